use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReactionType {
    Like,
    Heart,
    Haha,
    Crying,
}

impl ReactionType {
    pub const EVERY: [ReactionType; 4] = [
        ReactionType::Like,
        ReactionType::Heart,
        ReactionType::Haha,
        ReactionType::Crying,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReactionType::Like => "like",
            ReactionType::Heart => "heart",
            ReactionType::Haha => "haha",
            ReactionType::Crying => "crying",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "like" => Some(ReactionType::Like),
            "heart" => Some(ReactionType::Heart),
            "haha" => Some(ReactionType::Haha),
            "crying" => Some(ReactionType::Crying),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reaction {
    pub user_id: String,
    #[serde(rename = "type")]
    pub reaction_type: ReactionType,
}

/// Reactions on one notice, at most one per user, in first-reaction order.
///
/// The entries are private so the only way in is [`Reactions::set`]. A
/// deserialized list with repeated user ids collapses to one entry per user,
/// the later value replacing the earlier one in place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<Reaction>", into = "Vec<Reaction>")]
pub struct Reactions {
    entries: Vec<Reaction>,
}

impl Reactions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str) -> Option<ReactionType> {
        self.entries
            .iter()
            .find(|r| r.user_id == user_id)
            .map(|r| r.reaction_type)
    }

    /// Inserts or replaces the user's reaction, returning the previous type.
    pub fn set(&mut self, user_id: &str, reaction_type: ReactionType) -> Option<ReactionType> {
        match self.entries.iter_mut().find(|r| r.user_id == user_id) {
            Some(existing) => Some(std::mem::replace(&mut existing.reaction_type, reaction_type)),
            None => {
                self.entries.push(Reaction {
                    user_id: user_id.to_string(),
                    reaction_type,
                });
                None
            }
        }
    }

    pub fn remove(&mut self, user_id: &str) -> Option<ReactionType> {
        let index = self.entries.iter().position(|r| r.user_id == user_id)?;
        Some(self.entries.remove(index).reaction_type)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Reaction> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<Vec<Reaction>> for Reactions {
    fn from(list: Vec<Reaction>) -> Self {
        let mut reactions = Reactions::new();
        for reaction in list {
            reactions.set(&reaction.user_id, reaction.reaction_type);
        }
        reactions
    }
}

impl From<Reactions> for Vec<Reaction> {
    fn from(reactions: Reactions) -> Self {
        reactions.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_replaces_in_place() {
        let mut reactions = Reactions::new();
        assert_eq!(reactions.set("a", ReactionType::Like), None);
        assert_eq!(reactions.set("b", ReactionType::Haha), None);
        assert_eq!(reactions.set("a", ReactionType::Heart), Some(ReactionType::Like));

        let order: Vec<_> = reactions.iter().map(|r| (r.user_id.as_str(), r.reaction_type)).collect();
        assert_eq!(order, vec![("a", ReactionType::Heart), ("b", ReactionType::Haha)]);
    }

    #[test]
    fn test_duplicate_users_collapse_on_deserialize() {
        let json = r#"[
            {"userId": "a", "type": "like"},
            {"userId": "b", "type": "crying"},
            {"userId": "a", "type": "haha"}
        ]"#;
        let reactions: Reactions = serde_json::from_str(json).unwrap();
        assert_eq!(reactions.len(), 2);
        assert_eq!(reactions.get("a"), Some(ReactionType::Haha));
        assert_eq!(reactions.iter().next().map(|r| r.user_id.as_str()), Some("a"));
    }

    #[test]
    fn test_reaction_type_parsing() {
        assert_eq!(ReactionType::from_str("HEART"), Some(ReactionType::Heart));
        assert_eq!(ReactionType::from_str("dislike"), None);
        assert_eq!(ReactionType::Crying.as_str(), "crying");
    }
}
