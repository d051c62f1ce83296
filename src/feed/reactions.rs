use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::{
    domain::{Notice, ReactionType, User},
    error::{AppError, Result},
};

/// What happens when a user repeats the reaction they already have.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RepeatReaction {
    /// Leave it in place.
    #[default]
    Keep,
    /// Take it back.
    Toggle,
}

/// Applies one user's reaction and returns the updated notice.
///
/// A user holds at most one reaction per notice: a new type replaces the old
/// one in place rather than adding a second entry.
pub fn upsert(
    notice: &Notice,
    user_id: &str,
    reaction_type: ReactionType,
    repeat: RepeatReaction,
) -> Result<Notice> {
    if !notice.is_reactable() {
        return Err(AppError::NotReactable(notice.id.clone()));
    }

    let mut updated = notice.clone();
    match updated.reactions.get(user_id) {
        Some(current) if current == reaction_type && repeat == RepeatReaction::Toggle => {
            updated.reactions.remove(user_id);
        }
        _ => {
            updated.reactions.set(user_id, reaction_type);
        }
    }

    Ok(updated)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactionSummary {
    pub counts: BTreeMap<ReactionType, usize>,
    pub reactor_names: BTreeMap<ReactionType, Vec<String>>,
    pub viewer_reaction: Option<ReactionType>,
}

impl ReactionSummary {
    /// Zero for every type.
    pub fn empty() -> Self {
        Self {
            counts: ReactionType::EVERY.iter().map(|t| (*t, 0)).collect(),
            reactor_names: ReactionType::EVERY.iter().map(|t| (*t, Vec::new())).collect(),
            viewer_reaction: None,
        }
    }

    pub fn count(&self, reaction_type: ReactionType) -> usize {
        self.counts.get(&reaction_type).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

/// Counts and reactor names per type, plus the viewer's own reaction.
///
/// Reactors whose user record is missing still count but are left out of
/// the name lists.
pub fn aggregate(notice: &Notice, viewer_id: &str, users_by_id: &HashMap<String, User>) -> ReactionSummary {
    let mut summary = ReactionSummary::empty();

    for reaction in notice.reactions.iter() {
        *summary.counts.entry(reaction.reaction_type).or_insert(0) += 1;

        if let Some(user) = users_by_id.get(&reaction.user_id) {
            summary
                .reactor_names
                .entry(reaction.reaction_type)
                .or_default()
                .push(user.name.clone());
        }
    }

    summary.viewer_reaction = notice.reactions.get(viewer_id);
    summary
}

/// The snapshot without `notice_id`. Its reactions go with it.
pub fn remove(notices: &[Notice], notice_id: &str) -> Vec<Notice> {
    notices
        .iter()
        .filter(|notice| notice.id != notice_id)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{NoticeKind, Role};

    fn board_notice() -> Notice {
        Notice::new("n1", "admin", "All", NoticeKind::Notice, Utc::now()).with_text("Exam", "Monday")
    }

    fn users() -> HashMap<String, User> {
        ["a", "b", "c"]
            .iter()
            .map(|id| (id.to_string(), User::new(*id, format!("User {}", id), Role::Student)))
            .collect()
    }

    #[test]
    fn test_switching_type_keeps_one_entry() {
        let notice = board_notice();
        let liked = upsert(&notice, "a", ReactionType::Like, RepeatReaction::Keep).unwrap();
        let hearted = upsert(&liked, "a", ReactionType::Heart, RepeatReaction::Keep).unwrap();

        assert_eq!(hearted.reactions.len(), 1);
        assert_eq!(hearted.reactions.get("a"), Some(ReactionType::Heart));
        // caller's value is not touched
        assert!(notice.reactions.is_empty());
        assert_eq!(liked.reactions.get("a"), Some(ReactionType::Like));
    }

    #[test]
    fn test_repeat_policy() {
        let liked = upsert(&board_notice(), "a", ReactionType::Like, RepeatReaction::Keep).unwrap();

        let kept = upsert(&liked, "a", ReactionType::Like, RepeatReaction::Keep).unwrap();
        assert_eq!(kept, liked);

        let toggled = upsert(&liked, "a", ReactionType::Like, RepeatReaction::Toggle).unwrap();
        assert!(toggled.reactions.is_empty());

        let switched = upsert(&liked, "a", ReactionType::Haha, RepeatReaction::Toggle).unwrap();
        assert_eq!(switched.reactions.get("a"), Some(ReactionType::Haha));
    }

    #[test]
    fn test_private_messages_reject_reactions() {
        let message = Notice::new("m1", "a", "b", NoticeKind::PrivateMessage, Utc::now());
        let err = upsert(&message, "b", ReactionType::Like, RepeatReaction::Keep).unwrap_err();
        assert!(matches!(err, AppError::NotReactable(id) if id == "m1"));
    }

    #[test]
    fn test_aggregate_skips_unknown_reactors() {
        let mut notice = board_notice();
        for (user, reaction) in [
            ("a", ReactionType::Like),
            ("ghost", ReactionType::Like),
            ("b", ReactionType::Crying),
            ("c", ReactionType::Like),
        ] {
            notice = upsert(&notice, user, reaction, RepeatReaction::Keep).unwrap();
        }

        let summary = aggregate(&notice, "c", &users());
        assert_eq!(summary.count(ReactionType::Like), 3);
        assert_eq!(summary.count(ReactionType::Crying), 1);
        assert_eq!(summary.count(ReactionType::Heart), 0);
        assert_eq!(summary.total(), 4);
        assert_eq!(summary.reactor_names[&ReactionType::Like], vec!["User a", "User c"]);
        assert_eq!(summary.viewer_reaction, Some(ReactionType::Like));

        assert_eq!(aggregate(&notice, "c", &users()), summary);
        assert_eq!(aggregate(&notice, "nobody", &users()).viewer_reaction, None);
    }

    #[test]
    fn test_remove_drops_only_the_target() {
        let first = upsert(&board_notice(), "a", ReactionType::Like, RepeatReaction::Keep).unwrap();
        let mut second = board_notice();
        second.id = "n2".to_string();

        let snapshot = vec![first, second];
        let remaining = remove(&snapshot, "n1");
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].id, "n2");
        assert_eq!(snapshot.len(), 2);
    }
}
