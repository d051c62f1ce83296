//! The feed engine: given one snapshot of the institution and a viewer,
//! decide what the viewer sees and annotate it for display.
//!
//! Everything in here is synchronous and works on borrowed snapshots. The
//! functions that change a notice hand back a new value.

pub mod membership;
pub mod ordering;
pub mod publishing;
pub mod reactions;
pub mod visibility;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::domain::{classify, Audience, BroadcastScope, Notice, NoticeKind, Section, TimetableEntry, User};

pub use membership::{accessible_sections, SectionMembershipIndex};
pub use ordering::{newest_first, order_newest_first};
pub use publishing::{authorize_publish, can_delete, can_edit, recipient_options, RecipientGroup, RecipientOption};
pub use reactions::{aggregate, upsert, ReactionSummary, RepeatReaction};
pub use visibility::{is_visible, RolePolicy, ScopeSet, SectionAccess, VisibilityPolicy};

pub const EMPTY_FEED_MESSAGE: &str = "No relevant notices or messages found.";

const UNKNOWN_AUTHOR_NAME: &str = "School Admin";
const UNKNOWN_AUTHOR_ROLE: &str = "Staff";

/// Everything the engine reads, fetched together.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default)]
    pub notices: Vec<Notice>,
    #[serde(default)]
    pub users: Vec<User>,
    #[serde(default)]
    pub sections: Vec<Section>,
    #[serde(default)]
    pub timetable: Vec<TimetableEntry>,
}

impl Snapshot {
    pub fn membership_index(&self) -> SectionMembershipIndex {
        SectionMembershipIndex::build(&self.sections, &self.timetable)
    }

    pub fn users_by_id(&self) -> HashMap<String, User> {
        self.users.iter().map(|u| (u.id.clone(), u.clone())).collect()
    }

    pub fn find_notice(&self, notice_id: &str) -> Option<&Notice> {
        self.notices.iter().find(|n| n.id == notice_id)
    }
}

/// A visible notice with everything needed to render it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedItem {
    #[serde(flatten)]
    pub notice: Notice,
    pub author_name: String,
    pub author_role: String,
    pub audience_label: String,
    pub reaction_summary: ReactionSummary,
    pub can_delete: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Feed {
    pub items: Vec<FeedItem>,
    pub empty_message: Option<&'static str>,
}

impl Feed {
    pub fn ids(&self) -> Vec<&str> {
        self.items.iter().map(|item| item.notice.id.as_str()).collect()
    }
}

/// Context shared by every item of one feed render.
pub struct FeedContext<'a> {
    viewer: &'a User,
    users_by_id: HashMap<String, User>,
    sections: &'a [Section],
}

impl<'a> FeedContext<'a> {
    /// The viewer is always resolvable, even when the user list is stale.
    pub fn new(snapshot: &'a Snapshot, viewer: &'a User) -> Self {
        let mut users_by_id = snapshot.users_by_id();
        users_by_id.insert(viewer.id.clone(), viewer.clone());
        Self {
            viewer,
            users_by_id,
            sections: &snapshot.sections,
        }
    }

    pub fn annotate(&self, notice: &Notice) -> FeedItem {
        let (author_name, author_role) = match self.users_by_id.get(&notice.author_id) {
            Some(author) => (author.name.clone(), author.role.to_string()),
            None => (UNKNOWN_AUTHOR_NAME.to_string(), UNKNOWN_AUTHOR_ROLE.to_string()),
        };

        let reaction_summary = if notice.is_reactable() {
            aggregate(notice, &self.viewer.id, &self.users_by_id)
        } else {
            ReactionSummary::empty()
        };

        FeedItem {
            notice: notice.clone(),
            author_name,
            author_role,
            audience_label: self.audience_label(notice),
            reaction_summary,
            can_delete: can_delete(notice, self.viewer),
        }
    }

    fn audience_label(&self, notice: &Notice) -> String {
        if notice.kind == NoticeKind::PrivateMessage {
            let recipient = self
                .users_by_id
                .get(&notice.target)
                .map(|u| u.name.as_str())
                .unwrap_or("user");
            return format!("Private to {}", recipient);
        }

        match classify(&notice.target) {
            Ok(Audience::Broadcast(BroadcastScope::All)) => "Public Notice".to_string(),
            Ok(Audience::Broadcast(BroadcastScope::Student)) => "For Students".to_string(),
            Ok(Audience::Broadcast(BroadcastScope::Teacher)) => "For Teachers".to_string(),
            Ok(Audience::Broadcast(BroadcastScope::Staff)) => "For Staff".to_string(),
            Ok(Audience::SectionScoped(section_id)) => self
                .sections
                .iter()
                .find(|s| s.id == section_id)
                .map(|s| format!("For Sec {}", s.name))
                .unwrap_or_else(|| "Class Notice".to_string()),
            Ok(Audience::Direct(_)) | Err(_) => "Notice".to_string(),
        }
    }
}

/// Visible notices for `viewer`, newest first, annotated for display.
pub fn build_feed(snapshot: &Snapshot, viewer: &User, policy: &VisibilityPolicy) -> Feed {
    let index = snapshot.membership_index();
    let mut visible = policy.visible_notices(&snapshot.notices, viewer, &index);
    order_newest_first(&mut visible);

    let context = FeedContext::new(snapshot, viewer);
    let items: Vec<FeedItem> = visible.into_iter().map(|n| context.annotate(n)).collect();

    let empty_message = if items.is_empty() {
        Some(EMPTY_FEED_MESSAGE)
    } else {
        None
    };

    Feed { items, empty_message }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::domain::{ReactionType, Role};

    fn notice(id: &str, author: &str, target: &str, kind: NoticeKind, day: u32) -> Notice {
        let date = Utc.with_ymd_and_hms(2024, 3, day, 8, 30, 0).unwrap();
        Notice::new(id, author, target, kind, date).with_text(format!("Title {}", id), "Body")
    }

    #[test]
    fn test_feed_annotations() {
        let mut pinned = notice("n1", "admin", "All", NoticeKind::Notice, 2);
        pinned = upsert(&pinned, "s1", ReactionType::Heart, RepeatReaction::Keep).unwrap();

        let snapshot = Snapshot {
            notices: vec![
                pinned,
                notice("n2", "ghost", "section_10", NoticeKind::Notice, 5),
                notice("m1", "t1-user", "s1", NoticeKind::PrivateMessage, 4),
            ],
            users: vec![
                User::new("admin", "Principal", Role::Admin),
                User::new("t1-user", "Ms. Rahman", Role::Teacher),
            ],
            sections: vec![Section {
                id: "10".to_string(),
                name: "B".to_string(),
                subject_id: "bio".to_string(),
                department_id: "science".to_string(),
                class_teacher_id: None,
            }],
            timetable: Vec::new(),
        };
        // the student is missing from the user list on purpose
        let viewer = User::new("s1", "Rafi", Role::Student).with_section_id("10");

        let feed = build_feed(&snapshot, &viewer, &VisibilityPolicy::standard());
        assert_eq!(feed.ids(), vec!["n2", "m1", "n1"]);
        assert_eq!(feed.empty_message, None);

        let section = &feed.items[0];
        assert_eq!(section.author_name, "School Admin");
        assert_eq!(section.author_role, "Staff");
        assert_eq!(section.audience_label, "For Sec B");
        assert!(!section.can_delete);

        let message = &feed.items[1];
        assert_eq!(message.audience_label, "Private to Rafi");
        assert_eq!(message.reaction_summary, ReactionSummary::empty());

        let public = &feed.items[2];
        assert_eq!(public.audience_label, "Public Notice");
        assert_eq!(public.reaction_summary.viewer_reaction, Some(ReactionType::Heart));
        assert_eq!(public.reaction_summary.reactor_names[&ReactionType::Heart], vec!["Rafi"]);
    }

    #[test]
    fn test_empty_snapshot_gives_empty_state() {
        let viewer = User::new("a", "Admin", Role::Admin);
        let feed = build_feed(&Snapshot::default(), &viewer, &VisibilityPolicy::default());
        assert!(feed.items.is_empty());
        assert_eq!(feed.empty_message, Some(EMPTY_FEED_MESSAGE));
    }

    #[test]
    fn test_feed_item_json_shape() {
        let viewer = User::new("a", "Admin", Role::Admin);
        let snapshot = Snapshot {
            notices: vec![notice("n1", "a", "Staff", NoticeKind::Notice, 1)],
            ..Default::default()
        };
        let feed = build_feed(&snapshot, &viewer, &VisibilityPolicy::default());
        let json = serde_json::to_value(&feed).unwrap();

        let item = &json["items"][0];
        assert_eq!(item["id"], "n1");
        assert_eq!(item["type"], "notice");
        assert_eq!(item["authorId"], "a");
        assert_eq!(item["messageType"], "text");
        assert_eq!(item["audienceLabel"], "For Staff");
        assert_eq!(item["canDelete"], true);
        assert_eq!(item["reactionSummary"]["counts"]["like"], 0);
        assert!(json["emptyMessage"].is_null());
    }
}
