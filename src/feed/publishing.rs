//! Who may address which audience, and who may change a published notice.

use serde::Serialize;

use crate::{
    domain::{Audience, BroadcastScope, Notice, Role, User},
    error::{AppError, Result},
    feed::{membership::SectionMembershipIndex, Snapshot},
};

/// Admins may address anyone. Teachers may address the sections they teach.
/// Everybody may send a direct message.
pub fn authorize_publish(viewer: &User, audience: &Audience, index: &SectionMembershipIndex) -> Result<()> {
    let allowed = match (&viewer.role, audience) {
        (Role::Admin, _) => true,
        (_, Audience::Direct(_)) => true,
        (Role::Teacher, Audience::SectionScoped(section_id)) => viewer
            .teacher_id
            .as_deref()
            .map(|teacher_id| index.teaches(teacher_id, section_id))
            .unwrap_or(false),
        _ => false,
    };

    if allowed {
        Ok(())
    } else {
        tracing::debug!("{} ({}) may not address '{}'", viewer.id, viewer.role, audience);
        Err(AppError::Forbidden)
    }
}

pub fn can_delete(notice: &Notice, viewer: &User) -> bool {
    viewer.role == Role::Admin || notice.author_id == viewer.id
}

pub fn can_edit(notice: &Notice, viewer: &User) -> bool {
    can_delete(notice, viewer)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientOption {
    pub value: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecipientGroup {
    pub label: &'static str,
    pub options: Vec<RecipientOption>,
}

fn broadcast_label(scope: BroadcastScope) -> &'static str {
    match scope {
        BroadcastScope::All => "Everyone (All Staff & Students)",
        BroadcastScope::Staff => "All Staff Members",
        BroadcastScope::Teacher => "All Teachers",
        BroadcastScope::Student => "All Students",
    }
}

/// Recipients offered to `viewer` when composing, grouped as
/// Broadcasts / My Sections / Direct Messages. Empty groups are left out.
pub fn recipient_options(viewer: &User, snapshot: &Snapshot) -> Vec<RecipientGroup> {
    let broadcasts: Vec<RecipientOption> = if viewer.role == Role::Admin {
        BroadcastScope::EVERY
            .iter()
            .map(|scope| RecipientOption {
                value: Audience::Broadcast(*scope).to_string(),
                label: broadcast_label(*scope).to_string(),
            })
            .collect()
    } else {
        Vec::new()
    };

    let my_sections: Vec<RecipientOption> = match viewer.teacher_id.as_deref() {
        Some(teacher_id) => snapshot
            .sections
            .iter()
            .filter(|section| section.class_teacher_id.as_deref() == Some(teacher_id))
            .map(|section| RecipientOption {
                value: Audience::section(section.id.clone()).to_string(),
                label: format!("{} - Sec {}", section.subject_id, section.name),
            })
            .collect(),
        None => Vec::new(),
    };

    let direct: Vec<RecipientOption> = snapshot
        .users
        .iter()
        .filter(|user| user.role.is_staff() && user.id != viewer.id)
        .map(|user| RecipientOption {
            value: user.id.clone(),
            label: format!("{} ({})", user.name, user.role),
        })
        .collect();

    [
        RecipientGroup { label: "Broadcasts", options: broadcasts },
        RecipientGroup { label: "My Sections", options: my_sections },
        RecipientGroup { label: "Direct Messages", options: direct },
    ]
    .into_iter()
    .filter(|group| !group.options.is_empty())
    .collect()
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{NoticeKind, Section, TimetableEntry};

    fn snapshot() -> Snapshot {
        Snapshot {
            notices: Vec::new(),
            users: vec![
                User::new("admin", "Principal", Role::Admin),
                User::new("t-user", "Ms. Rahman", Role::Teacher).with_teacher_id("t1"),
                User::new("s-user", "Rafi", Role::Student).with_section_id("10"),
                User::new("lib", "Nadia", Role::Librarian),
            ],
            sections: vec![Section {
                id: "10".to_string(),
                name: "A".to_string(),
                subject_id: "physics".to_string(),
                department_id: "science".to_string(),
                class_teacher_id: Some("t1".to_string()),
            }],
            timetable: vec![TimetableEntry {
                id: "slot-1".to_string(),
                teacher_id: Some("t1".to_string()),
                section_id: Some("11".to_string()),
            }],
        }
    }

    #[test]
    fn test_publish_rules() {
        let snap = snapshot();
        let index = snap.membership_index();
        let admin = &snap.users[0];
        let teacher = &snap.users[1];
        let student = &snap.users[2];

        assert!(authorize_publish(admin, &Audience::Broadcast(BroadcastScope::All), &index).is_ok());
        assert!(authorize_publish(admin, &Audience::section("77"), &index).is_ok());
        assert!(authorize_publish(teacher, &Audience::section("11"), &index).is_ok());
        assert!(authorize_publish(teacher, &Audience::section("77"), &index).is_err());
        assert!(authorize_publish(teacher, &Audience::Broadcast(BroadcastScope::Teacher), &index).is_err());
        assert!(authorize_publish(student, &Audience::Direct("t-user".to_string()), &index).is_ok());
        assert!(authorize_publish(student, &Audience::section("10"), &index).is_err());
    }

    #[test]
    fn test_delete_rights() {
        let snap = snapshot();
        let notice = Notice::new("n1", "t-user", "section_10", NoticeKind::Notice, Utc::now());
        assert!(can_delete(&notice, &snap.users[0]));
        assert!(can_delete(&notice, &snap.users[1]));
        assert!(!can_delete(&notice, &snap.users[2]));
        assert!(!can_edit(&notice, &snap.users[3]));
    }

    #[test]
    fn test_recipient_groups() {
        let snap = snapshot();

        let admin_groups = recipient_options(&snap.users[0], &snap);
        let labels: Vec<_> = admin_groups.iter().map(|g| g.label).collect();
        assert_eq!(labels, vec!["Broadcasts", "Direct Messages"]);
        assert_eq!(admin_groups[0].options.len(), 4);

        let teacher_groups = recipient_options(&snap.users[1], &snap);
        assert_eq!(teacher_groups[0].label, "My Sections");
        assert_eq!(teacher_groups[0].options[0].value, "section_10");
        assert_eq!(teacher_groups[0].options[0].label, "physics - Sec A");
        let direct: Vec<_> = teacher_groups[1].options.iter().map(|o| o.label.as_str()).collect();
        assert_eq!(direct, vec!["Principal (Admin)", "Nadia (Librarian)"]);
    }
}
