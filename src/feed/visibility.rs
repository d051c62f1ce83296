//! Decides whether a notice belongs in a viewer's feed.
//!
//! The decision is a short-circuit sequence: authorship, then private
//! message addressing, then the audience of a public notice checked against
//! the viewer's row in a [`VisibilityPolicy`] table.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::{
    domain::{classify, Audience, BroadcastScope, Notice, NoticeKind, Role, User},
    error::{AppError, Result},
    feed::membership::SectionMembershipIndex,
};

/// A set of broadcast scopes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeSet(u8);

impl ScopeSet {
    pub const EMPTY: ScopeSet = ScopeSet(0);

    pub fn of(scopes: &[BroadcastScope]) -> Self {
        scopes
            .iter()
            .fold(ScopeSet::EMPTY, |set, scope| ScopeSet(set.0 | Self::bit(*scope)))
    }

    pub fn contains(self, scope: BroadcastScope) -> bool {
        self.0 & Self::bit(scope) != 0
    }

    pub fn iter(self) -> impl Iterator<Item = BroadcastScope> {
        BroadcastScope::EVERY
            .into_iter()
            .filter(move |scope| self.contains(*scope))
    }

    fn bit(scope: BroadcastScope) -> u8 {
        match scope {
            BroadcastScope::All => 1,
            BroadcastScope::Staff => 1 << 1,
            BroadcastScope::Teacher => 1 << 2,
            BroadcastScope::Student => 1 << 3,
        }
    }
}

/// How a role relates to section-scoped notices.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionAccess {
    /// Never sees section traffic.
    None,
    /// Sees sections in the teacher's membership set.
    Taught,
    /// Sees the single section the student belongs to.
    Enrolled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RolePolicy {
    pub broadcast: ScopeSet,
    pub sections: SectionAccess,
}

#[derive(Debug, Clone)]
pub struct VisibilityPolicy {
    table: HashMap<Role, RolePolicy>,
    fallback: RolePolicy,
}

impl VisibilityPolicy {
    /// The institution's standard table. Admins see every broadcast but no
    /// section traffic; roles outside the table get the support-staff row.
    pub fn standard() -> Self {
        use BroadcastScope::*;

        let staff = RolePolicy {
            broadcast: ScopeSet::of(&[All, Staff]),
            sections: SectionAccess::None,
        };

        let table = HashMap::from([
            (
                Role::Admin,
                RolePolicy {
                    broadcast: ScopeSet::of(&[All, Staff, Teacher, Student]),
                    sections: SectionAccess::None,
                },
            ),
            (
                Role::Teacher,
                RolePolicy {
                    broadcast: ScopeSet::of(&[All, Staff, Teacher]),
                    sections: SectionAccess::Taught,
                },
            ),
            (
                Role::Student,
                RolePolicy {
                    broadcast: ScopeSet::of(&[All, Student]),
                    sections: SectionAccess::Enrolled,
                },
            ),
            (Role::Accountant, staff),
            (Role::Librarian, staff),
        ]);

        Self { table, fallback: staff }
    }

    pub fn lookup(&self, role: &Role) -> Result<RolePolicy> {
        self.table
            .get(role)
            .copied()
            .ok_or_else(|| AppError::UnknownRole(role.to_string()))
    }

    /// Like [`lookup`](Self::lookup), resolving unknown roles to the fallback
    /// row.
    pub fn for_role(&self, role: &Role) -> RolePolicy {
        self.lookup(role).unwrap_or_else(|err| {
            tracing::debug!("{}; applying support-staff visibility", err);
            self.fallback
        })
    }

    pub fn is_visible(&self, notice: &Notice, viewer: &User, index: &SectionMembershipIndex) -> bool {
        if notice.author_id == viewer.id {
            return true;
        }

        match notice.kind {
            NoticeKind::PrivateMessage => notice.target == viewer.id,
            NoticeKind::Notice => {
                let audience = match classify(&notice.target) {
                    Ok(audience) => audience,
                    Err(err) => {
                        tracing::debug!("Hiding notice {}: {}", notice.id, err);
                        return false;
                    }
                };
                self.audience_includes(&audience, viewer, index)
            }
        }
    }

    fn audience_includes(&self, audience: &Audience, viewer: &User, index: &SectionMembershipIndex) -> bool {
        let policy = self.for_role(&viewer.role);

        match audience {
            Audience::Broadcast(scope) => policy.broadcast.contains(*scope),
            Audience::SectionScoped(section_id) => match policy.sections {
                SectionAccess::None => false,
                SectionAccess::Taught => viewer
                    .teacher_id
                    .as_deref()
                    .map(|teacher_id| index.teaches(teacher_id, section_id))
                    .unwrap_or(false),
                SectionAccess::Enrolled => viewer.section_id.as_deref() == Some(section_id.as_str()),
            },
            // A public notice cannot be addressed to a single user.
            Audience::Direct(_) => false,
        }
    }

    /// Notices visible to `viewer`, in input order.
    pub fn visible_notices<'a>(
        &self,
        notices: &'a [Notice],
        viewer: &User,
        index: &SectionMembershipIndex,
    ) -> Vec<&'a Notice> {
        notices
            .iter()
            .filter(|notice| self.is_visible(notice, viewer, index))
            .collect()
    }
}

impl Default for VisibilityPolicy {
    fn default() -> Self {
        Self::standard()
    }
}

/// [`VisibilityPolicy::is_visible`] against the standard table.
pub fn is_visible(notice: &Notice, viewer: &User, index: &SectionMembershipIndex) -> bool {
    static STANDARD: OnceLock<VisibilityPolicy> = OnceLock::new();
    STANDARD
        .get_or_init(VisibilityPolicy::standard)
        .is_visible(notice, viewer, index)
}

#[cfg(test)]
mod tests {
    use chrono::Utc;

    use super::*;
    use crate::domain::{Section, TimetableEntry};

    fn notice(id: &str, author: &str, target: &str, kind: NoticeKind) -> Notice {
        Notice::new(id, author, target, kind, Utc::now()).with_text("t", "c")
    }

    fn index_for(teacher: &str, sections: &[&str]) -> SectionMembershipIndex {
        let timetable: Vec<TimetableEntry> = sections
            .iter()
            .map(|s| TimetableEntry {
                id: format!("slot-{}", s),
                teacher_id: Some(teacher.to_string()),
                section_id: Some(s.to_string()),
            })
            .collect();
        SectionMembershipIndex::build(&Vec::<Section>::new(), &timetable)
    }

    #[test]
    fn test_scope_set() {
        let set = ScopeSet::of(&[BroadcastScope::All, BroadcastScope::Student]);
        assert!(set.contains(BroadcastScope::All));
        assert!(!set.contains(BroadcastScope::Staff));
        assert_eq!(set.iter().collect::<Vec<_>>(), vec![BroadcastScope::All, BroadcastScope::Student]);
        assert_eq!(ScopeSet::EMPTY.iter().count(), 0);
    }

    #[test]
    fn test_unknown_role_uses_staff_row() {
        let policy = VisibilityPolicy::standard();
        let janitor = Role::from("Janitor");
        assert!(matches!(policy.lookup(&janitor), Err(AppError::UnknownRole(_))));
        assert_eq!(policy.for_role(&janitor), policy.for_role(&Role::Librarian));

        let viewer = User::new("u9", "Sam", janitor);
        let index = SectionMembershipIndex::default();
        assert!(is_visible(&notice("n1", "a", "Staff", NoticeKind::Notice), &viewer, &index));
        assert!(!is_visible(&notice("n2", "a", "Teacher", NoticeKind::Notice), &viewer, &index));
    }

    #[test]
    fn test_author_sees_everything_they_wrote() {
        let viewer = User::new("u1", "Ann", Role::Student).with_section_id("3");
        let index = SectionMembershipIndex::default();
        for (target, kind) in [
            ("Teacher", NoticeKind::Notice),
            ("section_99", NoticeKind::Notice),
            ("someone-else", NoticeKind::PrivateMessage),
            ("", NoticeKind::Notice),
        ] {
            assert!(is_visible(&notice("n", "u1", target, kind), &viewer, &index));
        }
    }

    #[test]
    fn test_private_message_only_for_recipient() {
        let index = SectionMembershipIndex::default();
        let message = notice("m1", "u1", "u2", NoticeKind::PrivateMessage);

        assert!(is_visible(&message, &User::new("u2", "Bo", Role::Accountant), &index));
        assert!(!is_visible(&message, &User::new("u3", "Cy", Role::Admin), &index));
    }

    #[test]
    fn test_section_access_by_role() {
        let index = index_for("t1", &["10", "11"]);
        let teacher = User::new("u5", "Dee", Role::Teacher).with_teacher_id("t1");
        let untethered = User::new("u6", "Eve", Role::Teacher);
        let student = User::new("u7", "Fay", Role::Student).with_section_id("10");
        let admin = User::new("u8", "Gus", Role::Admin);

        let section_10 = notice("s10", "x", "section_10", NoticeKind::Notice);
        let section_99 = notice("s99", "x", "section_99", NoticeKind::Notice);

        assert!(is_visible(&section_10, &teacher, &index));
        assert!(!is_visible(&section_99, &teacher, &index));
        assert!(!is_visible(&section_10, &untethered, &index));
        assert!(is_visible(&section_10, &student, &index));
        assert!(!is_visible(&section_99, &student, &index));
        assert!(!is_visible(&section_10, &admin, &index));
    }

    #[test]
    fn test_malformed_public_notices_are_hidden() {
        let index = SectionMembershipIndex::default();
        let admin = User::new("u8", "Gus", Role::Admin);

        assert!(!is_visible(&notice("n1", "x", "", NoticeKind::Notice), &admin, &index));
        assert!(!is_visible(&notice("n2", "x", "section_", NoticeKind::Notice), &admin, &index));
        assert!(!is_visible(&notice("n3", "x", "u8", NoticeKind::Notice), &admin, &index));
    }
}
