use std::sync::Arc;

use chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    domain::*,
    error::{AppError, Result},
    feed::{
        self, build_feed, can_delete, can_edit, recipient_options, Feed, FeedContext, FeedItem,
        RecipientGroup, RepeatReaction, Snapshot, VisibilityPolicy,
    },
    repository::{DirectoryRepository, NoticeRepository},
};

/// Required publish fields, in the order they are reported when missing.
const REQUIRED_FIELDS: [(&str, &str); 4] = [
    ("title", "title"),
    ("content", "content"),
    ("target", "target"),
    ("author_id", "authorId"),
];

/// Turns a publish payload into a notice dated `now`.
///
/// Reports the first missing field by its wire name. The item kind is taken
/// from the target when the payload leaves it out; a kind that contradicts
/// the target is rejected.
pub fn prepare_notice(request: CreateNoticeRequest, now: DateTime<Utc>) -> Result<Notice> {
    if let Err(errors) = request.validate() {
        let field_errors = errors.field_errors();
        let missing = REQUIRED_FIELDS
            .iter()
            .find(|(field, _)| field_errors.contains_key(*field))
            .map(|(_, wire)| *wire)
            .unwrap_or("unknown");
        return Err(AppError::MissingField(missing.to_string()));
    }

    let CreateNoticeRequest {
        title: Some(title),
        content: Some(content),
        target: Some(target),
        author_id: Some(author_id),
        kind,
        message_type,
    } = request
    else {
        return Err(AppError::Internal("validated notice payload lost a field".to_string()));
    };

    let audience = classify(&target)?;
    let kind = match kind {
        Some(kind) => {
            audience.check_kind(kind)?;
            kind
        }
        None => audience.expected_kind(),
    };

    let mut notice = Notice::new(Uuid::new_v4().to_string(), author_id, target, kind, now)
        .with_text(title, content);
    notice.message_type = message_type.unwrap_or_default();
    Ok(notice)
}

pub struct NoticeService {
    notice_repo: Arc<dyn NoticeRepository>,
    directory_repo: Arc<dyn DirectoryRepository>,
    policy: VisibilityPolicy,
    repeat_reaction: RepeatReaction,
}

impl NoticeService {
    pub fn new(
        notice_repo: Arc<dyn NoticeRepository>,
        directory_repo: Arc<dyn DirectoryRepository>,
        repeat_reaction: RepeatReaction,
    ) -> Self {
        Self {
            notice_repo,
            directory_repo,
            policy: VisibilityPolicy::standard(),
            repeat_reaction,
        }
    }

    pub fn with_policy(mut self, policy: VisibilityPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Loads all four collections. A collection that fails to load is
    /// logged and replaced by an empty list, so callers always get a
    /// snapshot.
    pub async fn fetch_snapshot(&self) -> Snapshot {
        let (notices, users, sections, timetable) = tokio::join!(
            self.notice_repo.list(),
            self.directory_repo.list_users(),
            self.directory_repo.list_sections(),
            self.directory_repo.list_timetable(),
        );

        Snapshot {
            notices: or_empty("notices", notices),
            users: or_empty("users", users),
            sections: or_empty("sections", sections),
            timetable: or_empty("timetable", timetable),
        }
    }

    pub async fn feed_for(&self, viewer: &User) -> Feed {
        let snapshot = self.fetch_snapshot().await;
        let feed = build_feed(&snapshot, viewer, &self.policy);
        tracing::debug!(
            "Feed for {}: {} of {} notices visible",
            viewer.id,
            feed.items.len(),
            snapshot.notices.len()
        );
        feed
    }

    /// A single notice, only if `viewer` could see it in their feed.
    pub async fn get_for(&self, id: &str, viewer: &User) -> Result<FeedItem> {
        let snapshot = self.fetch_snapshot().await;
        let index = snapshot.membership_index();

        let notice = snapshot
            .find_notice(id)
            .filter(|n| self.policy.is_visible(n, viewer, &index))
            .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))?;

        Ok(FeedContext::new(&snapshot, viewer).annotate(notice))
    }

    pub async fn recipient_options(&self, viewer: &User) -> Vec<RecipientGroup> {
        let snapshot = self.fetch_snapshot().await;
        recipient_options(viewer, &snapshot)
    }

    pub async fn create_notice(&self, viewer: &User, request: CreateNoticeRequest) -> Result<Notice> {
        let notice = prepare_notice(request, Utc::now())?;

        if notice.author_id != viewer.id {
            return Err(AppError::Forbidden);
        }

        let audience = classify(&notice.target)?;
        let (sections, timetable) = tokio::join!(
            self.directory_repo.list_sections(),
            self.directory_repo.list_timetable(),
        );
        let index = feed::SectionMembershipIndex::build(
            &or_empty("sections", sections),
            &or_empty("timetable", timetable),
        );
        feed::authorize_publish(viewer, &audience, &index)?;

        let created = self.notice_repo.create(notice).await?;
        tracing::info!(
            "{} {} published {} to '{}'",
            viewer.role,
            viewer.id,
            created.kind.as_str(),
            created.target
        );
        Ok(created)
    }

    pub async fn update_notice(&self, viewer: &User, id: &str, request: UpdateNoticeRequest) -> Result<Notice> {
        let mut notice = self.notice_repo.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))?;

        if !can_edit(&notice, viewer) {
            return Err(AppError::Forbidden);
        }

        if let Some(title) = request.title {
            if title.is_empty() {
                return Err(AppError::MissingField("title".to_string()));
            }
            notice.title = title;
        }
        if let Some(content) = request.content {
            if content.is_empty() {
                return Err(AppError::MissingField("content".to_string()));
            }
            notice.content = content;
        }
        if let Some(message_type) = request.message_type {
            notice.message_type = message_type;
        }

        self.notice_repo.update(id, notice).await
    }

    /// Deletes a notice together with its reactions and returns what was
    /// removed.
    pub async fn delete_notice(&self, viewer: &User, id: &str) -> Result<Notice> {
        let notice = self.notice_repo.find_by_id(id).await?
            .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))?;

        if !can_delete(&notice, viewer) {
            return Err(AppError::Forbidden);
        }

        self.notice_repo.delete(id).await?;
        tracing::info!(
            "Notice {} deleted by {} with {} reactions",
            id,
            viewer.id,
            notice.reactions.len()
        );
        Ok(notice)
    }

    pub async fn react_to_notice(&self, viewer: &User, id: &str, reaction_type: ReactionType) -> Result<FeedItem> {
        let snapshot = self.fetch_snapshot().await;
        let index = snapshot.membership_index();

        let notice = snapshot
            .find_notice(id)
            .filter(|n| self.policy.is_visible(n, viewer, &index))
            .ok_or_else(|| AppError::NotFound("Notice not found".to_string()))?;

        // Rejects private messages before anything is written.
        feed::upsert(notice, &viewer.id, reaction_type, self.repeat_reaction)?;

        let stored = self
            .notice_repo
            .upsert_reaction(id, &viewer.id, reaction_type, self.repeat_reaction)
            .await?;

        tracing::debug!(
            "{} reacted {} on {}; now {:?}",
            viewer.id,
            reaction_type.as_str(),
            id,
            stored.reactions.get(&viewer.id)
        );

        Ok(FeedContext::new(&snapshot, viewer).annotate(&stored))
    }
}

fn or_empty<T>(collection: &str, result: Result<Vec<T>>) -> Vec<T> {
    result.unwrap_or_else(|e| {
        tracing::warn!("Failed to load {}: {}. Treating as empty.", collection, e);
        Vec::new()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(title: &str, content: &str, target: &str, author: &str) -> CreateNoticeRequest {
        let field = |s: &str| if s.is_empty() { None } else { Some(s.to_string()) };
        CreateNoticeRequest {
            title: field(title),
            content: field(content),
            target: field(target),
            author_id: field(author),
            ..Default::default()
        }
    }

    #[test]
    fn test_missing_fields_reported_in_order() {
        let cases = [
            (request("", "", "", ""), "title"),
            (request("T", "", "All", "u1"), "content"),
            (request("T", "C", "", ""), "target"),
            (request("T", "C", "All", ""), "authorId"),
        ];
        for (req, field) in cases {
            match prepare_notice(req, Utc::now()) {
                Err(AppError::MissingField(f)) => assert_eq!(f, field),
                other => panic!("expected MissingField({}), got {:?}", field, other),
            }
        }

        let mut blank_title = request("T", "C", "All", "u1");
        blank_title.title = Some(String::new());
        assert!(matches!(prepare_notice(blank_title, Utc::now()), Err(AppError::MissingField(f)) if f == "title"));
    }

    #[test]
    fn test_kind_inferred_from_target() {
        let now = Utc::now();
        let public = prepare_notice(request("T", "C", "section_4", "u1"), now).unwrap();
        assert_eq!(public.kind, NoticeKind::Notice);
        assert_eq!(public.message_type, MessageType::Text);
        assert_eq!(public.date, now);
        assert!(Uuid::parse_str(&public.id).is_ok());

        let direct = prepare_notice(request("T", "C", "u2", "u1"), now).unwrap();
        assert_eq!(direct.kind, NoticeKind::PrivateMessage);
    }

    #[test]
    fn test_contradicting_kind_rejected() {
        let mut req = request("T", "C", "All", "u1");
        req.kind = Some(NoticeKind::PrivateMessage);
        assert!(matches!(prepare_notice(req, Utc::now()), Err(AppError::InvalidTarget(_))));

        let mut req = request("T", "C", "u2", "u1");
        req.kind = Some(NoticeKind::Notice);
        assert!(matches!(prepare_notice(req, Utc::now()), Err(AppError::InvalidTarget(_))));
    }

    struct Unreachable;

    fn offline<T>() -> Result<T> {
        Err(AppError::Database("connection refused".to_string()))
    }

    #[async_trait::async_trait]
    impl NoticeRepository for Unreachable {
        async fn create(&self, _: Notice) -> Result<Notice> {
            offline()
        }
        async fn find_by_id(&self, _: &str) -> Result<Option<Notice>> {
            offline()
        }
        async fn list(&self) -> Result<Vec<Notice>> {
            offline()
        }
        async fn update(&self, _: &str, _: Notice) -> Result<Notice> {
            offline()
        }
        async fn delete(&self, _: &str) -> Result<()> {
            offline()
        }
        async fn upsert_reaction(
            &self,
            _: &str,
            _: &str,
            _: ReactionType,
            _: RepeatReaction,
        ) -> Result<Notice> {
            offline()
        }
    }

    #[async_trait::async_trait]
    impl DirectoryRepository for Unreachable {
        async fn find_user(&self, _: &str) -> Result<Option<User>> {
            offline()
        }
        async fn list_users(&self) -> Result<Vec<User>> {
            offline()
        }
        async fn list_sections(&self) -> Result<Vec<Section>> {
            offline()
        }
        async fn list_timetable(&self) -> Result<Vec<TimetableEntry>> {
            offline()
        }
        async fn save_user(&self, _: User) -> Result<User> {
            offline()
        }
        async fn save_section(&self, _: Section) -> Result<Section> {
            offline()
        }
        async fn save_timetable_entry(&self, _: TimetableEntry) -> Result<TimetableEntry> {
            offline()
        }
    }

    #[tokio::test]
    async fn test_failed_loads_give_an_empty_feed() {
        let service = NoticeService::new(
            Arc::new(Unreachable),
            Arc::new(Unreachable),
            RepeatReaction::Keep,
        );
        let viewer = User::new("s1", "Rafi", Role::Student);

        let feed = service.feed_for(&viewer).await;
        assert!(feed.items.is_empty());
        assert_eq!(feed.empty_message, Some(feed::EMPTY_FEED_MESSAGE));

        assert!(service.recipient_options(&viewer).await.is_empty());
        assert!(matches!(service.get_for("n1", &viewer).await, Err(AppError::NotFound(_))));
    }
}
