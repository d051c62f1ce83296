use async_trait::async_trait;

use crate::domain::*;
use crate::error::Result;
use crate::feed::RepeatReaction;

pub mod directory_repository;
pub mod notice_repository;

pub use directory_repository::SqliteDirectoryRepository;
pub use notice_repository::SqliteNoticeRepository;

#[async_trait]
pub trait NoticeRepository: Send + Sync {
    async fn create(&self, notice: Notice) -> Result<Notice>;
    async fn find_by_id(&self, id: &str) -> Result<Option<Notice>>;
    /// Every notice with its reactions, newest first.
    async fn list(&self) -> Result<Vec<Notice>>;
    async fn update(&self, id: &str, notice: Notice) -> Result<Notice>;
    /// Removes the notice and all of its reactions as one unit.
    async fn delete(&self, id: &str) -> Result<()>;
    /// Atomic replace-or-insert keyed on `(notice_id, user_id)`.
    async fn upsert_reaction(
        &self,
        notice_id: &str,
        user_id: &str,
        reaction_type: ReactionType,
        repeat: RepeatReaction,
    ) -> Result<Notice>;
}

/// Read access to the people and classes notices are addressed to.
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    async fn find_user(&self, id: &str) -> Result<Option<User>>;
    async fn list_users(&self) -> Result<Vec<User>>;
    async fn list_sections(&self) -> Result<Vec<Section>>;
    async fn list_timetable(&self) -> Result<Vec<TimetableEntry>>;
    async fn save_user(&self, user: User) -> Result<User>;
    async fn save_section(&self, section: Section) -> Result<Section>;
    async fn save_timetable_entry(&self, entry: TimetableEntry) -> Result<TimetableEntry>;
}
