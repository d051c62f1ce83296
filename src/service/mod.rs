pub mod notice_service;

use std::sync::Arc;
use sqlx::SqlitePool;
use crate::config::FeedConfig;
use crate::repository::*;

pub use notice_service::{prepare_notice, NoticeService};

pub struct ServiceContext {
    pub notice_repo: Arc<dyn NoticeRepository>,
    pub directory_repo: Arc<dyn DirectoryRepository>,
    pub notice_service: Arc<NoticeService>,
    pub db_pool: SqlitePool,
}

impl ServiceContext {
    pub fn new(
        notice_repo: Arc<dyn NoticeRepository>,
        directory_repo: Arc<dyn DirectoryRepository>,
        feed_config: &FeedConfig,
        db_pool: SqlitePool,
    ) -> Self {
        let notice_service = Arc::new(NoticeService::new(
            notice_repo.clone(),
            directory_repo.clone(),
            feed_config.repeat_reaction,
        ));

        Self {
            notice_repo,
            directory_repo,
            notice_service,
            db_pool,
        }
    }

    /// Builds the SQLite-backed repositories over one pool.
    pub fn from_pool(db_pool: SqlitePool, feed_config: &FeedConfig) -> Self {
        let notice_repo = Arc::new(SqliteNoticeRepository::new(db_pool.clone()));
        let directory_repo = Arc::new(SqliteDirectoryRepository::new(db_pool.clone()));
        Self::new(notice_repo, directory_repo, feed_config, db_pool)
    }
}
