use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, Utc};
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{MessageType, Notice, NoticeKind, Reaction, ReactionType, Reactions},
    error::{AppError, Result},
    feed::RepeatReaction,
    repository::NoticeRepository,
};

#[derive(FromRow)]
struct NoticeRow {
    id: String,
    title: String,
    content: String,
    date: NaiveDateTime,
    author_id: String,
    target: String,
    kind: String,
    message_type: String,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(FromRow)]
struct ReactionRow {
    notice_id: String,
    user_id: String,
    reaction_type: String,
}

pub struct SqliteNoticeRepository {
    pool: SqlitePool,
}

impl SqliteNoticeRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn row_to_notice(row: NoticeRow, reactions: Vec<Reaction>) -> Result<Notice> {
        Ok(Notice {
            id: row.id,
            title: row.title,
            content: row.content,
            date: DateTime::from_naive_utc_and_offset(row.date, Utc),
            author_id: row.author_id,
            target: row.target,
            kind: NoticeKind::from_str(&row.kind)
                .ok_or_else(|| AppError::Database(format!("Invalid notice kind: {}", row.kind)))?,
            message_type: MessageType::from_str(&row.message_type)
                .ok_or_else(|| AppError::Database(format!("Invalid message type: {}", row.message_type)))?,
            reactions: Reactions::from(reactions),
            created_at: DateTime::from_naive_utc_and_offset(row.created_at, Utc),
            updated_at: DateTime::from_naive_utc_and_offset(row.updated_at, Utc),
        })
    }

    fn row_to_reaction(row: ReactionRow) -> Result<(String, Reaction)> {
        let reaction_type = ReactionType::from_str(&row.reaction_type)
            .ok_or_else(|| AppError::Database(format!("Invalid reaction type: {}", row.reaction_type)))?;
        Ok((
            row.notice_id,
            Reaction {
                user_id: row.user_id,
                reaction_type,
            },
        ))
    }

    async fn reactions_for(&self, notice_id: &str) -> Result<Vec<Reaction>> {
        let rows = sqlx::query_as::<_, ReactionRow>(
            r#"
            SELECT notice_id, user_id, reaction_type
            FROM notice_reactions
            WHERE notice_id = ?
            ORDER BY rowid
            "#
        )
        .bind(notice_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        rows.into_iter()
            .map(|row| Self::row_to_reaction(row).map(|(_, reaction)| reaction))
            .collect()
    }

    /// Why a reaction on `notice_id` was not written.
    async fn unreactable(&self, notice_id: &str) -> Result<AppError> {
        let kind: Option<String> = sqlx::query_scalar("SELECT kind FROM notices WHERE id = ?")
            .bind(notice_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(match kind {
            None => AppError::NotFound("Notice not found".to_string()),
            Some(_) => AppError::NotReactable(notice_id.to_string()),
        })
    }
}

#[async_trait]
impl NoticeRepository for SqliteNoticeRepository {
    async fn create(&self, notice: Notice) -> Result<Notice> {
        sqlx::query(
            r#"
            INSERT INTO notices (
                id, title, content, date, author_id, target, kind, message_type,
                created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#
        )
        .bind(&notice.id)
        .bind(&notice.title)
        .bind(&notice.content)
        .bind(notice.date.naive_utc())
        .bind(&notice.author_id)
        .bind(&notice.target)
        .bind(notice.kind.as_str())
        .bind(notice.message_type.as_str())
        .bind(notice.created_at.naive_utc())
        .bind(notice.updated_at.naive_utc())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        self.find_by_id(&notice.id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve created notice".to_string())
        })
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Notice>> {
        let row = sqlx::query_as::<_, NoticeRow>(
            r#"
            SELECT id, title, content, date, author_id, target, kind, message_type,
                   created_at, updated_at
            FROM notices
            WHERE id = ?
            "#
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        match row {
            Some(r) => {
                let reactions = self.reactions_for(id).await?;
                Ok(Some(Self::row_to_notice(r, reactions)?))
            }
            None => Ok(None),
        }
    }

    async fn list(&self) -> Result<Vec<Notice>> {
        let rows = sqlx::query_as::<_, NoticeRow>(
            r#"
            SELECT id, title, content, date, author_id, target, kind, message_type,
                   created_at, updated_at
            FROM notices
            ORDER BY date DESC, rowid
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let reaction_rows = sqlx::query_as::<_, ReactionRow>(
            r#"
            SELECT notice_id, user_id, reaction_type
            FROM notice_reactions
            ORDER BY rowid
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        let mut by_notice: HashMap<String, Vec<Reaction>> = HashMap::new();
        for row in reaction_rows {
            let (notice_id, reaction) = Self::row_to_reaction(row)?;
            by_notice.entry(notice_id).or_default().push(reaction);
        }

        rows.into_iter()
            .map(|row| {
                let reactions = by_notice.remove(&row.id).unwrap_or_default();
                Self::row_to_notice(row, reactions)
            })
            .collect()
    }

    async fn update(&self, id: &str, notice: Notice) -> Result<Notice> {
        let now = Utc::now().naive_utc();

        let result = sqlx::query(
            r#"
            UPDATE notices
            SET title = ?, content = ?, message_type = ?, updated_at = ?
            WHERE id = ?
            "#
        )
        .bind(&notice.title)
        .bind(&notice.content)
        .bind(notice.message_type.as_str())
        .bind(now)
        .bind(id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Notice not found".to_string()));
        }

        self.find_by_id(id).await?.ok_or_else(|| {
            AppError::Database("Failed to retrieve updated notice".to_string())
        })
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM notice_reactions WHERE notice_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM notices WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(AppError::NotFound("Notice not found".to_string()));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn upsert_reaction(
        &self,
        notice_id: &str,
        user_id: &str,
        reaction_type: ReactionType,
        repeat: RepeatReaction,
    ) -> Result<Notice> {
        // Every statement here writes, so the transaction takes the write
        // lock up front and concurrent reactors queue on the busy timeout.
        let mut tx = self.pool.begin().await?;

        let mut toggled_off = false;
        if repeat == RepeatReaction::Toggle {
            let removed = sqlx::query(
                "DELETE FROM notice_reactions WHERE notice_id = ? AND user_id = ? AND reaction_type = ?",
            )
            .bind(notice_id)
            .bind(user_id)
            .bind(reaction_type.as_str())
            .execute(&mut *tx)
            .await?;
            toggled_off = removed.rows_affected() > 0;
        }

        if !toggled_off {
            // Updating in place keeps the row's position in the reaction order.
            let written = sqlx::query(
                r#"
                INSERT INTO notice_reactions (notice_id, user_id, reaction_type, created_at)
                SELECT id, ?, ?, ? FROM notices WHERE id = ? AND kind = ?
                ON CONFLICT(notice_id, user_id) DO UPDATE SET reaction_type = excluded.reaction_type
                "#
            )
            .bind(user_id)
            .bind(reaction_type.as_str())
            .bind(Utc::now().naive_utc())
            .bind(notice_id)
            .bind(NoticeKind::Notice.as_str())
            .execute(&mut *tx)
            .await?;

            if written.rows_affected() == 0 {
                tx.rollback().await?;
                return Err(self.unreactable(notice_id).await?);
            }
        }

        tx.commit().await?;

        self.find_by_id(notice_id).await?.ok_or_else(|| {
            AppError::NotFound("Notice not found".to_string())
        })
    }
}
