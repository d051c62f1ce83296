use async_trait::async_trait;
use sqlx::{FromRow, SqlitePool};

use crate::{
    domain::{Role, Section, TimetableEntry, User},
    error::{AppError, Result},
    repository::DirectoryRepository,
};

#[derive(FromRow)]
struct UserRow {
    id: String,
    name: String,
    role: String,
    teacher_id: Option<String>,
    section_id: Option<String>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        User {
            id: row.id,
            name: row.name,
            role: Role::from(row.role),
            teacher_id: row.teacher_id,
            section_id: row.section_id,
        }
    }
}

#[derive(FromRow)]
struct SectionRow {
    id: String,
    name: String,
    subject_id: String,
    department_id: String,
    class_teacher_id: Option<String>,
}

impl From<SectionRow> for Section {
    fn from(row: SectionRow) -> Self {
        Section {
            id: row.id,
            name: row.name,
            subject_id: row.subject_id,
            department_id: row.department_id,
            class_teacher_id: row.class_teacher_id,
        }
    }
}

#[derive(FromRow)]
struct TimetableRow {
    id: String,
    teacher_id: Option<String>,
    section_id: Option<String>,
}

impl From<TimetableRow> for TimetableEntry {
    fn from(row: TimetableRow) -> Self {
        TimetableEntry {
            id: row.id,
            teacher_id: row.teacher_id,
            section_id: row.section_id,
        }
    }
}

pub struct SqliteDirectoryRepository {
    pool: SqlitePool,
}

impl SqliteDirectoryRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl DirectoryRepository for SqliteDirectoryRepository {
    async fn find_user(&self, id: &str) -> Result<Option<User>> {
        let row = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, role, teacher_id, section_id FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(row.map(User::from))
    }

    async fn list_users(&self) -> Result<Vec<User>> {
        let rows = sqlx::query_as::<_, UserRow>(
            "SELECT id, name, role, teacher_id, section_id FROM users ORDER BY name",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(User::from).collect())
    }

    async fn list_sections(&self) -> Result<Vec<Section>> {
        let rows = sqlx::query_as::<_, SectionRow>(
            r#"
            SELECT id, name, subject_id, department_id, class_teacher_id
            FROM sections
            ORDER BY name
            "#
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(Section::from).collect())
    }

    async fn list_timetable(&self) -> Result<Vec<TimetableEntry>> {
        let rows = sqlx::query_as::<_, TimetableRow>(
            "SELECT id, teacher_id, section_id FROM timetable_entries",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(rows.into_iter().map(TimetableEntry::from).collect())
    }

    async fn save_user(&self, user: User) -> Result<User> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, role, teacher_id, section_id)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                role = excluded.role,
                teacher_id = excluded.teacher_id,
                section_id = excluded.section_id
            "#
        )
        .bind(&user.id)
        .bind(&user.name)
        .bind(user.role.as_str())
        .bind(&user.teacher_id)
        .bind(&user.section_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(user)
    }

    async fn save_section(&self, section: Section) -> Result<Section> {
        sqlx::query(
            r#"
            INSERT INTO sections (id, name, subject_id, department_id, class_teacher_id)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                subject_id = excluded.subject_id,
                department_id = excluded.department_id,
                class_teacher_id = excluded.class_teacher_id
            "#
        )
        .bind(&section.id)
        .bind(&section.name)
        .bind(&section.subject_id)
        .bind(&section.department_id)
        .bind(&section.class_teacher_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(section)
    }

    async fn save_timetable_entry(&self, entry: TimetableEntry) -> Result<TimetableEntry> {
        sqlx::query(
            r#"
            INSERT INTO timetable_entries (id, teacher_id, section_id)
            VALUES (?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                teacher_id = excluded.teacher_id,
                section_id = excluded.section_id
            "#
        )
        .bind(&entry.id)
        .bind(&entry.teacher_id)
        .bind(&entry.section_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Database(e.to_string()))?;

        Ok(entry)
    }
}
