use chrono::{DateTime, SubsecRound, Utc};
use sqlx::{FromRow, SqlitePool};
use uuid::Uuid;

use crate::models::deadline::{format_timestamp, parse_due_date};
use crate::models::{Deadline, DeadlinePatch, ModelError, NewDeadline};

const SELECT_DEADLINE: &str = "SELECT id, user_id, title, description, due_date, priority, status, created_at, updated_at FROM deadlines";

/// Stored shape of a deadline. Timestamps and enums are kept as text.
#[derive(Debug, FromRow)]
struct DeadlineRow {
    id: String,
    user_id: String,
    title: String,
    description: Option<String>,
    due_date: String,
    priority: String,
    status: String,
    created_at: String,
    updated_at: String,
}

impl DeadlineRow {
    fn into_deadline(self) -> Result<Deadline, ModelError> {
        Ok(Deadline {
            due_date: parse_due_date(&self.due_date)?,
            priority: self.priority.parse()?,
            status: self.status.parse()?,
            created_at: parse_due_date(&self.created_at)?,
            updated_at: parse_due_date(&self.updated_at)?,
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
        })
    }
}

/// A row we wrote ourselves failing to parse is a decode error, never a
/// silently skipped entry.
fn decode(row: DeadlineRow) -> Result<Deadline, sqlx::Error> {
    row.into_deadline()
        .map_err(|e| sqlx::Error::Decode(Box::new(e)))
}

/// All of a user's deadlines, pending first, then by due date.
pub async fn fetch_deadlines(db: &SqlitePool, user_id: &str) -> Result<Vec<Deadline>, sqlx::Error> {
    let sql = format!(
        "{SELECT_DEADLINE} WHERE user_id = ? \
         ORDER BY CASE status WHEN 'pending' THEN 0 ELSE 1 END, due_date ASC"
    );
    sqlx::query_as::<_, DeadlineRow>(&sql)
        .bind(user_id)
        .fetch_all(db)
        .await?
        .into_iter()
        .map(decode)
        .collect()
}

pub async fn find_deadline(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
) -> Result<Option<Deadline>, sqlx::Error> {
    let sql = format!("{SELECT_DEADLINE} WHERE id = ? AND user_id = ?");
    sqlx::query_as::<_, DeadlineRow>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(db)
        .await?
        .map(decode)
        .transpose()
}

pub async fn insert_deadline(
    db: &SqlitePool,
    user_id: &str,
    new: NewDeadline,
    now: DateTime<Utc>,
) -> Result<Deadline, sqlx::Error> {
    // storage keeps milliseconds; return exactly what a later read will see
    let now = now.trunc_subsecs(3);
    let deadline = Deadline {
        id: Uuid::new_v4().to_string(),
        title: new.title,
        description: new.description,
        due_date: new.due_date.trunc_subsecs(3),
        priority: new.priority,
        status: new.status,
        user_id: user_id.to_string(),
        created_at: now,
        updated_at: now,
    };

    sqlx::query(
        r#"
        INSERT INTO deadlines
            (id, user_id, title, description, due_date, priority, status, created_at, updated_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
    )
    .bind(&deadline.id)
    .bind(&deadline.user_id)
    .bind(&deadline.title)
    .bind(&deadline.description)
    .bind(format_timestamp(&deadline.due_date))
    .bind(deadline.priority.as_str())
    .bind(deadline.status.as_str())
    .bind(format_timestamp(&deadline.created_at))
    .bind(format_timestamp(&deadline.updated_at))
    .execute(db)
    .await?;

    Ok(deadline)
}

pub async fn update_deadline(
    db: &SqlitePool,
    user_id: &str,
    id: &str,
    patch: DeadlinePatch,
    now: DateTime<Utc>,
) -> Result<Option<Deadline>, sqlx::Error> {
    let mut current = match find_deadline(db, user_id, id).await? {
        Some(d) => d,
        None => return Ok(None),
    };

    patch.apply(&mut current);
    current.updated_at = now;

    if save_deadline(db, &mut current).await? {
        Ok(Some(current))
    } else {
        // deleted between the read and the write
        Ok(None)
    }
}

/// Writes every mutable field of `deadline` back to its row. Returns `false`
/// when no row with that id exists for the owner any more.
pub async fn save_deadline(db: &SqlitePool, deadline: &mut Deadline) -> Result<bool, sqlx::Error> {
    deadline.due_date = deadline.due_date.trunc_subsecs(3);
    deadline.updated_at = deadline.updated_at.trunc_subsecs(3);

    let affected = sqlx::query(
        r#"
        UPDATE deadlines
        SET title = ?1,
            description = ?2,
            due_date = ?3,
            priority = ?4,
            status = ?5,
            updated_at = ?6
        WHERE id = ?7 AND user_id = ?8
        "#,
    )
    .bind(&deadline.title)
    .bind(&deadline.description)
    .bind(format_timestamp(&deadline.due_date))
    .bind(deadline.priority.as_str())
    .bind(deadline.status.as_str())
    .bind(format_timestamp(&deadline.updated_at))
    .bind(&deadline.id)
    .bind(&deadline.user_id)
    .execute(db)
    .await?
    .rows_affected();

    Ok(affected > 0)
}

pub async fn delete_deadline(db: &SqlitePool, user_id: &str, id: &str) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM deadlines WHERE id = ?1 AND user_id = ?2")
        .bind(id)
        .bind(user_id)
        .execute(db)
        .await?
        .rows_affected();

    Ok(result > 0)
}
