/// Task model and database operations
///
/// Tasks live on a board in one of three status columns. `position` orders a
/// task within its (board, status) column; new tasks and tasks moved to a
/// different column are appended after the current maximum.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE task_status AS ENUM ('TODO', 'IN_PROGRESS', 'DONE');
///
/// CREATE TABLE tasks (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     board_id UUID NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
///     title TEXT NOT NULL,
///     description TEXT,
///     status task_status NOT NULL DEFAULT 'TODO',
///     position INTEGER NOT NULL DEFAULT 0,
///     assignee_id UUID,
///     created_by_id UUID NOT NULL REFERENCES users(id),
///     due_date TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// `assignee_id` carries no foreign key: removing a member keeps their
/// assignments in place.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// Kanban column a task sits in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Todo,
    InProgress,
    Done,
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Todo
    }
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Todo => "TODO",
            TaskStatus::InProgress => "IN_PROGRESS",
            TaskStatus::Done => "DONE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub board_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub position: i32,
    pub assignee_id: Option<Uuid>,
    pub created_by_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for inserting a task; the position is allocated by the caller
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub board_id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub status: TaskStatus,
    pub position: i32,
    pub assignee_id: Option<Uuid>,
    pub created_by_id: Uuid,
    pub due_date: Option<DateTime<Utc>>,
}

/// Highest position a task may hold
pub const MAX_POSITION: i32 = 1_000_000;

/// Position for a task appended to a column whose current maximum is `max`
///
/// An empty column starts at 0. Returns `None` when appending would pass
/// [`MAX_POSITION`].
pub fn next_position(max: Option<i32>) -> Option<i32> {
    match max {
        None => Some(0),
        Some(position) => position
            .checked_add(1)
            .filter(|next| *next <= MAX_POSITION),
    }
}

impl Task {
    pub async fn create<'e, E>(executor: E, data: CreateTask) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (board_id, title, description, status, position,
                               assignee_id, created_by_id, due_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id, board_id, title, description, status, position,
                      assignee_id, created_by_id, due_date, created_at, updated_at
            "#,
        )
        .bind(data.board_id)
        .bind(data.title)
        .bind(data.description)
        .bind(data.status)
        .bind(data.position)
        .bind(data.assignee_id)
        .bind(data.created_by_id)
        .bind(data.due_date)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, board_id, title, description, status, position,
                   assignee_id, created_by_id, due_date, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Tasks on a board ordered by status, then position
    pub async fn list_by_board<'e, E>(executor: E, board_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT id, board_id, title, description, status, position,
                   assignee_id, created_by_id, due_date, created_at, updated_at
            FROM tasks
            WHERE board_id = $1
            ORDER BY status ASC, position ASC
            "#,
        )
        .bind(board_id)
        .fetch_all(executor)
        .await
    }

    pub async fn count_by_board<'e, E>(executor: E, board_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM tasks WHERE board_id = $1")
            .bind(board_id)
            .fetch_one(executor)
            .await
    }

    /// Highest position in a (board, status) column, `None` when empty
    pub async fn max_position<'e, E>(
        executor: E,
        board_id: Uuid,
        status: TaskStatus,
    ) -> Result<Option<i32>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            SELECT MAX(position) FROM tasks
            WHERE board_id = $1 AND status = $2
            "#,
        )
        .bind(board_id)
        .bind(status)
        .fetch_one(executor)
        .await
    }

    /// Writes every mutable column of `task` back, bumping `updated_at`
    pub async fn save<'e, E>(executor: E, task: &Task) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET title = $2, description = $3, status = $4, position = $5,
                assignee_id = $6, due_date = $7, updated_at = NOW()
            WHERE id = $1
            RETURNING id, board_id, title, description, status, position,
                      assignee_id, created_by_id, due_date, created_at, updated_at
            "#,
        )
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.position)
        .bind(task.assignee_id)
        .bind(task.due_date)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Deletes every task on a board, returning how many went
    pub async fn delete_by_board<'e, E>(executor: E, board_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM tasks WHERE board_id = $1")
            .bind(board_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_position_empty_column() {
        assert_eq!(next_position(None), Some(0));
    }

    #[test]
    fn test_next_position_appends() {
        assert_eq!(next_position(Some(0)), Some(1));
        assert_eq!(next_position(Some(7)), Some(8));
    }

    #[test]
    fn test_next_position_stops_at_limit() {
        assert_eq!(next_position(Some(MAX_POSITION - 1)), Some(MAX_POSITION));
        assert_eq!(next_position(Some(MAX_POSITION)), None);
        assert_eq!(next_position(Some(i32::MAX)), None);
    }

    #[test]
    fn test_status_ordering_matches_columns() {
        assert!(TaskStatus::Todo < TaskStatus::InProgress);
        assert!(TaskStatus::InProgress < TaskStatus::Done);
    }

    #[test]
    fn test_status_serialization() {
        assert_eq!(
            serde_json::to_string(&TaskStatus::InProgress).unwrap(),
            "\"IN_PROGRESS\""
        );
        assert_eq!(TaskStatus::default(), TaskStatus::Todo);
    }
}
