/// Notification model and database operations
///
/// Notifications are written as a side effect of other workflows (currently
/// only invitations) and read by polling. Only the `read` flag ever changes
/// after insert.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE notification_type AS ENUM ('TEAM_INVITATION');
///
/// CREATE TABLE notifications (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     type notification_type NOT NULL,
///     title TEXT NOT NULL,
///     message TEXT NOT NULL,
///     data JSONB NOT NULL DEFAULT '{}',
///     read BOOLEAN NOT NULL DEFAULT FALSE,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// Maximum number of notifications returned by a feed query
pub const NOTIFICATION_FEED_LIMIT: i64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "notification_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationType {
    TeamInvitation,
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: Uuid,
    pub user_id: Uuid,

    #[sqlx(rename = "type")]
    #[serde(rename = "type")]
    pub kind: NotificationType,

    pub title: String,
    pub message: String,

    /// Structured payload, e.g. the invitation id for TEAM_INVITATION
    pub data: serde_json::Value,

    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateNotification {
    pub user_id: Uuid,
    pub kind: NotificationType,
    pub title: String,
    pub message: String,
    pub data: serde_json::Value,
}

impl Notification {
    pub async fn create<'e, E>(executor: E, data: CreateNotification) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Notification>(
            r#"
            INSERT INTO notifications (user_id, type, title, message, data)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, type, title, message, data, read, created_at
            "#,
        )
        .bind(data.user_id)
        .bind(data.kind)
        .bind(data.title)
        .bind(data.message)
        .bind(data.data)
        .fetch_one(executor)
        .await
    }

    /// Newest notifications for a user, at most `limit`
    pub async fn list_for_user<'e, E>(
        executor: E,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Notification>(
            r#"
            SELECT id, user_id, type, title, message, data, read, created_at
            FROM notifications
            WHERE user_id = $1 AND (NOT $2 OR read = FALSE)
            ORDER BY created_at DESC
            LIMIT $3
            "#,
        )
        .bind(user_id)
        .bind(unread_only)
        .bind(limit)
        .fetch_all(executor)
        .await
    }

    pub async fn count_unread<'e, E>(executor: E, user_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .fetch_one(executor)
        .await
    }

    /// Marks the given notifications read; ids owned by other users are ignored
    pub async fn mark_read<'e, E>(executor: E, user_id: Uuid, ids: &[Uuid]) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND id = ANY($2)",
        )
        .bind(user_id)
        .bind(ids)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }

    pub async fn mark_all_read<'e, E>(executor: E, user_id: Uuid) -> Result<u64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query(
            "UPDATE notifications SET read = TRUE WHERE user_id = $1 AND read = FALSE",
        )
        .bind(user_id)
        .execute(executor)
        .await?;

        Ok(result.rows_affected())
    }
}
