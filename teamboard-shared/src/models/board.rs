/// Board model and database operations
///
/// # Schema
///
/// ```sql
/// CREATE TABLE boards (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     name TEXT NOT NULL,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Board {
    pub id: Uuid,
    pub team_id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CreateBoard {
    pub team_id: Uuid,
    pub name: String,
}

impl Board {
    pub async fn create<'e, E>(executor: E, data: CreateBoard) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Board>(
            r#"
            INSERT INTO boards (team_id, name)
            VALUES ($1, $2)
            RETURNING id, team_id, name, created_at, updated_at
            "#,
        )
        .bind(data.team_id)
        .bind(data.name)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Board>(
            r#"
            SELECT id, team_id, name, created_at, updated_at
            FROM boards
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    /// Boards of a team, newest first
    pub async fn list_by_team<'e, E>(executor: E, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Board>(
            r#"
            SELECT id, team_id, name, created_at, updated_at
            FROM boards
            WHERE team_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(team_id)
        .fetch_all(executor)
        .await
    }

    pub async fn count_by_team<'e, E>(executor: E, team_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar("SELECT COUNT(*) FROM boards WHERE team_id = $1")
            .bind(team_id)
            .fetch_one(executor)
            .await
    }

    pub async fn rename<'e, E>(executor: E, id: Uuid, name: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Board>(
            r#"
            UPDATE boards
            SET name = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, team_id, name, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(name)
        .fetch_optional(executor)
        .await
    }

    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM boards WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
