/// Team model and database operations
///
/// A team is the tenant boundary: it owns boards and memberships, and both
/// cascade when the team row goes away.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE teams (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
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
pub struct Team {
    pub id: Uuid,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `{id, name}` projection embedded in invitations and profiles
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamSummary {
    pub id: Uuid,
    pub name: String,
}

impl Team {
    pub fn summary(&self) -> TeamSummary {
        TeamSummary {
            id: self.id,
            name: self.name.clone(),
        }
    }

    /// Inserts a team row
    ///
    /// Callers pair this with an ADMIN membership for the creator inside the
    /// same transaction.
    pub async fn create<'e, E>(executor: E, name: &str) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Team>(
            r#"
            INSERT INTO teams (name)
            VALUES ($1)
            RETURNING id, name, created_at, updated_at
            "#,
        )
        .bind(name)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM teams
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_many<'e, E>(executor: E, ids: &[Uuid]) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT id, name, created_at, updated_at
            FROM teams
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await
    }

    /// Teams the user belongs to, newest first
    pub async fn list_for_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Team>(
            r#"
            SELECT t.id, t.name, t.created_at, t.updated_at
            FROM teams t
            JOIN memberships m ON m.team_id = t.id
            WHERE m.user_id = $1
            ORDER BY t.created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }
}
