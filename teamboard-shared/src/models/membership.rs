/// Membership model and database operations
///
/// A membership links one user to one team with a role. There is at most one
/// membership per (team, user) pair, and every team keeps at least one ADMIN;
/// that floor is enforced by the membership lifecycle service rather than the
/// schema.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE team_role AS ENUM ('ADMIN', 'MEMBER');
///
/// CREATE TABLE memberships (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     role team_role NOT NULL DEFAULT 'MEMBER',
///     joined_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     UNIQUE (team_id, user_id)
/// );
/// ```
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::models::membership::{CreateMembership, Membership, TeamRole};
/// use uuid::Uuid;
///
/// # async fn example(pool: sqlx::PgPool) -> Result<(), sqlx::Error> {
/// let membership = Membership::create(&pool, CreateMembership {
///     team_id: Uuid::new_v4(),
///     user_id: Uuid::new_v4(),
///     role: TeamRole::Admin,
/// }).await?;
///
/// assert!(membership.role.is_admin());
/// # Ok(())
/// # }
/// ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// Role of a user within a team
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "team_role", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamRole {
    /// Manages boards, members and invitations
    Admin,

    /// Reads and edits boards and tasks
    Member,
}

impl Default for TeamRole {
    fn default() -> Self {
        TeamRole::Member
    }
}

impl TeamRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TeamRole::Admin => "ADMIN",
            TeamRole::Member => "MEMBER",
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, TeamRole::Admin)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Membership {
    pub id: Uuid,
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
    pub joined_at: DateTime<Utc>,
}

/// Input for creating a membership
#[derive(Debug, Clone)]
pub struct CreateMembership {
    pub team_id: Uuid,
    pub user_id: Uuid,
    pub role: TeamRole,
}

impl Membership {
    /// Inserts a membership
    ///
    /// # Errors
    ///
    /// Returns a unique violation (`memberships_team_id_user_id_key`) if the
    /// user already belongs to the team.
    pub async fn create<'e, E>(executor: E, data: CreateMembership) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            INSERT INTO memberships (team_id, user_id, role)
            VALUES ($1, $2, $3)
            RETURNING id, team_id, user_id, role, joined_at
            "#,
        )
        .bind(data.team_id)
        .bind(data.user_id)
        .bind(data.role)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, team_id, user_id, role, joined_at
            FROM memberships
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find<'e, E>(
        executor: E,
        team_id: Uuid,
        user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, team_id, user_id, role, joined_at
            FROM memberships
            WHERE team_id = $1 AND user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(user_id)
        .fetch_optional(executor)
        .await
    }

    /// Members of a team, oldest first
    pub async fn list_by_team<'e, E>(executor: E, team_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, team_id, user_id, role, joined_at
            FROM memberships
            WHERE team_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(team_id)
        .fetch_all(executor)
        .await
    }

    pub async fn list_by_user<'e, E>(executor: E, user_id: Uuid) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            SELECT id, team_id, user_id, role, joined_at
            FROM memberships
            WHERE user_id = $1
            ORDER BY joined_at ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(executor)
        .await
    }

    pub async fn count_admins<'e, E>(executor: E, team_id: Uuid) -> Result<i64, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM memberships
            WHERE team_id = $1 AND role = 'ADMIN'
            "#,
        )
        .bind(team_id)
        .fetch_one(executor)
        .await
    }

    pub async fn update_role<'e, E>(
        executor: E,
        id: Uuid,
        role: TeamRole,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Membership>(
            r#"
            UPDATE memberships
            SET role = $2
            WHERE id = $1
            RETURNING id, team_id, user_id, role, joined_at
            "#,
        )
        .bind(id)
        .bind(role)
        .fetch_optional(executor)
        .await
    }

    /// Deletes the membership row only; tasks assigned to the user are left as-is
    pub async fn delete<'e, E>(executor: E, id: Uuid) -> Result<bool, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let result = sqlx::query("DELETE FROM memberships WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_as_str() {
        assert_eq!(TeamRole::Admin.as_str(), "ADMIN");
        assert_eq!(TeamRole::Member.as_str(), "MEMBER");
    }

    #[test]
    fn test_default_role_is_member() {
        assert_eq!(TeamRole::default(), TeamRole::Member);
        assert!(!TeamRole::default().is_admin());
    }

    #[test]
    fn test_role_serialization() {
        assert_eq!(serde_json::to_string(&TeamRole::Admin).unwrap(), "\"ADMIN\"");
        let role: TeamRole = serde_json::from_str("\"MEMBER\"").unwrap();
        assert_eq!(role, TeamRole::Member);
        assert!(serde_json::from_str::<TeamRole>("\"OWNER\"").is_err());
    }
}
