/// User model and database operations
///
/// Users sign up with an email and password and can belong to any number of
/// teams. Accounts are never hard-deleted.
///
/// # Schema
///
/// ```sql
/// CREATE TABLE users (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     email TEXT NOT NULL UNIQUE,
///     name TEXT,
///     password_hash TEXT NOT NULL,
///     image TEXT,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
///
/// Emails are stored lowercased; callers normalise with [`normalize_email`]
/// before lookups and writes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

/// A registered account
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    /// Lowercased, unique
    pub email: String,

    pub name: Option<String>,

    /// Argon2id PHC string. Never serialized.
    #[serde(skip_serializing, default)]
    pub password_hash: String,

    /// Avatar URL
    pub image: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Public projection of a user embedded in other resources
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
}

/// Input for creating a user
#[derive(Debug, Clone)]
pub struct CreateUser {
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
}

/// Partial profile update; `None` leaves the column untouched
#[derive(Debug, Clone, Default)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Trims and lowercases an email address
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

impl User {
    /// Name shown to other users, falling back to the email address
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            image: self.image.clone(),
        }
    }

    /// Inserts a new user
    ///
    /// # Errors
    ///
    /// Returns a unique violation (`users_email_key`) if the email is taken.
    pub async fn create<'e, E>(executor: E, data: CreateUser) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, name, password_hash)
            VALUES ($1, $2, $3)
            RETURNING id, email, name, password_hash, image, created_at, updated_at
            "#,
        )
        .bind(normalize_email(&data.email))
        .bind(data.name)
        .bind(data.password_hash)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, image, created_at, updated_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_by_email<'e, E>(executor: E, email: &str) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, name, password_hash, image, created_at, updated_at
            FROM users
            WHERE email = $1
            "#,
        )
        .bind(normalize_email(email))
        .fetch_optional(executor)
        .await
    }

    /// Applies a partial update, bumping `updated_at`
    ///
    /// Returns `None` if the user does not exist.
    pub async fn update<'e, E>(
        executor: E,
        id: Uuid,
        data: UpdateUser,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, email, name, password_hash, image, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(data.name)
        .bind(data.email.as_deref().map(normalize_email))
        .bind(data.password_hash)
        .fetch_optional(executor)
        .await
    }

    /// Loads public summaries for a set of user ids
    pub async fn summaries<'e, E>(executor: E, ids: &[Uuid]) -> Result<Vec<UserSummary>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, UserSummary>(
            r#"
            SELECT id, name, email, image
            FROM users
            WHERE id = ANY($1)
            "#,
        )
        .bind(ids)
        .fetch_all(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: Option<&str>) -> User {
        User {
            id: Uuid::new_v4(),
            email: "ada@example.com".to_string(),
            name: name.map(str::to_string),
            password_hash: "$argon2id$stub".to_string(),
            image: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_normalize_email() {
        assert_eq!(normalize_email("  Ada@Example.COM "), "ada@example.com");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        assert_eq!(user(Some("Ada")).display_name(), "Ada");
        assert_eq!(user(None).display_name(), "ada@example.com");
        assert_eq!(user(Some("  ")).display_name(), "ada@example.com");
    }

    #[test]
    fn test_password_hash_not_serialized() {
        let json = serde_json::to_value(user(Some("Ada"))).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "ada@example.com");
        assert!(json.get("createdAt").is_some());
    }
}
