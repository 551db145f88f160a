/// Request authentication
///
/// Resolves the bearer token on a request to a [`CurrentUser`]. The API
/// layer runs [`authenticate`] in a middleware and hands the result to
/// handlers as a request extension; services take it as an explicit
/// argument instead of reading any ambient session.
///
/// Resolution fails closed: a missing header, a malformed or expired token,
/// a refresh token, or a token whose user no longer exists all yield an
/// [`AuthError`].

use axum::http::{header, HeaderMap};
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::jwt::{validate_access_token, JwtError};
use crate::models::User;
use crate::store::{Store, StoreError};

/// The authenticated caller of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
    pub name: Option<String>,
}

impl CurrentUser {
    /// Name shown to other users, falling back to the email address
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.email,
        }
    }
}

impl From<&User> for CurrentUser {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Missing credentials")]
    MissingCredentials,

    #[error("Expected Bearer token")]
    InvalidFormat,

    #[error("Invalid token: {0}")]
    InvalidToken(#[from] JwtError),

    /// Token is valid but its subject no longer exists
    #[error("Unknown user")]
    UnknownUser,

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Extracts the token from an `Authorization: Bearer <token>` header
pub fn bearer_token(headers: &HeaderMap) -> Result<&str, AuthError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or(AuthError::MissingCredentials)?;

    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or(AuthError::InvalidFormat)
}

/// Validates the request's access token and loads the user it names
pub async fn authenticate(
    store: &dyn Store,
    secret: &str,
    headers: &HeaderMap,
) -> Result<CurrentUser, AuthError> {
    let token = bearer_token(headers)?;
    let claims = validate_access_token(token, secret)?;

    let user = store
        .find_user(claims.sub)
        .await?
        .ok_or(AuthError::UnknownUser)?;

    debug!(user_id = %user.id, "Authenticated request");
    Ok(CurrentUser::from(&user))
}
