/// Business workflows
///
/// Each service function takes the store and the [`CurrentUser`] explicitly,
/// runs the authorization guard, checks domain rules, and only then writes.
/// Multi-row writes go through a single unit of work.
///
/// # Modules
///
/// - `accounts`: signup, sign-in, profile
/// - `teams`: team creation and listing
/// - `boards`: board CRUD with cascade delete
/// - `tasks`: task CRUD and column position allocation
/// - `invitations`: invite / respond workflow
/// - `memberships`: role changes and removal with last-admin protection
/// - `notifications`: feed and read state
///
/// [`CurrentUser`]: crate::auth::CurrentUser

pub mod accounts;
pub mod boards;
pub mod invitations;
pub mod memberships;
pub mod notifications;
pub mod tasks;
pub mod teams;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::authorization::AuthzError;
use crate::auth::password::PasswordError;
use crate::models::{Membership, UserSummary};
use crate::store::{Store, StoreError};

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;

/// Failure of a service operation
///
/// Every variant except `Store` and `Password` carries a message meant for
/// the end user.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Credentials were wrong
    #[error("{0}")]
    Unauthorized(String),

    /// The guard refused the caller
    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// A domain rule rejected the request (duplicate, last admin, expiry, ...)
    #[error("{0}")]
    Rule(String),

    /// Input failed validation
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Password(#[from] PasswordError),
}

impl ServiceError {
    pub fn not_found(what: &str) -> Self {
        ServiceError::NotFound(format!("{} not found", what))
    }

    pub fn rule(message: impl Into<String>) -> Self {
        ServiceError::Rule(message.into())
    }
}

impl From<AuthzError> for ServiceError {
    fn from(err: AuthzError) -> Self {
        match err {
            AuthzError::Forbidden(message) => ServiceError::Forbidden(message),
            AuthzError::Store(err) => ServiceError::Store(err),
        }
    }
}

/// A membership with the member's public profile attached
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberView {
    #[serde(flatten)]
    pub membership: Membership,
    pub user: Option<UserSummary>,
}

/// Attaches user summaries to memberships, preserving order
pub(crate) async fn member_views(
    store: &dyn Store,
    memberships: Vec<Membership>,
) -> ServiceResult<Vec<MemberView>> {
    let ids: Vec<Uuid> = memberships.iter().map(|m| m.user_id).collect();
    let users = store.user_summaries(&ids).await?;

    Ok(memberships
        .into_iter()
        .map(|membership| {
            let user = users.iter().find(|u| u.id == membership.user_id).cloned();
            MemberView { membership, user }
        })
        .collect())
}
