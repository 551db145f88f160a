/// Team-scoped authorization guard
///
/// Every team, board and task operation is gated on the caller's membership
/// in the owning team. The predicates answer yes/no; the `require_*`
/// wrappers turn a "no" into [`AuthzError::Forbidden`] carrying the message
/// the caller wants to surface.
///
/// All checks fail closed: a missing membership, a missing board, or a
/// store error never grants access.
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::auth::authorization::{is_team_admin, is_team_member};
/// use teamboard_shared::store::Store;
/// use uuid::Uuid;
///
/// # async fn example(store: &dyn Store, user_id: Uuid, team_id: Uuid) -> Result<(), Box<dyn std::error::Error>> {
/// if is_team_admin(store, user_id, team_id).await? {
///     assert!(is_team_member(store, user_id, team_id).await?);
/// }
/// # Ok(())
/// # }
/// ```

use uuid::Uuid;

use super::middleware::CurrentUser;
use crate::models::{Board, Membership};
use crate::store::{Store, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum AuthzError {
    /// The caller lacks the required membership or role
    #[error("{0}")]
    Forbidden(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// True when the user has a membership in the team
pub async fn is_team_member(
    store: &dyn Store,
    user_id: Uuid,
    team_id: Uuid,
) -> Result<bool, StoreError> {
    Ok(store.find_membership(team_id, user_id).await?.is_some())
}

/// True when the user is a member of the team with the ADMIN role
pub async fn is_team_admin(
    store: &dyn Store,
    user_id: Uuid,
    team_id: Uuid,
) -> Result<bool, StoreError> {
    Ok(store
        .find_membership(team_id, user_id)
        .await?
        .is_some_and(|m| m.role.is_admin()))
}

/// True when the board exists and the user belongs to its team
///
/// A missing board is indistinguishable from a forbidden one here; callers
/// that need a 404 check existence first.
pub async fn can_access_board(
    store: &dyn Store,
    user_id: Uuid,
    board_id: Uuid,
) -> Result<bool, StoreError> {
    match store.find_board(board_id).await? {
        Some(board) => is_team_member(store, user_id, board.team_id).await,
        None => Ok(false),
    }
}

/// Returns the caller's membership or fails with `message`
pub async fn require_member(
    store: &dyn Store,
    user: &CurrentUser,
    team_id: Uuid,
    message: &str,
) -> Result<Membership, AuthzError> {
    store
        .find_membership(team_id, user.id)
        .await?
        .ok_or_else(|| AuthzError::Forbidden(message.to_string()))
}

/// Returns the caller's ADMIN membership or fails with `message`
pub async fn require_admin(
    store: &dyn Store,
    user: &CurrentUser,
    team_id: Uuid,
    message: &str,
) -> Result<Membership, AuthzError> {
    store
        .find_membership(team_id, user.id)
        .await?
        .filter(|m| m.role.is_admin())
        .ok_or_else(|| AuthzError::Forbidden(message.to_string()))
}

/// Checks the caller may see `board`, which the caller has already loaded so
/// that a missing board surfaces as 404 before this runs
pub async fn require_board_access(
    store: &dyn Store,
    user: &CurrentUser,
    board: &Board,
    message: &str,
) -> Result<(), AuthzError> {
    if can_access_board(store, user.id, board.id).await? {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(message.to_string()))
    }
}
