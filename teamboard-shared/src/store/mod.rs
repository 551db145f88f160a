/// Persistence boundary
///
/// Services never touch SQL directly. They talk to a [`Store`], and run
/// multi-step writes through a [`UnitOfWork`] obtained from
/// [`Store::begin`]: writes are applied in order and become visible only on
/// [`UnitOfWork::commit`]. Dropping an uncommitted unit of work discards it.
///
/// Two implementations ship with the crate:
///
/// - [`postgres::PgStore`]: the production store on a `sqlx` pool
/// - [`memory::MemoryStore`]: a lock-guarded in-process store with the same
///   uniqueness and transaction semantics, used by tests and local demos
///
/// # Example
///
/// ```no_run
/// use teamboard_shared::store::{memory::MemoryStore, Store};
/// use teamboard_shared::models::{CreateMembership, TeamRole};
///
/// # async fn example(user_id: uuid::Uuid) -> Result<(), teamboard_shared::store::StoreError> {
/// let store = MemoryStore::new();
///
/// let mut uow = store.begin().await?;
/// let team = uow.create_team("Platform").await?;
/// uow.create_membership(CreateMembership {
///     team_id: team.id,
///     user_id,
///     role: TeamRole::Admin,
/// }).await?;
/// uow.commit().await?;
/// # Ok(())
/// # }
/// ```

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    Board, CreateBoard, CreateMembership, CreateNotification, CreateTask, CreateUser, Invitation,
    InvitationState, Membership, Notification, Task, TaskStatus, Team, TeamRole, UpdateUser,
    UpsertInvitation, User, UserSummary,
};

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors returned by store implementations
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    /// A unique constraint rejected the write; carries the constraint name
    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    /// An update or delete targeted a row that does not exist
    #[error("record not found")]
    NotFound,

    /// Backend failure
    #[error("persistence error: {0}")]
    Persistence(Arc<dyn std::error::Error + Send + Sync>),
}

impl StoreError {
    pub fn persistence(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Persistence(Arc::new(err))
    }

    pub fn is_unique_violation(&self) -> bool {
        matches!(self, StoreError::UniqueViolation(_))
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => StoreError::NotFound,
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                StoreError::UniqueViolation(db_err.constraint().unwrap_or_default().to_string())
            }
            other => StoreError::persistence(other),
        }
    }
}

/// Read and single-row write access to every aggregate
#[async_trait]
pub trait Store: Send + Sync {
    /// Round-trips to the backend
    async fn ping(&self) -> StoreResult<()>;

    /// Opens a unit of work
    ///
    /// While a [`memory::MemoryStore`] unit of work is open it holds the
    /// store's lock, so callers finish their reads before beginning.
    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>>;

    // Users

    /// # Errors
    ///
    /// [`StoreError::UniqueViolation`] when the email is taken.
    async fn create_user(&self, data: CreateUser) -> StoreResult<User>;

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// # Errors
    ///
    /// [`StoreError::UniqueViolation`] when the new email is taken,
    /// [`StoreError::NotFound`] when the user does not exist.
    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<User>;

    /// Public summaries for the given ids; unknown ids are skipped
    async fn user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>>;

    // Teams

    async fn find_team(&self, id: Uuid) -> StoreResult<Option<Team>>;

    async fn find_teams(&self, ids: &[Uuid]) -> StoreResult<Vec<Team>>;

    /// Teams the user belongs to, newest first
    async fn teams_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Team>>;

    // Memberships

    async fn find_membership(&self, team_id: Uuid, user_id: Uuid)
        -> StoreResult<Option<Membership>>;

    async fn find_membership_by_id(&self, id: Uuid) -> StoreResult<Option<Membership>>;

    /// Members of a team, ordered by join time
    async fn team_memberships(&self, team_id: Uuid) -> StoreResult<Vec<Membership>>;

    async fn user_memberships(&self, user_id: Uuid) -> StoreResult<Vec<Membership>>;

    async fn count_admins(&self, team_id: Uuid) -> StoreResult<i64>;

    async fn update_membership_role(&self, id: Uuid, role: TeamRole) -> StoreResult<Membership>;

    async fn delete_membership(&self, id: Uuid) -> StoreResult<()>;

    // Boards

    async fn create_board(&self, data: CreateBoard) -> StoreResult<Board>;

    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>>;

    /// Boards of a team, newest first
    async fn team_boards(&self, team_id: Uuid) -> StoreResult<Vec<Board>>;

    async fn count_boards(&self, team_id: Uuid) -> StoreResult<i64>;

    async fn rename_board(&self, id: Uuid, name: &str) -> StoreResult<Board>;

    // Tasks

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task>;

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>>;

    /// Tasks on a board ordered by status, then position
    async fn board_tasks(&self, board_id: Uuid) -> StoreResult<Vec<Task>>;

    async fn count_tasks(&self, board_id: Uuid) -> StoreResult<i64>;

    /// Highest position in a (board, status) column
    async fn max_task_position(&self, board_id: Uuid, status: TaskStatus)
        -> StoreResult<Option<i32>>;

    /// Writes the mutable columns of `task` back
    async fn save_task(&self, task: &Task) -> StoreResult<Task>;

    async fn delete_task(&self, id: Uuid) -> StoreResult<()>;

    // Invitations

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>>;

    async fn find_invitation_for(
        &self,
        team_id: Uuid,
        invited_user_id: Uuid,
    ) -> StoreResult<Option<Invitation>>;

    /// PENDING invitations for the user whose expiry is unset or after `now`,
    /// newest first
    async fn open_invitations_for(
        &self,
        invited_user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Invitation>>;

    async fn save_invitation_state(
        &self,
        id: Uuid,
        state: &InvitationState,
    ) -> StoreResult<Invitation>;

    // Notifications

    /// Newest first, at most `limit`
    async fn notifications_for(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>>;

    async fn count_unread(&self, user_id: Uuid) -> StoreResult<i64>;

    /// Marks the user's notifications among `ids` read
    async fn mark_read(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64>;

    async fn mark_all_read(&self, user_id: Uuid) -> StoreResult<u64>;
}

/// An open transaction
///
/// Writes issued here are invisible outside the unit of work until
/// [`commit`](UnitOfWork::commit) succeeds.
#[async_trait]
pub trait UnitOfWork: Send {
    async fn create_team(&mut self, name: &str) -> StoreResult<Team>;

    /// # Errors
    ///
    /// [`StoreError::UniqueViolation`] when the user already belongs to the team.
    async fn create_membership(&mut self, data: CreateMembership) -> StoreResult<Membership>;

    async fn upsert_invitation(&mut self, data: UpsertInvitation) -> StoreResult<Invitation>;

    async fn save_invitation_state(
        &mut self,
        id: Uuid,
        state: &InvitationState,
    ) -> StoreResult<Invitation>;

    async fn create_notification(&mut self, data: CreateNotification)
        -> StoreResult<Notification>;

    /// Deletes all tasks on a board, returning how many were removed
    async fn delete_board_tasks(&mut self, board_id: Uuid) -> StoreResult<u64>;

    async fn delete_board(&mut self, id: Uuid) -> StoreResult<()>;

    async fn commit(self: Box<Self>) -> StoreResult<()>;
}
