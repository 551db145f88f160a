/// Database models for Teamboard
///
/// Each model owns its row type, its input types and the SQL that reads and
/// writes it. Query functions are generic over [`sqlx::postgres::PgExecutor`]
/// so the same code runs against the pool or inside a transaction.
///
/// # Models
///
/// - `user`: accounts and public user summaries
/// - `team`: the tenant boundary
/// - `membership`: user-team link with ADMIN / MEMBER role
/// - `board`: Kanban boards owned by a team
/// - `task`: cards on a board, ordered per status column
/// - `invitation`: invite workflow and its state machine
/// - `notification`: in-app notifications

pub mod board;
pub mod invitation;
pub mod membership;
pub mod notification;
pub mod task;
pub mod team;
pub mod user;

pub use board::{Board, CreateBoard};
pub use invitation::{
    Invitation, InvitationEvent, InvitationState, InvitationStatus, TransitionError,
    UpsertInvitation,
};
pub use membership::{CreateMembership, Membership, TeamRole};
pub use notification::{CreateNotification, Notification, NotificationType};
pub use task::{CreateTask, Task, TaskStatus};
pub use team::{Team, TeamSummary};
pub use user::{CreateUser, UpdateUser, User, UserSummary};
