/// PostgreSQL-backed store
///
/// Thin adapter over the model query functions. Single-statement operations
/// run on the pool; [`PgUnitOfWork`] wraps a `sqlx` transaction, which rolls
/// back on drop unless committed.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, UnitOfWork};
use crate::db::pool::health_check;
use crate::models::{
    Board, CreateBoard, CreateMembership, CreateNotification, CreateTask, CreateUser, Invitation,
    InvitationState, Membership, Notification, Task, TaskStatus, Team, TeamRole, UpdateUser,
    UpsertInvitation, User, UserSummary,
};

/// Store on a PostgreSQL pool
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn found<T>(row: Option<T>) -> StoreResult<T> {
    row.ok_or(StoreError::NotFound)
}

#[async_trait]
impl Store for PgStore {
    async fn ping(&self) -> StoreResult<()> {
        health_check(&self.pool).await?;
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let tx = self.pool.begin().await?;
        debug!("Opened database transaction");
        Ok(Box::new(PgUnitOfWork { tx }))
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        Ok(User::create(&self.pool, data).await?)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(User::find_by_id(&self.pool, id).await?)
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(User::find_by_email(&self.pool, email).await?)
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<User> {
        found(User::update(&self.pool, id, data).await?)
    }

    async fn user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>> {
        Ok(User::summaries(&self.pool, ids).await?)
    }

    async fn find_team(&self, id: Uuid) -> StoreResult<Option<Team>> {
        Ok(Team::find_by_id(&self.pool, id).await?)
    }

    async fn find_teams(&self, ids: &[Uuid]) -> StoreResult<Vec<Team>> {
        Ok(Team::find_many(&self.pool, ids).await?)
    }

    async fn teams_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Team>> {
        Ok(Team::list_for_user(&self.pool, user_id).await?)
    }

    async fn find_membership(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        Ok(Membership::find(&self.pool, team_id, user_id).await?)
    }

    async fn find_membership_by_id(&self, id: Uuid) -> StoreResult<Option<Membership>> {
        Ok(Membership::find_by_id(&self.pool, id).await?)
    }

    async fn team_memberships(&self, team_id: Uuid) -> StoreResult<Vec<Membership>> {
        Ok(Membership::list_by_team(&self.pool, team_id).await?)
    }

    async fn user_memberships(&self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        Ok(Membership::list_by_user(&self.pool, user_id).await?)
    }

    async fn count_admins(&self, team_id: Uuid) -> StoreResult<i64> {
        Ok(Membership::count_admins(&self.pool, team_id).await?)
    }

    async fn update_membership_role(&self, id: Uuid, role: TeamRole) -> StoreResult<Membership> {
        found(Membership::update_role(&self.pool, id, role).await?)
    }

    async fn delete_membership(&self, id: Uuid) -> StoreResult<()> {
        if Membership::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn create_board(&self, data: CreateBoard) -> StoreResult<Board> {
        Ok(Board::create(&self.pool, data).await?)
    }

    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        Ok(Board::find_by_id(&self.pool, id).await?)
    }

    async fn team_boards(&self, team_id: Uuid) -> StoreResult<Vec<Board>> {
        Ok(Board::list_by_team(&self.pool, team_id).await?)
    }

    async fn count_boards(&self, team_id: Uuid) -> StoreResult<i64> {
        Ok(Board::count_by_team(&self.pool, team_id).await?)
    }

    async fn rename_board(&self, id: Uuid, name: &str) -> StoreResult<Board> {
        found(Board::rename(&self.pool, id, name).await?)
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        Ok(Task::create(&self.pool, data).await?)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        Ok(Task::find_by_id(&self.pool, id).await?)
    }

    async fn board_tasks(&self, board_id: Uuid) -> StoreResult<Vec<Task>> {
        Ok(Task::list_by_board(&self.pool, board_id).await?)
    }

    async fn count_tasks(&self, board_id: Uuid) -> StoreResult<i64> {
        Ok(Task::count_by_board(&self.pool, board_id).await?)
    }

    async fn max_task_position(
        &self,
        board_id: Uuid,
        status: TaskStatus,
    ) -> StoreResult<Option<i32>> {
        Ok(Task::max_position(&self.pool, board_id, status).await?)
    }

    async fn save_task(&self, task: &Task) -> StoreResult<Task> {
        found(Task::save(&self.pool, task).await?)
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<()> {
        if Task::delete(&self.pool, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        Ok(Invitation::find_by_id(&self.pool, id).await?)
    }

    async fn find_invitation_for(
        &self,
        team_id: Uuid,
        invited_user_id: Uuid,
    ) -> StoreResult<Option<Invitation>> {
        Ok(Invitation::find_for_user(&self.pool, team_id, invited_user_id).await?)
    }

    async fn open_invitations_for(
        &self,
        invited_user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Invitation>> {
        Ok(Invitation::list_open_for_user(&self.pool, invited_user_id, now).await?)
    }

    async fn save_invitation_state(
        &self,
        id: Uuid,
        state: &InvitationState,
    ) -> StoreResult<Invitation> {
        found(Invitation::save_state(&self.pool, id, state).await?)
    }

    async fn notifications_for(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        Ok(Notification::list_for_user(&self.pool, user_id, unread_only, limit).await?)
    }

    async fn count_unread(&self, user_id: Uuid) -> StoreResult<i64> {
        Ok(Notification::count_unread(&self.pool, user_id).await?)
    }

    async fn mark_read(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        Ok(Notification::mark_read(&self.pool, user_id, ids).await?)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> StoreResult<u64> {
        Ok(Notification::mark_all_read(&self.pool, user_id).await?)
    }
}

/// Unit of work on a database transaction
pub struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl UnitOfWork for PgUnitOfWork {
    async fn create_team(&mut self, name: &str) -> StoreResult<Team> {
        Ok(Team::create(&mut *self.tx, name).await?)
    }

    async fn create_membership(&mut self, data: CreateMembership) -> StoreResult<Membership> {
        Ok(Membership::create(&mut *self.tx, data).await?)
    }

    async fn upsert_invitation(&mut self, data: UpsertInvitation) -> StoreResult<Invitation> {
        Ok(Invitation::upsert(&mut *self.tx, data).await?)
    }

    async fn save_invitation_state(
        &mut self,
        id: Uuid,
        state: &InvitationState,
    ) -> StoreResult<Invitation> {
        found(Invitation::save_state(&mut *self.tx, id, state).await?)
    }

    async fn create_notification(
        &mut self,
        data: CreateNotification,
    ) -> StoreResult<Notification> {
        Ok(Notification::create(&mut *self.tx, data).await?)
    }

    async fn delete_board_tasks(&mut self, board_id: Uuid) -> StoreResult<u64> {
        Ok(Task::delete_by_board(&mut *self.tx, board_id).await?)
    }

    async fn delete_board(&mut self, id: Uuid) -> StoreResult<()> {
        if Board::delete(&mut *self.tx, id).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound)
        }
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        self.tx.commit().await?;
        debug!("Committed database transaction");
        Ok(())
    }
}
