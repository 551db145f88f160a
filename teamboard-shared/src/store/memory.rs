/// In-process store
///
/// Keeps every table in a `Vec` behind one `tokio` mutex. Rows are kept in
/// insertion order so "newest first" listings stay deterministic when
/// timestamps tie. Uniqueness rules mirror the database constraints and
/// report the same constraint names.
///
/// A unit of work holds the lock for its whole lifetime and mutates a copy
/// of the state; commit swaps the copy in, drop throws it away.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::{Mutex, OwnedMutexGuard};
use uuid::Uuid;

use super::{Store, StoreError, StoreResult, UnitOfWork};
use crate::models::user::normalize_email;
use crate::models::{
    Board, CreateBoard, CreateMembership, CreateNotification, CreateTask, CreateUser, Invitation,
    InvitationState, InvitationStatus, Membership, Notification, Task, TaskStatus, Team, TeamRole,
    UpdateUser, UpsertInvitation, User, UserSummary,
};

const USERS_EMAIL_KEY: &str = "users_email_key";
const MEMBERSHIPS_TEAM_USER_KEY: &str = "memberships_team_id_user_id_key";

/// Thread-safe in-memory store
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryState {
    users: Vec<User>,
    teams: Vec<Team>,
    memberships: Vec<Membership>,
    boards: Vec<Board>,
    tasks: Vec<Task>,
    invitations: Vec<Invitation>,
    notifications: Vec<Notification>,
}

/// Clones `rows` newest first, ties broken by most recent insertion
fn newest_first<T>(
    rows: impl DoubleEndedIterator<Item = T>,
    key: impl Fn(&T) -> DateTime<Utc>,
) -> Vec<T> {
    let mut out: Vec<T> = rows.rev().collect();
    out.sort_by(|a, b| key(b).cmp(&key(a)));
    out
}

impl MemoryState {
    fn insert_team(&mut self, name: &str) -> Team {
        let now = Utc::now();
        let team = Team {
            id: Uuid::new_v4(),
            name: name.to_string(),
            created_at: now,
            updated_at: now,
        };
        self.teams.push(team.clone());
        team
    }

    fn insert_membership(&mut self, data: CreateMembership) -> StoreResult<Membership> {
        let taken = self
            .memberships
            .iter()
            .any(|m| m.team_id == data.team_id && m.user_id == data.user_id);
        if taken {
            return Err(StoreError::UniqueViolation(MEMBERSHIPS_TEAM_USER_KEY.to_string()));
        }

        let membership = Membership {
            id: Uuid::new_v4(),
            team_id: data.team_id,
            user_id: data.user_id,
            role: data.role,
            joined_at: Utc::now(),
        };
        self.memberships.push(membership.clone());
        Ok(membership)
    }

    fn upsert_invitation(&mut self, data: UpsertInvitation) -> Invitation {
        if let Some(existing) = self
            .invitations
            .iter_mut()
            .find(|i| i.team_id == data.team_id && i.invited_user_id == data.invited_user_id)
        {
            existing.apply(&data.state);
            return existing.clone();
        }

        let state = data.state;
        let invitation = Invitation {
            id: Uuid::new_v4(),
            team_id: data.team_id,
            invited_user_id: data.invited_user_id,
            invited_by_id: state.invited_by_id,
            role: state.role,
            status: state.status,
            created_at: Utc::now(),
            expires_at: state.expires_at,
            responded_at: state.responded_at,
        };
        self.invitations.push(invitation.clone());
        invitation
    }

    fn save_invitation_state(&mut self, id: Uuid, state: &InvitationState) -> StoreResult<Invitation> {
        let invitation = self
            .invitations
            .iter_mut()
            .find(|i| i.id == id)
            .ok_or(StoreError::NotFound)?;
        invitation.apply(state);
        Ok(invitation.clone())
    }

    fn insert_notification(&mut self, data: CreateNotification) -> Notification {
        let notification = Notification {
            id: Uuid::new_v4(),
            user_id: data.user_id,
            kind: data.kind,
            title: data.title,
            message: data.message,
            data: data.data,
            read: false,
            created_at: Utc::now(),
        };
        self.notifications.push(notification.clone());
        notification
    }

    fn delete_board_tasks(&mut self, board_id: Uuid) -> u64 {
        let before = self.tasks.len();
        self.tasks.retain(|t| t.board_id != board_id);
        (before - self.tasks.len()) as u64
    }

    fn delete_board(&mut self, id: Uuid) -> StoreResult<()> {
        let before = self.boards.len();
        self.boards.retain(|b| b.id != id);
        if self.boards.len() == before {
            return Err(StoreError::NotFound);
        }
        // ON DELETE CASCADE
        self.tasks.retain(|t| t.board_id != id);
        Ok(())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    async fn begin(&self) -> StoreResult<Box<dyn UnitOfWork>> {
        let guard = self.state.clone().lock_owned().await;
        let working = guard.clone();
        Ok(Box::new(MemoryUnitOfWork { guard, working }))
    }

    async fn create_user(&self, data: CreateUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;
        let email = normalize_email(&data.email);
        if state.users.iter().any(|u| u.email == email) {
            return Err(StoreError::UniqueViolation(USERS_EMAIL_KEY.to_string()));
        }

        let now = Utc::now();
        let user = User {
            id: Uuid::new_v4(),
            email,
            name: data.name,
            password_hash: data.password_hash,
            image: None,
            created_at: now,
            updated_at: now,
        };
        state.users.push(user.clone());
        Ok(user)
    }

    async fn find_user(&self, id: Uuid) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        Ok(state.users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let state = self.state.lock().await;
        let email = normalize_email(email);
        Ok(state.users.iter().find(|u| u.email == email).cloned())
    }

    async fn update_user(&self, id: Uuid, data: UpdateUser) -> StoreResult<User> {
        let mut state = self.state.lock().await;
        let email = data.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if state.users.iter().any(|u| u.id != id && &u.email == email) {
                return Err(StoreError::UniqueViolation(USERS_EMAIL_KEY.to_string()));
            }
        }

        let user = state
            .users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or(StoreError::NotFound)?;
        if let Some(name) = data.name {
            user.name = Some(name);
        }
        if let Some(email) = email {
            user.email = email;
        }
        if let Some(password_hash) = data.password_hash {
            user.password_hash = password_hash;
        }
        user.updated_at = Utc::now();
        Ok(user.clone())
    }

    async fn user_summaries(&self, ids: &[Uuid]) -> StoreResult<Vec<UserSummary>> {
        let state = self.state.lock().await;
        Ok(state
            .users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(User::summary)
            .collect())
    }

    async fn find_team(&self, id: Uuid) -> StoreResult<Option<Team>> {
        let state = self.state.lock().await;
        Ok(state.teams.iter().find(|t| t.id == id).cloned())
    }

    async fn find_teams(&self, ids: &[Uuid]) -> StoreResult<Vec<Team>> {
        let state = self.state.lock().await;
        Ok(state
            .teams
            .iter()
            .filter(|t| ids.contains(&t.id))
            .cloned()
            .collect())
    }

    async fn teams_for_user(&self, user_id: Uuid) -> StoreResult<Vec<Team>> {
        let state = self.state.lock().await;
        let team_ids: Vec<Uuid> = state
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .map(|m| m.team_id)
            .collect();
        Ok(newest_first(
            state.teams.iter().filter(|t| team_ids.contains(&t.id)).cloned(),
            |t| t.created_at,
        ))
    }

    async fn find_membership(
        &self,
        team_id: Uuid,
        user_id: Uuid,
    ) -> StoreResult<Option<Membership>> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .find(|m| m.team_id == team_id && m.user_id == user_id)
            .cloned())
    }

    async fn find_membership_by_id(&self, id: Uuid) -> StoreResult<Option<Membership>> {
        let state = self.state.lock().await;
        Ok(state.memberships.iter().find(|m| m.id == id).cloned())
    }

    async fn team_memberships(&self, team_id: Uuid) -> StoreResult<Vec<Membership>> {
        let state = self.state.lock().await;
        let mut members: Vec<Membership> = state
            .memberships
            .iter()
            .filter(|m| m.team_id == team_id)
            .cloned()
            .collect();
        members.sort_by_key(|m| m.joined_at);
        Ok(members)
    }

    async fn user_memberships(&self, user_id: Uuid) -> StoreResult<Vec<Membership>> {
        let state = self.state.lock().await;
        let mut memberships: Vec<Membership> = state
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id)
            .cloned()
            .collect();
        memberships.sort_by_key(|m| m.joined_at);
        Ok(memberships)
    }

    async fn count_admins(&self, team_id: Uuid) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .memberships
            .iter()
            .filter(|m| m.team_id == team_id && m.role == TeamRole::Admin)
            .count() as i64)
    }

    async fn update_membership_role(&self, id: Uuid, role: TeamRole) -> StoreResult<Membership> {
        let mut state = self.state.lock().await;
        let membership = state
            .memberships
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(StoreError::NotFound)?;
        membership.role = role;
        Ok(membership.clone())
    }

    async fn delete_membership(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let before = state.memberships.len();
        state.memberships.retain(|m| m.id != id);
        if state.memberships.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn create_board(&self, data: CreateBoard) -> StoreResult<Board> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let board = Board {
            id: Uuid::new_v4(),
            team_id: data.team_id,
            name: data.name,
            created_at: now,
            updated_at: now,
        };
        state.boards.push(board.clone());
        Ok(board)
    }

    async fn find_board(&self, id: Uuid) -> StoreResult<Option<Board>> {
        let state = self.state.lock().await;
        Ok(state.boards.iter().find(|b| b.id == id).cloned())
    }

    async fn team_boards(&self, team_id: Uuid) -> StoreResult<Vec<Board>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state.boards.iter().filter(|b| b.team_id == team_id).cloned(),
            |b| b.created_at,
        ))
    }

    async fn count_boards(&self, team_id: Uuid) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state.boards.iter().filter(|b| b.team_id == team_id).count() as i64)
    }

    async fn rename_board(&self, id: Uuid, name: &str) -> StoreResult<Board> {
        let mut state = self.state.lock().await;
        let board = state
            .boards
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or(StoreError::NotFound)?;
        board.name = name.to_string();
        board.updated_at = Utc::now();
        Ok(board.clone())
    }

    async fn create_task(&self, data: CreateTask) -> StoreResult<Task> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let task = Task {
            id: Uuid::new_v4(),
            board_id: data.board_id,
            title: data.title,
            description: data.description,
            status: data.status,
            position: data.position,
            assignee_id: data.assignee_id,
            created_by_id: data.created_by_id,
            due_date: data.due_date,
            created_at: now,
            updated_at: now,
        };
        state.tasks.push(task.clone());
        Ok(task)
    }

    async fn find_task(&self, id: Uuid) -> StoreResult<Option<Task>> {
        let state = self.state.lock().await;
        Ok(state.tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn board_tasks(&self, board_id: Uuid) -> StoreResult<Vec<Task>> {
        let state = self.state.lock().await;
        let mut tasks: Vec<Task> = state
            .tasks
            .iter()
            .filter(|t| t.board_id == board_id)
            .cloned()
            .collect();
        tasks.sort_by_key(|t| (t.status, t.position));
        Ok(tasks)
    }

    async fn count_tasks(&self, board_id: Uuid) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state.tasks.iter().filter(|t| t.board_id == board_id).count() as i64)
    }

    async fn max_task_position(
        &self,
        board_id: Uuid,
        status: TaskStatus,
    ) -> StoreResult<Option<i32>> {
        let state = self.state.lock().await;
        Ok(state
            .tasks
            .iter()
            .filter(|t| t.board_id == board_id && t.status == status)
            .map(|t| t.position)
            .max())
    }

    async fn save_task(&self, task: &Task) -> StoreResult<Task> {
        let mut state = self.state.lock().await;
        let stored = state
            .tasks
            .iter_mut()
            .find(|t| t.id == task.id)
            .ok_or(StoreError::NotFound)?;
        stored.title = task.title.clone();
        stored.description = task.description.clone();
        stored.status = task.status;
        stored.position = task.position;
        stored.assignee_id = task.assignee_id;
        stored.due_date = task.due_date;
        stored.updated_at = Utc::now();
        Ok(stored.clone())
    }

    async fn delete_task(&self, id: Uuid) -> StoreResult<()> {
        let mut state = self.state.lock().await;
        let before = state.tasks.len();
        state.tasks.retain(|t| t.id != id);
        if state.tasks.len() == before {
            return Err(StoreError::NotFound);
        }
        Ok(())
    }

    async fn find_invitation(&self, id: Uuid) -> StoreResult<Option<Invitation>> {
        let state = self.state.lock().await;
        Ok(state.invitations.iter().find(|i| i.id == id).cloned())
    }

    async fn find_invitation_for(
        &self,
        team_id: Uuid,
        invited_user_id: Uuid,
    ) -> StoreResult<Option<Invitation>> {
        let state = self.state.lock().await;
        Ok(state
            .invitations
            .iter()
            .find(|i| i.team_id == team_id && i.invited_user_id == invited_user_id)
            .cloned())
    }

    async fn open_invitations_for(
        &self,
        invited_user_id: Uuid,
        now: DateTime<Utc>,
    ) -> StoreResult<Vec<Invitation>> {
        let state = self.state.lock().await;
        Ok(newest_first(
            state
                .invitations
                .iter()
                .filter(|i| {
                    i.invited_user_id == invited_user_id
                        && i.status == InvitationStatus::Pending
                        && i.expires_at.map_or(true, |expires_at| expires_at > now)
                })
                .cloned(),
            |i| i.created_at,
        ))
    }

    async fn save_invitation_state(
        &self,
        id: Uuid,
        state: &InvitationState,
    ) -> StoreResult<Invitation> {
        self.state.lock().await.save_invitation_state(id, state)
    }

    async fn notifications_for(
        &self,
        user_id: Uuid,
        unread_only: bool,
        limit: i64,
    ) -> StoreResult<Vec<Notification>> {
        let state = self.state.lock().await;
        let mut feed = newest_first(
            state
                .notifications
                .iter()
                .filter(|n| n.user_id == user_id && (!unread_only || !n.read))
                .cloned(),
            |n| n.created_at,
        );
        feed.truncate(usize::try_from(limit).unwrap_or(0));
        Ok(feed)
    }

    async fn count_unread(&self, user_id: Uuid) -> StoreResult<i64> {
        let state = self.state.lock().await;
        Ok(state
            .notifications
            .iter()
            .filter(|n| n.user_id == user_id && !n.read)
            .count() as i64)
    }

    async fn mark_read(&self, user_id: Uuid, ids: &[Uuid]) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let mut updated = 0;
        for notification in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && ids.contains(&n.id))
        {
            notification.read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn mark_all_read(&self, user_id: Uuid) -> StoreResult<u64> {
        let mut state = self.state.lock().await;
        let mut updated = 0;
        for notification in state
            .notifications
            .iter_mut()
            .filter(|n| n.user_id == user_id && !n.read)
        {
            notification.read = true;
            updated += 1;
        }
        Ok(updated)
    }
}

/// Unit of work over a private copy of the state
pub struct MemoryUnitOfWork {
    guard: OwnedMutexGuard<MemoryState>,
    working: MemoryState,
}

#[async_trait]
impl UnitOfWork for MemoryUnitOfWork {
    async fn create_team(&mut self, name: &str) -> StoreResult<Team> {
        Ok(self.working.insert_team(name))
    }

    async fn create_membership(&mut self, data: CreateMembership) -> StoreResult<Membership> {
        self.working.insert_membership(data)
    }

    async fn upsert_invitation(&mut self, data: UpsertInvitation) -> StoreResult<Invitation> {
        Ok(self.working.upsert_invitation(data))
    }

    async fn save_invitation_state(
        &mut self,
        id: Uuid,
        state: &InvitationState,
    ) -> StoreResult<Invitation> {
        self.working.save_invitation_state(id, state)
    }

    async fn create_notification(
        &mut self,
        data: CreateNotification,
    ) -> StoreResult<Notification> {
        Ok(self.working.insert_notification(data))
    }

    async fn delete_board_tasks(&mut self, board_id: Uuid) -> StoreResult<u64> {
        Ok(self.working.delete_board_tasks(board_id))
    }

    async fn delete_board(&mut self, id: Uuid) -> StoreResult<()> {
        self.working.delete_board(id)
    }

    async fn commit(self: Box<Self>) -> StoreResult<()> {
        let MemoryUnitOfWork { mut guard, working } = *self;
        *guard = working;
        Ok(())
    }
}
