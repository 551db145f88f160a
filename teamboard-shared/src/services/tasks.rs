/// Tasks and column positions
///
/// A task's `position` orders it inside its (board, status) column. New
/// tasks, and tasks moved to a different status, are appended at
/// `max(position) + 1` of the destination column (0 when it is empty).
/// Positions are not compacted after deletes or moves, so gaps are normal.
/// Two concurrent appends to the same column can receive the same position.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::auth::authorization::{is_team_member, require_board_access};
use crate::auth::CurrentUser;
use crate::models::task::{next_position, MAX_POSITION};
use crate::models::{Board, CreateTask, Task, TaskStatus, UserSummary};
use crate::store::Store;

/// A task with its assignee and creator profiles
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    #[serde(flatten)]
    pub task: Task,
    pub assignee: Option<UserSummary>,
    pub created_by: Option<UserSummary>,
}

/// Fields for a new task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub description: Option<String>,
    /// Defaults to TODO
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

/// Partial task update
///
/// The outer `Option` means "leave unchanged"; for `assignee_id` and
/// `due_date` an inner `None` clears the value.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Option<Uuid>>,
    pub due_date: Option<Option<DateTime<Utc>>>,
    /// Applied as given unless the status changes in the same request
    pub position: Option<i32>,
}

pub(crate) async fn task_views(store: &dyn Store, tasks: Vec<Task>) -> ServiceResult<Vec<TaskView>> {
    let mut ids: Vec<Uuid> = tasks
        .iter()
        .flat_map(|t| [Some(t.created_by_id), t.assignee_id])
        .flatten()
        .collect();
    ids.sort_unstable();
    ids.dedup();
    let users = store.user_summaries(&ids).await?;
    let lookup = |id: Option<Uuid>| id.and_then(|id| users.iter().find(|u| u.id == id).cloned());

    Ok(tasks
        .into_iter()
        .map(|task| TaskView {
            assignee: lookup(task.assignee_id),
            created_by: lookup(Some(task.created_by_id)),
            task,
        })
        .collect())
}

async fn task_view(store: &dyn Store, task: Task) -> ServiceResult<TaskView> {
    task_views(store, vec![task])
        .await?
        .pop()
        .ok_or_else(|| ServiceError::not_found("Task"))
}

/// Position for a task appended to the given column
async fn append_position(
    store: &dyn Store,
    board_id: Uuid,
    status: TaskStatus,
) -> ServiceResult<i32> {
    let max = store.max_task_position(board_id, status).await?;
    next_position(max)
        .ok_or_else(|| ServiceError::rule("Task position limit reached for this column"))
}

fn require_position(position: i32) -> ServiceResult<i32> {
    if (0..=MAX_POSITION).contains(&position) {
        Ok(position)
    } else {
        Err(ServiceError::Validation(format!(
            "Position must be between 0 and {}",
            MAX_POSITION
        )))
    }
}

/// Assignees must belong to the board's team at assignment time
async fn check_assignee(store: &dyn Store, board: &Board, assignee_id: Option<Uuid>) -> ServiceResult<()> {
    if let Some(assignee_id) = assignee_id {
        if !is_team_member(store, assignee_id, board.team_id).await? {
            return Err(ServiceError::rule("Assignee must be a member of this team"));
        }
    }
    Ok(())
}

fn require_title(title: &str) -> ServiceResult<String> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ServiceError::Validation("Task title is required".to_string()));
    }
    Ok(title.to_string())
}

/// Loads a task and its board, checking the caller can see the board
async fn load_for_edit(
    store: &dyn Store,
    user: &CurrentUser,
    task_id: Uuid,
) -> ServiceResult<(Task, Board)> {
    let task = store
        .find_task(task_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Task"))?;
    let board = store
        .find_board(task.board_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Task"))?;
    require_board_access(
        store,
        user,
        &board,
        "Forbidden: You do not have access to this task",
    )
    .await?;

    Ok((task, board))
}

/// Creates a task at the end of its status column
pub async fn create_task(
    store: &dyn Store,
    user: &CurrentUser,
    board_id: Uuid,
    data: NewTask,
) -> ServiceResult<TaskView> {
    let board = store
        .find_board(board_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Board"))?;
    require_board_access(
        store,
        user,
        &board,
        "Forbidden: You do not have access to this board",
    )
    .await?;

    let title = require_title(&data.title)?;
    check_assignee(store, &board, data.assignee_id).await?;

    let status = data.status.unwrap_or_default();
    let position = append_position(store, board.id, status).await?;

    let task = store
        .create_task(CreateTask {
            board_id: board.id,
            title,
            description: data.description,
            status,
            position,
            assignee_id: data.assignee_id,
            created_by_id: user.id,
            due_date: data.due_date,
        })
        .await?;

    info!(
        task_id = %task.id,
        board_id = %board.id,
        status = status.as_str(),
        position,
        "Task created"
    );

    task_view(store, task).await
}

/// Applies a partial update, re-appending the task when its status changes
pub async fn update_task(
    store: &dyn Store,
    user: &CurrentUser,
    task_id: Uuid,
    patch: TaskPatch,
) -> ServiceResult<TaskView> {
    let (mut task, board) = load_for_edit(store, user, task_id).await?;

    if let Some(title) = patch.title {
        task.title = require_title(&title)?;
    }
    if let Some(description) = patch.description {
        task.description = Some(description);
    }
    if let Some(assignee_id) = patch.assignee_id {
        check_assignee(store, &board, assignee_id).await?;
        task.assignee_id = assignee_id;
    }
    if let Some(due_date) = patch.due_date {
        task.due_date = due_date;
    }

    match patch.status {
        Some(status) if status != task.status => {
            task.position = append_position(store, board.id, status).await?;
            debug!(
                task_id = %task.id,
                from = task.status.as_str(),
                to = status.as_str(),
                position = task.position,
                "Task moved to another column"
            );
            task.status = status;
        }
        _ => {
            if let Some(position) = patch.position {
                task.position = require_position(position)?;
            }
        }
    }

    let task = store.save_task(&task).await?;
    task_view(store, task).await
}

pub async fn delete_task(store: &dyn Store, user: &CurrentUser, task_id: Uuid) -> ServiceResult<()> {
    let (task, _) = load_for_edit(store, user, task_id).await?;

    store.delete_task(task.id).await?;
    info!(task_id = %task.id, board_id = %task.board_id, "Task deleted");

    Ok(())
}
