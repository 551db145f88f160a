/// Boards
///
/// Any team member can read a board; only admins create, rename or delete
/// them. Deleting a board removes its tasks first, then the board, in one
/// unit of work.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::tasks::{task_views, TaskView};
use super::{member_views, MemberView, ServiceError, ServiceResult};
use crate::auth::authorization::{require_admin, require_board_access, require_member};
use crate::auth::CurrentUser;
use crate::models::{Board, CreateBoard};
use crate::store::Store;

/// Board list entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardOverview {
    #[serde(flatten)]
    pub board: Board,
    pub task_count: i64,
}

/// Board page: tasks in column order plus the team roster for assignment
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardDetail {
    #[serde(flatten)]
    pub board: Board,
    pub tasks: Vec<TaskView>,
    pub members: Vec<MemberView>,
}

async fn load_board(store: &dyn Store, board_id: Uuid) -> ServiceResult<Board> {
    store
        .find_board(board_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Board"))
}

/// Boards of a team, newest first, with task counts
pub async fn list_boards(
    store: &dyn Store,
    user: &CurrentUser,
    team_id: Uuid,
) -> ServiceResult<Vec<BoardOverview>> {
    require_member(
        store,
        user,
        team_id,
        "Forbidden: You are not a member of this team",
    )
    .await?;

    let boards = store.team_boards(team_id).await?;
    let mut overviews = Vec::with_capacity(boards.len());
    for board in boards {
        let task_count = store.count_tasks(board.id).await?;
        overviews.push(BoardOverview { board, task_count });
    }

    Ok(overviews)
}

pub async fn create_board(
    store: &dyn Store,
    user: &CurrentUser,
    team_id: Uuid,
    name: &str,
) -> ServiceResult<Board> {
    require_admin(
        store,
        user,
        team_id,
        "Forbidden: Only team admins can create boards",
    )
    .await?;

    let board = store
        .create_board(CreateBoard {
            team_id,
            name: name.trim().to_string(),
        })
        .await?;

    info!(board_id = %board.id, team_id = %team_id, "Board created");
    Ok(board)
}

pub async fn board_detail(
    store: &dyn Store,
    user: &CurrentUser,
    board_id: Uuid,
) -> ServiceResult<BoardDetail> {
    let board = load_board(store, board_id).await?;
    require_board_access(
        store,
        user,
        &board,
        "Forbidden: You do not have access to this board",
    )
    .await?;

    let tasks = task_views(store, store.board_tasks(board.id).await?).await?;
    let members = member_views(store, store.team_memberships(board.team_id).await?).await?;

    Ok(BoardDetail {
        board,
        tasks,
        members,
    })
}

pub async fn rename_board(
    store: &dyn Store,
    user: &CurrentUser,
    board_id: Uuid,
    name: &str,
) -> ServiceResult<Board> {
    let board = load_board(store, board_id).await?;
    require_admin(
        store,
        user,
        board.team_id,
        "Forbidden: Only team admins can update boards",
    )
    .await?;

    Ok(store.rename_board(board.id, name.trim()).await?)
}

/// Deletes a board and all of its tasks
pub async fn delete_board(
    store: &dyn Store,
    user: &CurrentUser,
    board_id: Uuid,
) -> ServiceResult<()> {
    let board = load_board(store, board_id).await?;
    require_admin(
        store,
        user,
        board.team_id,
        "Forbidden: Only team admins can delete boards",
    )
    .await?;

    let mut uow = store.begin().await?;
    let removed_tasks = uow.delete_board_tasks(board.id).await?;
    uow.delete_board(board.id).await?;
    uow.commit().await?;

    info!(board_id = %board.id, removed_tasks, "Board deleted");
    Ok(())
}
