/// Board endpoints
///
/// - `GET /api/teams/:team_id/boards` - boards with task counts (member)
/// - `POST /api/teams/:team_id/boards` - create (admin)
/// - `GET /api/boards/:board_id` - board, tasks and team members (member)
/// - `PUT /api/boards/:board_id` - rename (admin)
/// - `DELETE /api/boards/:board_id` - delete with its tasks (admin)

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ValidatedJson},
    response::ApiResponse,
};
use axum::{extract::State, http::StatusCode, Extension};
use serde::Deserialize;
use teamboard_shared::{
    auth::CurrentUser,
    models::Board,
    services::boards::{self, BoardDetail, BoardOverview},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct BoardRequest {
    #[validate(length(min = 2, message = "Board name must be at least 2 characters"))]
    pub name: String,
}

pub async fn list_boards(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(team_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<BoardOverview>>> {
    let boards = boards::list_boards(state.store(), &user, team_id).await?;
    Ok(ApiResponse::ok(boards))
}

pub async fn create_board(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(team_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<BoardRequest>,
) -> ApiResult<(StatusCode, ApiResponse<Board>)> {
    let board = boards::create_board(state.store(), &user, team_id, &req.name).await?;

    Ok(ApiResponse::ok(board)
        .with_message("Board created successfully")
        .created())
}

pub async fn get_board(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(board_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<BoardDetail>> {
    let board = boards::board_detail(state.store(), &user, board_id).await?;
    Ok(ApiResponse::ok(board))
}

pub async fn update_board(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(board_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<BoardRequest>,
) -> ApiResult<ApiResponse<Board>> {
    let board = boards::rename_board(state.store(), &user, board_id, &req.name).await?;
    Ok(ApiResponse::ok(board).with_message("Board updated successfully"))
}

pub async fn delete_board(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(board_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse> {
    boards::delete_board(state.store(), &user, board_id).await?;
    Ok(ApiResponse::done("Board deleted successfully"))
}
