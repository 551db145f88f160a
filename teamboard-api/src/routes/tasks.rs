/// Task endpoints
///
/// - `POST /api/boards/:board_id/tasks` - create; appended to its column
/// - `PUT /api/tasks/:task_id` - partial update; a status change re-appends
/// - `DELETE /api/tasks/:task_id`
///
/// `assigneeId` and `dueDate` may be sent as `null` on update to clear them.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{nullable, ApiPath, ValidatedJson},
    response::ApiResponse,
};
use axum::{extract::State, http::StatusCode, Extension};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use teamboard_shared::{
    auth::CurrentUser,
    models::TaskStatus,
    services::tasks::{self, NewTask, TaskPatch, TaskView},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    #[validate(length(min = 1, message = "Task title is required"))]
    pub title: String,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    pub assignee_id: Option<Uuid>,
    pub due_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskRequest {
    #[validate(length(min = 1, message = "Task title is required"))]
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "nullable")]
    pub assignee_id: Option<Option<Uuid>>,
    #[serde(default, deserialize_with = "nullable")]
    pub due_date: Option<Option<DateTime<Utc>>>,
    #[validate(range(min = 0, max = 1000000, message = "Position must be between 0 and 1000000"))]
    pub position: Option<i32>,
}

pub async fn create_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(board_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<CreateTaskRequest>,
) -> ApiResult<(StatusCode, ApiResponse<TaskView>)> {
    let task = tasks::create_task(
        state.store(),
        &user,
        board_id,
        NewTask {
            title: req.title,
            description: req.description,
            status: req.status,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
        },
    )
    .await?;

    Ok(ApiResponse::ok(task)
        .with_message("Task created successfully")
        .created())
}

pub async fn update_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(task_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<UpdateTaskRequest>,
) -> ApiResult<ApiResponse<TaskView>> {
    let task = tasks::update_task(
        state.store(),
        &user,
        task_id,
        TaskPatch {
            title: req.title,
            description: req.description,
            status: req.status,
            assignee_id: req.assignee_id,
            due_date: req.due_date,
            position: req.position,
        },
    )
    .await?;

    Ok(ApiResponse::ok(task).with_message("Task updated successfully"))
}

pub async fn delete_task(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(task_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse> {
    tasks::delete_task(state.store(), &user, task_id).await?;
    Ok(ApiResponse::done("Task deleted successfully"))
}
