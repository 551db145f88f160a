/// Team endpoints
///
/// - `GET /api/teams` - teams the caller belongs to
/// - `POST /api/teams` - create a team; the caller becomes its admin
/// - `GET /api/teams/:team_id` - team with members and boards

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
    services::teams::{self, TeamDetail, TeamOverview},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct CreateTeamRequest {
    #[validate(length(min = 2, message = "Team name must be at least 2 characters"))]
    pub name: String,
}

pub async fn list_teams(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<ApiResponse<Vec<TeamOverview>>> {
    let teams = teams::list_teams(state.store(), &user).await?;
    Ok(ApiResponse::ok(teams))
}

pub async fn create_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<CreateTeamRequest>,
) -> ApiResult<(StatusCode, ApiResponse<TeamOverview>)> {
    let team = teams::create_team(state.store(), &user, &req.name).await?;

    Ok(ApiResponse::ok(team)
        .with_message("Team created successfully")
        .created())
}

pub async fn get_team(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(team_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<TeamDetail>> {
    let team = teams::team_detail(state.store(), &user, team_id).await?;
    Ok(ApiResponse::ok(team))
}
