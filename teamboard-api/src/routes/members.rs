/// Team membership endpoints
///
/// - `GET /api/teams/:team_id/members`
/// - `PATCH /api/teams/:team_id/members/:member_id` - change role (admin)
/// - `DELETE /api/teams/:team_id/members/:member_id` - remove member (admin)
///
/// `member_id` is the membership id, not the user id.

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ValidatedJson},
    response::ApiResponse,
};
use axum::{extract::State, Extension};
use serde::Deserialize;
use teamboard_shared::{
    auth::CurrentUser,
    models::TeamRole,
    services::{memberships, MemberView},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct UpdateMemberRequest {
    pub role: TeamRole,
}

pub async fn list_members(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(team_id): ApiPath<Uuid>,
) -> ApiResult<ApiResponse<Vec<MemberView>>> {
    let members = memberships::list_members(state.store(), &user, team_id).await?;
    Ok(ApiResponse::ok(members))
}

pub async fn update_member(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath((team_id, member_id)): ApiPath<(Uuid, Uuid)>,
    ValidatedJson(req): ValidatedJson<UpdateMemberRequest>,
) -> ApiResult<ApiResponse<MemberView>> {
    let member =
        memberships::change_role(state.store(), &user, team_id, member_id, req.role).await?;

    Ok(ApiResponse::ok(member).with_message("Member role updated successfully"))
}

pub async fn remove_member(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath((team_id, member_id)): ApiPath<(Uuid, Uuid)>,
) -> ApiResult<ApiResponse> {
    memberships::remove_member(state.store(), &user, team_id, member_id).await?;
    Ok(ApiResponse::done("Member removed successfully"))
}
