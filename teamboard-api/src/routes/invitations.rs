/// Invitation endpoints
///
/// - `POST /api/teams/:team_id/invite` - invite a registered user (admin)
/// - `GET /api/invitations` - the caller's open invitations
/// - `POST /api/invitations/:invitation_id` - `{"action": "accept" | "reject"}`

use crate::{
    app::AppState,
    error::ApiResult,
    extract::{ApiPath, ValidatedJson},
    response::ApiResponse,
};
use axum::{extract::State, http::StatusCode, Extension};
use serde::{Deserialize, Serialize};
use teamboard_shared::{
    auth::CurrentUser,
    models::{Invitation, Membership, TeamRole},
    services::invitations::{self, InvitationAction, InvitationResponse, PendingInvitation},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct InviteRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[serde(default)]
    pub role: TeamRole,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RespondRequest {
    pub action: InvitationAction,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AcceptedInvitation {
    pub invitation: Invitation,
    pub team_member: Membership,
}

/// Either an accepted invitation with the new membership, or the rejected
/// invitation alone
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum RespondData {
    Accepted(AcceptedInvitation),
    Rejected(Invitation),
}

pub async fn invite(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(team_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<InviteRequest>,
) -> ApiResult<(StatusCode, ApiResponse<Invitation>)> {
    let invitation =
        invitations::invite(state.store(), &user, team_id, &req.email, req.role).await?;

    Ok(ApiResponse::ok(invitation)
        .with_message("Invitation sent successfully")
        .created())
}

pub async fn list_pending(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<ApiResponse<Vec<PendingInvitation>>> {
    let pending = invitations::pending_for(state.store(), &user).await?;
    Ok(ApiResponse::ok(pending))
}

pub async fn respond(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiPath(invitation_id): ApiPath<Uuid>,
    ValidatedJson(req): ValidatedJson<RespondRequest>,
) -> ApiResult<ApiResponse<RespondData>> {
    let response = invitations::respond(state.store(), &user, invitation_id, req.action).await?;

    Ok(match response {
        InvitationResponse::Accepted {
            invitation,
            membership,
            team_name,
        } => ApiResponse::ok(RespondData::Accepted(AcceptedInvitation {
            invitation,
            team_member: membership,
        }))
        .with_message(format!("You have joined \"{}\"", team_name)),
        InvitationResponse::Rejected { invitation } => {
            ApiResponse::ok(RespondData::Rejected(invitation)).with_message("Invitation rejected")
        }
    })
}
