/// Invitation workflow
///
/// Admins invite existing users by email; invitees accept or reject. The
/// state rules live in [`crate::models::invitation::transition`]; this module
/// loads the current row, applies the transition, and persists the outcome
/// together with its side effects.
///
/// Side effects per step:
///
/// - invite: invitation upsert and TEAM_INVITATION notification, one unit of work
/// - accept: status change and membership creation, one unit of work
/// - reject: status change only
/// - respond after expiry: the row is flipped to EXPIRED before the error
///   is returned

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::auth::authorization::require_admin;
use crate::auth::CurrentUser;
use crate::models::invitation::transition;
use crate::models::{
    CreateMembership, CreateNotification, Invitation, InvitationEvent, Membership,
    NotificationType, TeamRole, TeamSummary, TransitionError, UpsertInvitation, UserSummary,
};
use crate::store::Store;

/// Invitee's answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvitationAction {
    Accept,
    Reject,
}

impl InvitationAction {
    fn event(self) -> InvitationEvent {
        match self {
            InvitationAction::Accept => InvitationEvent::Accept,
            InvitationAction::Reject => InvitationEvent::Reject,
        }
    }
}

/// A pending invitation with the team and inviter it came from
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingInvitation {
    #[serde(flatten)]
    pub invitation: Invitation,
    pub team: Option<TeamSummary>,
    pub invited_by: Option<UserSummary>,
}

/// Outcome of a successful response
#[derive(Debug, Clone)]
pub enum InvitationResponse {
    Accepted {
        invitation: Invitation,
        membership: Membership,
        team_name: String,
    },
    Rejected {
        invitation: Invitation,
    },
}

/// Invites the user registered under `email` to the team
///
/// # Errors
///
/// - `Forbidden` unless the caller is a team admin
/// - `NotFound` when no user has that email
/// - `Rule` when the user is already a member or a PENDING invitation is
///   stored for them, even one past its expiry
pub async fn invite(
    store: &dyn Store,
    user: &CurrentUser,
    team_id: Uuid,
    email: &str,
    role: TeamRole,
) -> ServiceResult<Invitation> {
    require_admin(
        store,
        user,
        team_id,
        "Forbidden: Only team admins can invite members",
    )
    .await?;

    let team = store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Team"))?;

    let invitee = store
        .find_user_by_email(email)
        .await?
        .ok_or_else(|| ServiceError::NotFound("User with this email does not exist".to_string()))?;

    if store.find_membership(team_id, invitee.id).await?.is_some() {
        return Err(ServiceError::rule("User is already a member of this team"));
    }

    let existing = store.find_invitation_for(team_id, invitee.id).await?;
    let current = existing.as_ref().map(Invitation::state);

    let state = transition(
        current.as_ref(),
        InvitationEvent::Issue {
            role,
            invited_by_id: user.id,
        },
        Utc::now(),
    )
    .map_err(|err| match err {
        TransitionError::AlreadyPending => {
            ServiceError::rule("User already has a pending invitation to this team")
        }
        other => ServiceError::rule(other.to_string()),
    })?;

    let inviter_name = user.display_name().to_string();

    let mut uow = store.begin().await?;
    let invitation = uow
        .upsert_invitation(UpsertInvitation {
            team_id,
            invited_user_id: invitee.id,
            state,
        })
        .await?;
    uow.create_notification(CreateNotification {
        user_id: invitee.id,
        kind: NotificationType::TeamInvitation,
        title: "Team Invitation".to_string(),
        message: format!("{} invited you to join \"{}\"", inviter_name, team.name),
        data: json!({
            "invitationId": invitation.id,
            "teamId": team.id,
            "teamName": team.name,
            "inviterName": inviter_name,
            "role": role,
        }),
    })
    .await?;
    uow.commit().await?;

    info!(
        invitation_id = %invitation.id,
        team_id = %team_id,
        invited_user_id = %invitee.id,
        role = role.as_str(),
        "Invitation issued"
    );

    Ok(invitation)
}

/// Open invitations addressed to the caller, newest first
pub async fn pending_for(
    store: &dyn Store,
    user: &CurrentUser,
) -> ServiceResult<Vec<PendingInvitation>> {
    let invitations = store.open_invitations_for(user.id, Utc::now()).await?;

    let team_ids: Vec<Uuid> = invitations.iter().map(|i| i.team_id).collect();
    let inviter_ids: Vec<Uuid> = invitations.iter().map(|i| i.invited_by_id).collect();
    let teams = store.find_teams(&team_ids).await?;
    let inviters = store.user_summaries(&inviter_ids).await?;

    Ok(invitations
        .into_iter()
        .map(|invitation| PendingInvitation {
            team: teams
                .iter()
                .find(|t| t.id == invitation.team_id)
                .map(|t| t.summary()),
            invited_by: inviters
                .iter()
                .find(|u| u.id == invitation.invited_by_id)
                .cloned(),
            invitation,
        })
        .collect())
}

/// Accepts or rejects an invitation addressed to the caller
///
/// # Errors
///
/// - `NotFound` for an unknown invitation
/// - `Forbidden` when the invitation belongs to someone else
/// - `Rule` when it is no longer pending, has expired (the row is marked
///   EXPIRED first), or, on accept, the caller is already a member
pub async fn respond(
    store: &dyn Store,
    user: &CurrentUser,
    invitation_id: Uuid,
    action: InvitationAction,
) -> ServiceResult<InvitationResponse> {
    let invitation = store
        .find_invitation(invitation_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Invitation"))?;

    if invitation.invited_user_id != user.id {
        return Err(ServiceError::Forbidden(
            "Forbidden: This invitation is not for you".to_string(),
        ));
    }

    let next = match transition(Some(&invitation.state()), action.event(), Utc::now()) {
        Ok(next) => next,
        Err(TransitionError::Expired(expired)) => {
            store.save_invitation_state(invitation.id, &expired).await?;
            info!(invitation_id = %invitation.id, "Invitation expired");
            return Err(ServiceError::rule("Invitation has expired"));
        }
        Err(TransitionError::NotPending(status)) => {
            return Err(ServiceError::rule(format!(
                "Invitation has already been {}",
                status.as_str().to_lowercase()
            )));
        }
        Err(other) => return Err(ServiceError::rule(other.to_string())),
    };

    match action {
        InvitationAction::Reject => {
            let invitation = store.save_invitation_state(invitation.id, &next).await?;
            info!(invitation_id = %invitation.id, "Invitation rejected");
            Ok(InvitationResponse::Rejected { invitation })
        }
        InvitationAction::Accept => {
            let team = store
                .find_team(invitation.team_id)
                .await?
                .ok_or_else(|| ServiceError::not_found("Team"))?;

            let mut uow = store.begin().await?;
            let accepted = uow.save_invitation_state(invitation.id, &next).await?;
            let membership = match uow
                .create_membership(CreateMembership {
                    team_id: invitation.team_id,
                    user_id: user.id,
                    role: invitation.role,
                })
                .await
            {
                Ok(membership) => membership,
                Err(err) if err.is_unique_violation() => {
                    warn!(
                        invitation_id = %invitation.id,
                        "Accept raced with an existing membership, rolling back"
                    );
                    return Err(ServiceError::rule("You are already a member of this team"));
                }
                Err(err) => return Err(err.into()),
            };
            uow.commit().await?;

            info!(
                invitation_id = %accepted.id,
                team_id = %membership.team_id,
                user_id = %membership.user_id,
                "Invitation accepted"
            );

            Ok(InvitationResponse::Accepted {
                invitation: accepted,
                membership,
                team_name: team.name,
            })
        }
    }
}
