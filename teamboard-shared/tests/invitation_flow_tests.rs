//! Invitation workflow against the in-memory store

mod common;

use chrono::{Duration, Utc};
use teamboard_shared::models::{CreateMembership, InvitationStatus, NotificationType, TeamRole};
use teamboard_shared::services::invitations::{self, InvitationAction, InvitationResponse};
use teamboard_shared::services::{notifications, ServiceError};
use teamboard_shared::store::{Store, UnitOfWork};

#[tokio::test]
async fn test_invite_unknown_email_is_not_found() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let team_id = common::team(&store, &admin, "Core").await;

    let err = invitations::invite(&store, &admin, team_id, "nobody@example.com", TeamRole::Member)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::NotFound(ref m) if m == "User with this email does not exist"));
}

#[tokio::test]
async fn test_invite_requires_admin() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let member = common::user(&store, "grace").await;
    let outsider = common::user(&store, "linus").await;
    let team_id = common::team(&store, &admin, "Core").await;
    common::join(&store, &admin, team_id, &member, TeamRole::Member).await;

    let err = invitations::invite(&store, &member, team_id, &outsider.email, TeamRole::Member)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Forbidden(ref m) if m == "Forbidden: Only team admins can invite members"));
    assert!(store.find_invitation_for(team_id, outsider.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_invite_creates_pending_invitation_and_notification() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let invitee = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;

    let before = Utc::now();
    let invitation = invitations::invite(&store, &admin, team_id, "GRACE@example.com", TeamRole::Admin)
        .await
        .unwrap();

    assert_eq!(invitation.status, InvitationStatus::Pending);
    assert_eq!(invitation.role, TeamRole::Admin);
    assert_eq!(invitation.invited_user_id, invitee.id);
    assert_eq!(invitation.invited_by_id, admin.id);
    let expires_at = invitation.expires_at.unwrap();
    assert!(expires_at >= before + Duration::days(7));
    assert!(expires_at <= Utc::now() + Duration::days(7));

    let feed = notifications::feed(&store, &invitee, false).await.unwrap();
    assert_eq!(feed.unread_count, 1);
    let notification = &feed.notifications[0];
    assert_eq!(notification.kind, NotificationType::TeamInvitation);
    assert_eq!(notification.title, "Team Invitation");
    assert_eq!(notification.message, "ada invited you to join \"Core\"");
    assert_eq!(notification.data["invitationId"], invitation.id.to_string());
    assert_eq!(notification.data["teamName"], "Core");
    assert_eq!(notification.data["role"], "ADMIN");
}

#[tokio::test]
async fn test_duplicate_pending_invitation_is_refused() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let invitee = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;

    invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Member)
        .await
        .unwrap();
    let err = invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Member)
        .await
        .unwrap_err();

    assert_eq!(err.to_string(), "User already has a pending invitation to this team");
    let feed = notifications::feed(&store, &invitee, false).await.unwrap();
    assert_eq!(feed.notifications.len(), 1);
}

#[tokio::test]
async fn test_accept_creates_membership_with_invited_role() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let invitee = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;

    let invitation = invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Admin)
        .await
        .unwrap();
    let response = invitations::respond(&store, &invitee, invitation.id, InvitationAction::Accept)
        .await
        .unwrap();

    match response {
        InvitationResponse::Accepted {
            invitation,
            membership,
            team_name,
        } => {
            assert_eq!(invitation.status, InvitationStatus::Accepted);
            assert!(invitation.responded_at.is_some());
            assert_eq!(membership.role, TeamRole::Admin);
            assert_eq!(membership.team_id, team_id);
            assert_eq!(team_name, "Core");
        }
        other => panic!("expected acceptance, got {:?}", other),
    }

    assert_eq!(store.team_memberships(team_id).await.unwrap().len(), 2);

    let again = invitations::respond(&store, &invitee, invitation.id, InvitationAction::Accept)
        .await
        .unwrap_err();
    assert_eq!(again.to_string(), "Invitation has already been accepted");
    assert_eq!(store.team_memberships(team_id).await.unwrap().len(), 2);

    let reinvite = invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Member)
        .await
        .unwrap_err();
    assert_eq!(reinvite.to_string(), "User is already a member of this team");
}

#[tokio::test]
async fn test_accept_after_joining_elsewhere_rolls_back() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let invitee = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;

    let invitation = invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Member)
        .await
        .unwrap();

    // the invitee ends up a member between the invite and the accept
    let mut uow = store.begin().await.unwrap();
    uow.create_membership(CreateMembership {
        team_id,
        user_id: invitee.id,
        role: TeamRole::Member,
    })
    .await
    .unwrap();
    uow.commit().await.unwrap();

    let err = invitations::respond(&store, &invitee, invitation.id, InvitationAction::Accept)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Rule(ref m) if m == "You are already a member of this team"));

    let stored = store.find_invitation(invitation.id).await.unwrap().unwrap();
    assert_eq!(stored.status, InvitationStatus::Pending);
    assert!(stored.responded_at.is_none());
    assert_eq!(store.team_memberships(team_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_reject_leaves_no_membership_and_allows_reinvite() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let invitee = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;

    let invitation = invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Member)
        .await
        .unwrap();
    let response = invitations::respond(&store, &invitee, invitation.id, InvitationAction::Reject)
        .await
        .unwrap();
    assert!(matches!(
        response,
        InvitationResponse::Rejected { ref invitation } if invitation.status == InvitationStatus::Rejected
    ));
    assert!(store.find_membership(team_id, invitee.id).await.unwrap().is_none());

    let refreshed = invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Admin)
        .await
        .unwrap();
    assert_eq!(refreshed.id, invitation.id);
    assert_eq!(refreshed.status, InvitationStatus::Pending);
    assert_eq!(refreshed.role, TeamRole::Admin);
    assert!(refreshed.responded_at.is_none());
}

#[tokio::test]
async fn test_only_invitee_can_respond() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let invitee = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;

    let invitation = invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Member)
        .await
        .unwrap();
    let err = invitations::respond(&store, &admin, invitation.id, InvitationAction::Accept)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Forbidden(ref m) if m == "Forbidden: This invitation is not for you"));
}

#[tokio::test]
async fn test_expired_invitation_is_flipped_and_hidden() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let invitee = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;

    let invitation = invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Member)
        .await
        .unwrap();
    let mut state = invitation.state();
    state.expires_at = Some(Utc::now() - Duration::hours(1));
    store.save_invitation_state(invitation.id, &state).await.unwrap();

    assert!(invitations::pending_for(&store, &invitee).await.unwrap().is_empty());

    // still PENDING in storage until someone responds, so a new invite is refused
    let err = invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Rule(ref m) if m == "User already has a pending invitation to this team"));

    let err = invitations::respond(&store, &invitee, invitation.id, InvitationAction::Reject)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Rule(ref m) if m == "Invitation has expired"));

    let stored = store.find_invitation(invitation.id).await.unwrap().unwrap();
    assert_eq!(stored.status, InvitationStatus::Expired);
    assert!(store.find_membership(team_id, invitee.id).await.unwrap().is_none());

    // expired invitations can be reissued
    let reissued = invitations::invite(&store, &admin, team_id, &invitee.email, TeamRole::Member)
        .await
        .unwrap();
    assert_eq!(reissued.status, InvitationStatus::Pending);
    assert_eq!(invitations::pending_for(&store, &invitee).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_pending_list_includes_team_and_inviter() {
    let store = common::store();
    let ada = common::user(&store, "ada").await;
    let linus = common::user(&store, "linus").await;
    let invitee = common::user(&store, "grace").await;
    let core = common::team(&store, &ada, "Core").await;
    let kernel = common::team(&store, &linus, "Kernel").await;

    invitations::invite(&store, &ada, core, &invitee.email, TeamRole::Member)
        .await
        .unwrap();
    invitations::invite(&store, &linus, kernel, &invitee.email, TeamRole::Member)
        .await
        .unwrap();

    let pending = invitations::pending_for(&store, &invitee).await.unwrap();
    assert_eq!(pending.len(), 2);
    assert_eq!(pending[0].team.as_ref().unwrap().name, "Kernel");
    assert_eq!(pending[0].invited_by.as_ref().unwrap().id, linus.id);
    assert_eq!(pending[1].team.as_ref().unwrap().name, "Core");
}
