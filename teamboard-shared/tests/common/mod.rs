//! Shared fixtures for service-level tests
//!
//! Everything runs against `MemoryStore`; no database is needed. Users are
//! inserted with a placeholder hash so tests that do not sign in skip the
//! Argon2 cost.

#![allow(dead_code)]

use teamboard_shared::auth::CurrentUser;
use teamboard_shared::models::{CreateUser, Membership, TeamRole};
use teamboard_shared::services::invitations::{self, InvitationAction, InvitationResponse};
use teamboard_shared::services::teams;
use teamboard_shared::store::memory::MemoryStore;
use teamboard_shared::store::Store;
use uuid::Uuid;

pub fn store() -> MemoryStore {
    MemoryStore::new()
}

/// Inserts `<handle>@example.com` named after the handle
pub async fn user(store: &MemoryStore, handle: &str) -> CurrentUser {
    let user = store
        .create_user(CreateUser {
            email: format!("{}@example.com", handle),
            name: Some(handle.to_string()),
            password_hash: "$argon2id$placeholder".to_string(),
        })
        .await
        .expect("Failed to create user");

    CurrentUser::from(&user)
}

/// Creates a team owned by `admin`
pub async fn team(store: &MemoryStore, admin: &CurrentUser, name: &str) -> Uuid {
    teams::create_team(store, admin, name)
        .await
        .expect("Failed to create team")
        .team
        .id
}

/// Brings `invitee` into the team through the invitation workflow
pub async fn join(
    store: &MemoryStore,
    admin: &CurrentUser,
    team_id: Uuid,
    invitee: &CurrentUser,
    role: TeamRole,
) -> Membership {
    let invitation = invitations::invite(store, admin, team_id, &invitee.email, role)
        .await
        .expect("Failed to invite");

    match invitations::respond(store, invitee, invitation.id, InvitationAction::Accept)
        .await
        .expect("Failed to accept")
    {
        InvitationResponse::Accepted { membership, .. } => membership,
        InvitationResponse::Rejected { .. } => panic!("accept returned a rejection"),
    }
}
