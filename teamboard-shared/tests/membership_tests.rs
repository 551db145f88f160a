//! Membership lifecycle: listing, role changes and removal

mod common;

use teamboard_shared::auth::authorization::{is_team_admin, is_team_member};
use teamboard_shared::models::TeamRole;
use teamboard_shared::services::{memberships, teams, ServiceError};
use teamboard_shared::store::Store;
use uuid::Uuid;

#[tokio::test]
async fn test_creator_becomes_sole_admin() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;

    let overview = teams::create_team(&store, &admin, "  Core  ").await.unwrap();

    assert_eq!(overview.team.name, "Core");
    assert_eq!(overview.board_count, 0);
    assert_eq!(overview.members.len(), 1);
    assert_eq!(overview.members[0].membership.role, TeamRole::Admin);
    assert_eq!(overview.members[0].user.as_ref().unwrap().id, admin.id);
    assert_eq!(store.count_admins(overview.team.id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_admin_implies_member() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let member = common::user(&store, "grace").await;
    let outsider = common::user(&store, "linus").await;
    let team_id = common::team(&store, &admin, "Core").await;
    common::join(&store, &admin, team_id, &member, TeamRole::Member).await;

    assert!(is_team_admin(&store, admin.id, team_id).await.unwrap());
    assert!(is_team_member(&store, admin.id, team_id).await.unwrap());
    assert!(is_team_member(&store, member.id, team_id).await.unwrap());
    assert!(!is_team_admin(&store, member.id, team_id).await.unwrap());
    assert!(!is_team_member(&store, outsider.id, team_id).await.unwrap());
}

#[tokio::test]
async fn test_list_members_requires_membership() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let outsider = common::user(&store, "linus").await;
    let team_id = common::team(&store, &admin, "Core").await;

    let members = memberships::list_members(&store, &admin, team_id).await.unwrap();
    assert_eq!(members.len(), 1);

    let err = memberships::list_members(&store, &outsider, team_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(ref m) if m == "Forbidden: You are not a member of this team"));
}

#[tokio::test]
async fn test_cannot_demote_last_admin() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let team_id = common::team(&store, &admin, "Core").await;
    let own = store.find_membership(team_id, admin.id).await.unwrap().unwrap();

    let err = memberships::change_role(&store, &admin, team_id, own.id, TeamRole::Member)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Cannot demote the last admin. Promote another member first."
    );
    assert_eq!(store.count_admins(team_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_promote_then_demote() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let member = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;
    let joined = common::join(&store, &admin, team_id, &member, TeamRole::Member).await;

    let promoted = memberships::change_role(&store, &admin, team_id, joined.id, TeamRole::Admin)
        .await
        .unwrap();
    assert_eq!(promoted.membership.role, TeamRole::Admin);
    assert_eq!(promoted.user.as_ref().unwrap().email, "grace@example.com");

    // with two admins the original one may step down
    let own = store.find_membership(team_id, admin.id).await.unwrap().unwrap();
    let demoted = memberships::change_role(&store, &member, team_id, own.id, TeamRole::Member)
        .await
        .unwrap();
    assert_eq!(demoted.membership.role, TeamRole::Member);
    assert_eq!(store.count_admins(team_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_change_role_requires_admin() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let member = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;
    let joined = common::join(&store, &admin, team_id, &member, TeamRole::Member).await;

    let err = memberships::change_role(&store, &member, team_id, joined.id, TeamRole::Admin)
        .await
        .unwrap_err();

    assert!(matches!(err, ServiceError::Forbidden(ref m) if m == "Forbidden: Only team admins can update member roles"));
}

#[tokio::test]
async fn test_membership_from_other_team_is_not_found() {
    let store = common::store();
    let ada = common::user(&store, "ada").await;
    let linus = common::user(&store, "linus").await;
    let core = common::team(&store, &ada, "Core").await;
    let kernel = common::team(&store, &linus, "Kernel").await;
    let foreign = store.find_membership(kernel, linus.id).await.unwrap().unwrap();

    let err = memberships::remove_member(&store, &ada, core, foreign.id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(ref m) if m == "Member not found"));

    let err = memberships::change_role(&store, &ada, core, Uuid::new_v4(), TeamRole::Admin)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));
    assert!(store.find_membership(kernel, linus.id).await.unwrap().is_some());
}

#[tokio::test]
async fn test_cannot_remove_last_admin() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let team_id = common::team(&store, &admin, "Core").await;
    let own = store.find_membership(team_id, admin.id).await.unwrap().unwrap();

    let err = memberships::remove_member(&store, &admin, team_id, own.id)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "Cannot remove the last admin. Promote another member first."
    );
}

#[tokio::test]
async fn test_admin_cannot_remove_self() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let other = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;
    common::join(&store, &admin, team_id, &other, TeamRole::Admin).await;
    let own = store.find_membership(team_id, admin.id).await.unwrap().unwrap();

    let err = memberships::remove_member(&store, &admin, team_id, own.id)
        .await
        .unwrap_err();

    assert_eq!(
        err.to_string(),
        "You cannot remove yourself from the team. Ask another admin to remove you."
    );
    assert_eq!(store.team_memberships(team_id).await.unwrap().len(), 2);
}

#[tokio::test]
async fn test_remove_member() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let member = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;
    let joined = common::join(&store, &admin, team_id, &member, TeamRole::Member).await;

    memberships::remove_member(&store, &admin, team_id, joined.id)
        .await
        .unwrap();

    assert!(store.find_membership(team_id, member.id).await.unwrap().is_none());
    let err = memberships::list_members(&store, &member, team_id)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));
}

#[tokio::test]
async fn test_remove_admin_when_another_admin_remains() {
    let store = common::store();
    let admin = common::user(&store, "ada").await;
    let other = common::user(&store, "grace").await;
    let team_id = common::team(&store, &admin, "Core").await;
    let joined = common::join(&store, &admin, team_id, &other, TeamRole::Admin).await;

    memberships::remove_member(&store, &admin, team_id, joined.id)
        .await
        .unwrap();

    assert!(store.find_membership(team_id, other.id).await.unwrap().is_none());
    assert_eq!(store.count_admins(team_id).await.unwrap(), 1);
}

#[tokio::test]
async fn test_list_teams_only_shows_memberships() {
    let store = common::store();
    let ada = common::user(&store, "ada").await;
    let linus = common::user(&store, "linus").await;
    let core = common::team(&store, &ada, "Core").await;
    common::team(&store, &linus, "Kernel").await;

    let listed = teams::list_teams(&store, &ada).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].team.id, core);

    let err = teams::team_detail(&store, &linus, core).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)));

    let detail = teams::team_detail(&store, &ada, core).await.unwrap();
    assert_eq!(detail.team.name, "Core");
    assert!(detail.boards.is_empty());
}
