/// Membership lifecycle
///
/// Role changes and removals are admin-only and keep at least one ADMIN per
/// team. Admin counts are read before the write; under concurrent admins the
/// floor is best-effort.

use tracing::info;
use uuid::Uuid;

use super::{member_views, MemberView, ServiceError, ServiceResult};
use crate::auth::authorization::{require_admin, require_member};
use crate::auth::CurrentUser;
use crate::models::{Membership, TeamRole};
use crate::store::Store;

const NOT_A_MEMBER: &str = "Forbidden: You are not a member of this team";

/// Loads a membership and checks it belongs to `team_id`
///
/// A membership from another team is reported as missing.
async fn membership_in_team(
    store: &dyn Store,
    team_id: Uuid,
    member_id: Uuid,
) -> ServiceResult<Membership> {
    store
        .find_membership_by_id(member_id)
        .await?
        .filter(|m| m.team_id == team_id)
        .ok_or_else(|| ServiceError::not_found("Member"))
}

/// Members of a team ordered by join time
pub async fn list_members(
    store: &dyn Store,
    user: &CurrentUser,
    team_id: Uuid,
) -> ServiceResult<Vec<MemberView>> {
    require_member(store, user, team_id, NOT_A_MEMBER).await?;

    let memberships = store.team_memberships(team_id).await?;
    member_views(store, memberships).await
}

/// Changes a member's role
///
/// # Errors
///
/// - `Forbidden` unless the caller is a team admin
/// - `NotFound` when the membership is not in this team
/// - `Rule` when demoting the team's only ADMIN
pub async fn change_role(
    store: &dyn Store,
    user: &CurrentUser,
    team_id: Uuid,
    member_id: Uuid,
    role: TeamRole,
) -> ServiceResult<MemberView> {
    require_admin(
        store,
        user,
        team_id,
        "Forbidden: Only team admins can update member roles",
    )
    .await?;

    let target = membership_in_team(store, team_id, member_id).await?;

    if target.role.is_admin() && !role.is_admin() && store.count_admins(team_id).await? <= 1 {
        return Err(ServiceError::rule(
            "Cannot demote the last admin. Promote another member first.",
        ));
    }

    let updated = store.update_membership_role(target.id, role).await?;
    info!(
        team_id = %team_id,
        member_id = %updated.id,
        role = role.as_str(),
        "Member role updated"
    );

    let mut views = member_views(store, vec![updated]).await?;
    views
        .pop()
        .ok_or_else(|| ServiceError::not_found("Member"))
}

/// Removes a member from the team
///
/// Only the membership row is deleted; the member's task assignments stay.
///
/// # Errors
///
/// - `Forbidden` unless the caller is a team admin
/// - `NotFound` when the membership is not in this team
/// - `Rule` when removing the only ADMIN, or when the caller targets
///   themselves (the last-admin check runs first)
pub async fn remove_member(
    store: &dyn Store,
    user: &CurrentUser,
    team_id: Uuid,
    member_id: Uuid,
) -> ServiceResult<()> {
    require_admin(
        store,
        user,
        team_id,
        "Forbidden: Only team admins can remove members",
    )
    .await?;

    let target = membership_in_team(store, team_id, member_id).await?;

    if target.role.is_admin() && store.count_admins(team_id).await? <= 1 {
        return Err(ServiceError::rule(
            "Cannot remove the last admin. Promote another member first.",
        ));
    }

    if target.user_id == user.id {
        return Err(ServiceError::rule(
            "You cannot remove yourself from the team. Ask another admin to remove you.",
        ));
    }

    store.delete_membership(target.id).await?;
    info!(team_id = %team_id, user_id = %target.user_id, "Member removed");

    Ok(())
}
