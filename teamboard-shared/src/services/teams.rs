/// Teams
///
/// Creating a team makes the creator its first ADMIN; the team row and the
/// membership are written in one unit of work.

use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use super::{member_views, MemberView, ServiceError, ServiceResult};
use crate::auth::authorization::require_member;
use crate::auth::CurrentUser;
use crate::models::{Board, CreateMembership, Team, TeamRole};
use crate::store::Store;

/// Team list entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamOverview {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<MemberView>,
    pub board_count: i64,
}

/// Team page: members and boards
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamDetail {
    #[serde(flatten)]
    pub team: Team,
    pub members: Vec<MemberView>,
    pub boards: Vec<Board>,
}

/// Teams the caller belongs to, newest first
pub async fn list_teams(store: &dyn Store, user: &CurrentUser) -> ServiceResult<Vec<TeamOverview>> {
    let teams = store.teams_for_user(user.id).await?;

    let mut overviews = Vec::with_capacity(teams.len());
    for team in teams {
        let members = member_views(store, store.team_memberships(team.id).await?).await?;
        let board_count = store.count_boards(team.id).await?;
        overviews.push(TeamOverview {
            team,
            members,
            board_count,
        });
    }

    Ok(overviews)
}

/// Creates a team with the caller as ADMIN
pub async fn create_team(
    store: &dyn Store,
    user: &CurrentUser,
    name: &str,
) -> ServiceResult<TeamOverview> {
    let mut uow = store.begin().await?;
    let team = uow.create_team(name.trim()).await?;
    let membership = uow
        .create_membership(CreateMembership {
            team_id: team.id,
            user_id: user.id,
            role: TeamRole::Admin,
        })
        .await?;
    uow.commit().await?;

    info!(team_id = %team.id, user_id = %user.id, "Team created");

    let members = member_views(store, vec![membership]).await?;
    Ok(TeamOverview {
        team,
        members,
        board_count: 0,
    })
}

/// Team with members and boards; members only
pub async fn team_detail(
    store: &dyn Store,
    user: &CurrentUser,
    team_id: Uuid,
) -> ServiceResult<TeamDetail> {
    require_member(
        store,
        user,
        team_id,
        "Forbidden: You are not a member of this team",
    )
    .await?;

    let team = store
        .find_team(team_id)
        .await?
        .ok_or_else(|| ServiceError::not_found("Team"))?;
    let members = member_views(store, store.team_memberships(team_id).await?).await?;
    let boards = store.team_boards(team_id).await?;

    Ok(TeamDetail {
        team,
        members,
        boards,
    })
}
