/// Invitation model, state machine and database operations
///
/// An invitation asks an existing user to join a team with a given role.
/// There is one row per (team, invited user); re-inviting after a terminal
/// outcome refreshes that row back to PENDING.
///
/// # States
///
/// ```text
///             accept            reject
/// ACCEPTED <---------- PENDING ----------> REJECTED
///                         |
///                         | respond after expires_at
///                         v
///                      EXPIRED
/// ```
///
/// ACCEPTED, REJECTED and EXPIRED are terminal for responses. Expiry is lazy:
/// nothing sweeps old invitations, the flip to EXPIRED happens when the
/// invitee tries to respond.
///
/// # Schema
///
/// ```sql
/// CREATE TYPE invitation_status AS ENUM ('PENDING', 'ACCEPTED', 'REJECTED', 'EXPIRED');
///
/// CREATE TABLE invitations (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     team_id UUID NOT NULL REFERENCES teams(id) ON DELETE CASCADE,
///     invited_user_id UUID NOT NULL REFERENCES users(id) ON DELETE CASCADE,
///     invited_by_id UUID NOT NULL REFERENCES users(id),
///     role team_role NOT NULL DEFAULT 'MEMBER',
///     status invitation_status NOT NULL DEFAULT 'PENDING',
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     expires_at TIMESTAMPTZ,
///     responded_at TIMESTAMPTZ,
///     UNIQUE (team_id, invited_user_id)
/// );
/// ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgExecutor;
use uuid::Uuid;

use super::membership::TeamRole;

/// How long a freshly issued invitation stays answerable
pub const INVITATION_TTL_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "invitation_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvitationStatus {
    Pending,
    Accepted,
    Rejected,
    Expired,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "PENDING",
            InvitationStatus::Accepted => "ACCEPTED",
            InvitationStatus::Rejected => "REJECTED",
            InvitationStatus::Expired => "EXPIRED",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, InvitationStatus::Pending)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Invitation {
    pub id: Uuid,
    pub team_id: Uuid,
    pub invited_user_id: Uuid,
    pub invited_by_id: Uuid,
    pub role: TeamRole,
    pub status: InvitationStatus,
    pub created_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
}

/// The mutable part of an invitation, produced by [`transition`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvitationState {
    pub role: TeamRole,
    pub status: InvitationStatus,
    pub invited_by_id: Uuid,
    pub expires_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
}

impl InvitationState {
    /// True once `now` is past `expires_at`; an invitation is still valid at
    /// the exact expiry instant. Rows without an expiry never lapse.
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at < now)
    }
}

/// Something that happens to an invitation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvitationEvent {
    /// An admin invites (or re-invites) the user
    Issue { role: TeamRole, invited_by_id: Uuid },

    /// The invitee accepts
    Accept,

    /// The invitee declines
    Reject,
}

/// Why a transition was refused
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransitionError {
    /// Issue while the stored invitation is PENDING, lapsed or not
    #[error("invitation is already pending")]
    AlreadyPending,

    /// Accept or reject on an invitation that does not exist
    #[error("invitation not found")]
    Missing,

    /// Accept or reject on an invitation that already left PENDING
    #[error("invitation has already been {}", .0.as_str().to_lowercase())]
    NotPending(InvitationStatus),

    /// Accept or reject after expiry; carries the EXPIRED state to persist
    #[error("invitation has expired")]
    Expired(InvitationState),
}

/// Computes the next invitation state for `event`
///
/// `current` is `None` when no invitation exists yet for the (team, user)
/// pair. The function is pure: persisting the returned state (including the
/// EXPIRED state carried by [`TransitionError::Expired`]) is the caller's job.
///
/// # Rules
///
/// - `Issue` is allowed when nothing exists or the existing invitation is
///   terminal. Any stored PENDING row refuses it, even past its expiry, until
///   a response flips it to EXPIRED. It yields PENDING with a fresh 7-day
///   expiry and clears `responded_at`.
/// - `Accept` / `Reject` require PENDING. A lapsed PENDING invitation yields
///   [`TransitionError::Expired`] whatever the requested action.
pub fn transition(
    current: Option<&InvitationState>,
    event: InvitationEvent,
    now: DateTime<Utc>,
) -> Result<InvitationState, TransitionError> {
    match event {
        InvitationEvent::Issue { role, invited_by_id } => {
            if current.is_some_and(|state| state.status.is_pending()) {
                return Err(TransitionError::AlreadyPending);
            }

            Ok(InvitationState {
                role,
                status: InvitationStatus::Pending,
                invited_by_id,
                expires_at: Some(now + Duration::days(INVITATION_TTL_DAYS)),
                responded_at: None,
            })
        }
        InvitationEvent::Accept | InvitationEvent::Reject => {
            let state = current.ok_or(TransitionError::Missing)?;

            if !state.status.is_pending() {
                return Err(TransitionError::NotPending(state.status));
            }

            if state.is_expired_at(now) {
                return Err(TransitionError::Expired(InvitationState {
                    status: InvitationStatus::Expired,
                    ..state.clone()
                }));
            }

            let status = if event == InvitationEvent::Accept {
                InvitationStatus::Accepted
            } else {
                InvitationStatus::Rejected
            };

            Ok(InvitationState {
                status,
                responded_at: Some(now),
                ..state.clone()
            })
        }
    }
}

/// Insert-or-refresh payload for the (team, invited user) row
#[derive(Debug, Clone)]
pub struct UpsertInvitation {
    pub team_id: Uuid,
    pub invited_user_id: Uuid,
    pub state: InvitationState,
}

impl Invitation {
    pub fn state(&self) -> InvitationState {
        InvitationState {
            role: self.role,
            status: self.status,
            invited_by_id: self.invited_by_id,
            expires_at: self.expires_at,
            responded_at: self.responded_at,
        }
    }

    /// Copies a computed state onto this row
    pub fn apply(&mut self, state: &InvitationState) {
        self.role = state.role;
        self.status = state.status;
        self.invited_by_id = state.invited_by_id;
        self.expires_at = state.expires_at;
        self.responded_at = state.responded_at;
    }

    /// Creates the invitation or refreshes the existing (team, user) row
    pub async fn upsert<'e, E>(executor: E, data: UpsertInvitation) -> Result<Self, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        let state = data.state;

        sqlx::query_as::<_, Invitation>(
            r#"
            INSERT INTO invitations (team_id, invited_user_id, invited_by_id, role,
                                     status, expires_at, responded_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (team_id, invited_user_id) DO UPDATE
            SET invited_by_id = EXCLUDED.invited_by_id,
                role = EXCLUDED.role,
                status = EXCLUDED.status,
                expires_at = EXCLUDED.expires_at,
                responded_at = EXCLUDED.responded_at
            RETURNING id, team_id, invited_user_id, invited_by_id, role, status,
                      created_at, expires_at, responded_at
            "#,
        )
        .bind(data.team_id)
        .bind(data.invited_user_id)
        .bind(state.invited_by_id)
        .bind(state.role)
        .bind(state.status)
        .bind(state.expires_at)
        .bind(state.responded_at)
        .fetch_one(executor)
        .await
    }

    pub async fn find_by_id<'e, E>(executor: E, id: Uuid) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, team_id, invited_user_id, invited_by_id, role, status,
                   created_at, expires_at, responded_at
            FROM invitations
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(executor)
        .await
    }

    pub async fn find_for_user<'e, E>(
        executor: E,
        team_id: Uuid,
        invited_user_id: Uuid,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, team_id, invited_user_id, invited_by_id, role, status,
                   created_at, expires_at, responded_at
            FROM invitations
            WHERE team_id = $1 AND invited_user_id = $2
            "#,
        )
        .bind(team_id)
        .bind(invited_user_id)
        .fetch_optional(executor)
        .await
    }

    /// PENDING, unexpired invitations addressed to a user, newest first
    pub async fn list_open_for_user<'e, E>(
        executor: E,
        invited_user_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Vec<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Invitation>(
            r#"
            SELECT id, team_id, invited_user_id, invited_by_id, role, status,
                   created_at, expires_at, responded_at
            FROM invitations
            WHERE invited_user_id = $1
              AND status = 'PENDING'
              AND (expires_at IS NULL OR expires_at > $2)
            ORDER BY created_at DESC
            "#,
        )
        .bind(invited_user_id)
        .bind(now)
        .fetch_all(executor)
        .await
    }

    /// Persists a computed state for an existing invitation
    pub async fn save_state<'e, E>(
        executor: E,
        id: Uuid,
        state: &InvitationState,
    ) -> Result<Option<Self>, sqlx::Error>
    where
        E: PgExecutor<'e>,
    {
        sqlx::query_as::<_, Invitation>(
            r#"
            UPDATE invitations
            SET invited_by_id = $2, role = $3, status = $4,
                expires_at = $5, responded_at = $6
            WHERE id = $1
            RETURNING id, team_id, invited_user_id, invited_by_id, role, status,
                      created_at, expires_at, responded_at
            "#,
        )
        .bind(id)
        .bind(state.invited_by_id)
        .bind(state.role)
        .bind(state.status)
        .bind(state.expires_at)
        .bind(state.responded_at)
        .fetch_optional(executor)
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(now: DateTime<Utc>) -> InvitationState {
        InvitationState {
            role: TeamRole::Member,
            status: InvitationStatus::Pending,
            invited_by_id: Uuid::new_v4(),
            expires_at: Some(now + Duration::days(INVITATION_TTL_DAYS)),
            responded_at: None,
        }
    }

    fn issue(role: TeamRole) -> InvitationEvent {
        InvitationEvent::Issue {
            role,
            invited_by_id: Uuid::new_v4(),
        }
    }

    #[test]
    fn test_issue_fresh_invitation() {
        let now = Utc::now();
        let state = transition(None, issue(TeamRole::Admin), now).unwrap();

        assert_eq!(state.status, InvitationStatus::Pending);
        assert_eq!(state.role, TeamRole::Admin);
        assert_eq!(state.expires_at, Some(now + Duration::days(7)));
        assert!(state.responded_at.is_none());
    }

    #[test]
    fn test_issue_while_pending_is_refused() {
        let now = Utc::now();
        let current = pending(now);

        assert_eq!(
            transition(Some(&current), issue(TeamRole::Member), now),
            Err(TransitionError::AlreadyPending)
        );
    }

    #[test]
    fn test_issue_after_terminal_state_refreshes() {
        let now = Utc::now();

        for status in [
            InvitationStatus::Accepted,
            InvitationStatus::Rejected,
            InvitationStatus::Expired,
        ] {
            let current = InvitationState {
                status,
                responded_at: Some(now - Duration::days(1)),
                expires_at: Some(now - Duration::days(2)),
                ..pending(now)
            };

            let inviter = Uuid::new_v4();
            let next = transition(
                Some(&current),
                InvitationEvent::Issue {
                    role: TeamRole::Admin,
                    invited_by_id: inviter,
                },
                now,
            )
            .unwrap();

            assert_eq!(next.status, InvitationStatus::Pending);
            assert_eq!(next.role, TeamRole::Admin);
            assert_eq!(next.invited_by_id, inviter);
            assert_eq!(next.expires_at, Some(now + Duration::days(7)));
            assert!(next.responded_at.is_none());
        }
    }

    #[test]
    fn test_issue_over_lapsed_pending_is_refused() {
        let now = Utc::now();
        let current = InvitationState {
            expires_at: Some(now - Duration::minutes(1)),
            ..pending(now)
        };

        assert_eq!(
            transition(Some(&current), issue(TeamRole::Member), now),
            Err(TransitionError::AlreadyPending)
        );
    }

    #[test]
    fn test_accept_and_reject() {
        let now = Utc::now();
        let current = pending(now);

        let accepted = transition(Some(&current), InvitationEvent::Accept, now).unwrap();
        assert_eq!(accepted.status, InvitationStatus::Accepted);
        assert_eq!(accepted.responded_at, Some(now));
        assert_eq!(accepted.role, current.role);

        let rejected = transition(Some(&current), InvitationEvent::Reject, now).unwrap();
        assert_eq!(rejected.status, InvitationStatus::Rejected);
        assert_eq!(rejected.responded_at, Some(now));
    }

    #[test]
    fn test_respond_to_terminal_state() {
        let now = Utc::now();
        let accepted = InvitationState {
            status: InvitationStatus::Accepted,
            ..pending(now)
        };

        let err = transition(Some(&accepted), InvitationEvent::Reject, now).unwrap_err();
        assert_eq!(err, TransitionError::NotPending(InvitationStatus::Accepted));
        assert_eq!(err.to_string(), "invitation has already been accepted");
    }

    #[test]
    fn test_respond_after_expiry() {
        let now = Utc::now();
        let lapsed = InvitationState {
            expires_at: Some(now - Duration::seconds(1)),
            ..pending(now)
        };

        for event in [InvitationEvent::Accept, InvitationEvent::Reject] {
            match transition(Some(&lapsed), event, now) {
                Err(TransitionError::Expired(state)) => {
                    assert_eq!(state.status, InvitationStatus::Expired);
                    assert!(state.responded_at.is_none());
                }
                other => panic!("expected expiry, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_still_valid_at_expiry_instant() {
        let now = Utc::now();
        let state = InvitationState {
            expires_at: Some(now),
            ..pending(now)
        };

        assert!(!state.is_expired_at(now));
        assert!(state.is_expired_at(now + Duration::milliseconds(1)));
        assert!(transition(Some(&state), InvitationEvent::Accept, now).is_ok());
    }

    #[test]
    fn test_missing_expiry_never_lapses() {
        let now = Utc::now();
        let state = InvitationState {
            expires_at: None,
            ..pending(now)
        };

        assert!(!state.is_expired_at(now + Duration::days(365)));
    }

    #[test]
    fn test_respond_to_missing_invitation() {
        assert_eq!(
            transition(None, InvitationEvent::Accept, Utc::now()),
            Err(TransitionError::Missing)
        );
    }
}
