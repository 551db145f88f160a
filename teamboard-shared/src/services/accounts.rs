/// Accounts: signup, sign-in and profile
///
/// Emails are matched case-insensitively. Sign-in failures never reveal
/// whether the email exists.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use super::{ServiceError, ServiceResult};
use crate::auth::password::{hash_password, validate_password_length, verify_password};
use crate::auth::CurrentUser;
use crate::models::user::normalize_email;
use crate::models::{CreateUser, Membership, TeamSummary, UpdateUser, User};
use crate::store::{Store, StoreError};

const EMAIL_IN_USE: &str = "Email is already in use";
const INVALID_CREDENTIALS: &str = "Invalid email or password";

#[derive(Debug, Clone)]
pub struct SignUp {
    pub name: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub current_password: Option<String>,
    pub new_password: Option<String>,
}

/// A membership with its team, as listed on the profile
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileMembership {
    #[serde(flatten)]
    pub membership: Membership,
    pub team: Option<TeamSummary>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: Uuid,
    pub name: Option<String>,
    pub email: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub memberships: Vec<ProfileMembership>,
}

fn email_in_use(err: StoreError) -> ServiceError {
    if err.is_unique_violation() {
        ServiceError::rule(EMAIL_IN_USE)
    } else {
        ServiceError::Store(err)
    }
}

/// Registers a new account
///
/// # Errors
///
/// `Validation` for a short password, `Rule` when the email is taken.
pub async fn sign_up(store: &dyn Store, data: SignUp) -> ServiceResult<User> {
    validate_password_length(&data.password).map_err(ServiceError::Validation)?;

    let password_hash = hash_password(&data.password)?;
    let user = store
        .create_user(CreateUser {
            email: normalize_email(&data.email),
            name: Some(data.name.trim().to_string()),
            password_hash,
        })
        .await
        .map_err(email_in_use)?;

    info!(user_id = %user.id, "User signed up");
    Ok(user)
}

/// Verifies credentials and returns the account
pub async fn sign_in(store: &dyn Store, email: &str, password: &str) -> ServiceResult<User> {
    let Some(user) = store.find_user_by_email(email).await? else {
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    };

    if !verify_password(password, &user.password_hash)? {
        warn!(user_id = %user.id, "Failed sign-in attempt");
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.to_string()));
    }

    Ok(user)
}

pub async fn profile(store: &dyn Store, user: &CurrentUser) -> ServiceResult<Profile> {
    let account = store
        .find_user(user.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    let memberships = store.user_memberships(user.id).await?;
    let team_ids: Vec<Uuid> = memberships.iter().map(|m| m.team_id).collect();
    let teams = store.find_teams(&team_ids).await?;

    Ok(Profile {
        id: account.id,
        name: account.name,
        email: account.email,
        image: account.image,
        created_at: account.created_at,
        memberships: memberships
            .into_iter()
            .map(|membership| ProfileMembership {
                team: teams
                    .iter()
                    .find(|t| t.id == membership.team_id)
                    .map(|t| t.summary()),
                membership,
            })
            .collect(),
    })
}

/// Updates name, email and/or password
///
/// A new password requires the current one.
///
/// # Errors
///
/// `Rule` when the email belongs to someone else, when the current password
/// is missing or wrong; `Validation` for a short new password.
pub async fn update_profile(
    store: &dyn Store,
    user: &CurrentUser,
    update: ProfileUpdate,
) -> ServiceResult<User> {
    let account = store
        .find_user(user.id)
        .await?
        .ok_or_else(|| ServiceError::not_found("User"))?;

    let email = update.email.as_deref().map(normalize_email);
    if let Some(email) = email.as_deref().filter(|e| *e != account.email) {
        if let Some(other) = store.find_user_by_email(email).await? {
            if other.id != account.id {
                return Err(ServiceError::rule(EMAIL_IN_USE));
            }
        }
    }

    let password_hash = match update.new_password.as_deref() {
        Some(new_password) => {
            let current = update
                .current_password
                .as_deref()
                .filter(|p| !p.is_empty())
                .ok_or_else(|| {
                    ServiceError::rule("Current password is required to set a new password")
                })?;
            if !verify_password(current, &account.password_hash)? {
                return Err(ServiceError::rule("Current password is incorrect"));
            }
            validate_password_length(new_password).map_err(ServiceError::Validation)?;
            Some(hash_password(new_password)?)
        }
        None => None,
    };

    let password_changed = password_hash.is_some();
    let updated = store
        .update_user(
            account.id,
            UpdateUser {
                name: update.name.map(|n| n.trim().to_string()),
                email,
                password_hash,
            },
        )
        .await
        .map_err(email_in_use)?;

    info!(user_id = %updated.id, password_changed, "Profile updated");
    Ok(updated)
}
