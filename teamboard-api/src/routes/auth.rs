/// Authentication endpoints
///
/// - `POST /api/auth/signup` - create an account and receive tokens
/// - `POST /api/auth/signin` - exchange credentials for tokens
/// - `POST /api/auth/refresh` - exchange a refresh token for an access token

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ValidatedJson,
    response::ApiResponse,
};
use axum::{extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use teamboard_shared::{
    auth::jwt::{self, TokenPair},
    models::User,
    services::accounts::{self, SignUp},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: String,

    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct SigninRequest {
    #[validate(email(message = "Invalid email address"))]
    pub email: String,

    #[validate(length(min = 1, message = "Password is required"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    #[validate(length(min = 1, message = "Refresh token is required"))]
    pub refresh_token: String,
}

/// Account plus a fresh token pair
#[derive(Debug, Serialize)]
pub struct Session {
    pub user: User,

    #[serde(flatten)]
    pub tokens: TokenPair,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub access_token: String,
}

fn session(user: User, secret: &str) -> ApiResult<Session> {
    let tokens = jwt::issue_token_pair(user.id, secret)?;
    Ok(Session { user, tokens })
}

/// ```text
/// POST /api/auth/signup
/// { "name": "Ada", "email": "ada@example.com", "password": "secret1" }
/// ```
///
/// # Errors
///
/// - `400`: validation failed or email already in use
pub async fn signup(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SignupRequest>,
) -> ApiResult<(StatusCode, ApiResponse<Session>)> {
    let user = accounts::sign_up(
        state.store(),
        SignUp {
            name: req.name,
            email: req.email,
            password: req.password,
        },
    )
    .await?;

    Ok(ApiResponse::ok(session(user, state.jwt_secret())?)
        .with_message("Account created successfully")
        .created())
}

/// # Errors
///
/// - `401`: "Invalid email or password"
pub async fn signin(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<SigninRequest>,
) -> ApiResult<ApiResponse<Session>> {
    let user = accounts::sign_in(state.store(), &req.email, &req.password).await?;

    Ok(ApiResponse::ok(session(user, state.jwt_secret())?))
}

/// # Errors
///
/// - `401`: invalid, expired, or non-refresh token
pub async fn refresh(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<RefreshRequest>,
) -> ApiResult<ApiResponse<RefreshResponse>> {
    let access_token = jwt::refresh_access_token(&req.refresh_token, state.jwt_secret())?;

    Ok(ApiResponse::ok(RefreshResponse { access_token }))
}
