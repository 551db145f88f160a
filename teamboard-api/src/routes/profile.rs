/// Profile endpoints
///
/// - `GET /api/profile` - public fields plus memberships
/// - `PUT /api/profile` - change name, email or password

use crate::{
    app::AppState,
    error::ApiResult,
    extract::ValidatedJson,
    response::ApiResponse,
};
use axum::{extract::State, Extension};
use serde::Deserialize;
use teamboard_shared::{
    auth::CurrentUser,
    models::User,
    services::accounts::{self, Profile, ProfileUpdate},
};
use validator::Validate;

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    #[validate(length(min = 2, message = "Name must be at least 2 characters"))]
    pub name: Option<String>,

    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,

    pub current_password: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub new_password: Option<String>,
}

pub async fn get_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
) -> ApiResult<ApiResponse<Profile>> {
    let profile = accounts::profile(state.store(), &user).await?;
    Ok(ApiResponse::ok(profile))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<UpdateProfileRequest>,
) -> ApiResult<ApiResponse<User>> {
    let updated = accounts::update_profile(
        state.store(),
        &user,
        ProfileUpdate {
            name: req.name,
            email: req.email,
            current_password: req.current_password,
            new_password: req.new_password,
        },
    )
    .await?;

    Ok(ApiResponse::ok(updated).with_message("Profile updated successfully"))
}
