/// Notification endpoints
///
/// - `GET /api/notifications[?unreadOnly=true]` - newest 50 plus unread count
/// - `PATCH /api/notifications` - `{"notificationIds": [...]}` or
///   `{"markAllAsRead": true}`

use crate::{
    app::AppState,
    error::{ApiError, ApiResult},
    extract::{ApiQuery, ValidatedJson},
    response::ApiResponse,
};
use axum::{extract::State, Extension, Json};
use serde::{Deserialize, Serialize};
use teamboard_shared::{
    auth::CurrentUser,
    models::Notification,
    services::notifications::{self, MarkRead},
};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListQuery {
    #[serde(default)]
    pub unread_only: bool,
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct MarkReadRequest {
    pub notification_ids: Option<Vec<Uuid>>,
    #[serde(default)]
    pub mark_all_as_read: bool,
}

impl MarkReadRequest {
    /// `markAllAsRead` wins when both are present
    fn target(self) -> Option<MarkRead> {
        if self.mark_all_as_read {
            return Some(MarkRead::All);
        }
        self.notification_ids.map(MarkRead::Ids)
    }
}

/// Feed envelope; carries `unreadCount` beside `data`
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationList {
    pub success: bool,
    pub data: Vec<Notification>,
    pub unread_count: i64,
}

pub async fn list_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ApiQuery(query): ApiQuery<ListQuery>,
) -> ApiResult<Json<NotificationList>> {
    let feed = notifications::feed(state.store(), &user, query.unread_only).await?;

    Ok(Json(NotificationList {
        success: true,
        data: feed.notifications,
        unread_count: feed.unread_count,
    }))
}

pub async fn mark_notifications(
    State(state): State<AppState>,
    Extension(user): Extension<CurrentUser>,
    ValidatedJson(req): ValidatedJson<MarkReadRequest>,
) -> ApiResult<ApiResponse> {
    let target = req.target().ok_or_else(|| {
        ApiError::BadRequest(
            "Invalid request: provide notificationIds or markAllAsRead".to_string(),
        )
    })?;

    let message = match target {
        MarkRead::All => "All notifications marked as read",
        MarkRead::Ids(_) => "Notifications marked as read",
    };
    notifications::mark_read(state.store(), &user, target).await?;

    Ok(ApiResponse::done(message))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(body: &str) -> MarkReadRequest {
        serde_json::from_str(body).unwrap()
    }

    #[test]
    fn test_mark_read_target() {
        assert_eq!(request(r#"{"markAllAsRead": true}"#).target(), Some(MarkRead::All));
        assert_eq!(
            request(r#"{"notificationIds": []}"#).target(),
            Some(MarkRead::Ids(Vec::new()))
        );
        assert_eq!(request(r#"{"markAllAsRead": false}"#).target(), None);
        assert_eq!(request("{}").target(), None);
    }
}
