/// Notification feed
///
/// Clients poll the feed; there is no push channel. Everything here is
/// scoped to the caller's own notifications.

use serde::Serialize;
use tracing::debug;
use uuid::Uuid;

use super::ServiceResult;
use crate::auth::CurrentUser;
use crate::models::notification::NOTIFICATION_FEED_LIMIT;
use crate::models::Notification;
use crate::store::Store;

/// The newest notifications plus the caller's total unread count
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationFeed {
    pub notifications: Vec<Notification>,

    /// Counts every unread notification, not just those in the page
    pub unread_count: i64,
}

/// Which notifications to mark read
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MarkRead {
    /// Only these ids; ids the caller does not own are ignored
    Ids(Vec<Uuid>),
    All,
}

pub async fn feed(
    store: &dyn Store,
    user: &CurrentUser,
    unread_only: bool,
) -> ServiceResult<NotificationFeed> {
    let notifications = store
        .notifications_for(user.id, unread_only, NOTIFICATION_FEED_LIMIT)
        .await?;
    let unread_count = store.count_unread(user.id).await?;

    Ok(NotificationFeed {
        notifications,
        unread_count,
    })
}

/// Marks notifications read, returning how many changed. Idempotent.
pub async fn mark_read(store: &dyn Store, user: &CurrentUser, target: MarkRead) -> ServiceResult<u64> {
    let updated = match target {
        MarkRead::All => store.mark_all_read(user.id).await?,
        MarkRead::Ids(ids) if ids.is_empty() => 0,
        MarkRead::Ids(ids) => store.mark_read(user.id, &ids).await?,
    };

    debug!(user_id = %user.id, updated, "Notifications marked read");
    Ok(updated)
}
