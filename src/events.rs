//! Side effects that follow a successful mutation: the activity trail and
//! notification fan-out. Both are best effort and never fail the request.

use crate::auth::roles::Role;
use crate::database::activity_repository::NewActivity;
use crate::database::notification_repository::NewNotification;
use crate::state::AppState;
use serde_json::Value;
use tracing::warn;

pub async fn record_activity(
    state: &AppState,
    user_id: &str,
    action: &str,
    entity_type: &str,
    entity_id: &str,
    details: Option<Value>,
) {
    let activity = NewActivity {
        user_id: user_id.to_string(),
        action: action.to_string(),
        entity_type: entity_type.to_string(),
        entity_id: entity_id.to_string(),
        details,
    };

    if let Err(e) = state.stores.activity.record(&activity).await {
        warn!(
            user_id,
            action,
            entity_type,
            entity_id,
            "Failed to record activity: {}",
            e
        );
    }
}

pub async fn notify(state: &AppState, notifications: Vec<NewNotification>) {
    if notifications.is_empty() {
        return;
    }

    if let Err(e) = state.stores.notifications.insert_many(&notifications).await {
        warn!(count = notifications.len(), "Failed to insert notifications: {}", e);
    }
}

/// Send the same notification to every admin, skipping `except` (usually the
/// acting admin)
pub async fn notify_admins(state: &AppState, template: NewNotification, except: Option<&str>) {
    let admins = match state.stores.profiles.user_ids_with_role(Role::Admin).await {
        Ok(admins) => admins,
        Err(e) => {
            warn!("Failed to look up admins for notification: {}", e);
            return;
        }
    };

    let notifications = admins
        .into_iter()
        .filter(|admin| Some(admin.as_str()) != except)
        .map(|admin| NewNotification {
            user_id: admin,
            ..template.clone()
        })
        .collect();

    notify(state, notifications).await;
}
