use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Snapshot of a user's alert settings, as read by the dispatcher.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RecipientRecord {
    pub user_id: Uuid,
    pub job_alerts_enabled: bool,
    /// `None` means the user never touched the setting, which counts as opted in.
    pub push_notifications_enabled: Option<bool>,
    pub fcm_token: Option<String>,
}

impl RecipientRecord {
    /// The token to notify, if this recipient should receive job alerts.
    pub fn eligible_token(&self) -> Option<&str> {
        if !self.job_alerts_enabled || self.push_notifications_enabled == Some(false) {
            return None;
        }

        self.fcm_token.as_deref().filter(|token| !token.is_empty())
    }
}
