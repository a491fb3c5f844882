use axum::async_trait;
use uuid::Uuid;

use super::user_models::RecipientRecord;
use crate::error::Result;

/// Read side of the user profile store used by the dispatcher.
#[async_trait]
pub trait RecipientStore: Send + Sync {
    /// Every recipient with job alerts switched on.
    async fn find_job_alert_recipients(&self) -> Result<Vec<RecipientRecord>>;
}

/// Write side used by the registration endpoint.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Record `token` against `user_id`, stamping the update with server time.
    async fn upsert_fcm_token(&self, user_id: Uuid, token: &str) -> Result<()>;
}
