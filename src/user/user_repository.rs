use axum::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{
    user_models::RecipientRecord,
    user_store::{RecipientStore, TokenStore},
};
use crate::error::Result;

#[derive(Clone)]
pub struct UserRepository {
    pool: PgPool,
}

impl UserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecipientStore for UserRepository {
    async fn find_job_alert_recipients(&self) -> Result<Vec<RecipientRecord>> {
        let recipients = sqlx::query_as::<_, RecipientRecord>(
            "SELECT id AS user_id,
                    job_alerts AS job_alerts_enabled,
                    push_notifications AS push_notifications_enabled,
                    fcm_token
             FROM users
             WHERE job_alerts = TRUE",
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(recipients)
    }
}

#[async_trait]
impl TokenStore for UserRepository {
    async fn upsert_fcm_token(&self, user_id: Uuid, token: &str) -> Result<()> {
        sqlx::query(
            "INSERT INTO users (id, fcm_token, fcm_token_updated_at)
             VALUES ($1, $2, NOW())
             ON CONFLICT (id) DO UPDATE SET
                fcm_token = EXCLUDED.fcm_token,
                fcm_token_updated_at = EXCLUDED.fcm_token_updated_at,
                updated_at = NOW()",
        )
        .bind(user_id)
        .bind(token)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}
