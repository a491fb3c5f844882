use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use super::{
    user_dto::{RegisterTokenRequest, RegisterTokenResponse},
    user_store::TokenStore,
};
use crate::error::{AppError, Result};

/// Records device push tokens against the calling user.
#[derive(Clone)]
pub struct RegistrationService {
    tokens: Arc<dyn TokenStore>,
}

impl RegistrationService {
    pub fn new(tokens: Arc<dyn TokenStore>) -> Self {
        Self { tokens }
    }

    pub async fn update_fcm_token(
        &self,
        caller: Option<Uuid>,
        request: RegisterTokenRequest,
    ) -> Result<RegisterTokenResponse> {
        let user_id = caller.ok_or_else(|| {
            AppError::Unauthenticated("User must be authenticated to update FCM token".to_string())
        })?;

        let token = match request.token.as_deref() {
            Some(token) if !token.is_empty() => token,
            _ => return Err(AppError::InvalidArgument("FCM token is required".to_string())),
        };
        request.validate()?;

        self.tokens
            .upsert_fcm_token(user_id, token)
            .await
            .map_err(|e| {
                tracing::error!(%user_id, error = %e, "Error updating FCM token");
                AppError::Internal(e.to_string())
            })?;

        tracing::info!(%user_id, "Updated FCM token");
        Ok(RegisterTokenResponse { success: true })
    }
}
