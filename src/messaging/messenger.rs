use axum::async_trait;

use super::messaging_models::{BatchResponse, MulticastMessage};

/// Errors that fail a multicast call as a whole. Per-token delivery
/// failures are reported inside [`BatchResponse`] instead.
#[derive(Debug, thiserror::Error)]
pub enum MessagingError {
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Access token request failed: {0}")]
    Auth(String),

    #[error("Invalid service account: {0}")]
    ServiceAccount(String),

    #[error("Expected {expected} send responses, got {actual}")]
    ResponseMismatch { expected: usize, actual: usize },
}

/// Push delivery backend.
#[async_trait]
pub trait Messenger: Send + Sync {
    /// Deliver one payload to every token in `message.tokens`.
    ///
    /// `responses` in the returned batch is positional with the input token
    /// list.
    async fn send_each_for_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<BatchResponse, MessagingError>;
}
