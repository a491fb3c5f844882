//! Firebase Cloud Messaging delivery over the HTTP v1 API.
//!
//! HTTP v1 accepts one target per request, so a multicast is fanned out as
//! one `messages:send` call per token with bounded concurrency. Per-token
//! failures (HTTP errors and transport errors alike) are captured in the
//! positional [`BatchResponse`]; only failing to authenticate aborts the call.

use std::time::Duration;

use axum::async_trait;
use futures::{stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};

use super::{
    messaging_models::{BatchResponse, MulticastMessage, SendError, SendResponse},
    service_account::{AccessTokenProvider, ServiceAccountKey},
    Messenger, MessagingError,
};
use crate::state::FcmConfig;

#[derive(Debug, Deserialize)]
struct SendSuccess {
    name: String,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

pub struct FcmClient {
    http: reqwest::Client,
    tokens: AccessTokenProvider,
    endpoint: String,
    max_concurrency: usize,
}

impl FcmClient {
    pub fn new(config: &FcmConfig) -> Result<Self, MessagingError> {
        let key = ServiceAccountKey::from_file(&config.credentials_file)?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        let tokens = AccessTokenProvider::new(key, http.clone())?;

        let project_id = config
            .project_id
            .clone()
            .or_else(|| tokens.project_id().map(String::from))
            .ok_or_else(|| {
                MessagingError::ServiceAccount(
                    "no FCM project id configured or present in service account".to_string(),
                )
            })?;

        Ok(Self {
            http,
            tokens,
            endpoint: send_endpoint(&config.api_base, &project_id),
            max_concurrency: config.max_concurrency.max(1),
        })
    }

    async fn send_one(
        &self,
        access_token: &str,
        token: &str,
        message: &MulticastMessage,
    ) -> SendResponse {
        let response = match self
            .http
            .post(&self.endpoint)
            .bearer_auth(access_token)
            .json(&message_body(token, message))
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => return SendResponse::failed(SendError::new("UNAVAILABLE", e.to_string())),
        };

        let status = response.status();
        if status.is_success() {
            return match response.json::<SendSuccess>().await {
                Ok(body) => SendResponse::sent(body.name),
                Err(e) => SendResponse::failed(SendError::new("UNKNOWN", e.to_string())),
            };
        }

        let body = response.text().await.unwrap_or_default();
        SendResponse::failed(parse_error(status.as_u16(), &body))
    }
}

#[async_trait]
impl Messenger for FcmClient {
    async fn send_each_for_multicast(
        &self,
        message: &MulticastMessage,
    ) -> Result<BatchResponse, MessagingError> {
        if message.tokens.is_empty() {
            return Ok(BatchResponse::default());
        }

        let access_token = self.tokens.access_token().await?;
        let access_token = &access_token;

        // Each future owns its token; `buffered` keeps results in input order.
        let responses: Vec<SendResponse> = stream::iter(message.tokens.iter().cloned())
            .map(|token| async move { self.send_one(access_token, &token, message).await })
            .buffered(self.max_concurrency)
            .collect()
            .await;

        Ok(BatchResponse::from_responses(responses))
    }
}

fn send_endpoint(api_base: &str, project_id: &str) -> String {
    format!(
        "{}/v1/projects/{}/messages:send",
        api_base.trim_end_matches('/'),
        project_id
    )
}

fn message_body(token: &str, message: &MulticastMessage) -> Value {
    json!({
        "message": {
            "token": token,
            "notification": message.notification,
            "data": message.data,
        }
    })
}

fn parse_error(http_status: u16, body: &str) -> SendError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(envelope) => SendError::new(
            envelope
                .error
                .status
                .unwrap_or_else(|| format!("HTTP_{}", http_status)),
            envelope.error.message.unwrap_or_default(),
        ),
        Err(_) => SendError::new(format!("HTTP_{}", http_status), body.to_string()),
    }
}
