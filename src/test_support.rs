//! In-memory collaborators shared by the unit tests.

use std::sync::{Arc, Mutex};

use axum::async_trait;
use uuid::Uuid;

use crate::{
    error::{AppError, Result},
    messaging::{BatchResponse, Messenger, MessagingError, MulticastMessage, SendResponse},
    user::{user_models::RecipientRecord, RecipientStore, TokenStore},
};

pub fn recipient(alerts: bool, push: Option<bool>, token: Option<&str>) -> RecipientRecord {
    RecipientRecord {
        user_id: Uuid::new_v4(),
        job_alerts_enabled: alerts,
        push_notifications_enabled: push,
        fcm_token: token.map(String::from),
    }
}

pub struct FakeRecipientStore {
    records: Vec<RecipientRecord>,
    fail: bool,
}

impl FakeRecipientStore {
    pub fn new(records: Vec<RecipientRecord>) -> Self {
        Self {
            records,
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            records: vec![],
            fail: true,
        }
    }
}

#[async_trait]
impl RecipientStore for FakeRecipientStore {
    async fn find_job_alert_recipients(&self) -> Result<Vec<RecipientRecord>> {
        if self.fail {
            return Err(AppError::Database(sqlx::Error::PoolTimedOut));
        }
        // Mirror the `job_alerts = TRUE` filter of the real query.
        Ok(self
            .records
            .iter()
            .filter(|r| r.job_alerts_enabled)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct FakeTokenStore {
    pub upserts: Mutex<Vec<(Uuid, String)>>,
    pub fail_with: Option<String>,
}

impl FakeTokenStore {
    pub fn failing(message: &str) -> Self {
        Self {
            upserts: Mutex::new(vec![]),
            fail_with: Some(message.to_string()),
        }
    }

    pub fn upsert_count(&self) -> usize {
        self.upserts.lock().unwrap().len()
    }
}

#[async_trait]
impl TokenStore for FakeTokenStore {
    async fn upsert_fcm_token(&self, user_id: Uuid, token: &str) -> Result<()> {
        self.upserts.lock().unwrap().push((user_id, token.to_string()));
        match &self.fail_with {
            Some(message) => Err(AppError::Internal(message.clone())),
            None => Ok(()),
        }
    }
}

/// Replays scripted per-token responses and records every call.
pub struct FakeMessenger {
    responses: Option<Vec<SendResponse>>,
    pub calls: Mutex<Vec<MulticastMessage>>,
}

impl FakeMessenger {
    /// Every token succeeds.
    pub fn accepting() -> Self {
        Self {
            responses: None,
            calls: Mutex::new(vec![]),
        }
    }

    pub fn with_responses(responses: Vec<SendResponse>) -> Self {
        Self {
            responses: Some(responses),
            calls: Mutex::new(vec![]),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl Messenger for FakeMessenger {
    async fn send_each_for_multicast(
        &self,
        message: &MulticastMessage,
    ) -> std::result::Result<BatchResponse, MessagingError> {
        self.calls.lock().unwrap().push(message.clone());

        let responses = match &self.responses {
            Some(scripted) => scripted.clone(),
            None => message
                .tokens
                .iter()
                .enumerate()
                .map(|(i, _)| SendResponse::sent(format!("projects/test/messages/{}", i)))
                .collect(),
        };

        Ok(BatchResponse::from_responses(responses))
    }
}

/// A messenger whose transport is down.
pub struct UnavailableMessenger;

#[async_trait]
impl Messenger for UnavailableMessenger {
    async fn send_each_for_multicast(
        &self,
        _message: &MulticastMessage,
    ) -> std::result::Result<BatchResponse, MessagingError> {
        Err(MessagingError::Auth("token endpoint returned HTTP 503".to_string()))
    }
}

/// Formatted log output captured for the duration of a test.
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Route this thread's tracing output into a buffer until the guard drops.
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let writer = buffer.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();

    (buffer, tracing::subscriber::set_default(subscriber))
}
