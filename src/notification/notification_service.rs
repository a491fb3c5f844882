use std::sync::Arc;

use crate::{
    error::Result,
    job::JobEvent,
    messaging::{BatchResponse, Messenger, MessagingError},
    user::RecipientStore,
};
use super::{
    notification_helper::build_job_message,
    notification_models::{DeliveryFailure, DispatchOutcome, DispatchResult, NotificationBatch},
};

/// Fans a job event out to every recipient with job alerts and a device token.
///
/// Errors from the recipient query or from the multicast call itself fail the
/// whole dispatch so the event source can redeliver. Individual tokens that
/// the backend rejects are only counted and logged.
#[derive(Clone)]
pub struct NotificationDispatcher {
    recipients: Arc<dyn RecipientStore>,
    messenger: Arc<dyn Messenger>,
}

impl NotificationDispatcher {
    pub fn new(recipients: Arc<dyn RecipientStore>, messenger: Arc<dyn Messenger>) -> Self {
        Self {
            recipients,
            messenger,
        }
    }

    pub async fn dispatch(&self, job: &JobEvent) -> Result<DispatchOutcome> {
        tracing::info!(job_id = %job.job_id, title = %job.title, "New job created");

        let recipients = self.recipients.find_job_alert_recipients().await?;
        if recipients.is_empty() {
            tracing::info!(job_id = %job.job_id, "No users have job alerts enabled");
            return Ok(DispatchOutcome::without_send(DispatchResult::no_recipients()));
        }

        let eligible = recipients.len();
        tracing::info!(job_id = %job.job_id, eligible, "Found users with job alerts enabled");

        let batch = NotificationBatch::from_recipients(&recipients);
        let without_token = batch.without_token();
        if batch.is_empty() {
            tracing::warn!(
                job_id = %job.job_id,
                eligible,
                "No valid FCM tokens found, users may need to log in to register their tokens"
            );
            return Ok(DispatchOutcome::without_send(DispatchResult::no_tokens(
                eligible,
                without_token,
            )));
        }

        tracing::debug!(
            job_id = %job.job_id,
            batch_size = batch.tokens().len(),
            without_token,
            "Built notification batch"
        );
        let message = build_job_message(job, batch.into_tokens());
        let response = self.messenger.send_each_for_multicast(&message).await?;
        let failures = collect_failures(&message.tokens, &response)?;

        let sent = message.tokens.len() - failures.len();
        tracing::info!(job_id = %job.job_id, sent, "Sent push notifications");

        if !failures.is_empty() {
            tracing::warn!(
                job_id = %job.job_id,
                failed = failures.len(),
                "Failed to send some push notifications"
            );
            for failure in &failures {
                match &failure.error {
                    Some(error) => tracing::error!(
                        token = %failure.token,
                        error = %error,
                        "Failed to send to token"
                    ),
                    None => tracing::error!(token = %failure.token, "Failed to send to token"),
                }
            }
        }

        Ok(DispatchOutcome {
            result: DispatchResult {
                success: true,
                eligible,
                sent,
                failed: failures.len(),
                without_token,
                message: None,
            },
            failures,
        })
    }
}

/// Pair each requested token with its positional response and keep the
/// failed ones.
fn collect_failures(
    tokens: &[String],
    response: &BatchResponse,
) -> std::result::Result<Vec<DeliveryFailure>, MessagingError> {
    if tokens.len() != response.responses.len() {
        return Err(MessagingError::ResponseMismatch {
            expected: tokens.len(),
            actual: response.responses.len(),
        });
    }

    Ok(tokens
        .iter()
        .zip(&response.responses)
        .filter(|(_, outcome)| !outcome.success)
        .map(|(token, outcome)| DeliveryFailure {
            token: token.clone(),
            error: outcome.error.clone(),
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        error::AppError,
        messaging::{SendError, SendResponse},
        test_support::{
            capture_logs, recipient, FakeMessenger, FakeRecipientStore, UnavailableMessenger,
        },
    };

    fn job() -> JobEvent {
        JobEvent {
            job_id: "job-7".into(),
            title: "Rust Developer".into(),
            company: "Initech".into(),
        }
    }

    fn dispatcher(
        store: FakeRecipientStore,
        messenger: Arc<dyn Messenger>,
    ) -> NotificationDispatcher {
        NotificationDispatcher::new(Arc::new(store), messenger)
    }

    #[tokio::test]
    async fn test_no_recipients_skips_send() {
        let messenger = Arc::new(FakeMessenger::accepting());
        let dispatcher = dispatcher(FakeRecipientStore::new(vec![]), messenger.clone());

        let outcome = dispatcher.dispatch(&job()).await.unwrap();

        assert_eq!(outcome.result.eligible, 0);
        assert_eq!(outcome.result.sent, 0);
        assert_eq!(outcome.result.failed, 0);
        assert!(outcome.result.success);
        assert_eq!(messenger.call_count(), 0);
    }

    #[tokio::test]
    async fn test_alerts_disabled_records_are_not_recipients() {
        let messenger = Arc::new(FakeMessenger::accepting());
        let store = FakeRecipientStore::new(vec![recipient(false, None, Some("tok"))]);
        let dispatcher = dispatcher(store, messenger.clone());

        let outcome = dispatcher.dispatch(&job()).await.unwrap();

        assert_eq!(outcome.result, DispatchResult::no_recipients());
        assert_eq!(messenger.call_count(), 0);
    }

    #[tokio::test]
    async fn test_no_usable_tokens_skips_send() {
        let messenger = Arc::new(FakeMessenger::accepting());
        let store = FakeRecipientStore::new(vec![
            recipient(true, None, None),
            recipient(true, Some(false), Some("opted-out")),
            recipient(true, None, Some("")),
        ]);
        let dispatcher = dispatcher(store, messenger.clone());

        let outcome = dispatcher.dispatch(&job()).await.unwrap();

        assert_eq!(messenger.call_count(), 0);
        assert!(!outcome.result.success);
        assert!(!outcome.result.tokens_available());
        assert_eq!(outcome.result.eligible, 3);
        assert_eq!(outcome.result.sent, 0);
        assert_eq!(outcome.result.without_token, 3);
        assert_eq!(outcome.result.message.as_deref(), Some("No FCM tokens available"));
    }

    #[tokio::test]
    async fn test_only_eligible_tokens_are_sent_in_one_call() {
        let messenger = Arc::new(FakeMessenger::accepting());
        let store = FakeRecipientStore::new(vec![
            recipient(true, None, Some("A")),
            recipient(true, Some(false), Some("muted")),
            recipient(true, None, None),
            recipient(false, None, Some("no-alerts")),
            recipient(true, Some(true), Some("B")),
        ]);
        let dispatcher = dispatcher(store, messenger.clone());

        let outcome = dispatcher.dispatch(&job()).await.unwrap();

        let calls = messenger.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].tokens, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(calls[0].notification.body, "New job posted: Rust Developer at Initech");
        assert_eq!(calls[0].data["jobId"], "job-7");

        assert_eq!(outcome.result.eligible, 4);
        assert_eq!(outcome.result.sent, 2);
        assert_eq!(outcome.result.failed, 0);
        assert_eq!(outcome.result.without_token, 2);
        assert!(outcome.failures.is_empty());
    }

    #[tokio::test]
    async fn test_partial_failure_is_reported_per_token() {
        let messenger = Arc::new(FakeMessenger::with_responses(vec![
            SendResponse::sent("m1"),
            SendResponse::failed(SendError::new("UNREGISTERED", "X")),
            SendResponse::sent("m3"),
        ]));
        let store = FakeRecipientStore::new(vec![
            recipient(true, None, Some("A")),
            recipient(true, None, Some("B")),
            recipient(true, None, Some("C")),
        ]);
        let dispatcher = dispatcher(store, messenger.clone());

        let outcome = dispatcher.dispatch(&job()).await.unwrap();

        assert_eq!(outcome.result.eligible, 3);
        assert_eq!(outcome.result.sent, 2);
        assert_eq!(outcome.result.failed, 1);
        assert!(outcome.result.success);
        assert_eq!(
            outcome.failures,
            vec![DeliveryFailure {
                token: "B".into(),
                error: Some(SendError::new("UNREGISTERED", "X")),
            }]
        );
    }

    #[tokio::test]
    async fn test_each_failed_token_is_logged_once() {
        let (logs, _guard) = capture_logs();
        let messenger = Arc::new(FakeMessenger::with_responses(vec![
            SendResponse::sent("m1"),
            SendResponse::failed(SendError::new("UNREGISTERED", "X")),
            SendResponse::sent("m3"),
        ]));
        let store = FakeRecipientStore::new(vec![
            recipient(true, None, Some("A")),
            recipient(true, None, Some("B")),
            recipient(true, None, Some("C")),
        ]);
        let dispatcher = dispatcher(store, messenger);

        dispatcher.dispatch(&job()).await.unwrap();

        let output = logs.contents();
        let failure_lines: Vec<&str> = output
            .lines()
            .filter(|line| line.contains("Failed to send to token"))
            .collect();
        assert_eq!(failure_lines.len(), 1, "{}", output);
        assert!(failure_lines[0].contains("ERROR"));
        assert!(failure_lines[0].contains("token=B"));
        assert!(failure_lines[0].contains("UNREGISTERED: X"));
    }

    #[tokio::test]
    async fn test_mismatched_response_length_fails_dispatch() {
        let messenger = Arc::new(FakeMessenger::with_responses(vec![SendResponse::sent("m1")]));
        let store = FakeRecipientStore::new(vec![
            recipient(true, None, Some("A")),
            recipient(true, None, Some("B")),
        ]);
        let dispatcher = dispatcher(store, messenger);

        let err = dispatcher.dispatch(&job()).await.unwrap_err();

        assert!(matches!(
            err,
            AppError::Messaging(MessagingError::ResponseMismatch { expected: 2, actual: 1 })
        ));
    }

    #[tokio::test]
    async fn test_recipient_query_failure_propagates() {
        let messenger = Arc::new(FakeMessenger::accepting());
        let dispatcher = dispatcher(FakeRecipientStore::failing(), messenger.clone());

        let err = dispatcher.dispatch(&job()).await.unwrap_err();

        assert!(matches!(err, AppError::Database(_)));
        assert_eq!(messenger.call_count(), 0);
    }

    #[tokio::test]
    async fn test_send_failure_propagates() {
        let store = FakeRecipientStore::new(vec![recipient(true, None, Some("A"))]);
        let dispatcher = dispatcher(store, Arc::new(UnavailableMessenger));

        let err = dispatcher.dispatch(&job()).await.unwrap_err();

        assert!(matches!(err, AppError::Messaging(MessagingError::Auth(_))));
    }

    #[test]
    fn test_collect_failures_pairs_positionally() {
        let tokens = vec!["A".to_string(), "B".to_string()];
        let response = BatchResponse::from_responses(vec![
            SendResponse::failed(SendError::new("INTERNAL", "boom")),
            SendResponse::sent("m2"),
        ]);

        let failures = collect_failures(&tokens, &response).unwrap();
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].token, "A");
    }
}
