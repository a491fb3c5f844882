use async_nats::jetstream::{
    self,
    consumer::{pull, AckPolicy},
    AckKind,
};
use futures::StreamExt;

use super::job_models::{JobEvent, JOB_CREATED_PREFIX};
use crate::{
    error::{AppError, Result},
    notification::NotificationDispatcher,
    state::NatsConfig,
};

pub const JOB_STREAM: &str = "JOBS";
pub const DISPATCHER_CONSUMER: &str = "job-alert-dispatcher";

pub async fn connect(config: &NatsConfig) -> Result<async_nats::Client> {
    let options = match &config.creds_file {
        Some(path) => async_nats::ConnectOptions::with_credentials_file(path)
            .await
            .map_err(AppError::event_source)?,
        None => async_nats::ConnectOptions::new(),
    };

    options
        .name("job-alerts")
        .connect(config.url.as_str())
        .await
        .map_err(AppError::event_source)
}

/// Consume job creation events and dispatch notifications for each one.
///
/// Events are acknowledged after a successful dispatch. A failed dispatch is
/// negatively acknowledged so JetStream redelivers it; an event that can never
/// be decoded is terminated.
pub async fn start_job_listener(
    client: async_nats::Client,
    dispatcher: NotificationDispatcher,
) -> Result<()> {
    let jetstream = jetstream::new(client);

    let stream = jetstream
        .get_or_create_stream(jetstream::stream::Config {
            name: JOB_STREAM.to_string(),
            subjects: vec![format!("{}>", JOB_CREATED_PREFIX)],
            ..Default::default()
        })
        .await
        .map_err(AppError::event_source)?;

    let consumer = stream
        .get_or_create_consumer(
            DISPATCHER_CONSUMER,
            pull::Config {
                durable_name: Some(DISPATCHER_CONSUMER.to_string()),
                ack_policy: AckPolicy::Explicit,
                ..Default::default()
            },
        )
        .await
        .map_err(AppError::event_source)?;

    let mut messages = consumer.messages().await.map_err(AppError::event_source)?;
    tracing::info!(stream = JOB_STREAM, consumer = DISPATCHER_CONSUMER, "Job listener started");

    while let Some(message) = messages.next().await {
        match message {
            Ok(message) => handle_message(&dispatcher, &message).await,
            Err(e) => tracing::warn!(error = %e, "Failed to receive job event"),
        }
    }

    tracing::info!("Job event stream closed, listener shutting down");
    Ok(())
}

async fn handle_message(dispatcher: &NotificationDispatcher, message: &jetstream::Message) {
    let job = match JobEvent::from_message(message.subject.as_str(), &message.payload) {
        Ok(job) => job,
        Err(e) => {
            tracing::warn!(subject = %message.subject, error = %e, "Discarding undecodable job event");
            if let Err(e) = message.ack_with(AckKind::Term).await {
                tracing::warn!(error = %e, "Failed to terminate job event");
            }
            return;
        }
    };

    match dispatcher.dispatch(&job).await {
        Ok(outcome) => {
            tracing::debug!(
                job_id = %job.job_id,
                tokens_available = outcome.result.tokens_available(),
                failed_tokens = outcome.failures.len(),
                result = ?outcome.result,
                "Job event dispatched"
            );
            if let Err(e) = message.ack().await {
                tracing::warn!(job_id = %job.job_id, error = %e, "Failed to ack job event");
            }
        }
        Err(e) => {
            tracing::error!(job_id = %job.job_id, error = %e, "Error sending job notifications");
            if let Err(e) = message.ack_with(AckKind::Nak(None)).await {
                tracing::warn!(job_id = %job.job_id, error = %e, "Failed to nak job event");
            }
        }
    }
}
