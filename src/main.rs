mod auth;
mod db;
mod error;
mod job;
mod messaging;
mod middleware;
mod notification;
mod routes;
mod state;
mod user;

#[cfg(test)]
mod test_support;

use db::{create_pool, run_migrations};
use job::start_job_listener;
use messaging::FcmClient;
use notification::NotificationDispatcher;
use routes::create_router;
use state::{AppState, Config};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use user::{RegistrationService, UserRepository};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenv::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,job_alerts=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Arc::new(Config::from_env()?);

    // Sanitize URL for logging (hide password)
    let url_for_logging = config
        .database_url
        .split('@')
        .last()
        .map(|host| format!("<hidden>@{}", host))
        .unwrap_or_else(|| "<invalid format>".to_string());

    tracing::info!("Connecting to database at {}...", url_for_logging);
    let db = create_pool(&config.database_url).await.map_err(|e| {
        tracing::error!(error = %e, "Failed to connect to database");
        e
    })?;

    tracing::info!("Running migrations...");
    run_migrations(&db).await?;

    // Backend clients, built once and shared by every invocation
    let user_repository = Arc::new(UserRepository::new(db.clone()));
    let fcm_client = Arc::new(FcmClient::new(&config.fcm)?);

    tracing::info!(url = %config.nats.url, "Connecting to NATS...");
    let nats = job::connect(&config.nats).await?;

    // Start job listener
    let dispatcher = NotificationDispatcher::new(user_repository.clone(), fcm_client);
    tokio::spawn(async move {
        if let Err(e) = start_job_listener(nats, dispatcher).await {
            tracing::error!("Job listener error: {:?}", e);
        }
    });

    let state = AppState {
        config: config.clone(),
        registration_service: RegistrationService::new(user_repository),
    };

    // Create router
    let app = create_router(state);

    let addr = config.bind_address();
    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("Swagger UI available at http://{}/swagger-ui", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
