use std::sync::Arc;

use crate::{
    error::{AppError, Result},
    user::user_service::RegistrationService,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub registration_service: RegistrationService,
}

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub nats: NatsConfig,
    pub fcm: FcmConfig,
    pub cors_origins: Vec<String>,
    pub host: String,
    pub port: u16,
}

#[derive(Clone, Debug)]
pub struct NatsConfig {
    pub url: String,
    pub creds_file: Option<String>,
}

#[derive(Clone, Debug)]
pub struct FcmConfig {
    pub credentials_file: String,
    /// Falls back to the service account's `project_id` when unset.
    pub project_id: Option<String>,
    pub api_base: String,
    pub max_concurrency: usize,
    /// Timeout for each HTTP request to FCM and the token endpoint.
    pub request_timeout_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let credentials_file = optional("FCM_CREDENTIALS_FILE")
            .or_else(|| optional("GOOGLE_APPLICATION_CREDENTIALS"))
            .ok_or_else(|| {
                AppError::Config(
                    "FCM_CREDENTIALS_FILE or GOOGLE_APPLICATION_CREDENTIALS must be set".to_string(),
                )
            })?;

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            nats: NatsConfig {
                url: optional("NATS_URL").unwrap_or_else(|| "nats://127.0.0.1:4222".to_string()),
                creds_file: optional("NATS_CREDS_FILE"),
            },
            fcm: FcmConfig {
                credentials_file,
                project_id: optional("FCM_PROJECT_ID"),
                api_base: optional("FCM_API_BASE")
                    .unwrap_or_else(|| "https://fcm.googleapis.com".to_string()),
                max_concurrency: parse_or("FCM_MAX_CONCURRENCY", 32)?,
                request_timeout_secs: parse_or("FCM_REQUEST_TIMEOUT_SECS", 10)?,
            },
            cors_origins: parse_origins(
                &optional("CORS_ORIGINS").unwrap_or_else(|| "http://localhost:3000".to_string()),
            ),
            host: optional("HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port: parse_or("PORT", 3000)?,
        })
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn required(name: &str) -> Result<String> {
    optional(name).ok_or_else(|| AppError::Config(format!("{} must be set", name)))
}

fn optional(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> Result<T> {
    match optional(name) {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| AppError::Config(format!("{} must be a number", name))),
        None => Ok(default),
    }
}

fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(String::from)
        .collect()
}
