use serde::{Deserialize, Serialize};

/// Subject prefix for job creation events; the remaining token is the job id.
pub const JOB_CREATED_PREFIX: &str = "jobs.created.";

/// A newly created job posting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobEvent {
    pub job_id: String,
    pub title: String,
    pub company: String,
}

/// Body published on `jobs.created.<jobId>`.
#[derive(Debug, Deserialize)]
struct JobCreatedPayload {
    title: String,
    company: String,
}

#[derive(Debug, thiserror::Error)]
pub enum JobEventError {
    #[error("subject '{0}' does not carry a job id")]
    MissingJobId(String),

    #[error("invalid job payload: {0}")]
    Payload(#[from] serde_json::Error),
}

impl JobEvent {
    pub fn from_message(subject: &str, payload: &[u8]) -> Result<Self, JobEventError> {
        let job_id = subject
            .strip_prefix(JOB_CREATED_PREFIX)
            .filter(|id| !id.is_empty() && !id.contains('.'))
            .ok_or_else(|| JobEventError::MissingJobId(subject.to_string()))?;

        let payload: JobCreatedPayload = serde_json::from_slice(payload)?;

        Ok(Self {
            job_id: job_id.to_string(),
            title: payload.title,
            company: payload.company,
        })
    }
}
