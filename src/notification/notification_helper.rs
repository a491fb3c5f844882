use std::collections::BTreeMap;

use crate::{
    job::JobEvent,
    messaging::{MulticastMessage, PushNotification},
};

pub const JOB_NOTIFICATION_TITLE: &str = "New Job Opportunity";

/// Body line shown on the device for a new job
pub fn job_notification_body(job: &JobEvent) -> String {
    format!("New job posted: {} at {}", job.title, job.company)
}

/// Build the multicast message announcing `job` to every token in `tokens`
pub fn build_job_message(job: &JobEvent, tokens: Vec<String>) -> MulticastMessage {
    let mut data = BTreeMap::new();
    data.insert("type".to_string(), "job".to_string());
    data.insert("jobId".to_string(), job.job_id.clone());
    data.insert("jobTitle".to_string(), job.title.clone());
    data.insert("company".to_string(), job.company.clone());

    MulticastMessage {
        notification: PushNotification {
            title: JOB_NOTIFICATION_TITLE.to_string(),
            body: job_notification_body(job),
        },
        data,
        tokens,
    }
}
