pub mod job_listener;
pub mod job_models;

pub use job_listener::{connect, start_job_listener};
pub use job_models::JobEvent;
