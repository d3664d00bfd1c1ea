//! Structured job lifecycle logging.

use cutroom_models::JobId;
use tracing::{error, info};

/// Logger attaching job id and operation to lifecycle events.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    operation: String,
}

impl JobLogger {
    pub fn new(job_id: &JobId, operation: &str) -> Self {
        Self {
            job_id: job_id.to_string(),
            operation: operation.to_string(),
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job progress: {}", message
        );
    }

    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job error: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            operation = %self.operation,
            "Job completed: {}", message
        );
    }
}
