//! Job store error types.

use thiserror::Error;

pub type JobStoreResult<T> = Result<T, JobStoreError>;

#[derive(Debug, Error)]
pub enum JobStoreError {
    #[error("Job record not found: {0}")]
    NotFound(String),

    #[error("Failed to configure job store: {0}")]
    ConfigError(String),

    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl JobStoreError {
    pub fn not_found(job_id: impl Into<String>) -> Self {
        Self::NotFound(job_id.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}
