//! Worker error types.

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

/// Everything that can go wrong while handling one message.
///
/// All variants are terminal for the job: the handler converts them into a
/// best-effort FAILED status update and the loop deletes the message.
#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("No processor found for operation '{operation}' and format '{format}'")]
    NoProcessorFound { operation: String, format: String },

    #[error("{0}")]
    NotFound(String),

    #[error("Processing failed: {0}")]
    Processing(#[from] fileforge_processors::ProcessorError),

    #[error("Failed to parse job message: {0}")]
    MessageParse(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(fileforge_storage::StorageError),

    #[error("Job store error: {0}")]
    JobStore(fileforge_jobstore::JobStoreError),

    #[error("Queue error: {0}")]
    Queue(#[from] fileforge_queue::QueueError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn no_processor(operation: impl Into<String>, format: Option<&str>) -> Self {
        Self::NoProcessorFound {
            operation: operation.into(),
            format: format.unwrap_or("none").to_string(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }
}

impl From<fileforge_storage::StorageError> for WorkerError {
    fn from(err: fileforge_storage::StorageError) -> Self {
        match err {
            fileforge_storage::StorageError::NotFound(key) => {
                Self::NotFound(format!("Source file not found: {}", key))
            }
            other => Self::Storage(other),
        }
    }
}

impl From<fileforge_jobstore::JobStoreError> for WorkerError {
    fn from(err: fileforge_jobstore::JobStoreError) -> Self {
        match err {
            fileforge_jobstore::JobStoreError::NotFound(job_id) => {
                Self::NotFound(format!("Job record not found: {}", job_id))
            }
            other => Self::JobStore(other),
        }
    }
}
