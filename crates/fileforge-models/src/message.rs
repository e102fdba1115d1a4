//! Queue message types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default quality applied when the message carries none.
pub const DEFAULT_QUALITY: u8 = 80;

/// The operation requested for a job.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    /// Convert the file to a different format
    Convert,
    /// Reduce the file's size, keeping its format
    Compress,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Convert => "convert",
            Operation::Compress => "compress",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A job message as it arrives from the queue.
///
/// Immutable once enqueued. `retry_count` is carried on the wire but the
/// pipeline itself never re-enqueues a message.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMessage {
    /// Job identifier; must reference a pre-existing job record
    pub job_id: String,

    /// Requested operation
    pub operation: Operation,

    /// Target format, required for convert
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_format: Option<String>,

    /// Quality (0-100)
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Free-form per-job options
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<serde_json::Value>,

    /// Enqueue timestamp
    pub timestamp: DateTime<Utc>,

    /// Delivery attempt counter, maintained by the enqueueing side
    #[serde(default)]
    pub retry_count: u32,
}

fn default_quality() -> u8 {
    DEFAULT_QUALITY
}

impl JobMessage {
    /// Create a message for the given job and operation.
    pub fn new(job_id: impl Into<String>, operation: Operation) -> Self {
        Self {
            job_id: job_id.into(),
            operation,
            target_format: None,
            quality: DEFAULT_QUALITY,
            options: None,
            timestamp: Utc::now(),
            retry_count: 0,
        }
    }

    pub fn with_target_format(mut self, format: impl Into<String>) -> Self {
        self.target_format = Some(format.into());
        self
    }

    pub fn with_quality(mut self, quality: u8) -> Self {
        self.quality = quality;
        self
    }

    /// Parse a raw queue payload.
    pub fn parse(body: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(body)
    }

    /// Quality clamped to the valid 0-100 range.
    pub fn quality_clamped(&self) -> u8 {
        self.quality.min(100)
    }

    /// Best-effort extraction of the job id from a payload that may not
    /// parse as a full message. Used by the failure path.
    pub fn recover_job_id(body: &str) -> Option<String> {
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        value
            .get("jobId")
            .and_then(|v| v.as_str())
            .map(str::to_owned)
    }
}
