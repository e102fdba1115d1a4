//! Persisted job records and status transitions.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Job processing status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    /// Job record exists but no worker has picked it up
    #[default]
    Pending,
    /// A worker is actively processing the job
    Processing,
    /// Job completed successfully
    Completed,
    /// Job failed
    Failed,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Pending => "pending",
            JobStatus::Processing => "processing",
            JobStatus::Completed => "completed",
            JobStatus::Failed => "failed",
        }
    }

    /// Check if this is a terminal state (no more updates expected).
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Size metrics reported for compress jobs.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompressionMetrics {
    /// Source size in bytes
    pub original_file_size: u64,
    /// Processed artifact size in bytes
    pub processed_file_size: u64,
    /// Percentage saved, rounded to two decimals, floored at 0
    pub compression_savings: f64,
}

impl CompressionMetrics {
    pub fn new(original_file_size: u64, processed_file_size: u64) -> Self {
        Self {
            original_file_size,
            processed_file_size,
            compression_savings: compression_savings(original_file_size, processed_file_size),
        }
    }
}

/// Percentage reduction from original to processed size.
///
/// Rounded to two decimals and floored at 0 even when the processed
/// artifact grew.
pub fn compression_savings(original: u64, processed: u64) -> f64 {
    if original == 0 {
        return 0.0;
    }
    let pct = (original as f64 - processed as f64) / original as f64 * 100.0;
    ((pct * 100.0).round() / 100.0).max(0.0)
}

/// A partial status update applied to a job record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: JobStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metrics: Option<CompressionMetrics>,
}

impl StatusUpdate {
    pub fn new(status: JobStatus) -> Self {
        Self {
            status,
            progress: None,
            download_url: None,
            metrics: None,
        }
    }

    pub fn with_progress(mut self, progress: u8) -> Self {
        self.progress = Some(progress);
        self
    }

    pub fn with_download_url(mut self, url: impl Into<String>) -> Self {
        self.download_url = Some(url.into());
        self
    }

    pub fn with_metrics(mut self, metrics: CompressionMetrics) -> Self {
        self.metrics = Some(metrics);
        self
    }
}

/// The persisted state of a job.
///
/// Created by the upload step before the message is enqueued; the pipeline
/// reads `blob_key` and writes the status, progress and result fields.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobRecord {
    pub job_id: String,

    #[serde(default)]
    pub status: JobStatus,

    /// Key of the uploaded source object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blob_key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<u64>,

    /// Progress percentage (0-100)
    #[serde(default)]
    pub progress: u8,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_file_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub processed_file_size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub compression_savings: Option<f64>,

    /// Part of the schema for the surrounding system; the pipeline's
    /// failure path leaves it untouched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl JobRecord {
    /// Create a fresh pending record.
    pub fn new(job_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            job_id: job_id.into(),
            status: JobStatus::Pending,
            blob_key: None,
            file_name: None,
            file_size: None,
            progress: 0,
            download_url: None,
            original_file_size: None,
            processed_file_size: None,
            compression_savings: None,
            error_message: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_blob_key(mut self, key: impl Into<String>) -> Self {
        self.blob_key = Some(key.into());
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }

    /// Apply a partial update, enforcing the transition rules.
    ///
    /// Returns `false` without touching the record when the update is
    /// invalid. Rules:
    /// - a terminal record accepts no further updates;
    /// - progress never decreases while the record stays `Processing`;
    /// - a transition into a terminal status may carry any progress value.
    pub fn apply_update(&mut self, update: &StatusUpdate) -> bool {
        if self.status.is_terminal() {
            return false;
        }

        let progress = match update.progress {
            Some(p) if update.status == JobStatus::Processing => p.min(100).max(self.progress),
            Some(p) => p.min(100),
            None => self.progress,
        };

        self.status = update.status;
        self.progress = progress;
        if let Some(url) = &update.download_url {
            self.download_url = Some(url.clone());
        }
        if let Some(metrics) = &update.metrics {
            self.original_file_size = Some(metrics.original_file_size);
            self.processed_file_size = Some(metrics.processed_file_size);
            self.compression_savings = Some(metrics.compression_savings);
        }
        self.updated_at = Utc::now();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_wire_strings() {
        for (status, wire) in [
            (JobStatus::Pending, "\"pending\""),
            (JobStatus::Processing, "\"processing\""),
            (JobStatus::Completed, "\"completed\""),
            (JobStatus::Failed, "\"failed\""),
        ] {
            assert_eq!(serde_json::to_string(&status).unwrap(), wire);
        }
    }

    #[test]
    fn test_terminal_records_reject_updates() {
        let mut record = JobRecord::new("job-1");
        assert!(record.apply_update(&StatusUpdate::new(JobStatus::Completed).with_progress(100)));
        assert!(record.is_terminal());

        let before = record.clone();
        assert!(!record.apply_update(&StatusUpdate::new(JobStatus::Processing).with_progress(0)));
        assert_eq!(record.status, before.status);
        assert_eq!(record.progress, before.progress);
    }

    #[test]
    fn test_progress_is_monotonic_while_processing() {
        let mut record = JobRecord::new("job-1");
        assert!(record.apply_update(&StatusUpdate::new(JobStatus::Processing).with_progress(75)));
        assert!(record.apply_update(&StatusUpdate::new(JobStatus::Processing).with_progress(25)));
        assert_eq!(record.progress, 75);

        assert!(record.apply_update(&StatusUpdate::new(JobStatus::Processing).with_progress(90)));
        assert_eq!(record.progress, 90);
    }

    #[test]
    fn test_failed_transition_may_reset_progress() {
        let mut record = JobRecord::new("job-1");
        record.apply_update(&StatusUpdate::new(JobStatus::Processing).with_progress(75));
        assert!(record.apply_update(&StatusUpdate::new(JobStatus::Failed).with_progress(0)));
        assert_eq!(record.status, JobStatus::Failed);
        assert_eq!(record.progress, 0);
    }

    #[test]
    fn test_update_merges_url_and_metrics() {
        let mut record = JobRecord::new("job-1");
        let metrics = CompressionMetrics::new(1000, 400);
        let update = StatusUpdate::new(JobStatus::Processing)
            .with_progress(90)
            .with_download_url("https://files.example.com/processed/job-1.jpg")
            .with_metrics(metrics);

        assert!(record.apply_update(&update));
        assert_eq!(record.processed_file_size, Some(400));
        assert_eq!(record.compression_savings, Some(60.0));
        assert!(record.download_url.is_some());
    }

    #[test]
    fn test_compression_savings_rounds_to_two_decimals() {
        assert_eq!(compression_savings(3000, 1000), 66.67);
        assert_eq!(compression_savings(1000, 400), 60.0);
    }

    #[test]
    fn test_compression_savings_floors_at_zero_when_file_grew() {
        assert_eq!(compression_savings(100, 250), 0.0);
    }

    #[test]
    fn test_compression_savings_zero_original() {
        assert_eq!(compression_savings(0, 10), 0.0);
    }
}
