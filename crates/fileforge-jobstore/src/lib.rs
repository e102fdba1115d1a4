//! Redis-backed job record store.
//!
//! This crate provides:
//! - Job record reads by id
//! - Guarded, upsert-style status updates
//!
//! The transition rules themselves live in `fileforge-models`
//! (`JobRecord::apply_update`); this crate persists their outcome.

pub mod error;
pub mod store;

pub use error::{JobStoreError, JobStoreResult};
pub use store::{JobStoreConfig, RedisJobStore};

use async_trait::async_trait;
use fileforge_models::{JobRecord, StatusUpdate};

/// The job store contract the pipeline depends on.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Read a job record. Fails with `JobStoreError::NotFound` if absent.
    async fn get_record(&self, job_id: &str) -> JobStoreResult<JobRecord>;

    /// Apply a partial status update (upsert-style). Updates rejected by
    /// the transition guard are dropped with a warning.
    async fn update_status(&self, job_id: &str, update: StatusUpdate) -> JobStoreResult<()>;
}
