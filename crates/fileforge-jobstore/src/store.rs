//! Redis job record store.

use redis::AsyncCommands;
use tracing::{debug, warn};

use fileforge_models::{JobRecord, StatusUpdate};

use crate::error::{JobStoreError, JobStoreResult};
use crate::JobStore;

/// Job store configuration.
#[derive(Debug, Clone)]
pub struct JobStoreConfig {
    /// Redis URL
    pub redis_url: String,
    /// Key prefix for job records
    pub key_prefix: String,
}

impl Default for JobStoreConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            key_prefix: "fileforge:job".to_string(),
        }
    }
}

impl JobStoreConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| "redis://localhost:6379".to_string()),
            key_prefix: std::env::var("JOBSTORE_KEY_PREFIX")
                .unwrap_or_else(|_| "fileforge:job".to_string()),
        }
    }
}

/// Redis-backed job record store.
#[derive(Clone)]
pub struct RedisJobStore {
    client: redis::Client,
    key_prefix: String,
}

impl RedisJobStore {
    /// Create a new store.
    pub fn new(config: JobStoreConfig) -> JobStoreResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;
        Ok(Self {
            client,
            key_prefix: config.key_prefix,
        })
    }

    /// Create from environment variables.
    pub fn from_env() -> JobStoreResult<Self> {
        Self::new(JobStoreConfig::from_env())
    }

    fn record_key(&self, job_id: &str) -> String {
        format!("{}:{}", self.key_prefix, job_id)
    }

    /// Write a full record. Used by the upload side and tests.
    pub async fn put_record(&self, record: &JobRecord) -> JobStoreResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(record)?;
        conn.set::<_, _, ()>(self.record_key(&record.job_id), payload)
            .await?;
        Ok(())
    }

    async fn load(&self, job_id: &str) -> JobStoreResult<Option<JobRecord>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(self.record_key(job_id)).await?;
        match payload {
            Some(json) => Ok(Some(serde_json::from_str(&json)?)),
            None => Ok(None),
        }
    }
}

#[async_trait::async_trait]
impl JobStore for RedisJobStore {
    async fn get_record(&self, job_id: &str) -> JobStoreResult<JobRecord> {
        self.load(job_id)
            .await?
            .ok_or_else(|| JobStoreError::not_found(job_id))
    }

    async fn update_status(&self, job_id: &str, update: StatusUpdate) -> JobStoreResult<()> {
        let mut record = self
            .load(job_id)
            .await?
            .unwrap_or_else(|| JobRecord::new(job_id));

        if !record.apply_update(&update) {
            warn!(
                job_id = %job_id,
                status = %record.status,
                requested = %update.status,
                "Dropping status update for terminal job"
            );
            return Ok(());
        }

        debug!(
            job_id = %job_id,
            status = %record.status,
            progress = record.progress,
            "Persisting status update"
        );
        self.put_record(&record).await
    }
}
