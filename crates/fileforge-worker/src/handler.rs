//! Per-message state machine.

use std::sync::Arc;

use fileforge_jobstore::JobStore;
use fileforge_models::{
    content_type_for_extension, output_key, CompressionMetrics, JobMessage, JobStatus, Operation,
    StatusUpdate,
};
use fileforge_processors::ProcessorRegistry;
use fileforge_storage::BlobStorage;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// Drives a single queue message through the job state machine.
///
/// The registry and collaborators are injected; the handler owns no
/// global state and returns an explicit result so failures are
/// observable at the loop.
pub struct MessageHandler<B, J> {
    registry: ProcessorRegistry,
    storage: Arc<B>,
    jobs: Arc<J>,
}

impl<B, J> MessageHandler<B, J>
where
    B: BlobStorage,
    J: JobStore,
{
    pub fn new(registry: ProcessorRegistry, storage: Arc<B>, jobs: Arc<J>) -> Self {
        Self {
            registry,
            storage,
            jobs,
        }
    }

    /// Handle one raw queue payload.
    ///
    /// Any error is first converted, best-effort, into a FAILED status
    /// update for the job the payload names, then returned to the caller.
    /// Message deletion is the caller's duty and happens in every case.
    pub async fn handle(&self, body: &str) -> WorkerResult<()> {
        match self.process(body).await {
            Ok(()) => Ok(()),
            Err(err) => {
                self.mark_failed(body).await;
                Err(err)
            }
        }
    }

    async fn process(&self, body: &str) -> WorkerResult<()> {
        let message = JobMessage::parse(body)?;
        let logger = JobLogger::new(&message.job_id, message.operation.as_str());
        logger.log_start(&format!(
            "operation={} target={:?} quality={}",
            message.operation, message.target_format, message.quality
        ));

        let processor = self
            .registry
            .find(message.operation, message.target_format.as_deref())
            .ok_or_else(|| {
                WorkerError::no_processor(
                    message.operation.as_str(),
                    message.target_format.as_deref(),
                )
            })?;

        self.update(&message.job_id, JobStatus::Processing, 0, None, None)
            .await?;

        let record = self.jobs.get_record(&message.job_id).await?;
        let blob_key = record
            .blob_key
            .as_deref()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| {
                WorkerError::not_found(format!(
                    "Job record {} has no source blob key",
                    message.job_id
                ))
            })?;

        let input = self.storage.get_file(blob_key).await?;
        let original_size = input.len() as u64;
        self.update(&message.job_id, JobStatus::Processing, 25, None, None)
            .await?;
        logger.log_progress(&format!(
            "fetched {} bytes, dispatching to '{}'",
            original_size,
            processor.name()
        ));

        let result = processor.process(&input, &message).await?;
        self.update(&message.job_id, JobStatus::Processing, 75, None, None)
            .await?;

        let metrics = match message.operation {
            Operation::Compress => Some(CompressionMetrics::new(original_size, result.size())),
            Operation::Convert => None,
        };

        let key = output_key(&message.job_id, message.operation, &result.file_extension);
        let content_type = if result.content_type.is_empty() {
            content_type_for_extension(&result.file_extension).to_string()
        } else {
            result.content_type.clone()
        };
        self.storage
            .put_file(&key, result.bytes, &content_type)
            .await?;
        let download_url = self.storage.generate_download_url(&key);

        self.update(
            &message.job_id,
            JobStatus::Processing,
            90,
            Some(download_url.clone()),
            metrics,
        )
        .await?;
        self.update(
            &message.job_id,
            JobStatus::Completed,
            100,
            Some(download_url),
            metrics,
        )
        .await?;

        logger.log_completion(&format!("stored {}", key));
        Ok(())
    }

    async fn update(
        &self,
        job_id: &str,
        status: JobStatus,
        progress: u8,
        download_url: Option<String>,
        metrics: Option<CompressionMetrics>,
    ) -> WorkerResult<()> {
        let mut update = StatusUpdate::new(status).with_progress(progress);
        if let Some(url) = download_url {
            update = update.with_download_url(url);
        }
        if let Some(m) = metrics {
            update = update.with_metrics(m);
        }
        self.jobs.update_status(job_id, update).await?;
        Ok(())
    }

    /// Best-effort FAILED update. If the payload does not even yield a
    /// job id, the update is skipped; the message still gets deleted.
    async fn mark_failed(&self, body: &str) {
        let Some(job_id) = JobMessage::recover_job_id(body) else {
            tracing::warn!("Could not recover job id from payload, skipping status update");
            return;
        };

        let update = StatusUpdate::new(JobStatus::Failed).with_progress(0);
        if let Err(err) = self.jobs.update_status(&job_id, update).await {
            tracing::warn!(job_id = %job_id, "Failed to record FAILED status: {}", err);
        }
    }
}
