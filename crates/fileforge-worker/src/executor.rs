//! Polling worker loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, warn};

use fileforge_jobstore::JobStore;
use fileforge_queue::MessageQueue;
use fileforge_storage::BlobStorage;

use crate::error::WorkerResult;
use crate::handler::MessageHandler;

/// Externally driven loop state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Running,
    Stopping,
}

/// The polling loop that drains the queue and hands each message to the
/// handler.
///
/// Every received message is deleted after handling, whether handling
/// succeeded or not. A failed job is terminal; redelivery would only
/// fail it again.
pub struct WorkerLoop<Q, B, J> {
    queue: Arc<Q>,
    handler: MessageHandler<B, J>,
    poll_interval: Duration,
    lifecycle_tx: watch::Sender<Lifecycle>,
    lifecycle_rx: watch::Receiver<Lifecycle>,
}

impl<Q, B, J> WorkerLoop<Q, B, J>
where
    Q: MessageQueue,
    B: BlobStorage,
    J: JobStore,
{
    pub fn new(queue: Arc<Q>, handler: MessageHandler<B, J>, poll_interval: Duration) -> Self {
        let (lifecycle_tx, lifecycle_rx) = watch::channel(Lifecycle::Running);
        Self {
            queue,
            handler,
            poll_interval,
            lifecycle_tx,
            lifecycle_rx,
        }
    }

    /// Handle for requesting shutdown from another task.
    pub fn shutdown_handle(&self) -> ShutdownHandle {
        ShutdownHandle {
            tx: self.lifecycle_tx.clone(),
        }
    }

    /// One poll cycle: receive, handle, delete.
    ///
    /// Handler failures are logged and counted but never abort the cycle;
    /// queue receive failures are returned so the caller can back off.
    pub async fn poll_once(&self) -> WorkerResult<usize> {
        let messages = self.queue.poll_messages().await?;
        let count = messages.len();

        for message in messages {
            match self.handler.handle(&message.body).await {
                Ok(()) => {
                    metrics::counter!("fileforge_jobs_succeeded_total").increment(1);
                }
                Err(err) => {
                    metrics::counter!("fileforge_jobs_failed_total").increment(1);
                    error!("Job handling failed: {}", err);
                }
            }

            // Delete regardless of outcome; the job record already reflects it.
            if let Err(err) = self.queue.delete_message(&message.receipt).await {
                warn!("Failed to delete message: {}", err);
            }
        }

        Ok(count)
    }

    /// Run until a shutdown is requested.
    pub async fn run(&self) {
        info!(
            poll_interval_secs = self.poll_interval.as_secs(),
            "Worker loop started"
        );
        let mut lifecycle = self.lifecycle_rx.clone();

        loop {
            if *lifecycle.borrow() == Lifecycle::Stopping {
                break;
            }

            match self.poll_once().await {
                Ok(0) => debug!("Queue empty"),
                Ok(n) => debug!(count = n, "Handled messages"),
                Err(err) => error!("Poll cycle failed: {}", err),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.poll_interval) => {}
                _ = lifecycle.changed() => {}
            }
        }

        info!("Worker loop stopped");
    }
}

/// Clonable handle used to stop a running [`WorkerLoop`].
#[derive(Debug, Clone)]
pub struct ShutdownHandle {
    tx: watch::Sender<Lifecycle>,
}

impl ShutdownHandle {
    pub fn stop(&self) {
        // Send only fails when the loop is already gone.
        let _ = self.tx.send(Lifecycle::Stopping);
    }
}
