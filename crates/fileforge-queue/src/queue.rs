//! SQS queue client.

use aws_config::BehaviorVersion;
use aws_sdk_sqs::Client;
use tracing::{debug, info, warn};

use fileforge_models::JobMessage;

use crate::error::{QueueError, QueueResult};
use crate::MessageQueue;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Queue URL
    pub queue_url: String,
    /// Long-poll wait time in seconds
    pub wait_time_secs: u16,
    /// Optional endpoint override (local stacks)
    pub endpoint_url: Option<String>,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            queue_url: "http://localhost:4566/000000000000/fileforge-jobs".to_string(),
            wait_time_secs: 20,
            endpoint_url: None,
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> QueueResult<Self> {
        Ok(Self {
            queue_url: std::env::var("SQS_QUEUE_URL")
                .map_err(|_| QueueError::config_error("SQS_QUEUE_URL not set"))?,
            wait_time_secs: std::env::var("SQS_WAIT_TIME_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(20),
            endpoint_url: std::env::var("SQS_ENDPOINT_URL").ok(),
        })
    }
}

/// A received queue message, not yet interpreted.
#[derive(Debug, Clone)]
pub struct RawMessage {
    /// Receipt handle used to delete the message
    pub receipt: String,
    /// Raw JSON payload
    pub body: String,
}

/// SQS-backed job queue client.
#[derive(Clone)]
pub struct SqsQueue {
    client: Client,
    config: QueueConfig,
}

impl SqsQueue {
    /// Create a new queue client.
    pub async fn new(config: QueueConfig) -> Self {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }
        let sdk_config = loader.load().await;

        Self {
            client: Client::new(&sdk_config),
            config,
        }
    }

    /// Create from environment variables.
    pub async fn from_env() -> QueueResult<Self> {
        Ok(Self::new(QueueConfig::from_env()?).await)
    }

    /// Enqueue a job message.
    pub async fn send_message(&self, message: &JobMessage) -> QueueResult<()> {
        let payload = serde_json::to_string(message)?;

        self.client
            .send_message()
            .queue_url(&self.config.queue_url)
            .message_body(payload)
            .send()
            .await
            .map_err(|e| QueueError::send_failed(e.to_string()))?;

        info!("Enqueued job {}", message.job_id);
        Ok(())
    }

    /// Long-poll for a single message.
    pub async fn receive(&self) -> QueueResult<Vec<RawMessage>> {
        let response = self
            .client
            .receive_message()
            .queue_url(&self.config.queue_url)
            .max_number_of_messages(1)
            .wait_time_seconds(self.config.wait_time_secs as i32)
            .send()
            .await
            .map_err(|e| QueueError::receive_failed(e.to_string()))?;

        let messages: Vec<RawMessage> = response
            .messages
            .unwrap_or_default()
            .into_iter()
            .filter_map(|m| {
                let receipt = m.receipt_handle?;
                let body = m.body?;
                Some(RawMessage { receipt, body })
            })
            .collect();

        if !messages.is_empty() {
            debug!("Received {} message(s)", messages.len());
        }

        Ok(messages)
    }

    /// Delete a message by receipt handle.
    ///
    /// Receipts that are already gone or expired are treated as deleted.
    pub async fn delete(&self, receipt: &str) -> QueueResult<()> {
        let result = self
            .client
            .delete_message()
            .queue_url(&self.config.queue_url)
            .receipt_handle(receipt)
            .send()
            .await;

        match result {
            Ok(_) => {
                debug!("Deleted message");
                Ok(())
            }
            Err(e) => {
                let text = e.to_string();
                if text.contains("ReceiptHandleIsInvalid") || text.contains("InvalidParameterValue")
                {
                    warn!("Receipt handle no longer valid, treating as deleted");
                    Ok(())
                } else {
                    Err(QueueError::delete_failed(text))
                }
            }
        }
    }
}

#[async_trait::async_trait]
impl MessageQueue for SqsQueue {
    async fn poll_messages(&self) -> QueueResult<Vec<RawMessage>> {
        self.receive().await
    }

    async fn delete_message(&self, receipt: &str) -> QueueResult<()> {
        self.delete(receipt).await
    }
}
