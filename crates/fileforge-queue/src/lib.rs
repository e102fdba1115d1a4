//! SQS job message queue.
//!
//! This crate provides:
//! - Long-poll message consumption (at most one message per poll)
//! - Idempotent message deletion
//! - Job message enqueueing for the upload side and tests
//!
//! Delivery is at-least-once; mutual exclusion across worker instances
//! relies on the queue's visibility timeout, not on anything in this crate.

pub mod error;
pub mod queue;

pub use error::{QueueError, QueueResult};
pub use queue::{QueueConfig, RawMessage, SqsQueue};

use async_trait::async_trait;

/// The queue contract the worker loop depends on.
#[async_trait]
pub trait MessageQueue: Send + Sync {
    /// Long-poll for queued messages. Returns zero or one message.
    async fn poll_messages(&self) -> QueueResult<Vec<RawMessage>>;

    /// Delete a received message. Safe to call twice on the same receipt.
    async fn delete_message(&self, receipt: &str) -> QueueResult<()>;
}
