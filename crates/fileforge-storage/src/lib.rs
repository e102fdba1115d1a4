//! S3-compatible blob storage.
//!
//! This crate provides:
//! - Byte-level get/put of stored objects
//! - Deterministic download URL generation
//! - Connectivity checks for startup probes

pub mod client;
pub mod error;

pub use client::{S3BlobStore, S3Config};
pub use error::{StorageError, StorageResult};

use async_trait::async_trait;

/// The storage contract the pipeline depends on.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Fetch an object's bytes. Fails with `StorageError::NotFound` if the
    /// key does not exist.
    async fn get_file(&self, key: &str) -> StorageResult<Vec<u8>>;

    /// Store an object with the given content type.
    async fn put_file(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> StorageResult<()>;

    /// Build the public download URL for a key. Pure, no I/O.
    fn generate_download_url(&self, key: &str) -> String;
}
