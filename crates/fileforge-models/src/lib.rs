//! Shared data models for the fileforge pipeline.
//!
//! This crate provides:
//! - Queue message and job record types
//! - Job status state machine with transition guards
//! - Compression metrics
//! - Format tables and output key conventions

pub mod formats;
pub mod message;
pub mod record;
pub mod result;

pub use formats::{
    content_type_for_extension, normalize_extension, output_key, AUDIO_TARGETS, EBOOK_FORMATS,
    IMAGE_FORMATS, VIDEO_TARGETS,
};
pub use message::{JobMessage, Operation};
pub use record::{compression_savings, CompressionMetrics, JobRecord, JobStatus, StatusUpdate};
pub use result::ProcessingResult;
