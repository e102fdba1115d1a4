//! Transformation strategies for the fileforge pipeline.
//!
//! This crate provides:
//! - The `FileProcessor` strategy trait and the ordered registry
//! - Image, PDF, video, audio and ebook strategy families
//! - An FFmpeg command builder/runner shared by the audio and video
//!   strategies
//!
//! Strategies translate a `(bytes, JobMessage)` pair into a
//! `ProcessingResult`; codec internals live in the backends (the `image`
//! crate, `lopdf`, FFmpeg, `ebook-convert`).

pub mod audio;
pub mod command;
pub mod ebook;
pub mod error;
pub mod image;
pub mod pdf;
pub mod processor;
pub mod video;

pub use audio::{AudioEncodeParams, AudioProcessor};
pub use command::FfmpegCommand;
pub use ebook::EbookProcessor;
pub use error::{ProcessorError, ProcessorResult};
pub use image::{ImageEncodeParams, ImageProcessor, ImageTarget};
pub use pdf::{PdfCompressParams, PdfProcessor};
pub use processor::{FileProcessor, ProcessorRegistry};
pub use video::{VideoEncodeParams, VideoProcessor};
