//! PDF compression via lopdf.

use async_trait::async_trait;
use lopdf::{Document, Object};
use tracing::{debug, info};

use fileforge_models::{normalize_extension, JobMessage, Operation, ProcessingResult};

use crate::error::{ProcessorError, ProcessorResult};
use crate::processor::FileProcessor;

const METADATA_KEYS: [&[u8]; 4] = [b"Title", b"Author", b"Subject", b"Keywords"];

/// Compression parameters derived from a job message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PdfCompressParams {
    /// Drop document info metadata (title/author/subject/keywords)
    pub strip_metadata: bool,
    /// Repack streams compressed; slower writes, smaller output
    pub use_object_streams: bool,
}

impl PdfCompressParams {
    pub fn for_quality(quality: u8) -> Self {
        Self {
            strip_metadata: quality < 90,
            use_object_streams: quality > 50,
        }
    }
}

/// PDF strategy: compress only.
///
/// Images embedded in the document are not re-encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct PdfProcessor;

impl PdfProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileProcessor for PdfProcessor {
    fn name(&self) -> &'static str {
        "pdf"
    }

    fn can_process(&self, operation: Operation, target_format: Option<&str>) -> bool {
        operation == Operation::Compress
            && target_format.map(|f| normalize_extension(f) == "pdf").unwrap_or(false)
    }

    async fn process(&self, input: &[u8], message: &JobMessage) -> ProcessorResult<ProcessingResult> {
        let params = PdfCompressParams::for_quality(message.quality_clamped());

        let mut doc = Document::load_mem(input)
            .map_err(|e| ProcessorError::decode(format!("PDF parse failed: {}", e)))?;

        if params.strip_metadata {
            strip_info_metadata(&mut doc);
        }

        if params.use_object_streams {
            doc.compress();
        }

        let mut out = Vec::new();
        doc.save_to(&mut out)?;

        info!(
            "Compressed PDF {} -> {} bytes (strip_metadata={}, object_streams={})",
            input.len(),
            out.len(),
            params.strip_metadata,
            params.use_object_streams
        );

        Ok(ProcessingResult::new(out, "application/pdf", "pdf"))
    }
}

/// Remove identifying keys from the document info dictionary.
fn strip_info_metadata(doc: &mut Document) {
    let info_id = doc
        .trailer
        .get(b"Info")
        .ok()
        .and_then(|obj| obj.as_reference().ok());

    if let Some(id) = info_id {
        if let Ok(Object::Dictionary(info)) = doc.get_object_mut(id) {
            for key in METADATA_KEYS {
                if info.remove(key).is_some() {
                    debug!("Stripped PDF metadata key {}", String::from_utf8_lossy(key));
                }
            }
        }
    }
}
