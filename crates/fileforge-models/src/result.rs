//! Strategy output.

/// The transient product of a processing strategy.
///
/// Persisted to blob storage immediately after the strategy returns and
/// then discarded.
#[derive(Debug, Clone)]
pub struct ProcessingResult {
    /// Processed file contents
    pub bytes: Vec<u8>,
    /// MIME type of the processed file
    pub content_type: String,
    /// Extension used to build the output key, without a leading dot
    pub file_extension: String,
}

impl ProcessingResult {
    pub fn new(bytes: Vec<u8>, content_type: impl Into<String>, file_extension: impl Into<String>) -> Self {
        Self {
            bytes,
            content_type: content_type.into(),
            file_extension: file_extension.into(),
        }
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}
