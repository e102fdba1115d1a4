//! Strategy trait and ordered registry.

use std::sync::Arc;

use async_trait::async_trait;

use fileforge_models::{JobMessage, Operation, ProcessingResult};

use crate::audio::AudioProcessor;
use crate::ebook::EbookProcessor;
use crate::error::ProcessorResult;
use crate::image::ImageProcessor;
use crate::pdf::PdfProcessor;
use crate::video::VideoProcessor;

/// A transformation strategy bound to specific (operation, format) pairs.
#[async_trait]
pub trait FileProcessor: Send + Sync {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// Whether this strategy accepts the operation and format hint. For
    /// convert the hint is the target format; compress messages may carry
    /// no hint at all.
    fn can_process(&self, operation: Operation, target_format: Option<&str>) -> bool;

    /// Run the transformation. Tool and codec failures surface as
    /// `ProcessorError`, never as a panic.
    async fn process(&self, input: &[u8], message: &JobMessage) -> ProcessorResult<ProcessingResult>;
}

/// Ordered set of strategies queried first-match-wins.
///
/// The list is built by the caller and injected into the worker; there is
/// no global registry.
#[derive(Clone, Default)]
pub struct ProcessorRegistry {
    processors: Vec<Arc<dyn FileProcessor>>,
}

impl ProcessorRegistry {
    pub fn new() -> Self {
        Self {
            processors: Vec::new(),
        }
    }

    /// Registry with the stock strategy families in their canonical order:
    /// image, pdf, video, audio, ebook.
    pub fn with_default_processors() -> Self {
        let mut registry = Self::new();
        registry.register(Arc::new(ImageProcessor::new()));
        registry.register(Arc::new(PdfProcessor::new()));
        registry.register(Arc::new(VideoProcessor::new()));
        registry.register(Arc::new(AudioProcessor::new()));
        registry.register(Arc::new(EbookProcessor::new()));
        registry
    }

    /// Append a strategy; registration order is dispatch order.
    pub fn register(&mut self, processor: Arc<dyn FileProcessor>) {
        self.processors.push(processor);
    }

    /// First strategy accepting the (operation, format) pair, if any.
    pub fn find(
        &self,
        operation: Operation,
        target_format: Option<&str>,
    ) -> Option<Arc<dyn FileProcessor>> {
        self.processors
            .iter()
            .find(|p| p.can_process(operation, target_format))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.processors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processors.is_empty()
    }
}
