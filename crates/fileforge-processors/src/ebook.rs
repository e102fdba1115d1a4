//! Ebook conversion via the calibre command-line converter.

use std::process::Stdio;
use std::sync::OnceLock;

use async_trait::async_trait;
use regex::Regex;
use tokio::process::Command;
use tracing::{debug, info, warn};

use fileforge_models::{
    content_type_for_extension, normalize_extension, JobMessage, Operation, ProcessingResult,
    EBOOK_FORMATS,
};

use crate::error::{ProcessorError, ProcessorResult};
use crate::processor::FileProcessor;

const TOOL: &str = "ebook-convert";

/// Ebook strategy: convert between ebook formats, convert only.
///
/// Delegates to `ebook-convert`. When the tool is missing, the txt target
/// gets a degraded tag-stripping fallback; every other target falls back
/// to the original bytes relabeled with the target content type.
#[derive(Debug, Clone, Copy, Default)]
pub struct EbookProcessor;

impl EbookProcessor {
    pub fn new() -> Self {
        Self
    }

    fn converter_available() -> bool {
        which::which(TOOL).is_ok()
    }
}

#[async_trait]
impl FileProcessor for EbookProcessor {
    fn name(&self) -> &'static str {
        "ebook"
    }

    fn can_process(&self, operation: Operation, target_format: Option<&str>) -> bool {
        operation == Operation::Convert
            && target_format
                .map(|f| EBOOK_FORMATS.contains(&normalize_extension(f).as_str()))
                .unwrap_or(false)
    }

    async fn process(&self, input: &[u8], message: &JobMessage) -> ProcessorResult<ProcessingResult> {
        let target = message
            .target_format
            .as_deref()
            .map(normalize_extension)
            .ok_or_else(|| ProcessorError::unsupported_format("missing ebook target format"))?;

        if !Self::converter_available() {
            return fallback_convert(input, &target);
        }

        let source_ext = detect_source_extension(input);
        let scratch = tempfile::tempdir()?;
        let input_path = scratch.path().join(format!("source.{}", source_ext));
        let output_path = scratch.path().join(format!("output.{}", target));

        tokio::fs::write(&input_path, input).await?;

        info!("Converting ebook {} -> {}", source_ext, target);
        let output = Command::new(TOOL)
            .arg(&input_path)
            .arg(&output_path)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .output()
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ProcessorError::tool_failed(
                TOOL,
                format!("exited with {}", output.status),
                (!stderr.is_empty()).then_some(stderr),
                output.status.code(),
            ));
        }

        let bytes = tokio::fs::read(&output_path).await?;
        Ok(ProcessingResult::new(
            bytes,
            content_type_for_extension(&target),
            target,
        ))
    }
}

/// Degraded path used when the converter is not installed.
fn fallback_convert(input: &[u8], target: &str) -> ProcessorResult<ProcessingResult> {
    if target == "txt" {
        warn!("{} unavailable, producing plain text by tag stripping", TOOL);
        let text = strip_html_tags(&String::from_utf8_lossy(input));
        return Ok(ProcessingResult::new(
            text.into_bytes(),
            content_type_for_extension("txt"),
            "txt",
        ));
    }

    warn!(
        "{} unavailable, passing original bytes through relabeled as {}",
        TOOL, target
    );
    Ok(ProcessingResult::new(
        input.to_vec(),
        content_type_for_extension(target),
        target.to_string(),
    ))
}

/// Guess an input extension from magic bytes so the converter can pick a
/// reader. Unknown input is treated as HTML.
fn detect_source_extension(input: &[u8]) -> &'static str {
    if input.starts_with(b"%PDF") {
        "pdf"
    } else if input.starts_with(b"PK") {
        "epub"
    } else if input.starts_with(b"{\\rtf") {
        "rtf"
    } else if input.len() > 68 && &input[60..68] == b"BOOKMOBI" {
        "mobi"
    } else {
        "html"
    }
}

/// Naive tag stripping for the txt fallback.
pub fn strip_html_tags(input: &str) -> String {
    static TAG: OnceLock<Regex> = OnceLock::new();
    let tag = TAG.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"));

    let without_tags = tag.replace_all(input, " ");
    let decoded = without_tags
        .replace("&nbsp;", " ")
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'");

    let text: String = decoded
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n");

    debug!("Stripped HTML down to {} chars", text.len());
    text
}
