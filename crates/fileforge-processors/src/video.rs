//! Video conversion via FFmpeg.

use async_trait::async_trait;
use tracing::info;

use fileforge_models::{
    content_type_for_extension, normalize_extension, JobMessage, Operation, ProcessingResult,
    VIDEO_TARGETS,
};

use crate::command::FfmpegCommand;
use crate::error::{ProcessorError, ProcessorResult};
use crate::processor::FileProcessor;

/// Target bitrate in kbps: linear 1-8 Mbps across the quality range.
pub fn video_bitrate_kbps(quality: u8) -> u32 {
    1000 + ((quality.min(100) as f64 / 100.0) * 7000.0).round() as u32
}

/// CRF for H.264 targets, derived from quality.
pub fn h264_crf(quality: u8) -> u8 {
    (51.0 - (quality.min(100) as f64 / 100.0) * 28.0).round() as u8
}

/// Codec pairing fixed per target container.
fn codec_pair(container: &str) -> Option<(&'static str, &'static str)> {
    match container {
        "mp4" => Some(("libx264", "aac")),
        "webm" => Some(("libvpx-vp9", "libopus")),
        "mov" => Some(("libx264", "aac")),
        "avi" => Some(("mpeg4", "libmp3lame")),
        "mkv" => Some(("libx264", "aac")),
        "flv" => Some(("flv", "libmp3lame")),
        "wmv" => Some(("wmv2", "wmav2")),
        _ => None,
    }
}

/// Encoding parameters derived from a job message.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoEncodeParams {
    pub container: String,
    pub video_codec: &'static str,
    pub audio_codec: &'static str,
    pub video_bitrate_kbps: u32,
    pub audio_bitrate: &'static str,
    /// Set for H.264 targets only
    pub crf: Option<u8>,
}

impl VideoEncodeParams {
    pub fn for_message(message: &JobMessage) -> ProcessorResult<Self> {
        let container = message
            .target_format
            .as_deref()
            .map(normalize_extension)
            .ok_or_else(|| ProcessorError::unsupported_format("missing video target format"))?;

        let (video_codec, audio_codec) =
            codec_pair(&container).ok_or_else(|| ProcessorError::unsupported_format(&container))?;

        let quality = message.quality_clamped();

        Ok(Self {
            video_bitrate_kbps: video_bitrate_kbps(quality),
            audio_bitrate: if quality > 50 { "128k" } else { "96k" },
            crf: (video_codec == "libx264").then(|| h264_crf(quality)),
            container,
            video_codec,
            audio_codec,
        })
    }
}

/// Video strategy: convert to a different container, convert only.
#[derive(Debug, Clone, Copy, Default)]
pub struct VideoProcessor;

impl VideoProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileProcessor for VideoProcessor {
    fn name(&self) -> &'static str {
        "video"
    }

    fn can_process(&self, operation: Operation, target_format: Option<&str>) -> bool {
        operation == Operation::Convert
            && target_format
                .map(|f| VIDEO_TARGETS.contains(&normalize_extension(f).as_str()))
                .unwrap_or(false)
    }

    async fn process(&self, input: &[u8], message: &JobMessage) -> ProcessorResult<ProcessingResult> {
        let params = VideoEncodeParams::for_message(message)?;

        // Scratch files are scoped to the temp dir, which is removed on
        // drop whether the transform succeeds or not.
        let scratch = tempfile::tempdir()?;
        let input_path = scratch.path().join("source");
        let output_path = scratch.path().join(format!("output.{}", params.container));

        tokio::fs::write(&input_path, input).await?;

        info!(
            "Transcoding to {} ({}/{}, {} kbps)",
            params.container, params.video_codec, params.audio_codec, params.video_bitrate_kbps
        );

        let mut cmd = FfmpegCommand::new(&input_path, &output_path)
            .video_codec(params.video_codec)
            .audio_codec(params.audio_codec)
            .video_bitrate_kbps(params.video_bitrate_kbps)
            .audio_bitrate(params.audio_bitrate);
        if let Some(crf) = params.crf {
            cmd = cmd.crf(crf);
        }
        cmd.run().await?;

        let bytes = tokio::fs::read(&output_path).await?;
        let ext = params.container;

        Ok(ProcessingResult::new(
            bytes,
            content_type_for_extension(&ext),
            ext,
        ))
    }
}
