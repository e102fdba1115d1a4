//! Audio conversion via FFmpeg.

use async_trait::async_trait;
use tracing::info;

use fileforge_models::{
    content_type_for_extension, normalize_extension, JobMessage, Operation, ProcessingResult,
    AUDIO_TARGETS,
};

use crate::command::FfmpegCommand;
use crate::error::{ProcessorError, ProcessorResult};
use crate::processor::FileProcessor;

/// Per-format bitrate ceiling in kbps. Lossless targets have none.
pub fn bitrate_ceiling_kbps(target: &str) -> Option<u32> {
    match target {
        "mp3" => Some(320),
        "ogg" => Some(500),
        "aac" => Some(256),
        "m4a" => Some(256),
        "wma" => Some(192),
        // wav and flac are lossless; bitrate does not apply
        _ => None,
    }
}

fn audio_codec(target: &str) -> Option<&'static str> {
    match target {
        "mp3" => Some("libmp3lame"),
        "wav" => Some("pcm_s16le"),
        "ogg" => Some("libvorbis"),
        "flac" => Some("flac"),
        "aac" => Some("aac"),
        "m4a" => Some("aac"),
        "wma" => Some("wmav2"),
        _ => None,
    }
}

/// Encoding parameters derived from a job message.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioEncodeParams {
    pub target: String,
    pub codec: &'static str,
    /// Lossy targets: quality fraction of the format ceiling
    pub bitrate_kbps: Option<u32>,
    /// FLAC only: encoder effort derived from the inverse of quality
    pub flac_compression_level: Option<u8>,
}

impl AudioEncodeParams {
    pub fn for_message(message: &JobMessage) -> ProcessorResult<Self> {
        let target = message
            .target_format
            .as_deref()
            .map(normalize_extension)
            .ok_or_else(|| ProcessorError::unsupported_format("missing audio target format"))?;

        let codec =
            audio_codec(&target).ok_or_else(|| ProcessorError::unsupported_format(&target))?;

        let quality = message.quality_clamped();
        let bitrate_kbps = bitrate_ceiling_kbps(&target)
            .map(|ceiling| ((quality as f64 / 100.0) * ceiling as f64).round() as u32);

        let flac_compression_level = (target == "flac")
            .then(|| (((100 - quality) as f64 / 100.0) * 12.0).round() as u8);

        Ok(Self {
            target,
            codec,
            bitrate_kbps,
            flac_compression_level,
        })
    }
}

/// Audio strategy: convert to a different audio format, convert only.
#[derive(Debug, Clone, Copy, Default)]
pub struct AudioProcessor;

impl AudioProcessor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl FileProcessor for AudioProcessor {
    fn name(&self) -> &'static str {
        "audio"
    }

    fn can_process(&self, operation: Operation, target_format: Option<&str>) -> bool {
        operation == Operation::Convert
            && target_format
                .map(|f| AUDIO_TARGETS.contains(&normalize_extension(f).as_str()))
                .unwrap_or(false)
    }

    async fn process(&self, input: &[u8], message: &JobMessage) -> ProcessorResult<ProcessingResult> {
        let params = AudioEncodeParams::for_message(message)?;

        let scratch = tempfile::tempdir()?;
        let input_path = scratch.path().join("source");
        let output_path = scratch.path().join(format!("output.{}", params.target));

        tokio::fs::write(&input_path, input).await?;

        info!(
            "Transcoding audio to {} ({}, {:?} kbps)",
            params.target, params.codec, params.bitrate_kbps
        );

        let mut cmd = FfmpegCommand::new(&input_path, &output_path)
            .no_video()
            .audio_codec(params.codec);
        if let Some(kbps) = params.bitrate_kbps {
            cmd = cmd.audio_bitrate(format!("{}k", kbps));
        }
        if let Some(level) = params.flac_compression_level {
            cmd = cmd.compression_level(level);
        }
        cmd.run().await?;

        let bytes = tokio::fs::read(&output_path).await?;
        let ext = params.target;

        Ok(ProcessingResult::new(
            bytes,
            content_type_for_extension(&ext),
            ext,
        ))
    }
}
