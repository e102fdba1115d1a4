//! Image conversion and compression.

use std::io::Cursor;

use async_trait::async_trait;
use image::codecs::bmp::BmpEncoder;
use image::codecs::gif::GifEncoder;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType as PngFilterType, PngEncoder};
use image::codecs::tiff::TiffEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, ImageFormat};
use tracing::debug;

use fileforge_models::{
    content_type_for_extension, normalize_extension, JobMessage, Operation, ProcessingResult,
    IMAGE_FORMATS,
};

use crate::error::{ProcessorError, ProcessorResult};
use crate::processor::FileProcessor;

/// The encoder family a processed image is written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageTarget {
    Jpg,
    Png,
    Webp,
    Gif,
    Tiff,
    Bmp,
}

impl ImageTarget {
    /// Target for a requested extension.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match normalize_extension(ext).as_str() {
            "jpg" => Some(Self::Jpg),
            "png" => Some(Self::Png),
            "webp" => Some(Self::Webp),
            "gif" => Some(Self::Gif),
            "tiff" => Some(Self::Tiff),
            "bmp" => Some(Self::Bmp),
            _ => None,
        }
    }

    /// Target for a detected source format. Unknown and legacy formats
    /// fall back to WebP.
    pub fn from_detected(format: ImageFormat) -> Self {
        match format {
            ImageFormat::Jpeg => Self::Jpg,
            ImageFormat::Png => Self::Png,
            ImageFormat::WebP => Self::Webp,
            ImageFormat::Gif => Self::Gif,
            ImageFormat::Tiff => Self::Tiff,
            ImageFormat::Bmp => Self::Bmp,
            _ => Self::Webp,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
            Self::Gif => "gif",
            Self::Tiff => "tiff",
            Self::Bmp => "bmp",
        }
    }
}

/// Encoding parameters derived from a job message.
///
/// Computed separately from the encode call so the parameter rules can be
/// checked without running any codec.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageEncodeParams {
    pub target: ImageTarget,
    pub quality: u8,
    /// Dimension scale factor applied before encoding, if any
    pub scale: Option<f64>,
    /// JPEG: progressive encoding
    pub progressive: bool,
    /// PNG: palette (indexed) output
    pub png_palette: bool,
    /// PNG: zlib compression level
    pub png_compression_level: u8,
    /// GIF: palette size
    pub gif_colors: u16,
}

impl ImageEncodeParams {
    /// Derive parameters from the detected source format and the message.
    pub fn for_message(detected: Option<ImageFormat>, message: &JobMessage) -> Self {
        let quality = message.quality_clamped();

        // Compress keeps the detected source format; convert honors the
        // requested target.
        let target = match message.operation {
            Operation::Convert => message
                .target_format
                .as_deref()
                .and_then(ImageTarget::from_extension)
                .unwrap_or(ImageTarget::Webp),
            Operation::Compress => detected
                .map(ImageTarget::from_detected)
                .unwrap_or(ImageTarget::Webp),
        };

        // Low-quality compression also shrinks dimensions.
        let scale = match message.operation {
            Operation::Compress if quality < 70 => {
                Some(if quality >= 50 { 0.9 } else { 0.8 })
            }
            _ => None,
        };

        Self {
            target,
            quality,
            scale,
            progressive: quality > 60,
            png_palette: quality < 50,
            png_compression_level: if quality > 80 { 9 } else { 6 },
            gif_colors: if quality < 50 {
                64
            } else if quality < 80 {
                128
            } else {
                256
            },
        }
    }
}

/// Image strategy: convert or compress raster images.
#[derive(Debug, Clone, Copy, Default)]
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    fn is_image_format(format: &str) -> bool {
        let normalized = normalize_extension(format);
        IMAGE_FORMATS.contains(&normalized.as_str())
    }
}

#[async_trait]
impl FileProcessor for ImageProcessor {
    fn name(&self) -> &'static str {
        "image"
    }

    fn can_process(&self, operation: Operation, target_format: Option<&str>) -> bool {
        match operation {
            Operation::Convert => target_format.is_some_and(Self::is_image_format),
            // Compress messages without a format hint land here; the
            // encoder is picked from the detected source format.
            Operation::Compress => target_format.map_or(true, Self::is_image_format),
        }
    }

    async fn process(&self, input: &[u8], message: &JobMessage) -> ProcessorResult<ProcessingResult> {
        let detected = image::guess_format(input).ok();
        let params = ImageEncodeParams::for_message(detected, message);

        let mut img = image::load_from_memory(input)
            .map_err(|e| ProcessorError::decode(format!("image decode failed: {}", e)))?;

        if let Some(scale) = params.scale {
            let width = ((img.width() as f64 * scale).round() as u32).max(1);
            let height = ((img.height() as f64 * scale).round() as u32).max(1);
            debug!(
                "Scaling image {}x{} -> {}x{}",
                img.width(),
                img.height(),
                width,
                height
            );
            // resize() clamps to the original aspect ratio and never
            // enlarges here since the scale factor is below 1.
            img = img.resize(width, height, FilterType::Lanczos3);
        }

        let bytes = encode_image(&img, &params)?;
        let ext = params.target.extension();

        Ok(ProcessingResult::new(
            bytes,
            content_type_for_extension(ext),
            ext,
        ))
    }
}

/// Encode an image with the computed parameters.
///
/// Parameters the `image`-crate backend cannot express (progressive JPEG,
/// indexed PNG) are carried for backends that can; this encoder applies
/// the rest.
fn encode_image(img: &DynamicImage, params: &ImageEncodeParams) -> ProcessorResult<Vec<u8>> {
    let mut out = Cursor::new(Vec::new());

    match params.target {
        ImageTarget::Jpg => {
            let rgb = img.to_rgb8();
            let encoder = JpegEncoder::new_with_quality(&mut out, params.quality.max(1));
            encoder.write_image(
                rgb.as_raw(),
                rgb.width(),
                rgb.height(),
                ExtendedColorType::Rgb8,
            )?;
        }
        ImageTarget::Png => {
            let rgba = img.to_rgba8();
            let compression = if params.png_compression_level >= 9 {
                CompressionType::Best
            } else {
                CompressionType::Default
            };
            let encoder = PngEncoder::new_with_quality(&mut out, compression, PngFilterType::Adaptive);
            encoder.write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        ImageTarget::Webp => {
            let rgba = img.to_rgba8();
            let encoder = WebPEncoder::new_lossless(&mut out);
            encoder.write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        ImageTarget::Gif => {
            let rgba = img.to_rgba8();
            // Smaller palettes quantize faster; tiers map onto the
            // encoder's speed knob.
            let speed = match params.gif_colors {
                0..=64 => 30,
                65..=128 => 20,
                _ => 10,
            };
            let mut encoder = GifEncoder::new_with_speed(&mut out, speed);
            encoder.encode(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        ImageTarget::Tiff => {
            let rgba = img.to_rgba8();
            let encoder = TiffEncoder::new(&mut out);
            encoder.write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
        ImageTarget::Bmp => {
            let rgba = img.to_rgba8();
            let encoder = BmpEncoder::new(&mut out);
            encoder.write_image(
                rgba.as_raw(),
                rgba.width(),
                rgba.height(),
                ExtendedColorType::Rgba8,
            )?;
        }
    }

    Ok(out.into_inner())
}
