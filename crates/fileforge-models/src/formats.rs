//! Format tables, content types and the output key convention.

use crate::message::Operation;

/// Image formats accepted for convert and compress.
pub const IMAGE_FORMATS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "tiff", "bmp"];

/// Video container targets accepted for convert.
pub const VIDEO_TARGETS: &[&str] = &["mp4", "webm", "mov", "avi", "mkv", "flv", "wmv"];

/// Audio targets accepted for convert.
pub const AUDIO_TARGETS: &[&str] = &["mp3", "wav", "ogg", "flac", "aac", "m4a", "wma"];

/// Ebook formats accepted for convert.
pub const EBOOK_FORMATS: &[&str] = &["epub", "mobi", "azw3", "pdf", "txt", "docx", "rtf"];

/// Normalize a format string to its canonical lower-case extension.
pub fn normalize_extension(format: &str) -> String {
    let lower = format.trim().trim_start_matches('.').to_ascii_lowercase();
    match lower.as_str() {
        "jpeg" => "jpg".to_string(),
        "tif" => "tiff".to_string(),
        _ => lower,
    }
}

/// MIME type for a canonical extension.
pub fn content_type_for_extension(ext: &str) -> &'static str {
    match normalize_extension(ext).as_str() {
        "jpg" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "tiff" => "image/tiff",
        "bmp" => "image/bmp",
        "pdf" => "application/pdf",
        "mp4" => "video/mp4",
        "webm" => "video/webm",
        "mov" => "video/quicktime",
        "avi" => "video/x-msvideo",
        "mkv" => "video/x-matroska",
        "flv" => "video/x-flv",
        "wmv" => "video/x-ms-wmv",
        "mp3" => "audio/mpeg",
        "wav" => "audio/wav",
        "ogg" => "audio/ogg",
        "flac" => "audio/flac",
        "aac" => "audio/aac",
        "m4a" => "audio/mp4",
        "wma" => "audio/x-ms-wma",
        "epub" => "application/epub+zip",
        "mobi" => "application/x-mobipocket-ebook",
        "azw3" => "application/vnd.amazon.ebook",
        "txt" => "text/plain",
        "docx" => "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        "rtf" => "application/rtf",
        _ => "application/octet-stream",
    }
}

/// Storage key for a processed artifact.
///
/// `processed/{jobId}.{ext}` for convert, `processed/{jobId}_compressed.{ext}`
/// for compress.
pub fn output_key(job_id: &str, operation: Operation, extension: &str) -> String {
    let ext = normalize_extension(extension);
    match operation {
        Operation::Convert => format!("processed/{}.{}", job_id, ext),
        Operation::Compress => format!("processed/{}_compressed.{}", job_id, ext),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_extension() {
        assert_eq!(normalize_extension("JPEG"), "jpg");
        assert_eq!(normalize_extension(".png"), "png");
        assert_eq!(normalize_extension("tif"), "tiff");
        assert_eq!(normalize_extension("webm"), "webm");
    }

    #[test]
    fn test_output_key_convention() {
        assert_eq!(
            output_key("abc-123", Operation::Convert, "webp"),
            "processed/abc-123.webp"
        );
        assert_eq!(
            output_key("abc-123", Operation::Compress, "jpeg"),
            "processed/abc-123_compressed.jpg"
        );
    }

    #[test]
    fn test_content_types() {
        assert_eq!(content_type_for_extension("jpg"), "image/jpeg");
        assert_eq!(content_type_for_extension("jpeg"), "image/jpeg");
        assert_eq!(content_type_for_extension("epub"), "application/epub+zip");
        assert_eq!(content_type_for_extension("unknown"), "application/octet-stream");
    }
}
