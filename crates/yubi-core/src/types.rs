//! Core data types for the Yubi optimizer.
//!
//! A file moves through three shapes: an [`UploadCandidate`] when offered, an
//! [`AcceptedFile`] once intake lets it through, and an [`OutputArtifact`]
//! after transcoding.

use image::ImageFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Where a candidate's bytes live.
#[derive(Debug, Clone)]
pub enum FileSource {
    /// Read lazily from disk when the file is transcoded
    Path(PathBuf),
    /// Already in memory
    Memory(Arc<[u8]>),
}

/// A file offered by the user, before validation.
#[derive(Debug, Clone)]
pub struct UploadCandidate {
    /// Original file name, including extension
    pub name: String,

    /// Size in bytes
    pub size: u64,

    /// Declared media type, e.g. "image/png"
    pub media_type: String,

    /// Location of the file contents
    pub source: FileSource,
}

impl UploadCandidate {
    /// Build a candidate from bytes already in memory.
    pub fn from_bytes(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            size: bytes.len() as u64,
            media_type: media_type.into(),
            source: FileSource::Memory(Arc::from(bytes)),
        }
    }

    /// Build a candidate from a file on disk.
    ///
    /// Only metadata is read here; the contents are read when transcoding.
    pub fn from_path(path: &Path) -> std::io::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("unknown")
            .to_string();

        Ok(Self {
            name,
            size: metadata.len(),
            media_type: media_type_for_path(path),
            source: FileSource::Path(path.to_path_buf()),
        })
    }
}

/// A candidate that passed intake.
#[derive(Debug, Clone)]
pub struct AcceptedFile {
    /// Original file name
    pub name: String,

    /// Size in bytes
    pub size: u64,

    /// Declared media type
    pub media_type: String,

    /// Location of the file contents
    pub source: FileSource,
}

impl From<UploadCandidate> for AcceptedFile {
    fn from(candidate: UploadCandidate) -> Self {
        Self {
            name: candidate.name,
            size: candidate.size,
            media_type: candidate.media_type,
            source: candidate.source,
        }
    }
}

/// Output encoding selected by the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetFormat {
    /// Lossless PNG
    #[default]
    Png,
    /// Lossy JPEG
    Jpg,
}

impl TargetFormat {
    /// Parse the selector ("png", "jpg", "jpeg"; case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "png" => Some(Self::Png),
            "jpg" | "jpeg" => Some(Self::Jpg),
            _ => None,
        }
    }

    /// MIME type used in the data URL.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Png => "image/png",
            Self::Jpg => "image/jpeg",
        }
    }

    /// File extension for downloaded artifacts. `jpg` becomes `jpeg`.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Png => "png",
            Self::Jpg => "jpeg",
        }
    }

    /// Matching `image` crate format.
    pub fn image_format(self) -> ImageFormat {
        match self {
            Self::Png => ImageFormat::Png,
            Self::Jpg => ImageFormat::Jpeg,
        }
    }
}

impl std::fmt::Display for TargetFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TargetFormat::Png => write!(f, "png"),
            TargetFormat::Jpg => write!(f, "jpg"),
        }
    }
}

/// The transcoded result for one accepted file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputArtifact {
    /// Download name, e.g. "yubi-holiday-photo.jpeg"
    pub file_name: String,

    /// Name of the accepted file this came from
    pub source_name: String,

    /// Source size in bytes
    pub original_size: u64,

    /// Encoded image size in bytes
    pub compressed_size: u64,

    /// Length of the data URL string (what the browser tool reported as size)
    pub encoded_length: u64,

    /// Output width in pixels
    pub width: u32,

    /// Output height in pixels
    pub height: u32,

    /// Target encoding
    pub format: TargetFormat,

    /// Self-contained `data:` URL with the base64 payload
    #[serde(skip_serializing_if = "String::is_empty", default)]
    pub data_url: String,
}

impl OutputArtifact {
    /// Ratio of compressed to original size (0.0 when the source was empty).
    pub fn compression_ratio(&self) -> f64 {
        if self.original_size == 0 {
            0.0
        } else {
            self.compressed_size as f64 / self.original_size as f64
        }
    }
}

/// Guess a media type from a file extension.
///
/// SVG is not an `image` crate format, so it is mapped explicitly. Anything
/// unrecognized is reported as `application/octet-stream`.
pub fn media_type_for_path(path: &Path) -> String {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();

    if ext == "svg" || ext == "svgz" {
        return "image/svg+xml".to_string();
    }

    ImageFormat::from_extension(&ext)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_target_format_parse() {
        assert_eq!(TargetFormat::parse("png"), Some(TargetFormat::Png));
        assert_eq!(TargetFormat::parse("JPG"), Some(TargetFormat::Jpg));
        assert_eq!(TargetFormat::parse("jpeg"), Some(TargetFormat::Jpg));
        assert_eq!(TargetFormat::parse("webp"), None);
    }

    #[test]
    fn test_jpg_selector_uses_jpeg_extension() {
        assert_eq!(TargetFormat::Jpg.extension(), "jpeg");
        assert_eq!(TargetFormat::Jpg.mime_type(), "image/jpeg");
        assert_eq!(TargetFormat::Png.extension(), "png");
    }

    #[test]
    fn test_media_type_for_path() {
        assert_eq!(media_type_for_path(Path::new("a.PNG")), "image/png");
        assert_eq!(media_type_for_path(Path::new("a.jpg")), "image/jpeg");
        assert_eq!(media_type_for_path(Path::new("logo.svg")), "image/svg+xml");
        assert_eq!(media_type_for_path(Path::new("scan.tif")), "image/tiff");
        assert_eq!(
            media_type_for_path(Path::new("notes")),
            "application/octet-stream"
        );
    }

    #[test]
    fn test_candidate_from_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("Photo One.png");
        std::fs::write(&path, [0u8; 42]).unwrap();

        let candidate = UploadCandidate::from_path(&path).unwrap();
        assert_eq!(candidate.name, "Photo One.png");
        assert_eq!(candidate.size, 42);
        assert_eq!(candidate.media_type, "image/png");
        assert!(matches!(candidate.source, FileSource::Path(_)));
    }

    #[test]
    fn test_artifact_serialization_skips_empty_payload() {
        let artifact = OutputArtifact {
            file_name: "yubi-a.png".into(),
            source_name: "a.png".into(),
            original_size: 100,
            compressed_size: 50,
            encoded_length: 90,
            width: 10,
            height: 10,
            format: TargetFormat::Png,
            data_url: String::new(),
        };
        let json = serde_json::to_string(&artifact).unwrap();
        assert!(json.contains("\"format\":\"png\""));
        assert!(!json.contains("data_url"));
        assert!((artifact.compression_ratio() - 0.5).abs() < f64::EPSILON);
    }
}
