//! Error types for the Yubi optimizer.
//!
//! Intake rejections and per-file pipeline failures are recoverable and are
//! reported alongside successful results. Nothing here is fatal to a batch.

use std::path::Path;
use thiserror::Error;

/// Top-level error type for Yubi operations.
#[derive(Error, Debug)]
pub enum YubiError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Intake rejected the request
    #[error("{0}")]
    Intake(#[from] IntakeError),

    /// Transcoding failed for a file
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Artifact could not be written out
    #[error("Download failed for {name}: {message}")]
    Download { name: String, message: String },

    /// General I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Configuration-specific errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Failed to read the config file from disk
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    /// Failed to parse TOML configuration
    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Configuration values are invalid
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Reasons a candidate (or a whole batch) is turned away at intake.
///
/// The `Display` text of each variant is the message for that single
/// rejection. Combined messages for several files are built by
/// [`ValidationOutcome`](crate::intake::ValidationOutcome).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    /// Declared media type is in the unsupported set
    #[error("{format} files are not supported.")]
    UnsupportedType {
        name: String,
        media_type: String,
        format: String,
    },

    /// File is larger than the configured limit
    #[error("{name} exceeds the {max_mb}MB size limit.")]
    OversizedFile {
        name: String,
        size: u64,
        max_mb: String,
    },

    /// A file with the same name was already accepted
    #[error("{name} already uploaded.")]
    DuplicateFile { name: String },

    /// Accepting the batch would exceed the file count limit
    #[error("Too many files. You can upload up to {max_files} files at once.")]
    BatchLimitExceeded {
        offered: usize,
        already_accepted: usize,
        max_files: usize,
    },

    /// Optimize was requested with nothing accepted
    #[error("No files selected. Add at least one image before optimizing.")]
    NoFilesSelected,
}

/// Per-file transcoding errors, organized by stage.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PipelineError {
    /// Source bytes could not be read
    #[error("Read error for {name}: {message}")]
    Read { name: String, message: String },

    /// Image decoding failed
    #[error("Decode error for {name}: {message}")]
    Decode { name: String, message: String },

    /// Image encoding failed
    #[error("Encode error for {name}: {message}")]
    Encode { name: String, message: String },

    /// Operation timed out
    #[error("Timeout in {stage} stage for {name} after {timeout_ms}ms")]
    Timeout {
        name: String,
        stage: String,
        timeout_ms: u64,
    },

    /// The worker task died before producing a result
    #[error("Worker task failed for {name}: {message}")]
    Task { name: String, message: String },
}

impl PipelineError {
    /// Name of the file this error belongs to.
    pub fn file_name(&self) -> &str {
        match self {
            Self::Read { name, .. }
            | Self::Decode { name, .. }
            | Self::Encode { name, .. }
            | Self::Timeout { name, .. }
            | Self::Task { name, .. } => name,
        }
    }
}

/// Error raised while writing an artifact to disk.
pub(crate) fn download_error(name: &str, path: &Path, e: impl std::fmt::Display) -> YubiError {
    YubiError::Download {
        name: name.to_string(),
        message: format!("{}: {}", path.display(), e),
    }
}

/// Convenience type alias for Yubi results.
pub type Result<T> = std::result::Result<T, YubiError>;

/// Convenience type alias for pipeline-specific results.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;
