//! Sub-configuration structs with their defaults.

use serde::{Deserialize, Serialize};

/// Intake limits applied to every offered batch.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Maximum number of accepted files held at once
    pub max_files: usize,

    /// Maximum size per file in megabytes
    pub max_file_size_mb: f64,

    /// Media types rejected outright (vector and multi-page raster formats)
    pub unsupported_types: Vec<String>,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            max_files: 5,
            max_file_size_mb: 5.0,
            unsupported_types: vec![
                "image/svg+xml".to_string(),
                "image/tiff".to_string(),
                "image/x-tiff".to_string(),
            ],
        }
    }
}

impl IntakeConfig {
    /// Size limit converted to bytes.
    pub fn max_file_size_bytes(&self) -> u64 {
        (self.max_file_size_mb * 1024.0 * 1024.0) as u64
    }

    /// Size limit as shown to users: `5` rather than `5.0`, `2.2` as-is.
    pub fn max_file_size_label(&self) -> String {
        let mb = self.max_file_size_mb;
        if mb.fract() == 0.0 {
            format!("{}", mb as u64)
        } else {
            format!("{}", mb)
        }
    }
}

/// Resize and encode settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TranscodeConfig {
    /// Bounding width in pixels
    pub max_width: u32,

    /// Bounding height in pixels
    pub max_height: u32,

    /// JPEG quality on a 0.0-1.0 scale
    pub jpeg_quality: f32,

    /// Brand tag prepended to output file names
    pub name_prefix: String,

    /// Maximum files transcoded concurrently
    pub parallel_workers: usize,

    /// Decode timeout in milliseconds
    pub decode_timeout_ms: u64,
}

impl Default for TranscodeConfig {
    fn default() -> Self {
        Self {
            max_width: 800,
            max_height: 600,
            jpeg_quality: 0.8,
            name_prefix: "yubi".to_string(),
            parallel_workers: 4,
            decode_timeout_ms: 10_000,
        }
    }
}

impl TranscodeConfig {
    /// JPEG quality mapped onto the encoder's 1-100 scale.
    pub fn jpeg_quality_percent(&self) -> u8 {
        (self.jpeg_quality * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

/// Report output settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Report format ("json" or "jsonl")
    pub format: String,

    /// Pretty-print JSON reports
    pub pretty: bool,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            format: "json".to_string(),
            pretty: true,
        }
    }
}

/// Logging settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,

    /// Log format ("pretty" or "json")
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}
