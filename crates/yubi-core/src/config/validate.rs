//! Configuration validation with range checks.

use crate::error::ConfigError;

use super::Config;

impl Config {
    /// Validate configuration values are within acceptable ranges.
    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        if self.intake.max_files == 0 {
            return Err(ConfigError::ValidationError(
                "intake.max_files must be > 0".into(),
            ));
        }
        if !(self.intake.max_file_size_mb > 0.0) {
            return Err(ConfigError::ValidationError(
                "intake.max_file_size_mb must be > 0".into(),
            ));
        }
        if self.transcode.max_width == 0 {
            return Err(ConfigError::ValidationError(
                "transcode.max_width must be > 0".into(),
            ));
        }
        if self.transcode.max_height == 0 {
            return Err(ConfigError::ValidationError(
                "transcode.max_height must be > 0".into(),
            ));
        }
        if !(self.transcode.jpeg_quality > 0.0 && self.transcode.jpeg_quality <= 1.0) {
            return Err(ConfigError::ValidationError(
                "transcode.jpeg_quality must be in (0.0, 1.0]".into(),
            ));
        }
        if self.transcode.parallel_workers == 0 {
            return Err(ConfigError::ValidationError(
                "transcode.parallel_workers must be > 0".into(),
            ));
        }
        if self.transcode.decode_timeout_ms == 0 {
            return Err(ConfigError::ValidationError(
                "transcode.decode_timeout_ms must be > 0".into(),
            ));
        }
        if self.transcode.name_prefix.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "transcode.name_prefix must not be empty".into(),
            ));
        }
        Ok(())
    }
}
