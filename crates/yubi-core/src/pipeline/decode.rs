//! Reading and decoding source images.

use image::{DynamicImage, GenericImageView, ImageFormat};
use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;

use crate::error::PipelineError;
use crate::types::{AcceptedFile, FileSource};

/// Image decoder with a per-file timeout.
#[derive(Debug, Clone)]
pub struct ImageDecoder {
    timeout_ms: u64,
}

/// Result of decoding an image.
#[derive(Debug)]
pub struct DecodedImage {
    /// The decoded image data
    pub image: DynamicImage,
    /// Format detected from the content, if any
    pub format: Option<ImageFormat>,
    /// Intrinsic width in pixels
    pub width: u32,
    /// Intrinsic height in pixels
    pub height: u32,
}

impl ImageDecoder {
    /// Create a new decoder that gives up after `timeout_ms`.
    pub fn new(timeout_ms: u64) -> Self {
        Self { timeout_ms }
    }

    /// Fetch the raw bytes of an accepted file.
    pub async fn read(file: &AcceptedFile) -> Result<Arc<[u8]>, PipelineError> {
        match &file.source {
            FileSource::Memory(bytes) => Ok(bytes.clone()),
            FileSource::Path(path) => tokio::fs::read(path)
                .await
                .map(Arc::from)
                .map_err(|e| PipelineError::Read {
                    name: file.name.clone(),
                    message: format!("{}: {}", path.display(), e),
                }),
        }
    }

    /// Decode bytes on the blocking pool, bounded by the configured timeout.
    pub async fn decode(&self, bytes: Arc<[u8]>, name: &str) -> Result<DecodedImage, PipelineError> {
        let name_owned = name.to_string();
        let timeout_duration = Duration::from_millis(self.timeout_ms);

        let decode_result = timeout(
            timeout_duration,
            tokio::task::spawn_blocking(move || Self::decode_sync(&bytes, &name_owned)),
        )
        .await;

        match decode_result {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => Err(PipelineError::Task {
                name: name.to_string(),
                message: format!("decode task failed: {}", e),
            }),
            Err(_) => Err(PipelineError::Timeout {
                name: name.to_string(),
                stage: "decode".to_string(),
                timeout_ms: self.timeout_ms,
            }),
        }
    }

    /// Synchronous decode with content-based format detection.
    pub fn decode_sync(bytes: &[u8], name: &str) -> Result<DecodedImage, PipelineError> {
        let reader = image::ImageReader::new(Cursor::new(bytes))
            .with_guessed_format()
            .map_err(|e| PipelineError::Decode {
                name: name.to_string(),
                message: format!("Cannot detect image format: {}", e),
            })?;
        let format = reader.format();
        if format.is_none() {
            return Err(PipelineError::Decode {
                name: name.to_string(),
                message: "Unrecognized image data".to_string(),
            });
        }

        let image = reader.decode().map_err(|e| PipelineError::Decode {
            name: name.to_string(),
            message: e.to_string(),
        })?;

        let (width, height) = image.dimensions();
        Ok(DecodedImage {
            image,
            format,
            width,
            height,
        })
    }
}
