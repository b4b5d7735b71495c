//! Per-file transcoding - wires together read, decode, resize, encode, naming.

use crate::config::TranscodeConfig;
use crate::error::PipelineError;
use crate::types::{AcceptedFile, OutputArtifact, TargetFormat};

use super::decode::ImageDecoder;
use super::encode::{to_data_url, Encoder};
use super::naming::output_file_name;
use super::resize::{render, target_dimensions};

/// Transcodes a single accepted file into an [`OutputArtifact`].
#[derive(Debug, Clone)]
pub struct Transcoder {
    decoder: ImageDecoder,
    encoder: Encoder,
    config: TranscodeConfig,
}

impl Transcoder {
    /// Create a new transcoder with the given configuration.
    pub fn new(config: TranscodeConfig) -> Self {
        Self {
            decoder: ImageDecoder::new(config.decode_timeout_ms),
            encoder: Encoder::new(config.jpeg_quality_percent()),
            config,
        }
    }

    /// The settings this transcoder was built with.
    pub fn config(&self) -> &TranscodeConfig {
        &self.config
    }

    /// Run the full pipeline for one file.
    ///
    /// Every failure is returned as a [`PipelineError`] naming the file; no
    /// error here affects other files in a batch.
    pub async fn transcode(
        &self,
        file: &AcceptedFile,
        format: TargetFormat,
    ) -> Result<OutputArtifact, PipelineError> {
        let start = std::time::Instant::now();
        tracing::debug!("Transcoding: {} -> {}", file.name, format);

        let bytes = ImageDecoder::read(file).await?;
        let decoded = self.decoder.decode(bytes, &file.name).await?;
        let decode_time = start.elapsed();
        tracing::trace!("  Decode: {:?}", decode_time);

        let (width, height) = target_dimensions(
            decoded.width,
            decoded.height,
            self.config.max_width,
            self.config.max_height,
        );

        // Resize and encode are CPU-bound; keep them off the async workers
        let encoder = self.encoder.clone();
        let name = file.name.clone();
        let image = decoded.image;
        let encoded = tokio::task::spawn_blocking(move || {
            let rendered = render(&image, width, height);
            encoder
                .encode(&rendered, format)
                .map_err(|e| PipelineError::Encode {
                    name,
                    message: e.to_string(),
                })
        })
        .await
        .map_err(|e| PipelineError::Task {
            name: file.name.clone(),
            message: format!("encode task failed: {}", e),
        })??;

        let data_url = to_data_url(format.mime_type(), &encoded);
        let artifact = OutputArtifact {
            file_name: output_file_name(&file.name, &self.config.name_prefix, format),
            source_name: file.name.clone(),
            original_size: file.size,
            compressed_size: encoded.len() as u64,
            encoded_length: data_url.len() as u64,
            width,
            height,
            format,
            data_url,
        };

        tracing::debug!(
            "Transcoded {} in {:?} ({}x{} -> {}x{}, {} -> {} bytes)",
            file.name,
            start.elapsed(),
            decoded.width,
            decoded.height,
            width,
            height,
            file.size,
            artifact.compressed_size
        );

        Ok(artifact)
    }
}
