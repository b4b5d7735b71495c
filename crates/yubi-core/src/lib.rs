//! Yubi Core - embeddable image optimizer.
//!
//! Yubi takes a batch of images, checks them against intake limits, resizes
//! each to fit a bounding box and re-encodes it as PNG or JPEG.
//!
//! # Architecture
//!
//! ```text
//! Candidates → Intake → Accepted files → Read → Decode → Resize → Encode → Artifacts
//! ```
//!
//! Session state is owned by [`state::OptimizerState`] and changes only
//! through its transition function. [`Optimizer`] wires that state to the
//! async transcode pipeline.
//!
//! # Usage
//!
//! ```rust,ignore
//! use yubi_core::{Config, Optimizer, TargetFormat, UploadCandidate};
//!
//! #[tokio::main]
//! async fn main() -> yubi_core::Result<()> {
//!     let mut optimizer = Optimizer::new(Config::load()?);
//!     optimizer.offer(vec![UploadCandidate::from_path("./photo.jpg".as_ref())?]);
//!     optimizer.select_format(TargetFormat::Jpg);
//!
//!     for artifact in optimizer.optimize().await?.artifacts() {
//!         println!("{} ({} bytes)", artifact.file_name, artifact.compressed_size);
//!     }
//!     Ok(())
//! }
//! ```

// Module declarations
pub mod config;
pub mod download;
pub mod error;
pub mod intake;
pub mod output;
pub mod pipeline;
pub mod state;
pub mod types;

// Re-exports for convenient access
pub use config::Config;
pub use download::{save_all, save_artifact};
pub use error::{ConfigError, IntakeError, PipelineError, PipelineResult, Result, YubiError};
pub use intake::{IntakeValidator, ValidationOutcome};
pub use output::{Report, ReportFormat, ReportWriter};
pub use pipeline::{Completion, Transcoder};
pub use state::{Effect, Event, OptimizerState, SlotResult};
pub use types::{AcceptedFile, FileSource, OutputArtifact, TargetFormat, UploadCandidate};

use std::sync::Arc;

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Yubi optimizer - the main entry point.
///
/// Holds one session: the accepted files, the selected format and the
/// artifacts of the latest run.
pub struct Optimizer {
    config: Config,
    transcoder: Arc<Transcoder>,
    state: OptimizerState,
}

impl Optimizer {
    /// Create a new optimizer with the given configuration.
    pub fn new(config: Config) -> Self {
        tracing::debug!("Initializing Yubi v{}", VERSION);
        let transcoder = Arc::new(Transcoder::new(config.transcode.clone()));
        let state = OptimizerState::new(IntakeValidator::new(config.intake.clone()));
        Self {
            config,
            transcoder,
            state,
        }
    }

    /// Get a reference to the current configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Current session state.
    pub fn state(&self) -> &OptimizerState {
        &self.state
    }

    /// Offer a batch of candidates and return the intake outcome.
    pub fn offer(&mut self, batch: Vec<UploadCandidate>) -> ValidationOutcome {
        self.state.apply(Event::FilesOffered(batch));
        self.state.last_outcome().cloned().unwrap_or_default()
    }

    /// Select the output format for the next run.
    pub fn select_format(&mut self, format: TargetFormat) {
        self.state.apply(Event::FormatSelected(format));
    }

    /// Drop all accepted files and artifacts.
    pub fn reset(&mut self) {
        self.state.apply(Event::Reset);
    }

    /// Transcode every accepted file.
    pub async fn optimize(&mut self) -> Result<&OptimizerState> {
        self.optimize_with_progress(|_| {}).await
    }

    /// Transcode every accepted file, calling `on_complete` as each finishes.
    ///
    /// Per-file failures are stored in their slots; only an empty session is
    /// an error.
    pub async fn optimize_with_progress<F>(&mut self, mut on_complete: F) -> Result<&OptimizerState>
    where
        F: FnMut(&Completion),
    {
        let job = match self.state.apply(Event::OptimizeRequested) {
            Effect::Transcode(job) => job,
            Effect::None => {
                if self.state.files().is_empty() {
                    return Err(IntakeError::NoFilesSelected.into());
                }
                return Ok(&self.state);
            }
        };

        tracing::info!(
            "Optimizing {} file(s) as {}",
            job.files.len(),
            job.format
        );

        let mut rx = pipeline::spawn_batch(
            self.transcoder.clone(),
            job.files,
            job.format,
            self.config.transcode.parallel_workers,
        );

        while let Some(completion) = rx.recv().await {
            on_complete(&completion);
            self.state.apply(Event::TranscodeCompleted {
                generation: job.generation,
                index: completion.index,
                result: completion.result,
            });
            if !self.state.is_busy() {
                break;
            }
        }
        self.settle_unfinished(job.generation);

        let failed = self.state.failures().len();
        tracing::info!(
            "Optimized {} file(s), {} failed",
            self.state.artifacts().len(),
            failed
        );

        Ok(&self.state)
    }

    /// Fail any slot the batch closed without filling, so the run finishes.
    fn settle_unfinished(&mut self, generation: u64) {
        if !self.state.is_busy() {
            return;
        }
        let missing: Vec<(usize, String)> = self
            .state
            .slots()
            .iter()
            .zip(self.state.files())
            .enumerate()
            .filter(|(_, (slot, _))| slot.is_none())
            .map(|(index, (_, file))| (index, file.name.clone()))
            .collect();

        for (index, name) in missing {
            tracing::warn!("No result received for {}", name);
            self.state.apply(Event::TranscodeCompleted {
                generation,
                index,
                result: Err(PipelineError::Task {
                    name,
                    message: "worker exited without a result".to_string(),
                }),
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
    }

    #[tokio::test]
    async fn test_optimize_empty_session() {
        let mut optimizer = Optimizer::new(Config::default());
        let err = optimizer.optimize().await.unwrap_err();
        assert!(matches!(err, YubiError::Intake(IntakeError::NoFilesSelected)));
    }

    #[tokio::test]
    async fn test_unfinished_slots_are_settled() {
        let mut optimizer = Optimizer::new(Config::default());
        optimizer.offer(vec![
            UploadCandidate::from_bytes("a.png", "image/png", vec![0; 4]),
            UploadCandidate::from_bytes("b.png", "image/png", vec![0; 4]),
        ]);

        let Effect::Transcode(job) = optimizer.state.apply(Event::OptimizeRequested) else {
            panic!("expected a transcode job");
        };
        optimizer.state.apply(Event::TranscodeCompleted {
            generation: job.generation,
            index: 0,
            result: Err(PipelineError::Decode {
                name: "a.png".to_string(),
                message: "bad".to_string(),
            }),
        });
        assert!(optimizer.state().is_busy());

        optimizer.settle_unfinished(job.generation);
        assert!(!optimizer.state().is_busy());
        assert!(matches!(
            optimizer.state().slots()[1],
            Some(Err(PipelineError::Task { ref name, .. })) if name == "b.png"
        ));

        // A fresh run is accepted afterwards
        let state = optimizer.optimize().await.unwrap();
        assert_eq!(state.failures().len(), 2);
        assert!(!state.is_busy());
    }

    #[test]
    fn test_offer_returns_outcome() {
        let mut optimizer = Optimizer::new(Config::default());
        let outcome = optimizer.offer(vec![UploadCandidate::from_bytes(
            "logo.svg",
            "image/svg+xml",
            vec![0; 10],
        )]);
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.message().as_deref(), Some("SVG files are not supported."));
    }
}
