//! Session state as a single transition function.
//!
//! All mutable session data (accepted files, artifact slots, selected format,
//! busy flag, messages) lives in [`OptimizerState`] and only changes through
//! [`OptimizerState::apply`]. Asynchronous work is requested by returning an
//! [`Effect`]; its results come back as [`Event::TranscodeCompleted`].
//!
//! Invariants:
//! - `slots.len() == files.len()`, and slot `i` belongs to file `i`.
//! - The busy flag clears only when every submitted file has completed.
//! - Completions from an earlier run (older generation) are ignored.

use crate::error::{IntakeError, PipelineError};
use crate::intake::{IntakeValidator, ValidationOutcome};
use crate::types::{AcceptedFile, OutputArtifact, TargetFormat, UploadCandidate};

/// Result held in an artifact slot.
pub type SlotResult = Result<OutputArtifact, PipelineError>;

/// Inputs to the state machine.
#[derive(Debug)]
pub enum Event {
    /// The user offered a new batch of files
    FilesOffered(Vec<UploadCandidate>),
    /// The user picked an output format
    FormatSelected(TargetFormat),
    /// The user asked to optimize the accepted files
    OptimizeRequested,
    /// One file of a running optimize finished
    TranscodeCompleted {
        generation: u64,
        index: usize,
        result: SlotResult,
    },
    /// The user chose to start over with different files
    Reset,
}

/// Work the caller must perform after a transition.
#[derive(Debug)]
pub enum Effect {
    /// Nothing to do
    None,
    /// Transcode these files and feed completions back in
    Transcode(TranscodeJob),
}

/// A batch of files to transcode for one optimize run.
#[derive(Debug, Clone)]
pub struct TranscodeJob {
    /// Run identifier to attach to every completion
    pub generation: u64,
    /// Files in slot order
    pub files: Vec<AcceptedFile>,
    /// Target encoding
    pub format: TargetFormat,
}

#[derive(Debug, Clone, Copy)]
struct RunProgress {
    generation: u64,
    submitted: usize,
    completed: usize,
}

/// The complete session state.
#[derive(Debug)]
pub struct OptimizerState {
    validator: IntakeValidator,
    files: Vec<AcceptedFile>,
    slots: Vec<Option<SlotResult>>,
    format: TargetFormat,
    last_outcome: Option<ValidationOutcome>,
    message: Option<String>,
    run: Option<RunProgress>,
    generation: u64,
}

impl OptimizerState {
    /// Create an empty session.
    pub fn new(validator: IntakeValidator) -> Self {
        Self {
            validator,
            files: Vec::new(),
            slots: Vec::new(),
            format: TargetFormat::default(),
            last_outcome: None,
            message: None,
            run: None,
            generation: 0,
        }
    }

    /// Apply one event and return any work to perform.
    pub fn apply(&mut self, event: Event) -> Effect {
        match event {
            Event::FilesOffered(batch) => {
                let outcome = self.validator.offer(&self.files, batch);
                let added = outcome.accepted.len();
                self.files.extend(outcome.accepted.iter().cloned());
                self.slots.resize_with(self.files.len(), || None);
                self.message = outcome.message();
                tracing::debug!(
                    "Intake: {} accepted, {} rejected, {} held",
                    added,
                    outcome.rejections.len(),
                    self.files.len()
                );
                self.last_outcome = Some(outcome);
                Effect::None
            }

            Event::FormatSelected(format) => {
                self.format = format;
                Effect::None
            }

            Event::OptimizeRequested => {
                if self.run.is_some() {
                    tracing::debug!("Optimize already running, ignoring request");
                    return Effect::None;
                }
                if self.files.is_empty() {
                    self.message = Some(IntakeError::NoFilesSelected.to_string());
                    return Effect::None;
                }

                self.generation += 1;
                self.slots = vec![None; self.files.len()];
                self.run = Some(RunProgress {
                    generation: self.generation,
                    submitted: self.files.len(),
                    completed: 0,
                });
                self.message = None;

                Effect::Transcode(TranscodeJob {
                    generation: self.generation,
                    files: self.files.clone(),
                    format: self.format,
                })
            }

            Event::TranscodeCompleted {
                generation,
                index,
                result,
            } => {
                self.complete(generation, index, result);
                Effect::None
            }

            Event::Reset => {
                self.files.clear();
                self.slots.clear();
                self.last_outcome = None;
                self.message = None;
                self.run = None;
                Effect::None
            }
        }
    }

    fn complete(&mut self, generation: u64, index: usize, result: SlotResult) {
        let Some(run) = self.run.as_mut() else {
            tracing::debug!("Dropping completion {} with no run in progress", index);
            return;
        };
        if run.generation != generation {
            tracing::debug!("Dropping stale completion from run {}", generation);
            return;
        }
        let Some(slot) = self.slots.get_mut(index) else {
            return;
        };
        if slot.is_some() {
            return;
        }

        if let Err(e) = &result {
            self.message = Some(e.to_string());
        }
        *slot = Some(result);
        run.completed += 1;

        if run.completed == run.submitted {
            tracing::debug!("Run {} finished ({} files)", run.generation, run.submitted);
            self.run = None;
        }
    }

    /// Accepted files in upload order.
    pub fn files(&self) -> &[AcceptedFile] {
        &self.files
    }

    /// Artifact slots, index-aligned with [`files`](Self::files).
    pub fn slots(&self) -> &[Option<SlotResult>] {
        &self.slots
    }

    /// Successful artifacts in slot order.
    pub fn artifacts(&self) -> Vec<&OutputArtifact> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().and_then(|r| r.as_ref().ok()))
            .collect()
    }

    /// Per-file failures from the latest run, in slot order.
    pub fn failures(&self) -> Vec<&PipelineError> {
        self.slots
            .iter()
            .filter_map(|slot| slot.as_ref().and_then(|r| r.as_ref().err()))
            .collect()
    }

    /// Currently selected output format.
    pub fn format(&self) -> TargetFormat {
        self.format
    }

    /// True while an optimize run has outstanding files.
    pub fn is_busy(&self) -> bool {
        self.run.is_some()
    }

    /// `(completed, submitted)` for the run in progress.
    pub fn progress(&self) -> Option<(usize, usize)> {
        self.run.map(|run| (run.completed, run.submitted))
    }

    /// The single user-facing message, if any.
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    /// Outcome of the most recent intake.
    pub fn last_outcome(&self) -> Option<&ValidationOutcome> {
        self.last_outcome.as_ref()
    }

    /// Every current message: intake rejections, then per-file failures.
    pub fn messages(&self) -> Vec<String> {
        let mut messages = self
            .last_outcome
            .as_ref()
            .map(ValidationOutcome::messages)
            .unwrap_or_default();
        messages.extend(self.failures().iter().map(|e| e.to_string()));
        messages
    }
}
