//! The `yubi inspect` command: intake checks without transcoding.

use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use yubi_core::{Config, IntakeValidator, ValidationOutcome};

/// Arguments for the `inspect` command.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Image files or directories to check
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

#[derive(Serialize)]
struct InspectReport<'a> {
    accepted: Vec<AcceptedEntry<'a>>,
    rejections: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<String>,
}

#[derive(Serialize)]
struct AcceptedEntry<'a> {
    name: &'a str,
    size: u64,
    media_type: &'a str,
}

impl<'a> InspectReport<'a> {
    fn from_outcome(outcome: &'a ValidationOutcome) -> Self {
        Self {
            accepted: outcome
                .accepted
                .iter()
                .map(|f| AcceptedEntry {
                    name: &f.name,
                    size: f.size,
                    media_type: &f.media_type,
                })
                .collect(),
            rejections: outcome.rejections.iter().map(|r| r.to_string()).collect(),
            message: outcome.message(),
        }
    }
}

/// Execute the inspect command.
pub async fn execute(args: InspectArgs, config: Config) -> anyhow::Result<()> {
    let candidates = super::collect_candidates(&args.inputs)?;
    let validator = IntakeValidator::new(config.intake);
    let outcome = validator.offer(&[], candidates);

    tracing::info!(
        "{} accepted, {} rejected",
        outcome.accepted.len(),
        outcome.rejections.len()
    );

    let report = InspectReport::from_outcome(&outcome);
    let json = if config.output.pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");

    Ok(())
}
