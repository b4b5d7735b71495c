//! The `yubi optimize` command.

use anyhow::Context;
use clap::{Args, ValueEnum};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};
use yubi_core::{
    save_all, Completion, Config, Optimizer, OptimizerState, Report, ReportFormat, ReportWriter,
    TargetFormat,
};

/// Arguments for the `optimize` command.
#[derive(Args, Debug, Clone)]
pub struct OptimizeArgs {
    /// Image files or directories to optimize
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// Output image format
    #[arg(short, long, value_enum, default_value = "png")]
    pub format: FormatArg,

    /// Directory the optimized images are saved to
    #[arg(short, long, default_value = ".")]
    pub out_dir: PathBuf,

    /// Report format (defaults to the `[output]` config section)
    #[arg(long, value_enum)]
    pub report: Option<ReportArg>,

    /// Write the report to a file instead of stdout
    #[arg(long)]
    pub report_file: Option<PathBuf>,

    /// Keep results in the report only; don't save image files
    #[arg(long)]
    pub no_download: bool,

    /// Include base64 data URLs in the report
    #[arg(long)]
    pub include_data: bool,

    /// Number of files transcoded at once (defaults to config)
    #[arg(short, long)]
    pub parallel: Option<usize>,
}

/// Output image format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Lossless PNG
    #[default]
    Png,
    /// JPEG at the configured quality
    Jpg,
}

impl From<FormatArg> for TargetFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => TargetFormat::Png,
            FormatArg::Jpg => TargetFormat::Jpg,
        }
    }
}

/// Report format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ReportArg {
    /// Single JSON document
    Json,
    /// One JSON object per line
    Jsonl,
}

impl From<ReportArg> for ReportFormat {
    fn from(arg: ReportArg) -> Self {
        match arg {
            ReportArg::Json => ReportFormat::Json,
            ReportArg::Jsonl => ReportFormat::JsonLines,
        }
    }
}

/// Values match the clap `#[arg(default_value = ...)]` annotations above.
impl Default for OptimizeArgs {
    fn default() -> Self {
        Self {
            inputs: Vec::new(),
            format: FormatArg::Png,
            out_dir: PathBuf::from("."),
            report: None,
            report_file: None,
            no_download: false,
            include_data: false,
            parallel: None,
        }
    }
}

/// Execute the optimize command.
pub async fn execute(args: OptimizeArgs, mut config: Config) -> anyhow::Result<()> {
    apply_overrides(&mut config, &args);
    let report_format = resolve_report_format(&args, &config);
    let pretty = config.output.pretty;

    let candidates = super::collect_candidates(&args.inputs)?;
    tracing::info!("Offering {} file(s)", candidates.len());

    let mut optimizer = Optimizer::new(config);
    let outcome = optimizer.offer(candidates);
    for message in outcome.messages() {
        tracing::warn!("{message}");
    }
    if outcome.accepted.is_empty() {
        anyhow::bail!(
            "No files accepted{}",
            outcome
                .message()
                .map(|m| format!(": {m}"))
                .unwrap_or_default()
        );
    }

    optimizer.select_format(args.format.into());

    let start = Instant::now();
    let pb = create_progress_bar(outcome.accepted.len() as u64);
    let state = optimizer
        .optimize_with_progress(|completion| {
            pb.set_message(completion_label(completion));
            pb.inc(1);
        })
        .await?;
    pb.finish_and_clear();
    let elapsed = start.elapsed();

    for failure in state.failures() {
        tracing::error!("{failure}");
    }

    let saved = if args.no_download {
        Vec::new()
    } else {
        let out_dir = super::expand_path(&args.out_dir);
        std::fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create {}", out_dir.display()))?;
        let paths = save_all(state.artifacts(), &out_dir)?;
        for path in &paths {
            tracing::debug!("Saved {}", path.display());
        }
        paths
    };

    let mut report = Report::build(
        state.files(),
        state.slots(),
        state.last_outcome(),
        args.include_data,
    );
    report.attach_saved_paths(saved.iter().map(|p| p.display().to_string()));

    write_report(&report, report_format, pretty, args.report_file.as_deref())?;
    print_summary(state, saved.len(), elapsed);

    Ok(())
}

/// Apply CLI flags on top of the loaded config.
fn apply_overrides(config: &mut Config, args: &OptimizeArgs) {
    if let Some(parallel) = args.parallel {
        config.transcode.parallel_workers = parallel.max(1);
    }
}

fn resolve_report_format(args: &OptimizeArgs, config: &Config) -> ReportFormat {
    args.report
        .map(ReportFormat::from)
        .or_else(|| ReportFormat::parse(&config.output.format))
        .unwrap_or(ReportFormat::Json)
}

fn write_report(
    report: &Report,
    format: ReportFormat,
    pretty: bool,
    path: Option<&Path>,
) -> anyhow::Result<()> {
    match path {
        Some(path) => {
            let path = super::expand_path(path);
            let file = File::create(&path)
                .with_context(|| format!("Failed to create report {}", path.display()))?;
            let mut writer = ReportWriter::new(BufWriter::new(file), format, pretty);
            writer.write(report)?;
            writer.flush()?;
            tracing::info!("Report written to {}", path.display());
        }
        None => {
            let stdout = io::stdout();
            let mut writer = ReportWriter::new(stdout.lock(), format, pretty);
            writer.write(report)?;
            writer.flush()?;
        }
    }
    Ok(())
}

fn completion_label(completion: &Completion) -> String {
    match &completion.result {
        Ok(artifact) => artifact.file_name.clone(),
        Err(e) => format!("{} failed", e.file_name()),
    }
}

fn create_progress_bar(total: u64) -> indicatif::ProgressBar {
    use indicatif::{ProgressBar, ProgressStyle};

    let pb = ProgressBar::new(total);
    let style = ProgressStyle::default_bar()
        .template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("##-");
    pb.set_style(style);
    pb.set_message("starting...");
    pb
}

/// Print a summary table to stderr.
fn print_summary(state: &OptimizerState, saved: usize, elapsed: Duration) {
    let artifacts = state.artifacts();
    let failed = state.failures().len();
    let rejected = state
        .last_outcome()
        .map(|o| o.rejections.len())
        .unwrap_or_default();
    let original: u64 = artifacts.iter().map(|a| a.original_size).sum();
    let compressed: u64 = artifacts.iter().map(|a| a.compressed_size).sum();

    eprintln!();
    eprintln!("  ====================================");
    eprintln!("               Summary");
    eprintln!("  ====================================");
    eprintln!("    Optimized:    {:>8}", artifacts.len());
    if failed > 0 {
        eprintln!("    Failed:       {:>8}", failed);
    }
    if rejected > 0 {
        eprintln!("    Rejected:     {:>8}", rejected);
    }
    eprintln!("    Saved:        {:>8}", saved);
    eprintln!("  ------------------------------------");
    eprintln!("    Original:     {:>7.1} KB", original as f64 / 1024.0);
    eprintln!("    Optimized:    {:>7.1} KB", compressed as f64 / 1024.0);
    eprintln!("    Duration:     {:>7.1}s", elapsed.as_secs_f64());
    eprintln!("  ====================================");
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        args: OptimizeArgs,
    }

    #[test]
    fn test_default_matches_clap_defaults() {
        let parsed = Harness::try_parse_from(["optimize", "a.png"]).unwrap().args;
        let default = OptimizeArgs::default();

        assert_eq!(parsed.format, default.format);
        assert_eq!(parsed.out_dir, default.out_dir);
        assert_eq!(parsed.report, default.report);
        assert_eq!(parsed.no_download, default.no_download);
        assert_eq!(parsed.include_data, default.include_data);
        assert_eq!(parsed.parallel, default.parallel);
    }

    #[test]
    fn test_format_arg_maps_to_target() {
        assert_eq!(TargetFormat::from(FormatArg::Png), TargetFormat::Png);
        assert_eq!(TargetFormat::from(FormatArg::Jpg), TargetFormat::Jpg);
    }

    #[test]
    fn test_report_format_resolution() {
        let mut config = Config::default();
        let mut args = OptimizeArgs::default();
        assert_eq!(resolve_report_format(&args, &config), ReportFormat::Json);

        config.output.format = "jsonl".to_string();
        assert_eq!(resolve_report_format(&args, &config), ReportFormat::JsonLines);

        args.report = Some(ReportArg::Json);
        assert_eq!(resolve_report_format(&args, &config), ReportFormat::Json);
    }

    #[test]
    fn test_parallel_override() {
        let mut config = Config::default();
        let args = OptimizeArgs {
            parallel: Some(0),
            ..OptimizeArgs::default()
        };
        apply_overrides(&mut config, &args);
        assert_eq!(config.transcode.parallel_workers, 1);
    }

    #[tokio::test]
    async fn test_execute_saves_and_reports() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let input = src.path().join("Big Picture.png");
        image::DynamicImage::new_rgb8(1200, 600)
            .save_with_format(&input, image::ImageFormat::Png)
            .unwrap();
        let report_path = out.path().join("report.json");

        let args = OptimizeArgs {
            inputs: vec![input],
            out_dir: out.path().join("images"),
            report_file: Some(report_path.clone()),
            ..OptimizeArgs::default()
        };
        execute(args, Config::default()).await.unwrap();

        assert!(out.path().join("images").join("yubi-big-picture.png").exists());
        let report: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(report_path).unwrap()).unwrap();
        assert_eq!(report["summary"]["optimized"], 1);
        assert_eq!(report["entries"][0]["artifact"]["width"], 800);
    }

    #[tokio::test]
    async fn test_execute_fails_when_nothing_accepted() {
        let src = tempfile::tempdir().unwrap();
        let input = src.path().join("vector.svg");
        std::fs::write(&input, "<svg/>").unwrap();

        let args = OptimizeArgs {
            inputs: vec![input],
            no_download: true,
            ..OptimizeArgs::default()
        };
        let err = execute(args, Config::default()).await.unwrap_err();
        assert!(err.to_string().contains("SVG files are not supported."));
    }
}
