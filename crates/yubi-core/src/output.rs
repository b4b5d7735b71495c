//! Batch reports in JSON or JSONL.
//!
//! A report has one [`ReportEntry`] per accepted file, in upload order,
//! followed by a [`ReportSummary`]. Intake rejections are listed separately
//! because they never reach a slot.

use serde::Serialize;
use std::io::{self, Write};

use crate::intake::ValidationOutcome;
use crate::state::SlotResult;
use crate::types::{AcceptedFile, OutputArtifact};

/// Report format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportFormat {
    /// Single JSON document
    Json,
    /// One JSON object per line
    JsonLines,
}

impl ReportFormat {
    /// Parse format from string (case-insensitive).
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "json" => Some(Self::Json),
            "jsonl" | "jsonlines" | "ndjson" => Some(Self::JsonLines),
            _ => None,
        }
    }
}

/// Status of one accepted file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    /// Artifact produced
    Optimized,
    /// Transcoding failed
    Failed,
    /// Not part of the latest run
    Pending,
}

/// Report line for one accepted file.
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub index: usize,
    pub source_name: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub artifact: Option<OutputArtifact>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_to: Option<String>,
}

/// Totals for a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportSummary {
    pub accepted: usize,
    pub rejected: usize,
    pub optimized: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub messages: Vec<String>,
}

/// A complete run report.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub entries: Vec<ReportEntry>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub rejections: Vec<String>,
    pub summary: ReportSummary,
}

impl Report {
    /// Build a report from index-aligned files and slots.
    ///
    /// Artifact payloads are dropped unless `include_data` is set; they are
    /// large and already written to disk by the caller.
    pub fn build(
        files: &[AcceptedFile],
        slots: &[Option<SlotResult>],
        outcome: Option<&ValidationOutcome>,
        include_data: bool,
    ) -> Self {
        let mut summary = ReportSummary {
            accepted: files.len(),
            ..ReportSummary::default()
        };

        let entries = files
            .iter()
            .zip(slots.iter())
            .enumerate()
            .map(|(index, (file, slot))| {
                let mut entry = ReportEntry {
                    index,
                    source_name: file.name.clone(),
                    status: EntryStatus::Pending,
                    artifact: None,
                    error: None,
                    saved_to: None,
                };
                match slot {
                    Some(Ok(artifact)) => {
                        summary.optimized += 1;
                        summary.original_bytes += artifact.original_size;
                        summary.compressed_bytes += artifact.compressed_size;
                        let mut artifact = artifact.clone();
                        if !include_data {
                            artifact.data_url.clear();
                        }
                        entry.status = EntryStatus::Optimized;
                        entry.artifact = Some(artifact);
                    }
                    Some(Err(e)) => {
                        summary.failed += 1;
                        entry.status = EntryStatus::Failed;
                        entry.error = Some(e.to_string());
                    }
                    None => {}
                }
                entry
            })
            .collect();

        let rejections: Vec<String> = outcome
            .map(|o| o.rejections.iter().map(|r| r.to_string()).collect())
            .unwrap_or_default();
        summary.rejected = rejections.len();
        summary.messages = outcome.map(ValidationOutcome::messages).unwrap_or_default();

        Self {
            entries,
            rejections,
            summary,
        }
    }

    /// Record where each optimized entry was saved, in entry order.
    pub fn attach_saved_paths<I, S>(&mut self, paths: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut paths = paths.into_iter();
        for entry in self
            .entries
            .iter_mut()
            .filter(|e| e.status == EntryStatus::Optimized)
        {
            match paths.next() {
                Some(path) => entry.saved_to = Some(path.into()),
                None => break,
            }
        }
    }
}

/// A writer that serializes reports to JSON or JSONL.
pub struct ReportWriter<W: Write> {
    writer: W,
    format: ReportFormat,
    pretty: bool,
}

impl<W: Write> ReportWriter<W> {
    /// Create a new report writer.
    ///
    /// `pretty` only affects JSON; JSONL is always one object per line.
    pub fn new(writer: W, format: ReportFormat, pretty: bool) -> Self {
        Self {
            writer,
            format,
            pretty,
        }
    }

    /// Write a full report.
    ///
    /// JSON writes the report as one document. JSONL writes each entry on its
    /// own line, then the summary.
    pub fn write(&mut self, report: &Report) -> io::Result<()> {
        match self.format {
            ReportFormat::Json => {
                if self.pretty {
                    serde_json::to_writer_pretty(&mut self.writer, report)
                        .map_err(io::Error::other)?;
                } else {
                    serde_json::to_writer(&mut self.writer, report).map_err(io::Error::other)?;
                }
                writeln!(self.writer)?;
            }
            ReportFormat::JsonLines => {
                for entry in &report.entries {
                    self.write_line(entry)?;
                }
                self.write_line(&SummaryLine {
                    summary: &report.summary,
                    rejections: &report.rejections,
                })?;
            }
        }
        Ok(())
    }

    fn write_line<T: Serialize>(&mut self, item: &T) -> io::Result<()> {
        serde_json::to_writer(&mut self.writer, item).map_err(io::Error::other)?;
        writeln!(self.writer)
    }

    /// Flush the underlying writer.
    pub fn flush(&mut self) -> io::Result<()> {
        self.writer.flush()
    }

    /// Consume the writer and return the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

#[derive(Serialize)]
struct SummaryLine<'a> {
    summary: &'a ReportSummary,
    rejections: &'a [String],
}
