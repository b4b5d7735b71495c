//! Intake validation for offered file batches.
//!
//! A batch is checked against the files already accepted. The count limit is
//! all-or-nothing and runs before anything else; the per-file checks then run
//! in order: duplicate name, unsupported media type, size limit.

use crate::config::IntakeConfig;
use crate::error::IntakeError;
use crate::types::{AcceptedFile, UploadCandidate};

/// Validates offered batches against the intake limits.
#[derive(Debug, Clone)]
pub struct IntakeValidator {
    config: IntakeConfig,
}

/// Result of offering one batch.
#[derive(Debug, Clone, Default)]
pub struct ValidationOutcome {
    /// Newly accepted files, in offer order
    pub accepted: Vec<AcceptedFile>,

    /// Every rejection, in the order it was found
    pub rejections: Vec<IntakeError>,
}

impl IntakeValidator {
    /// Create a new validator with the given limits.
    pub fn new(config: IntakeConfig) -> Self {
        Self { config }
    }

    /// The limits this validator enforces.
    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Validate `batch` against the files in `existing`.
    ///
    /// Nothing in `existing` is modified; callers append
    /// [`ValidationOutcome::accepted`] to their own collection.
    pub fn offer(&self, existing: &[AcceptedFile], batch: Vec<UploadCandidate>) -> ValidationOutcome {
        let mut outcome = ValidationOutcome::default();

        if existing.len() + batch.len() > self.config.max_files {
            tracing::debug!(
                "Rejecting batch of {} (already holding {}, limit {})",
                batch.len(),
                existing.len(),
                self.config.max_files
            );
            outcome.rejections.push(IntakeError::BatchLimitExceeded {
                offered: batch.len(),
                already_accepted: existing.len(),
                max_files: self.config.max_files,
            });
            return outcome;
        }

        let max_bytes = self.config.max_file_size_bytes();

        for candidate in batch {
            let is_duplicate = existing
                .iter()
                .chain(outcome.accepted.iter())
                .any(|file| file.name == candidate.name);

            if is_duplicate {
                outcome.rejections.push(IntakeError::DuplicateFile {
                    name: candidate.name,
                });
                continue;
            }

            if self.is_unsupported(&candidate.media_type) {
                outcome.rejections.push(IntakeError::UnsupportedType {
                    format: format_label(&candidate.media_type),
                    name: candidate.name,
                    media_type: candidate.media_type,
                });
                continue;
            }

            if candidate.size > max_bytes {
                outcome.rejections.push(IntakeError::OversizedFile {
                    name: candidate.name,
                    size: candidate.size,
                    max_mb: self.config.max_file_size_label(),
                });
                continue;
            }

            tracing::trace!("Accepted {} ({} bytes)", candidate.name, candidate.size);
            outcome.accepted.push(candidate.into());
        }

        outcome
    }

    fn is_unsupported(&self, media_type: &str) -> bool {
        self.config
            .unsupported_types
            .iter()
            .any(|t| t.eq_ignore_ascii_case(media_type))
    }
}

impl ValidationOutcome {
    /// True when every offered file was accepted.
    pub fn is_clean(&self) -> bool {
        self.rejections.is_empty()
    }

    /// Names rejected as duplicates.
    pub fn duplicates(&self) -> Vec<&str> {
        self.rejections
            .iter()
            .filter_map(|r| match r {
                IntakeError::DuplicateFile { name } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Names rejected for exceeding the size limit.
    pub fn oversized(&self) -> Vec<&str> {
        self.rejections
            .iter()
            .filter_map(|r| match r {
                IntakeError::OversizedFile { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Rejections for unsupported media types.
    pub fn unsupported(&self) -> Vec<&IntakeError> {
        self.rejections
            .iter()
            .filter(|r| matches!(r, IntakeError::UnsupportedType { .. }))
            .collect()
    }

    /// The batch-limit rejection, if the whole batch was refused.
    pub fn batch_limit(&self) -> Option<&IntakeError> {
        self.rejections
            .iter()
            .find(|r| matches!(r, IntakeError::BatchLimitExceeded { .. }))
    }

    /// One message per rejection cause.
    ///
    /// Order: batch limit, duplicates, unsupported types, oversized files.
    pub fn messages(&self) -> Vec<String> {
        if let Some(limit) = self.batch_limit() {
            return vec![limit.to_string()];
        }

        let mut messages = Vec::new();

        let duplicates = self.duplicates();
        if !duplicates.is_empty() {
            messages.push(format!("{} already uploaded.", duplicates.join(", ")));
        }

        let mut formats: Vec<&str> = Vec::new();
        for rejection in self.unsupported() {
            if let IntakeError::UnsupportedType { format, .. } = rejection {
                if !formats.contains(&format.as_str()) {
                    formats.push(format);
                }
            }
        }
        if !formats.is_empty() {
            messages.push(format!("{} files are not supported.", formats.join(", ")));
        }

        if let Some(message) = self.oversized_message() {
            messages.push(message);
        }

        messages
    }

    /// The single message the browser tool would have shown.
    ///
    /// Later checks overwrite earlier ones, so an oversized file wins over an
    /// unsupported type, which wins over a duplicate. For unsupported types the
    /// last offending format is named.
    pub fn message(&self) -> Option<String> {
        if let Some(limit) = self.batch_limit() {
            return Some(limit.to_string());
        }
        if let Some(message) = self.oversized_message() {
            return Some(message);
        }
        if let Some(last) = self.unsupported().last() {
            return Some(last.to_string());
        }
        let duplicates = self.duplicates();
        if !duplicates.is_empty() {
            return Some(format!("{} already uploaded.", duplicates.join(", ")));
        }
        None
    }

    fn oversized_message(&self) -> Option<String> {
        let oversized: Vec<&IntakeError> = self
            .rejections
            .iter()
            .filter(|r| matches!(r, IntakeError::OversizedFile { .. }))
            .collect();

        match oversized.as_slice() {
            [] => None,
            [single] => Some(single.to_string()),
            [IntakeError::OversizedFile { max_mb, .. }, ..] => Some(format!(
                "{} exceed the {}MB size limit.",
                self.oversized().join(", "),
                max_mb
            )),
            _ => None,
        }
    }
}

/// Short display label for a media type: "image/svg+xml" becomes "SVG".
fn format_label(media_type: &str) -> String {
    let subtype = media_type.rsplit('/').next().unwrap_or(media_type);
    let subtype = subtype.split('+').next().unwrap_or(subtype);
    let subtype = subtype.strip_prefix("x-").unwrap_or(subtype);
    subtype.to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str, media_type: &str, size: usize) -> UploadCandidate {
        UploadCandidate::from_bytes(name, media_type, vec![0u8; size])
    }

    fn png(name: &str) -> UploadCandidate {
        candidate(name, "image/png", 16)
    }

    fn validator() -> IntakeValidator {
        IntakeValidator::new(IntakeConfig::default())
    }

    fn accept_all(validator: &IntakeValidator, names: &[&str]) -> Vec<AcceptedFile> {
        let outcome = validator.offer(&[], names.iter().map(|n| png(n)).collect());
        assert!(outcome.is_clean());
        outcome.accepted
    }

    #[test]
    fn test_accepts_valid_batch_in_order() {
        let outcome = validator().offer(&[], vec![png("a.png"), png("b.png"), png("c.png")]);
        let names: Vec<_> = outcome.accepted.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["a.png", "b.png", "c.png"]);
        assert!(outcome.message().is_none());
    }

    #[test]
    fn test_duplicate_against_existing() {
        let v = validator();
        let existing = accept_all(&v, &["a.png", "b.png"]);

        let outcome = v.offer(&existing, vec![png("a.png"), png("c.png"), png("b.png")]);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.accepted[0].name, "c.png");
        assert_eq!(outcome.duplicates(), ["a.png", "b.png"]);
        assert_eq!(
            outcome.message().as_deref(),
            Some("a.png, b.png already uploaded.")
        );
    }

    #[test]
    fn test_duplicate_within_same_batch() {
        let outcome = validator().offer(&[], vec![png("a.png"), png("a.png")]);
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.duplicates(), ["a.png"]);
    }

    #[test]
    fn test_duplicate_policy_uses_original_name() {
        // Both sanitize to "photo-one" but are distinct uploads
        let outcome = validator().offer(&[], vec![png("Photo One.png"), png("photo-one.png")]);
        assert_eq!(outcome.accepted.len(), 2);
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_unsupported_types_named_in_message() {
        let outcome = validator().offer(
            &[],
            vec![
                candidate("logo.svg", "image/svg+xml", 10),
                png("ok.png"),
                candidate("scan.tif", "image/tiff", 10),
            ],
        );
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.unsupported().len(), 2);
        assert_eq!(
            outcome.message().as_deref(),
            Some("TIFF files are not supported.")
        );
        assert_eq!(outcome.messages(), ["SVG, TIFF files are not supported."]);
    }

    #[test]
    fn test_oversized_files_collected() {
        let mut config = IntakeConfig::default();
        config.max_file_size_mb = 0.001; // 1048 bytes
        let v = IntakeValidator::new(config);

        let outcome = v.offer(
            &[],
            vec![
                candidate("big1.png", "image/png", 2000),
                candidate("small.png", "image/png", 1000),
                candidate("big2.png", "image/png", 4000),
            ],
        );
        assert_eq!(outcome.accepted.len(), 1);
        assert_eq!(outcome.oversized(), ["big1.png", "big2.png"]);
        assert_eq!(
            outcome.message().as_deref(),
            Some("big1.png, big2.png exceed the 0.001MB size limit.")
        );
    }

    #[test]
    fn test_single_oversized_message() {
        let mut config = IntakeConfig::default();
        config.max_file_size_mb = 1.0;
        let v = IntakeValidator::new(config);

        let outcome = v.offer(&[], vec![candidate("huge.jpg", "image/jpeg", 2 * 1024 * 1024)]);
        assert_eq!(
            outcome.message().as_deref(),
            Some("huge.jpg exceeds the 1MB size limit.")
        );
    }

    #[test]
    fn test_size_exactly_at_limit_is_accepted() {
        let mut config = IntakeConfig::default();
        config.max_file_size_mb = 1.0;
        let v = IntakeValidator::new(config);

        let outcome = v.offer(&[], vec![candidate("edge.png", "image/png", 1024 * 1024)]);
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_batch_limit_rejects_whole_batch() {
        let v = validator();
        let existing = accept_all(&v, &["a.png", "b.png", "c.png"]);

        // 3 + 3 > 5: nothing accepted, not even the valid ones
        let outcome = v.offer(&existing, vec![png("d.png"), png("e.png"), png("a.png")]);
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejections.len(), 1);
        assert!(outcome.batch_limit().is_some());
        assert_eq!(
            outcome.message().as_deref(),
            Some("Too many files. You can upload up to 5 files at once.")
        );
    }

    #[test]
    fn test_batch_limit_exactly_full_is_accepted() {
        let v = validator();
        let existing = accept_all(&v, &["a.png", "b.png", "c.png"]);

        let outcome = v.offer(&existing, vec![png("d.png"), png("e.png")]);
        assert_eq!(outcome.accepted.len(), 2);
        assert!(outcome.is_clean());
    }

    #[test]
    fn test_message_precedence_follows_check_order() {
        let mut config = IntakeConfig::default();
        config.max_file_size_mb = 0.001;
        let v = IntakeValidator::new(config);
        let existing = v.offer(&[], vec![png("dup.png")]).accepted;

        let outcome = v.offer(
            &existing,
            vec![
                png("dup.png"),
                candidate("logo.svg", "image/svg+xml", 10),
                candidate("big.png", "image/png", 5000),
            ],
        );
        assert!(outcome.accepted.is_empty());
        assert_eq!(outcome.rejections.len(), 3);
        assert_eq!(
            outcome.message().as_deref(),
            Some("big.png exceeds the 0.001MB size limit.")
        );
        assert_eq!(outcome.messages().len(), 3);
    }

    #[test]
    fn test_format_label() {
        assert_eq!(format_label("image/svg+xml"), "SVG");
        assert_eq!(format_label("image/x-tiff"), "TIFF");
        assert_eq!(format_label("image/tiff"), "TIFF");
    }

    #[test]
    fn test_accepted_names_stay_unique_across_offers() {
        let v = IntakeValidator::new(IntakeConfig {
            max_files: 50,
            ..IntakeConfig::default()
        });
        let mut accepted: Vec<AcceptedFile> = Vec::new();
        let batches = [
            vec!["a.png", "b.png", "a.png"],
            vec!["b.png", "c.png"],
            vec!["c.png", "d.png", "d.png", "e.png"],
        ];
        for batch in batches {
            let outcome = v.offer(&accepted, batch.into_iter().map(png).collect());
            accepted.extend(outcome.accepted);
        }

        let mut names: Vec<_> = accepted.iter().map(|f| f.name.clone()).collect();
        let total = names.len();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), total);
        assert_eq!(total, 5);
    }
}
