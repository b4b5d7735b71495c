//! CLI command implementations.

pub mod config;
pub mod inspect;
pub mod optimize;

use anyhow::Context;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use yubi_core::types::media_type_for_path;
use yubi_core::{Config, ConfigError, UploadCandidate};

/// Load config from an explicit path, or from the default location.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    match path {
        Some(path) => Config::load_from(path),
        None => Config::load(),
    }
}

/// Expand `~` and environment variables in a user-supplied path.
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(&raw) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => path.to_path_buf(),
    }
}

/// Turn input paths into upload candidates.
///
/// Directories contribute the image files directly inside them (not
/// recursive), sorted by path. Explicit file inputs are offered as given.
/// Order is otherwise preserved, since intake checks depend on it.
pub fn collect_candidates(inputs: &[PathBuf]) -> anyhow::Result<Vec<UploadCandidate>> {
    let mut candidates = Vec::new();

    for input in inputs {
        let input = expand_path(input);
        if !input.exists() {
            anyhow::bail!("Path does not exist: {}", input.display());
        }

        if input.is_dir() {
            let files = discover_images(&input);
            tracing::debug!("{} image(s) found in {}", files.len(), input.display());

            for file in files {
                candidates.push(candidate_for(&file)?);
            }
        } else {
            candidates.push(candidate_for(&input)?);
        }
    }

    Ok(candidates)
}

/// Image files directly inside `dir`, sorted by path.
fn discover_images(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|entry| entry.into_path())
        .filter(|path| path.is_file() && is_image(path))
        .collect();

    // Sort by path for deterministic ordering
    files.sort();
    files
}

/// Check if a file has an image extension.
fn is_image(path: &Path) -> bool {
    media_type_for_path(path).starts_with("image/")
}

fn candidate_for(path: &Path) -> anyhow::Result<UploadCandidate> {
    UploadCandidate::from_path(path).with_context(|| format!("Failed to read {}", path.display()))
}
