//! Writing artifacts to disk, one at a time or all at once.
//!
//! Two uploads can sanitize to the same download name ("Photo One.png" and
//! "photo-one.png"). Like a browser's download manager, an existing file is
//! never overwritten; a ` (n)` suffix is added instead.

use std::path::{Path, PathBuf};

use crate::error::{download_error, Result};
use crate::pipeline::parse_data_url;
use crate::types::OutputArtifact;

/// Upper bound on ` (n)` suffixes tried before giving up.
const MAX_NAME_ATTEMPTS: u32 = 1000;

/// Write one artifact into `dir` and return the path written.
pub fn save_artifact(artifact: &OutputArtifact, dir: &Path) -> Result<PathBuf> {
    let (_, bytes) = parse_data_url(&artifact.data_url).ok_or_else(|| {
        download_error(&artifact.file_name, dir, "artifact has no embedded image data")
    })?;

    std::fs::create_dir_all(dir).map_err(|e| download_error(&artifact.file_name, dir, e))?;

    let path = unique_path(dir, &artifact.file_name)
        .ok_or_else(|| download_error(&artifact.file_name, dir, "no free file name"))?;

    std::fs::write(&path, &bytes).map_err(|e| download_error(&artifact.file_name, &path, e))?;
    tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(path)
}

/// Write every artifact into `dir`, in order. Stops at the first failure.
pub fn save_all<'a, I>(artifacts: I, dir: &Path) -> Result<Vec<PathBuf>>
where
    I: IntoIterator<Item = &'a OutputArtifact>,
{
    artifacts
        .into_iter()
        .map(|artifact| save_artifact(artifact, dir))
        .collect()
}

fn unique_path(dir: &Path, file_name: &str) -> Option<PathBuf> {
    let candidate = dir.join(file_name);
    if !candidate.exists() {
        return Some(candidate);
    }

    let (stem, ext) = match file_name.rsplit_once('.') {
        Some((stem, ext)) => (stem, Some(ext)),
        None => (file_name, None),
    };

    (1..MAX_NAME_ATTEMPTS)
        .map(|n| match ext {
            Some(ext) => dir.join(format!("{} ({}).{}", stem, n, ext)),
            None => dir.join(format!("{} ({})", stem, n)),
        })
        .find(|path| !path.exists())
}
