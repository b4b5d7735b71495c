//! Concurrent batch transcoding with indexed completions.
//!
//! One tokio task per file, bounded by a semaphore. Each finished file is
//! delivered as a [`Completion`] carrying its submission index, so consumers
//! can place results into pre-sized slots regardless of finishing order.
//! Exactly one completion is delivered per submitted file, even if a worker
//! task panics.

use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};

use crate::error::PipelineError;
use crate::types::{AcceptedFile, OutputArtifact, TargetFormat};

use super::processor::Transcoder;

/// Outcome for one submitted file.
#[derive(Debug)]
pub struct Completion {
    /// Position of the file in the submitted list
    pub index: usize,
    /// The artifact, or why it could not be produced
    pub result: Result<OutputArtifact, PipelineError>,
}

/// Start transcoding `files` and return a receiver of completions.
///
/// The receiver yields exactly `files.len()` items, then closes.
pub fn spawn_batch(
    transcoder: Arc<Transcoder>,
    files: Vec<AcceptedFile>,
    format: TargetFormat,
    parallel: usize,
) -> mpsc::Receiver<Completion> {
    let (tx, rx) = mpsc::channel(files.len().max(1));
    let semaphore = Arc::new(Semaphore::new(parallel.max(1)));

    tokio::spawn(async move {
        let mut handles = Vec::with_capacity(files.len());

        for (index, file) in files.into_iter().enumerate() {
            let permit = match semaphore.clone().acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::warn!("Transcode semaphore closed unexpectedly");
                    let _ = tx
                        .send(Completion {
                            index,
                            result: Err(PipelineError::Task {
                                name: file.name,
                                message: "worker pool closed".to_string(),
                            }),
                        })
                        .await;
                    continue;
                }
            };

            let transcoder = transcoder.clone();
            let tx = tx.clone();
            let name = file.name.clone();

            let handle = tokio::spawn(async move {
                let result = transcoder.transcode(&file, format).await;
                drop(permit);
                if let Err(e) = &result {
                    tracing::warn!("{}", e);
                }
                // Receiver dropped means nobody is listening any more
                let _ = tx.send(Completion { index, result }).await;
            });

            handles.push((index, name, handle));
        }

        for (index, name, handle) in handles {
            if let Err(e) = handle.await {
                tracing::error!("Transcode task for {} panicked: {}", name, e);
                let _ = tx
                    .send(Completion {
                        index,
                        result: Err(PipelineError::Task {
                            name,
                            message: e.to_string(),
                        }),
                    })
                    .await;
            }
        }
    });

    rx
}

/// Transcode `files` and collect the results in submission order.
pub async fn transcode_all(
    transcoder: Arc<Transcoder>,
    files: Vec<AcceptedFile>,
    format: TargetFormat,
    parallel: usize,
) -> Vec<Result<OutputArtifact, PipelineError>> {
    let total = files.len();
    let names: Vec<String> = files.iter().map(|f| f.name.clone()).collect();
    let mut slots: Vec<Option<Result<OutputArtifact, PipelineError>>> = vec![None; total];
    let mut completed = 0usize;

    let mut rx = spawn_batch(transcoder, files, format, parallel);
    while let Some(completion) = rx.recv().await {
        if let Some(slot) = slots.get_mut(completion.index) {
            if slot.is_none() {
                completed += 1;
            }
            *slot = Some(completion.result);
        }
        if completed == total {
            break;
        }
    }

    slots
        .into_iter()
        .zip(names)
        .map(|(slot, name)| {
            slot.unwrap_or_else(|| {
                Err(PipelineError::Task {
                    name,
                    message: "no result delivered".to_string(),
                })
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TranscodeConfig;
    use crate::types::UploadCandidate;
    use image::{DynamicImage, ImageFormat};
    use std::io::Cursor;

    fn png_file(name: &str, width: u32, height: u32) -> AcceptedFile {
        let img = DynamicImage::new_rgb8(width, height);
        let mut buffer = Cursor::new(Vec::new());
        img.write_to(&mut buffer, ImageFormat::Png).unwrap();
        UploadCandidate::from_bytes(name, "image/png", buffer.into_inner()).into()
    }

    fn transcoder() -> Arc<Transcoder> {
        Arc::new(Transcoder::new(TranscodeConfig::default()))
    }

    #[tokio::test]
    async fn test_results_keep_submission_order() {
        // Large first file finishes last with several workers
        let files = vec![
            png_file("big.png", 2400, 1800),
            png_file("mid.png", 300, 200),
            png_file("tiny.png", 4, 4),
        ];

        let results = transcode_all(transcoder(), files, TargetFormat::Png, 3).await;
        let names: Vec<_> = results
            .iter()
            .map(|r| r.as_ref().unwrap().source_name.as_str())
            .collect();
        assert_eq!(names, ["big.png", "mid.png", "tiny.png"]);
    }

    #[tokio::test]
    async fn test_failure_does_not_abort_siblings() {
        let files = vec![
            png_file("one.png", 10, 10),
            UploadCandidate::from_bytes("corrupt.png", "image/png", vec![0x89, b'P', b'N', b'G'])
                .into(),
            png_file("three.png", 10, 10),
        ];

        let results = transcode_all(transcoder(), files, TargetFormat::Jpg, 2).await;
        assert_eq!(results.len(), 3);
        assert!(results[0].is_ok());
        assert!(matches!(results[1], Err(PipelineError::Decode { .. })));
        assert!(results[2].is_ok());
    }

    #[tokio::test]
    async fn test_one_completion_per_file() {
        let files: Vec<_> = (0..6)
            .map(|i| png_file(&format!("f{i}.png"), 8, 8))
            .collect();

        let mut rx = spawn_batch(transcoder(), files, TargetFormat::Png, 2);
        let mut seen = Vec::new();
        while let Some(completion) = rx.recv().await {
            seen.push(completion.index);
        }
        seen.sort();
        assert_eq!(seen, [0, 1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let results = transcode_all(transcoder(), Vec::new(), TargetFormat::Png, 4).await;
        assert!(results.is_empty());
    }
}
