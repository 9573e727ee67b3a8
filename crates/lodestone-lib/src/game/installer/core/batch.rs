use crate::game::installer::core::downloader::{ArtifactStore, FetchedArtifact};
use crate::game::installer::types::ProgressReporter;
use anyhow::{Context, Result};
use futures::stream::{self, StreamExt, TryStreamExt};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// One verified download within a batch
#[derive(Debug, Clone)]
pub struct FetchJob {
    /// Human-readable label used in errors (library coordinate, asset path)
    pub name: String,
    pub url: String,
    pub path: PathBuf,
    pub sha1: String,
}

pub struct BatchDownloader {
    store: ArtifactStore,
    concurrency: usize,
}

impl BatchDownloader {
    pub fn new(store: ArtifactStore, concurrency: usize) -> Self {
        Self {
            store,
            concurrency: concurrency.max(1),
        }
    }

    /// Fetch every job with bounded parallelism. The first failure aborts
    /// the batch; in-flight downloads are dropped and clean up after themselves.
    pub async fn download_all(
        &self,
        jobs: Vec<FetchJob>,
        reporter: Arc<dyn ProgressReporter>,
    ) -> Result<Vec<FetchedArtifact>> {
        // Deduplicate jobs by path to avoid concurrent writes to the same file
        let mut unique_jobs = Vec::new();
        let mut seen_paths = HashSet::new();
        for job in jobs {
            if seen_paths.insert(job.path.clone()) {
                unique_jobs.push(job);
            }
        }

        let total = unique_jobs.len();
        if total == 0 {
            return Ok(Vec::new());
        }

        let completed = Arc::new(AtomicUsize::new(0));
        let fetched_count = Arc::new(AtomicUsize::new(0));
        reporter.set_step_count(0, Some(total as u32));

        let results = stream::iter(unique_jobs)
            .map(|job| {
                let store = self.store.clone();
                let reporter = reporter.clone();
                let completed = completed.clone();
                let fetched_count = fetched_count.clone();

                async move {
                    let fetched = store
                        .fetch_verified(&job.path, &job.url, &job.sha1)
                        .await
                        .with_context(|| format!("Failed to fetch {}", job.name))?;

                    if fetched.was_downloaded() {
                        fetched_count.fetch_add(1, Ordering::SeqCst);
                    }

                    let count = completed.fetch_add(1, Ordering::SeqCst) + 1;
                    reporter.set_step_count(count as u32, Some(total as u32));

                    if count % 10 == 0 || count == total {
                        log::debug!("Batch download progress: {}/{}", count, total);
                    }

                    Ok::<_, anyhow::Error>(fetched)
                }
            })
            .buffer_unordered(self.concurrency)
            .try_collect::<Vec<_>>()
            .await?;

        log::info!(
            "Batch complete: {} artifacts, {} downloaded, {} already present",
            total,
            fetched_count.load(Ordering::SeqCst),
            total - fetched_count.load(Ordering::SeqCst)
        );

        Ok(results)
    }
}
