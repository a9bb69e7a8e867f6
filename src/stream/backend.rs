//! Download backend trait.
//!
//! A [`DownloadBackend`] takes a prepared (rewritten) manifest and key file
//! and produces a muxed file on disk, usually by invoking an external tool.
//! [`download`] wraps a backend with the skip-if-exists check.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, info};

use crate::error::Result;

/// Container extension of finished downloads.
pub const OUTPUT_EXTENSION: &str = "mkv";

/// Everything a backend needs for one title.
#[derive(Debug, Clone)]
pub struct DownloadJob<'a> {
    pub manifest_path: &'a Path,
    pub key_file: &'a Path,
    /// Scratch directory for segments.
    pub tmp_dir: &'a Path,
    pub save_dir: PathBuf,
    /// File name without extension.
    pub save_name: String,
    /// Video height to select.
    pub height: u32,
}

impl DownloadJob<'_> {
    /// Final muxed file.
    pub fn output_path(&self) -> PathBuf {
        self.save_dir
            .join(format!("{}.{OUTPUT_EXTENSION}", self.save_name))
    }

    /// Sidecar subtitle a previous interrupted run may have left behind.
    pub fn subtitle_path(&self) -> PathBuf {
        self.save_dir.join(format!("{}.vtt", self.save_name))
    }
}

/// What [`download`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Completed(PathBuf),
    /// Output already existed; nothing was run.
    Skipped(PathBuf),
}

/// Trait for download backends.
#[async_trait]
pub trait DownloadBackend: Send + Sync {
    /// Short backend name for logs.
    fn name(&self) -> &'static str;

    /// Fetch, decrypt and mux `job`. Non-zero exits are errors.
    async fn run(&self, job: &DownloadJob<'_>) -> Result<()>;
}

/// Run `job` on `backend` unless its output already exists.
pub async fn download(
    backend: &dyn DownloadBackend,
    job: &DownloadJob<'_>,
) -> Result<DownloadOutcome> {
    let output = job.output_path();

    if tokio::fs::try_exists(&output).await? {
        info!("{} already exists, skipping download", output.display());
        let subtitle = job.subtitle_path();
        if tokio::fs::try_exists(&subtitle).await? {
            tokio::fs::remove_file(&subtitle).await?;
            debug!("Removed orphaned {}", subtitle.display());
        }
        return Ok(DownloadOutcome::Skipped(output));
    }

    tokio::fs::create_dir_all(&job.save_dir).await?;
    debug!(backend = backend.name(), "Starting download");
    backend.run(job).await?;
    Ok(DownloadOutcome::Completed(output))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingBackend {
        runs: AtomicUsize,
    }

    #[async_trait]
    impl DownloadBackend for CountingBackend {
        fn name(&self) -> &'static str {
            "counting"
        }

        async fn run(&self, job: &DownloadJob<'_>) -> Result<()> {
            self.runs.fetch_add(1, Ordering::SeqCst);
            tokio::fs::write(job.output_path(), b"media").await?;
            Ok(())
        }
    }

    fn job<'a>(dir: &'a Path) -> DownloadJob<'a> {
        DownloadJob {
            manifest_path: dir,
            key_file: dir,
            tmp_dir: dir,
            save_dir: dir.join("Show"),
            save_name: "Show.S01E01.1080p".to_string(),
            height: 1080,
        }
    }

    #[tokio::test]
    async fn existing_output_skips_backend() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());
        std::fs::create_dir_all(&job.save_dir).unwrap();
        std::fs::write(job.output_path(), b"old").unwrap();
        std::fs::write(job.subtitle_path(), b"WEBVTT").unwrap();

        let backend = CountingBackend::default();
        let outcome = download(&backend, &job).await.unwrap();

        assert_eq!(outcome, DownloadOutcome::Skipped(job.output_path()));
        assert_eq!(backend.runs.load(Ordering::SeqCst), 0);
        assert!(!job.subtitle_path().exists());
    }

    #[tokio::test]
    async fn missing_output_runs_backend() {
        let dir = tempfile::tempdir().unwrap();
        let job = job(dir.path());

        let backend = CountingBackend::default();
        let outcome = download(&backend, &job).await.unwrap();

        assert_eq!(outcome, DownloadOutcome::Completed(job.output_path()));
        assert_eq!(backend.runs.load(Ordering::SeqCst), 1);
        assert!(job.output_path().exists());
    }

    #[test]
    fn output_path_uses_mkv() {
        let job = job(Path::new("/tmp/x"));
        assert_eq!(job.output_path(), PathBuf::from("/tmp/x/Show/Show.S01E01.1080p.mkv"));
    }
}
