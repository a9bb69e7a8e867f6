//! N_m3u8DL-RE bridge backend
//!
//! Uses the N_m3u8DL-RE subprocess for:
//! - DASH segment download from the rewritten local manifest
//! - CENC decryption with the resolved key file
//! - Muxing video, audio and subtitles into MKV

use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

use crate::error::{Result, StreamError};
use crate::stream::backend::{DownloadBackend, DownloadJob};

const BINARY_NAME: &str = "N_m3u8DL-RE";

/// N_m3u8DL-RE-based download backend
pub struct NM3u8DlBackend {
    /// Path to the N_m3u8DL-RE binary
    binary: PathBuf,
    /// Additional arguments appended after the generated ones
    extra_args: Vec<String>,
}

impl NM3u8DlBackend {
    /// Create new backend, searching for the binary in PATH
    pub fn new() -> Self {
        let binary = which::which(BINARY_NAME).unwrap_or_else(|_| PathBuf::from(BINARY_NAME));
        Self {
            binary,
            extra_args: Vec::new(),
        }
    }

    /// Specify custom binary path
    #[must_use]
    pub fn with_binary_path(mut self, path: &Path) -> Self {
        self.binary = path.to_path_buf();
        self
    }

    /// Add extra arguments
    #[must_use]
    pub fn with_extra_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Build command arguments for a job
    fn build_args(&self, job: &DownloadJob<'_>) -> Vec<String> {
        let path = |p: &Path| p.to_string_lossy().to_string();

        let mut args = vec![
            path(job.manifest_path),
            "--key-text-file".to_string(),
            path(job.key_file),
            // Video: the resolved height only
            "--select-video".to_string(),
            format!("res={}:for=best", job.height),
            "--select-audio".to_string(),
            "all".to_string(),
            "--select-subtitle".to_string(),
            "all".to_string(),
            // Mux into a single MKV
            "-M".to_string(),
            "format=mkv:muxer=mkvmerge".to_string(),
            "--save-name".to_string(),
            job.save_name.clone(),
            "--save-dir".to_string(),
            path(&job.save_dir),
            "--tmp-dir".to_string(),
            path(job.tmp_dir),
            "--no-log".to_string(),
        ];

        args.extend(self.extra_args.iter().cloned());
        args
    }

    /// Check if the binary is available
    pub async fn check_available(&self) -> bool {
        Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }
}

impl Default for NM3u8DlBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DownloadBackend for NM3u8DlBackend {
    fn name(&self) -> &'static str {
        "n_m3u8dl-re"
    }

    async fn run(&self, job: &DownloadJob<'_>) -> Result<()> {
        let args = self.build_args(job);
        debug!("{BINARY_NAME} args: {:?}", args);

        let status = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| {
                StreamError::Download(format!("failed to run {}: {e}", self.binary.display()))
            })?;

        if !status.success() {
            return Err(StreamError::Download(format!(
                "{BINARY_NAME} exited with status: {status}"
            )));
        }

        Ok(())
    }
}
