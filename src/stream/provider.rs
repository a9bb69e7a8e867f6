//! Stream provider trait and common types.
//!
//! A [`StreamProvider`] knows how to turn a catalog URL for one streaming
//! service into title records, and a title into a [`PreparedStream`]: a
//! rewritten manifest plus clear content keys, ready for a download backend.

use std::path::PathBuf;

use async_trait::async_trait;
use tempfile::TempDir;

use crate::error::Result;
use crate::stream::titles::{Movies, Series, Title};

/// Quality selection strategy for stream variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StreamQuality {
    /// Highest available resolution.
    #[default]
    Best,
    /// Exact height if offered, otherwise the closest one.
    Specific(u32),
}

impl StreamQuality {
    /// `None` -> `Best`, `Some(h)` -> `Specific(h)`.
    pub fn from_height(height: Option<u32>) -> Self {
        height.map_or(Self::Best, Self::Specific)
    }
}

/// Manifest and subtitle references for one title.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Playlist {
    /// DASH manifest URL.
    pub manifest_url: String,
    /// WebVTT subtitle URL, if the program has captions.
    pub subtitle_url: Option<String>,
}

/// A title whose manifest and keys have been resolved.
///
/// Owns the working directory holding the manifest and key file; both are
/// removed when this value is dropped.
#[derive(Debug)]
pub struct PreparedStream {
    pub title: Title,
    /// Resolved vertical resolution.
    pub height: u32,
    /// Content keys as `kid:key`.
    pub keys: Vec<String>,
    pub manifest_path: PathBuf,
    pub key_file: PathBuf,
    pub workdir: TempDir,
}

/// Trait for streaming service providers.
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Short lowercase provider name (e.g., `"abciview"`).
    fn name(&self) -> &'static str;

    /// Returns `true` if this provider can handle the given URL.
    fn matches(&self, url: &str) -> bool;

    /// Resolve a show URL into its episodes.
    async fn get_series(&self, url: &str) -> Result<Series>;

    /// Resolve a film URL into a movie collection.
    async fn get_movies(&self, url: &str) -> Result<Movies>;

    /// Resolve a direct episode URL into a one-episode series.
    async fn get_episode(&self, url: &str) -> Result<Series>;

    /// Fetch manifest and subtitle references for a title id.
    async fn get_playlist(&self, video_id: &str) -> Result<Playlist>;

    /// Resolve manifest, quality and keys for a title.
    async fn prepare(&self, title: &Title, quality: StreamQuality) -> Result<PreparedStream>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quality_from_height() {
        assert_eq!(StreamQuality::from_height(None), StreamQuality::Best);
        assert_eq!(StreamQuality::from_height(Some(720)), StreamQuality::Specific(720));
        assert_eq!(StreamQuality::default(), StreamQuality::Best);
    }
}
