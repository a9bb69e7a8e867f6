//! Error types for the iview adapter.
//!
//! Fatal conditions only. Upstream fields that may legitimately be absent are
//! modelled as `Option` in the response structs and never become an error.

use thiserror::Error;

/// Result alias used throughout the library.
pub type Result<T> = std::result::Result<T, StreamError>;

#[derive(Debug, Error)]
pub enum StreamError {
    /// A CLI mode this service cannot honour. Raised before any network call.
    #[error("{0} is not supported on this service")]
    UnsupportedMode(&'static str),

    /// Catalog URL could not be parsed or upstream returned an unexpected shape.
    #[error("unable to resolve catalog identifier: {0}")]
    Resolution(String),

    /// Upstream refused playback (time, region or rights window).
    #[error("{0}")]
    Unavailable(String),

    /// The manifest carries no key identifier.
    #[error("Video unavailable outside of Australia")]
    RegionRestricted,

    /// `--episode`/`--season` value that cannot be parsed or matches nothing.
    #[error("invalid selection: {0}")]
    Selection(String),

    #[error("failed to fetch license token: {0}")]
    License(String),

    #[error("malformed manifest: {0}")]
    Manifest(String),

    #[error("download failed or interrupted: {0}")]
    Download(String),

    #[error("config error: {0}")]
    Config(String),

    /// Non-success HTTP status from an upstream endpoint.
    #[error("{url} returned {status}")]
    Status {
        url: String,
        status: reqwest::StatusCode,
    },

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl StreamError {
    pub(crate) fn manifest(err: impl std::fmt::Display) -> Self {
        Self::Manifest(err.to_string())
    }
}
