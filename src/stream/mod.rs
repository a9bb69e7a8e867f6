//! Streaming media support for vodgrab
//!
//! Providers resolve catalog URLs into titles and prepared streams
//! (rewritten DASH manifest plus content keys); backends turn a prepared
//! stream into a file on disk.

pub mod backend;
pub mod backends;
pub mod drm;
pub mod manifest;
pub mod provider;
pub mod providers;
pub mod selection;
pub mod title_rules;
pub mod titles;

pub use backend::{download, DownloadBackend, DownloadJob, DownloadOutcome};
pub use provider::{Playlist, PreparedStream, StreamProvider, StreamQuality};
pub use selection::{Mode, Request};
pub use titles::{Content, Episode, Movie, Movies, Series, Title};
