//! `vodgrab` - ABC iview downloader
//!
//! # Features
//!
//! - **Catalog resolution**: series, single episodes and films into ordered title lists
//! - **Manifest preparation**: DASH `BaseURL` rewrite, subtitle injection, quality selection
//! - **DRM**: Widevine PSSH synthesis, JWT/license tokens, keys from a local CDM helper
//! - **Download**: `N_m3u8DL-RE` subprocess backend with skip-if-exists
//!
//! # Example
//!
//! ```rust,no_run
//! use vodgrab::stream::{providers::AbcIviewProvider, drm::CommandKeyResolver, StreamProvider};
//! use vodgrab::{Config, ServiceClient};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::load(None)?;
//!     let keys = CommandKeyResolver::new(&config.key_helper)?;
//!     let provider = AbcIviewProvider::new(ServiceClient::new()?, config.iview, Box::new(keys))?;
//!     let series = provider.get_series("https://iview.abc.net.au/show/gruen").await?;
//!     println!("{}", series.summary());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod http_client;
pub mod stream;

pub use config::{Config, IviewConfig};
pub use error::{Result, StreamError};
pub use http_client::ServiceClient;
pub use stream::{StreamProvider, StreamQuality};

/// Version of vodgrab
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
