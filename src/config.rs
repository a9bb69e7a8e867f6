//! Configuration loaded from `~/.config/vodgrab/config.toml`.
//!
//! Every field has a default except the iview `client_id` and the key helper
//! command, which are only checked when a download actually needs them.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{Result, StreamError};

/// Top-level config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Root directory for finished downloads.
    pub save_dir: PathBuf,
    /// Downloader binary. Looked up in `PATH` when unset.
    pub downloader: Option<PathBuf>,
    /// Local CDM helper command line, e.g. `["python3", "cdm.py"]`.
    pub key_helper: Vec<String>,
    /// ABC iview endpoints.
    pub iview: IviewConfig,
}

/// Endpoint templates for ABC iview.
///
/// Placeholders in braces (`{show}`, `{slug}`, `{video_id}`) are filled in
/// with [`expand`].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct IviewConfig {
    pub client_id: Option<String>,
    pub series: String,
    pub film: String,
    pub vod: String,
    pub jwt: String,
    pub drm: String,
    pub license: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            save_dir: dirs::download_dir()
                .or_else(dirs::home_dir)
                .unwrap_or_else(|| PathBuf::from("."))
                .join("vodgrab"),
            downloader: None,
            key_helper: Vec::new(),
            iview: IviewConfig::default(),
        }
    }
}

impl Default for IviewConfig {
    fn default() -> Self {
        Self {
            client_id: None,
            series: "https://api.iview.abc.net.au/v3/series/{show}".to_string(),
            film: "https://api.iview.abc.net.au/v3/show/{slug}".to_string(),
            vod: "https://api.iview.abc.net.au/v3/video/{video_id}".to_string(),
            jwt: "https://api.iview.abc.net.au/v3/token/jwt".to_string(),
            drm: "https://api.iview.abc.net.au/v3/token/drm/{video_id}".to_string(),
            license: "https://wv-keyos.licensekeyserver.com/".to_string(),
        }
    }
}

impl IviewConfig {
    pub fn client_id(&self) -> Result<&str> {
        self.client_id
            .as_deref()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| StreamError::Config("iview.client_id is not set".to_string()))
    }
}

impl Config {
    /// Load from `path`, or from the default location when `None`.
    ///
    /// A missing default file yields [`Config::default`]; a missing explicit
    /// file is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let (path, explicit) = match path {
            Some(p) => (p.to_path_buf(), true),
            None => (config_path(), false),
        };

        if !path.exists() {
            if explicit {
                return Err(StreamError::Config(format!(
                    "{} does not exist",
                    path.display()
                )));
            }
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(&path)?;
        Self::from_toml(&content)
            .map_err(|e| StreamError::Config(format!("invalid TOML in {}: {e}", path.display())))
    }

    pub fn from_toml(content: &str) -> std::result::Result<Self, toml::de::Error> {
        toml::from_str(content)
    }
}

/// Fill a single `{name}` placeholder in an endpoint template.
pub fn expand(template: &str, name: &str, value: &str) -> String {
    template.replace(&format!("{{{name}}}"), value)
}

/// Return the path to the config file.
fn config_path() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vodgrab")
        .join("config.toml")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_empty_config() {
        let cfg = Config::from_toml("").unwrap();
        assert!(cfg.key_helper.is_empty());
        assert!(cfg.iview.client_id.is_none());
        assert!(cfg.iview.vod.contains("{video_id}"));
    }

    #[test]
    fn parse_partial_config_keeps_defaults() {
        let toml_str = r#"
save_dir = "/media/tv"
key_helper = ["python3", "/opt/cdm/keys.py"]

[iview]
client_id = "abc-client"
license = "https://license.example/wv"
"#;
        let cfg = Config::from_toml(toml_str).unwrap();
        assert_eq!(cfg.save_dir, PathBuf::from("/media/tv"));
        assert_eq!(cfg.key_helper, vec!["python3", "/opt/cdm/keys.py"]);
        assert_eq!(cfg.iview.client_id().unwrap(), "abc-client");
        assert_eq!(cfg.iview.license, "https://license.example/wv");
        assert_eq!(cfg.iview.series, IviewConfig::default().series);
    }

    #[test]
    fn missing_client_id_is_config_error() {
        let cfg = IviewConfig::default();
        assert!(matches!(cfg.client_id(), Err(StreamError::Config(_))));
    }

    #[test]
    fn expand_fills_placeholder() {
        assert_eq!(
            expand("https://api/v3/video/{video_id}", "video_id", "ZW1234A001S00"),
            "https://api/v3/video/ZW1234A001S00"
        );
        assert_eq!(expand("https://api/{show}", "slug", "x"), "https://api/{show}");
    }

    #[test]
    fn explicit_missing_path_fails() {
        let err = Config::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, StreamError::Config(_)));
    }
}
