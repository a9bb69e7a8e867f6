//! Widevine key material.
//!
//! Builds the PSSH box handed to the content-decryption helper and defines
//! the [`KeyResolver`] seam through which clear `kid:key` pairs are obtained.
//! The CDM itself is external; [`CommandKeyResolver`] runs a local helper
//! program and reads keys from its stdout.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use regex::Regex;
use reqwest::header::HeaderMap;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, StreamError};

/// Widevine system id `edef8ba9-79d6-4ace-a3c8-27dcd51d21ed`.
pub const WIDEVINE_SYSTEM_ID: [u8; 16] = [
    0xed, 0xef, 0x8b, 0xa9, 0x79, 0xd6, 0x4a, 0xce, 0xa3, 0xc8, 0x27, 0xdc, 0xd5, 0x1d, 0x21, 0xed,
];

/// Total PSSH box size: header (8) + version/flags (4) + system id (16)
/// + data size (4) + protobuf tag/len (2) + key id (16).
pub const PSSH_LEN: usize = 50;

/// File name of the key list inside the working directory.
pub const KEY_FILE: &str = "keys.txt";

/// Parse a `cenc:default_KID` value, with or without dashes.
pub fn parse_kid(kid: &str) -> Result<[u8; 16]> {
    let bytes = hex::decode(kid.replace('-', "").trim())
        .map_err(|e| StreamError::Manifest(format!("invalid default_KID {kid:?}: {e}")))?;
    bytes
        .try_into()
        .map_err(|_| StreamError::Manifest(format!("default_KID {kid:?} is not 16 bytes")))
}

/// Build a version-0 Widevine PSSH box for `kid` and base64-encode it.
pub fn build_pssh(kid: &[u8; 16]) -> String {
    let mut data = Vec::with_capacity(PSSH_LEN);
    data.extend_from_slice(&(PSSH_LEN as u32).to_be_bytes());
    data.extend_from_slice(b"pssh");
    data.extend_from_slice(&[0, 0, 0, 0]);
    data.extend_from_slice(&WIDEVINE_SYSTEM_ID);
    // WidevinePsshData { key_id: kid }, field 2 length-delimited
    data.extend_from_slice(&18u32.to_be_bytes());
    data.extend_from_slice(&[0x12, 0x10]);
    data.extend_from_slice(kid);
    STANDARD.encode(data)
}

/// Recover the key id from a PSSH produced by [`build_pssh`].
pub fn kid_from_pssh(pssh: &str) -> Result<[u8; 16]> {
    let data = STANDARD
        .decode(pssh)
        .map_err(|e| StreamError::Manifest(format!("invalid PSSH base64: {e}")))?;
    if data.len() != PSSH_LEN || &data[4..8] != b"pssh" || data[12..28] != WIDEVINE_SYSTEM_ID {
        return Err(StreamError::Manifest("not a Widevine key-id PSSH".to_string()));
    }
    data[34..50]
        .try_into()
        .map_err(|_| StreamError::Manifest("truncated PSSH".to_string()))
}

/// Capability that turns a PSSH and license endpoint into clear content keys.
#[async_trait]
pub trait KeyResolver: Send + Sync {
    /// Return content keys as `kid:key` hex pairs.
    ///
    /// `headers` go on the license request only.
    async fn resolve_keys(
        &self,
        pssh: &str,
        license_url: &str,
        headers: &HeaderMap,
    ) -> Result<Vec<String>>;
}

/// Runs a local CDM helper:
/// `<program> <args..> --pssh <b64> --license-url <url> [--header name:value]..`
/// and collects every stdout line shaped like `kid:key`.
pub struct CommandKeyResolver {
    program: String,
    args: Vec<String>,
    key_line: Regex,
}

impl CommandKeyResolver {
    /// Build from a command line such as `["python3", "cdm.py"]`.
    ///
    /// An empty command is accepted so catalog-only runs work without a
    /// helper; resolving keys then fails with a config error.
    pub fn new(command: &[String]) -> Result<Self> {
        let (program, args) = match command.split_first() {
            Some((program, args)) => (program.clone(), args.to_vec()),
            None => (String::new(), Vec::new()),
        };
        let key_line = Regex::new(r"^([0-9a-fA-F]{32}):([0-9a-fA-F]{32})$")
            .map_err(|e| StreamError::Config(e.to_string()))?;
        Ok(Self {
            program,
            args,
            key_line,
        })
    }

    fn build_args(&self, pssh: &str, license_url: &str, headers: &HeaderMap) -> Vec<String> {
        let mut args = self.args.clone();
        args.extend([
            "--pssh".to_string(),
            pssh.to_string(),
            "--license-url".to_string(),
            license_url.to_string(),
        ]);
        for (name, value) in headers {
            if let Ok(value) = value.to_str() {
                args.push("--header".to_string());
                args.push(format!("{name}:{value}"));
            }
        }
        args
    }

    fn parse_keys(&self, stdout: &str) -> Vec<String> {
        stdout
            .lines()
            .map(str::trim)
            .filter(|line| self.key_line.is_match(line))
            .map(str::to_lowercase)
            .collect()
    }
}

#[async_trait]
impl KeyResolver for CommandKeyResolver {
    async fn resolve_keys(
        &self,
        pssh: &str,
        license_url: &str,
        headers: &HeaderMap,
    ) -> Result<Vec<String>> {
        if self.program.is_empty() {
            return Err(StreamError::Config(
                "key_helper is not set; a local CDM helper is required".to_string(),
            ));
        }

        let args = self.build_args(pssh, license_url, headers);
        debug!(program = %self.program, "Running key helper");

        let output = Command::new(&self.program).args(&args).output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(StreamError::License(format!(
                "key helper exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        let keys = self.parse_keys(&String::from_utf8_lossy(&output.stdout));
        if keys.is_empty() {
            return Err(StreamError::License(
                "no content keys returned by key helper".to_string(),
            ));
        }

        info!("Got {} content key(s)", keys.len());
        Ok(keys)
    }
}

/// Write keys, one per line, into `dir`.
pub async fn write_key_file(dir: &Path, keys: &[String]) -> Result<PathBuf> {
    let path = dir.join(KEY_FILE);
    tokio::fs::write(&path, keys.join("\n")).await?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http_client::single_header;

    const KID: [u8; 16] = [
        0x0a, 0x1b, 0x2c, 0x3d, 0x4e, 0x5f, 0x60, 0x71, 0x82, 0x93, 0xa4, 0xb5, 0xc6, 0xd7, 0xe8,
        0xf9,
    ];

    fn command(parts: &[&str]) -> Vec<String> {
        parts.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn pssh_layout() {
        let pssh = build_pssh(&KID);
        let raw = STANDARD.decode(&pssh).unwrap();
        assert_eq!(raw.len(), PSSH_LEN);
        assert_eq!(&raw[..8], b"\x00\x00\x002pssh");
        assert_eq!(&raw[12..28], &WIDEVINE_SYSTEM_ID);
        assert_eq!(&raw[28..34], &[0, 0, 0, 0x12, 0x12, 0x10]);
        assert_eq!(&raw[34..], &KID);
    }

    #[test]
    fn pssh_roundtrip_recovers_kid() {
        assert_eq!(kid_from_pssh(&build_pssh(&KID)).unwrap(), KID);
    }

    #[test]
    fn kid_from_foreign_pssh_fails() {
        let bogus = STANDARD.encode([0u8; PSSH_LEN]);
        assert!(kid_from_pssh(&bogus).is_err());
    }

    #[test]
    fn parse_kid_with_dashes() {
        assert_eq!(parse_kid("0a1b2c3d-4e5f-6071-8293-a4b5c6d7e8f9").unwrap(), KID);
        assert!(parse_kid("0a1b").is_err());
        assert!(parse_kid("zz").is_err());
    }

    #[test]
    fn helper_args_carry_headers() {
        let resolver = CommandKeyResolver::new(&command(&["cdm", "--device", "x.wvd"])).unwrap();
        let headers = single_header("customdata", "LIC").unwrap();
        let args = resolver.build_args("PSSH", "https://lic", &headers);
        assert_eq!(
            args,
            vec![
                "--device",
                "x.wvd",
                "--pssh",
                "PSSH",
                "--license-url",
                "https://lic",
                "--header",
                "customdata:LIC"
            ]
        );
    }

    #[test]
    fn parses_only_key_lines() {
        let resolver = CommandKeyResolver::new(&command(&["cdm"])).unwrap();
        let out = "loading device\n\
                   0A1B2C3D4E5F60718293A4B5C6D7E8F9:00112233445566778899aabbccddeeff\n\
                   SIGNING:nope\n";
        assert_eq!(
            resolver.parse_keys(out),
            vec!["0a1b2c3d4e5f60718293a4b5c6d7e8f9:00112233445566778899aabbccddeeff"]
        );
    }

    #[tokio::test]
    async fn empty_command_is_config_error() {
        let resolver = CommandKeyResolver::new(&[]).unwrap();
        let err = resolver
            .resolve_keys("PSSH", "https://lic", &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::Config(_)));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn runs_helper_process() {
        let script = "echo starting; \
                      echo 0a1b2c3d4e5f60718293a4b5c6d7e8f9:00112233445566778899aabbccddeeff";
        let resolver = CommandKeyResolver::new(&command(&["sh", "-c", script, "helper"])).unwrap();
        let keys = resolver
            .resolve_keys("PSSH", "https://lic", &HeaderMap::new())
            .await
            .unwrap();
        assert_eq!(keys.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn helper_without_keys_is_license_error() {
        let resolver = CommandKeyResolver::new(&command(&["sh", "-c", "echo nothing"])).unwrap();
        let err = resolver
            .resolve_keys("PSSH", "https://lic", &HeaderMap::new())
            .await
            .unwrap_err();
        assert!(matches!(err, StreamError::License(_)));
    }

    #[tokio::test]
    async fn key_file_is_newline_separated() {
        let dir = tempfile::tempdir().unwrap();
        let keys = vec!["a:b".to_string(), "c:d".to_string()];
        let path = write_key_file(dir.path(), &keys).await.unwrap();
        assert_eq!(std::fs::read_to_string(path).unwrap(), "a:b\nc:d");
    }
}
