//! Shared HTTP client for catalog, playback and token endpoints.
//!
//! One [`ServiceClient`] is built per run. Headers that vary per call (the
//! JWT `bearer`, the DRM `customdata`) are passed with each request and never
//! stored on the client.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::{Client, Response};
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::error::{Result, StreamError};

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
    AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36";

/// HTTP client shared by every request in a run
#[derive(Debug, Clone)]
pub struct ServiceClient {
    client: Client,
}

impl ServiceClient {
    /// Create a new client with the default browser User-Agent
    pub fn new() -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(DEFAULT_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static("*/*"));

        let client = Client::builder()
            // ═══════════════════════════════════════════════════════════════
            // CONNECTION
            // ═══════════════════════════════════════════════════════════════
            .pool_idle_timeout(Duration::from_secs(90))
            .tcp_keepalive(Duration::from_secs(60))
            .use_rustls_tls()
            // ═══════════════════════════════════════════════════════════════
            // COMPRESSION
            // ═══════════════════════════════════════════════════════════════
            .brotli(true)
            .gzip(true)
            // ═══════════════════════════════════════════════════════════════
            // HEADERS (static only)
            // ═══════════════════════════════════════════════════════════════
            .default_headers(headers)
            // ═══════════════════════════════════════════════════════════════
            // TIMEOUTS
            // ═══════════════════════════════════════════════════════════════
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(30))
            .redirect(reqwest::redirect::Policy::limited(10))
            .build()?;

        Ok(Self { client })
    }

    /// GET a URL and decode the JSON body, with per-request headers
    #[instrument(skip_all, fields(url = %url))]
    pub async fn get_json<T: DeserializeOwned>(&self, url: &str, headers: HeaderMap) -> Result<T> {
        let resp = self.client.get(url).headers(headers).send().await?;
        let body = Self::checked_body(url, resp).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET a playback document whose refusals arrive as a JSON body with a
    /// 4xx status. The body is decoded first; the status only matters when
    /// it does not parse.
    #[instrument(skip_all, fields(url = %url))]
    pub async fn get_refusable_json<T: DeserializeOwned>(&self, url: &str) -> Result<T> {
        let resp = self.client.get(url).send().await?;
        let status = resp.status();
        debug!(%status, "Response received");
        let body = resp.text().await?;
        match serde_json::from_str(&body) {
            Ok(value) => Ok(value),
            Err(_) if !status.is_success() => Err(StreamError::Status {
                url: url.to_string(),
                status,
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// POST a form and decode the JSON body
    #[instrument(skip_all, fields(url = %url))]
    pub async fn post_form_json<T: DeserializeOwned>(
        &self,
        url: &str,
        form: &[(&str, &str)],
    ) -> Result<T> {
        let resp = self.client.post(url).form(form).send().await?;
        let body = Self::checked_body(url, resp).await?;
        Ok(serde_json::from_str(&body)?)
    }

    /// GET a URL and return the body as text
    #[instrument(skip_all, fields(url = %url))]
    pub async fn get_text(&self, url: &str) -> Result<String> {
        let resp = self.client.get(url).send().await?;
        Self::checked_body(url, resp).await
    }

    async fn checked_body(url: &str, resp: Response) -> Result<String> {
        let status = resp.status();
        debug!(%status, "Response received");
        if !status.is_success() {
            return Err(StreamError::Status {
                url: url.to_string(),
                status,
            });
        }
        Ok(resp.text().await?)
    }
}

/// Build a one-entry header map, e.g. `bearer: <jwt>`.
pub fn single_header(name: &'static str, value: &str) -> Result<HeaderMap> {
    let mut headers = HeaderMap::new();
    let value = HeaderValue::from_str(value)
        .map_err(|e| StreamError::License(format!("invalid {name} header: {e}")))?;
    headers.insert(HeaderName::from_static(name), value);
    Ok(headers)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_header_is_isolated() {
        let a = single_header("bearer", "token-a").unwrap();
        let b = single_header("customdata", "lic-b").unwrap();
        assert_eq!(a.len(), 1);
        assert_eq!(a.get("bearer").unwrap(), "token-a");
        assert!(a.get("customdata").is_none());
        assert_eq!(b.get("customdata").unwrap(), "lic-b");
    }

    #[test]
    fn single_header_rejects_control_chars() {
        assert!(single_header("bearer", "bad\nvalue").is_err());
    }

    #[test]
    fn client_builds() {
        assert!(ServiceClient::new().is_ok());
    }
}
