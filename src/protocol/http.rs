// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! REST client for the August vendor API.

use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue};
use serde::Deserialize;
use serde::de::DeserializeOwned;

use crate::config::Credentials;
use crate::error::{ApiError, Error, ParseError};
use crate::protocol::{CommandAck, LockApi, LockSummary};
use crate::snapshot::LockDetails;
use crate::types::LockId;

const API_KEY_HEADER: &str = "x-august-api-key";
const KEASE_KEY_HEADER: &str = "x-kease-api-key";
const ACCESS_TOKEN_HEADER: &str = "x-august-access-token";
const ACCEPT_VERSION_HEADER: &str = "accept-version";
const ACCEPT_VERSION: &str = "0.0.1";

/// Configuration for the REST client.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use august_homekit::protocol::HttpConfig;
///
/// let config = HttpConfig::new("api-key", "access-token")
///     .with_base_url("http://127.0.0.1:8080")
///     .with_timeout(Duration::from_secs(5));
///
/// assert_eq!(config.base_url(), "http://127.0.0.1:8080");
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    base_url: String,
    api_key: String,
    access_token: String,
    timeout: Duration,
}

impl HttpConfig {
    /// Production API endpoint.
    pub const DEFAULT_BASE_URL: &'static str = "https://api-production.august.com";

    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a configuration against the production endpoint.
    #[must_use]
    pub fn new(api_key: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            access_token: access_token.into(),
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Creates a configuration from platform credentials.
    #[must_use]
    pub fn from_credentials(credentials: &Credentials) -> Self {
        let config = Self::new(&credentials.api_key, &credentials.access_token);
        match &credentials.base_url {
            Some(url) => config.with_base_url(url),
            None => config,
        }
    }

    /// Points the client at another endpoint.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidAddress`] for a base URL without an HTTP
    /// scheme, [`ApiError::InvalidHeader`] for credentials that cannot be
    /// sent as headers, and [`ApiError::Http`] if the client cannot be
    /// built.
    pub fn into_client(self) -> Result<HttpLockApi, ApiError> {
        if !(self.base_url.starts_with("http://") || self.base_url.starts_with("https://")) {
            return Err(ApiError::InvalidAddress(self.base_url));
        }

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(
            HeaderName::from_static(ACCEPT_VERSION_HEADER),
            HeaderValue::from_static(ACCEPT_VERSION),
        );
        for (name, value) in [
            (API_KEY_HEADER, &self.api_key),
            (KEASE_KEY_HEADER, &self.api_key),
            (ACCESS_TOKEN_HEADER, &self.access_token),
        ] {
            let mut value =
                HeaderValue::from_str(value).map_err(|_| ApiError::InvalidHeader(name))?;
            value.set_sensitive(true);
            headers.insert(HeaderName::from_static(name), value);
        }

        let client = Client::builder()
            .timeout(self.timeout)
            .default_headers(headers)
            .build()?;

        Ok(HttpLockApi {
            base_url: self.base_url,
            client,
        })
    }
}

/// [`LockApi`] implementation over the vendor REST API.
#[derive(Debug, Clone)]
pub struct HttpLockApi {
    base_url: String,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct LockListEntry {
    #[serde(rename = "LockName", default)]
    lock_name: Option<String>,
    #[serde(rename = "HouseName", default)]
    house_name: Option<String>,
}

impl HttpLockApi {
    /// Returns the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, prefix: &str, lock_id: &LockId, suffix: &str) -> String {
        format!(
            "{}{prefix}{}{suffix}",
            self.base_url,
            urlencoding::encode(lock_id.as_str())
        )
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> Result<T, Error> {
        tracing::debug!(url = %url, "Sending GET");

        let response = self.client.get(url).send().await.map_err(ApiError::Http)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(ApiError::Http)?;

        if !response_ok(status) {
            return Err(ApiError::Status { status, body }.into());
        }

        tracing::debug!(status, body = %body, "Received response");
        serde_json::from_str(&body).map_err(|e| Error::Parse(ParseError::Json(e)))
    }

    async fn put(&self, url: &str) -> Result<CommandAck, Error> {
        tracing::debug!(url = %url, "Sending PUT");

        let response = self.client.put(url).send().await.map_err(ApiError::Http)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(ApiError::Http)?;

        if !response_ok(status) {
            return Err(ApiError::Status { status, body }.into());
        }

        tracing::debug!(status, body = %body, "Command accepted");
        Ok(CommandAck::new(status, body))
    }
}

fn response_ok(status: u16) -> bool {
    (200..300).contains(&status)
}

impl LockApi for HttpLockApi {
    async fn locks(&self) -> Result<Vec<LockSummary>, Error> {
        let url = format!("{}/users/locks/mine", self.base_url);
        let entries: BTreeMap<String, LockListEntry> = self.get_json(&url).await?;

        Ok(entries
            .into_iter()
            .map(|(id, entry)| LockSummary {
                name: entry.lock_name.unwrap_or_else(|| id.clone()),
                lock_id: LockId::new(id),
                house_name: entry.house_name,
            })
            .collect())
    }

    async fn details(&self, lock_id: &LockId) -> Result<LockDetails, Error> {
        self.get_json(&self.url("/locks/", lock_id, "")).await
    }

    async fn lock(&self, lock_id: &LockId) -> Result<CommandAck, Error> {
        self.put(&self.url("/remoteoperate/", lock_id, "/lock")).await
    }

    async fn unlock(&self, lock_id: &LockId) -> Result<CommandAck, Error> {
        self.put(&self.url("/remoteoperate/", lock_id, "/unlock"))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults() {
        let config = HttpConfig::new("k", "t");
        assert_eq!(config.base_url(), HttpConfig::DEFAULT_BASE_URL);
        assert_eq!(config.timeout(), HttpConfig::DEFAULT_TIMEOUT);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let config = HttpConfig::new("k", "t").with_base_url("http://localhost:9000/");
        assert_eq!(config.base_url(), "http://localhost:9000");
    }

    #[test]
    fn from_credentials_uses_base_url_override() {
        let credentials = Credentials {
            api_key: "k".into(),
            access_token: "t".into(),
            base_url: Some("http://localhost:1".into()),
        };
        assert_eq!(
            HttpConfig::from_credentials(&credentials).base_url(),
            "http://localhost:1"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = HttpConfig::new("k", "t")
            .with_base_url("ftp://example")
            .into_client()
            .unwrap_err();
        assert!(matches!(err, ApiError::InvalidAddress(_)));
    }

    #[test]
    fn invalid_token_is_rejected() {
        let err = HttpConfig::new("k", "bad\ntoken").into_client().unwrap_err();
        assert!(matches!(err, ApiError::InvalidHeader(ACCESS_TOKEN_HEADER)));
    }

    #[test]
    fn lock_ids_are_encoded_in_paths() {
        let api = HttpConfig::new("k", "t")
            .with_base_url("http://localhost")
            .into_client()
            .unwrap();
        assert_eq!(
            api.url("/remoteoperate/", &LockId::new("a b/c"), "/lock"),
            "http://localhost/remoteoperate/a%20b%2Fc/lock"
        );
    }
}
