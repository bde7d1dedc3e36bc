//! Identity-provider key set (JWKS) source.
//!
//! The gate only sees the `KeySetSource` trait, so tests can substitute a fake
//! provider. `HttpKeySet` is the production implementation.

use std::time::Duration;

use async_trait::async_trait;
use jsonwebtoken::jwk::JwkSet;
use thiserror::Error;
use tracing::debug;
use url::Url;

/// Upper bound for a JWKS response body.
const MAX_KEY_SET_BYTES: u64 = 1024 * 1024;

#[derive(Debug, Error)]
pub enum KeySetError {
    #[error("invalid key set url: {0}")]
    InvalidUrl(String),
    #[error("http client error: {0}")]
    Client(String),
    #[error("key set request failed: {0}")]
    Request(String),
    #[error("key set endpoint returned HTTP {0}")]
    Status(u16),
    #[error("key set response too large: {0} bytes")]
    TooLarge(u64),
    #[error("key set response is not a JWK set: {0}")]
    Parse(String),
}

/// Anything that can produce the provider's current key set.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    async fn fetch(&self) -> Result<JwkSet, KeySetError>;
}

/// Fetches the key set over HTTP GET.
///
/// Redirects are not followed and bodies above 1 MiB are refused.
#[derive(Debug, Clone)]
pub struct HttpKeySet {
    client: reqwest::Client,
    url: Url,
}

impl HttpKeySet {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, KeySetError> {
        let url = Url::parse(url).map_err(|e| KeySetError::InvalidUrl(e.to_string()))?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(KeySetError::InvalidUrl(format!(
                "unsupported scheme '{}'",
                url.scheme()
            )));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| KeySetError::Client(e.to_string()))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl KeySetSource for HttpKeySet {
    async fn fetch(&self) -> Result<JwkSet, KeySetError> {
        debug!(url = %self.url, "fetching key set");

        let response = self
            .client
            .get(self.url.clone())
            .send()
            .await
            .map_err(|e| KeySetError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(KeySetError::Status(status.as_u16()));
        }

        if let Some(len) = response.content_length()
            && len > MAX_KEY_SET_BYTES
        {
            return Err(KeySetError::TooLarge(len));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| KeySetError::Request(e.to_string()))?;

        if body.len() as u64 > MAX_KEY_SET_BYTES {
            return Err(KeySetError::TooLarge(body.len() as u64));
        }

        let set: JwkSet =
            serde_json::from_slice(&body).map_err(|e| KeySetError::Parse(e.to_string()))?;

        debug!(keys = set.keys.len(), "fetched key set");
        Ok(set)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_http_urls() {
        let timeout = Duration::from_secs(1);
        assert!(matches!(
            HttpKeySet::new("not a url", timeout),
            Err(KeySetError::InvalidUrl(_))
        ));
        assert!(matches!(
            HttpKeySet::new("file:///etc/jwks.json", timeout),
            Err(KeySetError::InvalidUrl(_))
        ));
    }

    #[test]
    fn accepts_provider_certs_url() {
        let source = HttpKeySet::new(
            "https://idp.example.com/realms/tasks/protocol/openid-connect/certs",
            Duration::from_secs(1),
        )
        .unwrap();
        assert_eq!(source.url().host_str(), Some("idp.example.com"));
    }
}
