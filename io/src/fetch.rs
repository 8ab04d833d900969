//! Remote document fetching.

use std::time::Duration;

use schema_bundle_core::{ContentFetcher, SourceError};
use url::Url;

/// Default request timeout for remote documents.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches documents over HTTP(S) with a blocking client.
#[cfg(feature = "remote")]
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::blocking::Client,
}

#[cfg(feature = "remote")]
impl HttpFetcher {
    /// Builds a client with the given request timeout.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialized.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("schema-bundle/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client })
    }
}

#[cfg(feature = "remote")]
impl ContentFetcher for HttpFetcher {
    fn fetch(&self, url: &Url) -> Result<String, SourceError> {
        tracing::debug!(url = %url, "Fetching remote document");
        let response = self.client.get(url.clone()).send()?.error_for_status()?;
        Ok(response.text()?)
    }
}

/// Fetcher used when remote references are disabled; every fetch fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct OfflineFetcher;

impl ContentFetcher for OfflineFetcher {
    fn fetch(&self, url: &Url) -> Result<String, SourceError> {
        Err(format!("remote references are disabled (cannot fetch {url})").into())
    }
}
