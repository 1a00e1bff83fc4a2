//! HTTP snapshot source.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{PayloadDecoder, PayloadFormat, RawSnapshot, SnapshotSource};
use crate::error::SourceError;

/// Per-request timeout.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(3);

/// A source that GETs snapshots from the dashboard backend or a metrics
/// endpoint. The history window is passed as `?interval=<minutes>`.
#[derive(Debug)]
pub struct HttpSource {
    client: Client,
    url: String,
    description: String,
    decoder: PayloadDecoder,
}

impl HttpSource {
    pub fn new(url: impl Into<String>, format: PayloadFormat) -> Result<Self, SourceError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(client, url, format))
    }

    /// Use a preconfigured client (proxies, TLS roots, custom timeout).
    pub fn with_client(client: Client, url: impl Into<String>, format: PayloadFormat) -> Self {
        let url = url.into();
        let description = format!("http: {}", url);
        Self {
            client,
            url,
            description,
            decoder: PayloadDecoder::new(format),
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait(?Send)]
impl SnapshotSource for HttpSource {
    async fn fetch(&self, interval_minutes: u32) -> Result<RawSnapshot, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("interval", interval_minutes)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SourceError::Http(format!(
                "API returned status {}",
                response.status()
            )));
        }

        let body = response.text().await?;
        debug!(url = %self.url, bytes = body.len(), "fetched snapshot");
        self.decoder.decode(&body)
    }

    fn description(&self) -> &str {
        &self.description
    }
}
