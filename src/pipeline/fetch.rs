//! Fetcher: identifier → raw bytes → `NormalizedBitmap`.
//!
//! [`ImageSource`] is the network seam. [`HttpImageSource`] is the real
//! implementation; tests substitute in-memory sources. [`fetch_item`] makes
//! exactly one source call per identifier and never retries.

use crate::config::UrlTemplate;
use crate::error::{ItemError, ScanbindError};
use crate::pipeline::normalize::{decode_and_normalize, NormalizedBitmap};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// Somewhere item payloads can be downloaded from.
#[async_trait]
pub trait ImageSource: Send + Sync {
    /// Retrieve the raw payload for `id`. One attempt, no retry.
    async fn fetch(&self, id: u32) -> Result<Vec<u8>, ItemError>;
}

/// Downloads `template` with the identifier substituted, one GET per item.
pub struct HttpImageSource {
    client: reqwest::Client,
    template: UrlTemplate,
}

impl HttpImageSource {
    pub fn new(template: UrlTemplate, timeout_secs: Option<u64>) -> Result<Self, ScanbindError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        let client = builder
            .build()
            .map_err(|e| ScanbindError::ClientBuild(e.to_string()))?;
        Ok(Self { client, template })
    }

    /// Reuse an existing client (connection pool, proxies, headers).
    pub fn with_client(client: reqwest::Client, template: UrlTemplate) -> Self {
        Self { client, template }
    }

    pub fn url_for(&self, id: u32) -> String {
        self.template.render(id)
    }
}

#[async_trait]
impl ImageSource for HttpImageSource {
    async fn fetch(&self, id: u32) -> Result<Vec<u8>, ItemError> {
        let url = self.url_for(id);
        let network_err = |detail: String| ItemError::Network {
            id,
            url: url.clone(),
            detail,
        };

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| network_err(e.to_string()))?;

        if !response.status().is_success() {
            return Err(network_err(format!("HTTP {}", response.status())));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| network_err(e.to_string()))?;

        debug!(id, bytes = bytes.len(), "Downloaded {}", url);
        Ok(bytes.to_vec())
    }
}

/// Fetch `id` from `source`, then decode and normalise it.
///
/// Decoding is CPU-bound and runs on the blocking pool so it never stalls
/// the tokio workers that drive network I/O.
pub async fn fetch_item(source: &dyn ImageSource, id: u32) -> Result<NormalizedBitmap, ItemError> {
    let bytes = source.fetch(id).await?;

    tokio::task::spawn_blocking(move || decode_and_normalize(id, &bytes))
        .await
        .map_err(|e| ItemError::Decode {
            id,
            detail: format!("decode task panicked: {e}"),
        })?
}
