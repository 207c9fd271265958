//! HTTP access to the notice portal
//!
//! All requests share one `reqwest::Client` carrying the configured
//! User-Agent. Every operation applies its own timeout from
//! [`NetworkConfig`](crate::config::NetworkConfig).

use crate::config::NetworkConfig;
use crate::error::{CaptureError, Result};
use reqwest::header::CONTENT_LENGTH;
use std::path::Path;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Portal client used for notice pages and attachments
#[derive(Clone)]
pub struct NoticeClient {
    client: reqwest::Client,
    network: NetworkConfig,
}

impl NoticeClient {
    /// Build a client from the network settings
    pub fn new(network: &NetworkConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(network.user_agent.clone())
            .build()?;
        Ok(Self {
            client,
            network: network.clone(),
        })
    }

    /// Fetch a notice page and return its body
    ///
    /// The body is returned whatever the status code; the portal answers
    /// unknown identifiers with error pages that the classifier rejects.
    /// Only transport failures are errors.
    pub async fn fetch_page(&self, url: &str) -> Result<String> {
        let response = self
            .client
            .get(url)
            .timeout(self.network.page_timeout)
            .send()
            .await?;
        let status = response.status();
        debug!(url, %status, "fetched notice page");
        Ok(response.text().await?)
    }

    /// Ask the server how large an attachment is
    ///
    /// Reads the `Content-Length` header of a HEAD response. A failed probe or
    /// missing header yields 0; the size only feeds the rolling-prune estimate.
    pub async fn probe_size(&self, url: &str) -> u64 {
        let response = match self
            .client
            .head(url)
            .timeout(self.network.probe_timeout)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                warn!(url, error = %e, "attachment size probe failed, assuming 0");
                return 0;
            }
        };

        // reqwest reports a zero body length for HEAD, so read the header itself
        response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.trim().parse::<u64>().ok())
            .unwrap_or(0)
    }

    /// Stream an attachment to `dest`, returning the number of bytes written
    ///
    /// On any failure the partially written file is removed.
    pub async fn download_to(&self, url: &str, dest: &Path) -> std::result::Result<u64, CaptureError> {
        match self.stream_to_file(url, dest).await {
            Ok(bytes) => Ok(bytes),
            Err(e) => {
                if let Err(rm) = tokio::fs::remove_file(dest).await
                    && rm.kind() != std::io::ErrorKind::NotFound
                {
                    warn!(?dest, error = %rm, "failed to remove partial download");
                }
                Err(CaptureError::DownloadFailed {
                    url: url.to_string(),
                    reason: e.to_string(),
                })
            }
        }
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> Result<u64> {
        let mut response = self
            .client
            .get(url)
            .timeout(self.network.download_timeout)
            .send()
            .await?
            .error_for_status()?;

        let mut file = tokio::fs::File::create(dest).await?;
        let mut written: u64 = 0;
        while let Some(chunk) = response.chunk().await? {
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;

        debug!(url, ?dest, bytes = written, "attachment downloaded");
        Ok(written)
    }
}
