use std::time::Duration;

use plugin_sync::{FetchError, Fetcher, Sink};
use tokio::io::AsyncWriteExt;

const USER_AGENT: &str = "plugin-sync";

/// HTTP client for downloading plugin archives from an update center.
///
/// This is a pure transport: it streams whatever the URL serves into the
/// sink and leaves staging and naming to the caller.
pub struct UpdateCenterClient {
    client: reqwest::Client,
    label: String,
}

impl UpdateCenterClient {
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            label: label.into(),
        }
    }

    /// Like [`UpdateCenterClient::new`], but every request is bounded by `timeout`.
    pub fn with_timeout(
        label: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            label: label.into(),
        })
    }
}

#[async_trait::async_trait]
impl Fetcher for UpdateCenterClient {
    fn label(&self) -> &str {
        &self.label
    }

    async fn fetch(&self, url: &str, sink: &mut Sink) -> Result<u64, FetchError> {
        let mut response = self
            .client
            .get(url)
            .header("User-Agent", USER_AGENT)
            .send()
            .await
            .map_err(|e| FetchError::Network(format!("request to {url} failed: {e}")))?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let mut written = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|e| FetchError::Body(e.to_string()))?
        {
            sink.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        sink.flush().await?;

        tracing::debug!(url, bytes = written, "downloaded");
        Ok(written)
    }
}
