use tokio::io::AsyncWrite;

/// Errors a [`Fetcher`] can report for a single download.
#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("server returned HTTP {0}")]
    Status(u16),

    #[error("failed to read response body: {0}")]
    Body(String),

    /// The sink rejected a write. Kept apart from transport failures so the
    /// caller can tell a full disk from a dropped connection.
    #[error("I/O error: {0}")]
    Write(#[from] std::io::Error),
}

/// Destination a fetcher streams a response body into.
pub type Sink = dyn AsyncWrite + Unpin + Send;

/// Downloads remote archives.
#[async_trait::async_trait]
pub trait Fetcher: Send + Sync {
    /// Human-readable label identifying the remote.
    fn label(&self) -> &str;

    /// GET `url` and stream the whole body into `sink`.
    /// Returns the number of bytes written.
    async fn fetch(&self, url: &str, sink: &mut Sink) -> Result<u64, FetchError>;
}
