use std::collections::HashMap;
use std::sync::Mutex;

use tokio::io::AsyncWriteExt;

use crate::fetch::{FetchError, Fetcher, Sink};

#[derive(Debug, Clone)]
enum Response {
    Body(Vec<u8>),
    /// Writes the bytes, then fails as if the connection dropped.
    Truncated(Vec<u8>),
    Status(u16),
    Network(String),
}

/// In-memory fetcher for testing. Unknown URLs answer 404.
#[derive(Debug, Default)]
pub struct FakeFetcher {
    responses: HashMap<String, Response>,
    requests: Mutex<Vec<String>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_body(mut self, url: impl Into<String>, body: Vec<u8>) -> Self {
        self.responses.insert(url.into(), Response::Body(body));
        self
    }

    pub fn with_truncated_body(mut self, url: impl Into<String>, partial: Vec<u8>) -> Self {
        self.responses.insert(url.into(), Response::Truncated(partial));
        self
    }

    pub fn with_status(mut self, url: impl Into<String>, status: u16) -> Self {
        self.responses.insert(url.into(), Response::Status(status));
        self
    }

    pub fn with_network_error(mut self, url: impl Into<String>, message: &str) -> Self {
        self.responses
            .insert(url.into(), Response::Network(message.to_owned()));
        self
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Fetcher for FakeFetcher {
    fn label(&self) -> &str {
        "fake"
    }

    async fn fetch(&self, url: &str, sink: &mut Sink) -> Result<u64, FetchError> {
        self.requests.lock().unwrap().push(url.to_owned());

        match self.responses.get(url).cloned() {
            Some(Response::Body(body)) => {
                sink.write_all(&body).await?;
                Ok(body.len() as u64)
            }
            Some(Response::Truncated(partial)) => {
                sink.write_all(&partial).await?;
                Err(FetchError::Body("connection reset".into()))
            }
            Some(Response::Status(status)) => Err(FetchError::Status(status)),
            Some(Response::Network(message)) => Err(FetchError::Network(message)),
            None => Err(FetchError::Status(404)),
        }
    }
}
