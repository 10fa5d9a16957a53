use std::sync::{Arc, RwLock};

use async_trait::async_trait;
use tracing::debug;

#[derive(Debug, thiserror::Error)]
pub enum NetError {
    #[error("Request to {0} failed: {1}")]
    Request(String, #[source] reqwest::Error),
    #[error("Request to {0} returned status {1}")]
    Status(String, u16),
    #[error("No content registered for {0}")]
    NotFound(String),
}

/// Fetches a remote resource in full. No timeout is applied.
#[async_trait]
pub trait Fetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, NetError>;
}

#[derive(Debug, Default, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Fetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, NetError> {
        debug!("fetching {url}");
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| NetError::Request(url.to_string(), e))?;

        if !response.status().is_success() {
            return Err(NetError::Status(
                url.to_string(),
                response.status().as_u16(),
            ));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| NetError::Request(url.to_string(), e))?;

        Ok(bytes.to_vec())
    }
}

/// Fetcher answering from a fixed set of `(url, content)` pairs, recording every request.
#[derive(Debug, Default, Clone)]
pub struct FakeFetcher {
    content: Arc<RwLock<Vec<(String, Vec<u8>)>>>,
    requests: Arc<RwLock<Vec<String>>>,
}

impl FakeFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, url: impl Into<String>, content: impl Into<Vec<u8>>) -> Self {
        self.content
            .write()
            .unwrap()
            .push((url.into(), content.into()));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.read().unwrap().clone()
    }
}

#[async_trait]
impl Fetcher for FakeFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, NetError> {
        self.requests.write().unwrap().push(url.to_string());

        self.content
            .read()
            .unwrap()
            .iter()
            .find(|(u, _)| u == url)
            .map(|(_, content)| content.clone())
            .ok_or_else(|| NetError::NotFound(url.to_string()))
    }
}
