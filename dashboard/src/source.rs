use std::time::Duration;

use async_trait::async_trait;
use domain::{Holding, PayloadError, PortfolioPayload};
use reqwest::Client;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("portfolio request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Payload(#[from] PayloadError),
}

#[async_trait]
pub trait SnapshotSource: Send + Sync {
    async fn fetch(&self) -> Result<Vec<Holding>, FetchError>;
}

/// Reads snapshots from the dashboard's `/api/portfolio` passthrough.
#[derive(Clone)]
pub struct HttpSnapshotSource {
    client: Client,
    url: String,
}

impl HttpSnapshotSource {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SnapshotSource for HttpSnapshotSource {
    async fn fetch(&self) -> Result<Vec<Holding>, FetchError> {
        // Status is not inspected; error pages surface as payload errors.
        let body = self.client.get(&self.url).send().await?.bytes().await?;
        let payload = PortfolioPayload::from_slice(&body)?;
        Ok(payload.portfolio)
    }
}

/// Fixed snapshot, handy for demos and tests.
#[derive(Clone, Default)]
pub struct StaticSnapshotSource {
    holdings: Vec<Holding>,
}

impl StaticSnapshotSource {
    pub fn new(holdings: Vec<Holding>) -> Self {
        Self { holdings }
    }
}

#[async_trait]
impl SnapshotSource for StaticSnapshotSource {
    async fn fetch(&self) -> Result<Vec<Holding>, FetchError> {
        Ok(self.holdings.clone())
    }
}
