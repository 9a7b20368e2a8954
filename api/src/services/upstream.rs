use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use axum::{body::Bytes, http::StatusCode};
use reqwest::Client;
use serde::de::IgnoredAny;
use thiserror::Error;
use tracing::debug;

/// Upstream status plus the raw body, already checked to be a single JSON document.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl UpstreamResponse {
    pub fn json(status: StatusCode, body: Bytes) -> Result<Self, UpstreamError> {
        serde_json::from_slice::<IgnoredAny>(&body).map_err(UpstreamError::Malformed)?;
        Ok(Self { status, body })
    }
}

#[derive(Debug, Error)]
pub enum UpstreamError {
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("upstream body is not valid JSON: {0}")]
    Malformed(#[source] serde_json::Error),
}

impl UpstreamError {
    pub fn outcome(&self) -> &'static str {
        match self {
            UpstreamError::Transport(_) => "transport_error",
            UpstreamError::Malformed(_) => "malformed",
        }
    }
}

/// The remote portfolio source behind `/api/portfolio`.
#[async_trait]
pub trait UpstreamSource: Send + Sync {
    async fn fetch(&self) -> Result<UpstreamResponse, UpstreamError>;

    fn target(&self) -> &str;
}

#[derive(Clone)]
pub struct HttpUpstream {
    client: Client,
    url: String,
}

impl HttpUpstream {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl UpstreamSource for HttpUpstream {
    /// Plain `GET` with no body or extra headers; reqwest keeps no response cache, so every call
    /// reaches the upstream.
    async fn fetch(&self) -> Result<UpstreamResponse, UpstreamError> {
        let resp = self.client.get(&self.url).send().await?;
        let status =
            StatusCode::from_u16(resp.status().as_u16()).unwrap_or(StatusCode::BAD_GATEWAY);
        let bytes = resp.bytes().await?;
        debug!(%status, bytes = bytes.len(), "upstream portfolio response");
        UpstreamResponse::json(status, bytes)
    }

    fn target(&self) -> &str {
        &self.url
    }
}
