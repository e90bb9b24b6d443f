//! Request/response cycle against the external grid service.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::ACCEPT;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::ClientConfig;
use crate::grid::{Grid, GridSet};
use crate::normalize::normalize;

/// Failure of one service round trip. `Display` is the user-facing message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    #[error("HTTP {0}")]
    HttpStatus(u16),
    #[error("malformed response body: {0}")]
    Decode(String),
    #[error("{0}")]
    Transport(String),
}

impl ServiceError {
    /// Short tag for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::HttpStatus(_) => "http_status",
            ServiceError::Decode(_) => "decode",
            ServiceError::Transport(_) => "transport",
        }
    }
}

/// One generation-advance (or initial load) against the simulation service.
///
/// `None` asks for a fresh default grid set; `Some(grids)` asks for the next
/// generation of `grids`. Implementations do not retry.
#[async_trait]
pub trait GridService: Send + Sync {
    async fn fetch_next(&self, current: Option<GridSet>) -> Result<GridSet, ServiceError>;
}

#[derive(Serialize)]
struct NextGenerationBody<'a> {
    grids: &'a [Grid],
}

/// [`GridService`] over HTTP: `POST` with JSON in and out.
#[derive(Debug, Clone)]
pub struct HttpGridService {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpGridService {
    pub fn new(endpoint: impl Into<String>, timeout: Option<Duration>) -> Result<Self, ServiceError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| ServiceError::Transport(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    pub fn from_config(cfg: &ClientConfig) -> Result<Self, ServiceError> {
        Self::new(cfg.endpoint(), cfg.timeout())
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

fn transport_error(e: reqwest::Error) -> ServiceError {
    if e.is_timeout() {
        ServiceError::Transport("request timed out".to_string())
    } else if e.is_connect() {
        ServiceError::Transport(format!("connection failed: {e}"))
    } else {
        ServiceError::Transport(e.to_string())
    }
}

#[async_trait]
impl GridService for HttpGridService {
    async fn fetch_next(&self, current: Option<GridSet>) -> Result<GridSet, ServiceError> {
        let request = self
            .client
            .post(&self.endpoint)
            .header(ACCEPT, "application/json");
        // `.json()` also sets `Content-Type`; the empty request carries none.
        let request = match &current {
            Some(grids) => request.json(&NextGenerationBody { grids }),
            None => request,
        };

        let response = request.send().await.map_err(transport_error)?;
        let status = response.status();
        if !status.is_success() {
            return Err(ServiceError::HttpStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(transport_error)?;
        let payload: Value =
            serde_json::from_slice(&body).map_err(|e| ServiceError::Decode(e.to_string()))?;
        let grids = normalize(Some(payload));
        debug!(
            endpoint = %self.endpoint,
            sent = current.as_ref().map_or(0, Vec::len),
            received = grids.len(),
            "grid service round trip"
        );
        Ok(grids)
    }
}
