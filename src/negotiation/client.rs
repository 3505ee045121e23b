//! Optimizer Client
//! Mission: Reach the external MPSO optimizer service over HTTP

use crate::negotiation::models::{ComparisonRequest, NegotiationRequest, OptimizeResponse};
use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Failure talking to the optimizer
#[derive(Debug)]
pub enum OptimizerError {
    /// Connection refused, timeout, TLS failure...
    Unreachable(String),
    /// Optimizer answered with a non-success status
    Rejected { status: u16, detail: String },
    /// Success status but a body we could not decode
    InvalidResponse(String),
}

impl fmt::Display for OptimizerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OptimizerError::Unreachable(e) => write!(f, "Optimizer unreachable: {}", e),
            OptimizerError::Rejected { status, detail } => {
                write!(f, "Optimizer rejected request ({}): {}", status, detail)
            }
            OptimizerError::InvalidResponse(e) => write!(f, "Invalid optimizer response: {}", e),
        }
    }
}

impl std::error::Error for OptimizerError {}

/// Negotiation engine seam. The HTTP client is the production implementation.
#[async_trait]
pub trait Optimizer: Send + Sync {
    /// `POST /optimize`
    async fn optimize(&self, request: &NegotiationRequest)
        -> Result<OptimizeResponse, OptimizerError>;

    /// `POST /api/negotiation/run`
    async fn run_comparison(&self, request: &ComparisonRequest) -> Result<Value, OptimizerError>;
}

/// reqwest-backed optimizer client
pub struct OptimizerClient {
    http: reqwest::Client,
    base_url: String,
}

impl OptimizerClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, OptimizerError>
    where
        B: serde::Serialize + Sync,
        T: serde::de::DeserializeOwned,
    {
        let url = self.url(path);
        let start = Instant::now();

        let resp = self
            .http
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                warn!("Optimizer call to {} failed: {}", url, e);
                OptimizerError::Unreachable(e.to_string())
            })?;

        let status = resp.status();
        debug!(
            path,
            status = status.as_u16(),
            latency_ms = start.elapsed().as_millis() as u64,
            "Optimizer responded"
        );

        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let detail = error_detail(&text);
            warn!("Optimizer rejected {} ({}): {}", path, status, detail);
            return Err(OptimizerError::Rejected {
                status: status.as_u16(),
                detail,
            });
        }

        resp.json::<T>()
            .await
            .map_err(|e| OptimizerError::InvalidResponse(e.to_string()))
    }
}

#[async_trait]
impl Optimizer for OptimizerClient {
    async fn optimize(
        &self,
        request: &NegotiationRequest,
    ) -> Result<OptimizeResponse, OptimizerError> {
        info!(
            "🐝 Optimizing {} over {} manufacturers",
            request.user.fabric_type,
            request.manufacturers.len()
        );
        self.post_json("/optimize", request).await
    }

    async fn run_comparison(&self, request: &ComparisonRequest) -> Result<Value, OptimizerError> {
        info!("🐝 Running algorithm comparison: {:?}", request.algorithms);
        self.post_json("/api/negotiation/run", request).await
    }
}

/// Pull a human-readable message out of an optimizer error body.
///
/// FastAPI puts it under `detail`; anything else is returned as text.
fn error_detail(body: &str) -> String {
    let parsed = serde_json::from_str::<Value>(body).ok();
    let from_json = parsed.as_ref().and_then(|v| {
        v.get("detail")
            .or_else(|| v.get("error"))
            .or_else(|| v.get("message"))
            .map(|d| match d {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
    });

    from_json.unwrap_or_else(|| {
        let trimmed = body.trim();
        if trimmed.is_empty() {
            "no detail".to_string()
        } else {
            trimmed.chars().take(500).collect()
        }
    })
}
