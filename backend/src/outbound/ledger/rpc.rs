//! JSON-RPC 2.0 transport to the ledger node.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;
use url::Url;

use crate::domain::ports::LedgerError;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RpcError {
    #[error("transport failure: {message}")]
    Transport { message: String },
    #[error("request timed out after {waited_ms} ms")]
    Timeout { waited_ms: u64 },
    #[error("node returned error {code}: {message}")]
    Remote { code: i64, message: String },
    #[error("malformed response: {message}")]
    Malformed { message: String },
}

impl From<RpcError> for LedgerError {
    fn from(value: RpcError) -> Self {
        match value {
            RpcError::Transport { message } | RpcError::Malformed { message } => {
                Self::unavailable(message)
            }
            RpcError::Timeout { waited_ms } => Self::timeout(waited_ms),
            RpcError::Remote { code, message } => Self::rejected(format!("{code}: {message}")),
        }
    }
}

/// A single JSON-RPC method call.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RpcTransport: Send + Sync {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError>;
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Value,
    error: Option<RpcErrorBody>,
}

/// Interpret a JSON-RPC response envelope.
///
/// A `null` or absent `result` is returned as `Value::Null`; callers decide
/// whether that means "pending" or "missing".
fn parse_response(body: Value) -> Result<Value, RpcError> {
    let response: RpcResponse = serde_json::from_value(body).map_err(|err| RpcError::Malformed {
        message: err.to_string(),
    })?;
    match response.error {
        Some(RpcErrorBody { code, message }) => Err(RpcError::Remote { code, message }),
        None => Ok(response.result),
    }
}

pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// HTTP transport backed by `reqwest`.
#[derive(Debug)]
pub struct HttpRpcTransport {
    client: reqwest::Client,
    endpoint: Url,
    request_timeout: Duration,
    next_id: AtomicU64,
}

impl HttpRpcTransport {
    /// Build a transport whose requests are individually bounded by
    /// `request_timeout`.
    ///
    /// # Errors
    ///
    /// Returns `RpcError::Transport` when the HTTP client cannot be built.
    pub fn new(endpoint: Url, request_timeout: Duration) -> Result<Self, RpcError> {
        let client = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|err| RpcError::Transport {
                message: format!("failed to build HTTP client: {err}"),
            })?;
        Ok(Self {
            client,
            endpoint,
            request_timeout,
            next_id: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

#[async_trait]
impl RpcTransport for HttpRpcTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({ "jsonrpc": "2.0", "method": method, "params": params, "id": id });
        debug!(method, id, "ledger rpc call");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&body)
            .send()
            .await
            .map_err(|err| {
                if err.is_timeout() {
                    RpcError::Timeout {
                        waited_ms: millis(self.request_timeout),
                    }
                } else {
                    RpcError::Transport {
                        message: err.to_string(),
                    }
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(RpcError::Transport {
                message: format!("HTTP {status}"),
            });
        }

        let payload: Value = response.json().await.map_err(|err| RpcError::Malformed {
            message: err.to_string(),
        })?;
        parse_response(payload)
    }
}
