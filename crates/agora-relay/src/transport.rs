//! The outbound call seam.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tracing::debug;

use crate::relay::RelayError;
use crate::wire::{RpcRequest, RpcResponse};

/// One outbound JSON-RPC connection to a sibling module.
///
/// Implementations are cheap to share behind an `Arc`; calls may run
/// concurrently.
#[async_trait]
pub trait RpcTransport: Send + Sync {
    /// Calls `method` with `params` and returns the raw result value.
    ///
    /// A transport failure and an error response are both [`RelayError`]s;
    /// the caller decides which of them it can recover from.
    async fn call(&self, method: &str, params: Value) -> Result<Value, RelayError>;
}

/// HTTP implementation of [`RpcTransport`].
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    next_id: AtomicU64,
}

impl HttpTransport {
    /// Creates a transport posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.into(),
            next_id: AtomicU64::new(1),
        }
    }
}

#[async_trait]
impl RpcTransport for HttpTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RelayError> {
        let request = RpcRequest {
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method: method.to_owned(),
            params,
        };
        debug!(method, endpoint = %self.endpoint, "outbound rpc call");

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|err| RelayError::Transport(err.to_string()))?;
        let response: RpcResponse = response
            .json()
            .await
            .map_err(|err| RelayError::Transport(err.to_string()))?;

        if let Some(error) = response.error {
            return Err(RelayError::Remote(error));
        }
        response.result.ok_or_else(|| {
            RelayError::Transport("response carries neither result nor error".into())
        })
    }
}
