//! The access-control seam.
//!
//! Authentication and role resolution are owned by the access-control
//! module; the board only asks "who is this caller and what may they do" and
//! consumes the answer. The seam is a trait so tests can script callers
//! without a live sibling module.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::warn;

use agora_core::{Actor, RpcError};
use agora_relay::{RelayError, RpcTransport};

/// Authorisation data every user-facing RPC call carries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Auth {
    /// The caller's session token.
    #[serde(default)]
    pub token: String,
    /// The caller's IP address, as seen by the gateway.
    #[serde(rename = "userIPA", default)]
    pub user_ipa: String,
}

/// Resolves an [`Auth`] into an [`Actor`].
#[async_trait]
pub trait AccessControl: Send + Sync {
    /// Resolves the caller, or rejects the call.
    async fn actor_for(&self, auth: &Auth) -> Result<Actor, RpcError>;
}

/// Production implementation calling the access-control module.
pub struct RemoteAccessControl {
    transport: Arc<dyn RpcTransport>,
}

impl RemoteAccessControl {
    /// Creates a resolver calling over `transport`.
    pub fn new(transport: Arc<dyn RpcTransport>) -> Self {
        Self { transport }
    }
}

#[async_trait]
impl AccessControl for RemoteAccessControl {
    async fn actor_for(&self, auth: &Auth) -> Result<Actor, RpcError> {
        if auth.token.is_empty() || auth.user_ipa.is_empty() {
            return Err(RpcError::authorisation());
        }

        let result = self
            .transport
            .call(
                "GetSelfRoles",
                json!({
                    "auth": { "token": auth.token, "userIPA": auth.user_ipa },
                }),
            )
            .await
            .map_err(|err| match err {
                // The access module's own verdict passes through unchanged.
                RelayError::Remote(remote) => remote,
                other => {
                    warn!(%other, "role resolution call failed");
                    RpcError::rpc_call()
                }
            })?;

        serde_json::from_value(result).map_err(|err| {
            warn!(%err, "role resolution result does not parse");
            RpcError::rpc_call()
        })
    }
}
