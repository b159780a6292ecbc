//! Module synchronisation and the system event relay.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use agora_core::{RpcError, SystemEvent, SystemEventError};

use crate::transport::RpcTransport;

/// Failures of outbound module-to-module calls.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    /// The call never produced a usable response.
    #[error("transport error: {0}")]
    Transport(String),

    /// The remote module answered with an RPC error.
    #[error("remote error: {0}")]
    Remote(RpcError),

    /// DKey synchronisation failed; the dependent module must not start.
    #[error("module synchronisation error")]
    ModuleSynchronisation,

    /// The event failed its mandatory-field validation and was never sent.
    #[error(transparent)]
    Event(#[from] SystemEventError),
}

#[derive(Deserialize)]
struct DKeyResult {
    #[serde(rename = "dKey")]
    dkey: String,
}

/// Fetches the owning module's DKey, once, at the dependent module's
/// startup.
///
/// The key is the only authentication system calls have, so any failure —
/// transport, remote error, or an empty key — is a
/// [`RelayError::ModuleSynchronisation`] and must abort startup.
pub async fn fetch_dkey(transport: &dyn RpcTransport) -> Result<String, RelayError> {
    let result = transport
        .call("GetDKey", json!({}))
        .await
        .map_err(|err| {
            warn!(%err, "dkey fetch failed");
            RelayError::ModuleSynchronisation
        })?;
    let result: DKeyResult =
        serde_json::from_value(result).map_err(|_| RelayError::ModuleSynchronisation)?;
    if result.dkey.is_empty() {
        return Err(RelayError::ModuleSynchronisation);
    }
    Ok(result.dkey)
}

/// Delivers system events to the notification module.
///
/// Constructed once at startup from the transport and the key fetched via
/// [`fetch_dkey`]; the key is cached for the process lifetime.
pub struct EventRelay {
    transport: Arc<dyn RpcTransport>,
    dkey: String,
}

impl EventRelay {
    /// Synchronises with the notification module and builds the relay.
    pub async fn connect(transport: Arc<dyn RpcTransport>) -> Result<Self, RelayError> {
        let dkey = fetch_dkey(transport.as_ref()).await?;
        Ok(Self { transport, dkey })
    }

    /// A relay with a known key, for tests.
    pub fn with_dkey(transport: Arc<dyn RpcTransport>, dkey: impl Into<String>) -> Self {
        Self {
            transport,
            dkey: dkey.into(),
        }
    }

    /// Validates `event` and ships it.
    ///
    /// Called after the triggering mutation committed and outside the
    /// hierarchy lock. An error here means the notification was lost, not
    /// that the mutation failed.
    pub async fn report(&self, event: &SystemEvent) -> Result<(), RelayError> {
        event.check()?;
        self.transport
            .call(
                "ProcessSystemEventS",
                json!({
                    "dKey": self.dkey,
                    "systemEventData": event,
                }),
            )
            .await?;
        Ok(())
    }
}
