//! The JSON-RPC envelope modules exchange.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use agora_core::RpcError;

/// An outbound or inbound method call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcRequest {
    /// Request id echoed back in the response.
    pub id: u64,
    /// Method name, e.g. `AddSection` or `GetDKey`.
    pub method: String,
    /// Method parameters.
    #[serde(default)]
    pub params: Value,
}

/// A method result or error. Exactly one of the two fields is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcResponse {
    /// Request id this responds to.
    pub id: u64,
    /// Successful result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error, with its stable numeric code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<RpcError>,
}

impl RpcResponse {
    /// A successful response.
    pub fn result(id: u64, result: Value) -> Self {
        Self {
            id,
            result: Some(result),
            error: None,
        }
    }

    /// An error response.
    pub fn error(id: u64, error: RpcError) -> Self {
        Self {
            id,
            result: None,
            error: Some(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_round_trip() {
        let request = RpcRequest {
            id: 3,
            method: "GetDKey".into(),
            params: Value::Null,
        };
        let json = serde_json::to_string(&request).unwrap();
        let back: RpcRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back.method, "GetDKey");

        let response = RpcResponse::error(3, RpcError::permission());
        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("result").is_none());
        assert_eq!(json["error"]["code"], 2);
    }
}
