//! RPC error contract.
//!
//! Every error a module returns over RPC carries a stable numeric code plus a
//! message. The gateway maps codes to HTTP status families; modules treat the
//! codes as an ABI and never renumber them.

use serde::{Deserialize, Serialize};

/// Stable numeric error codes.
///
/// Codes below 100 are shared by all modules; the 100 range belongs to the
/// board module.
pub mod codes {
    /// Missing or malformed authorisation data.
    pub const AUTHORISATION: u16 = 1;
    /// The caller is not allowed to perform the operation.
    pub const PERMISSION: u16 = 2;
    /// The request parameters do not match the method's contract.
    pub const PARAMETERS: u16 = 3;
    /// A database operation failed; details are logged, never returned.
    pub const DATABASE: u16 = 4;
    /// A children-list operation failed, which indicates a damaged link.
    pub const UID_LIST: u16 = 5;
    /// A system event could not be built or validated.
    pub const SYSTEM_EVENT: u16 = 6;
    /// An outbound RPC call to a sibling module failed.
    pub const RPC_CALL: u16 = 7;
    /// Module synchronisation (DKey exchange) failed.
    pub const MODULE_SYNCHRONISATION: u16 = 8;
    /// The method name is not known to this module.
    pub const UNKNOWN_METHOD: u16 = 9;

    /// A required section id parameter is not set.
    pub const SECTION_ID_NOT_SET: u16 = 100;
    /// A required section name parameter is not set.
    pub const SECTION_NAME_NOT_SET: u16 = 101;
    /// The section does not exist.
    pub const SECTION_IS_NOT_FOUND: u16 = 102;
    /// A root section already exists.
    pub const ROOT_SECTION_ALREADY_EXISTS: u16 = 103;
    /// The root section can not be moved.
    pub const ROOT_SECTION_CAN_NOT_BE_MOVED: u16 = 104;
    /// The parent's child kind disagrees with the inserted child.
    pub const INCOMPATIBLE_CHILD_KIND: u16 = 105;
    /// The section still has children.
    pub const SECTION_HAS_CHILDREN: u16 = 106;
    /// A required forum id parameter is not set.
    pub const FORUM_ID_NOT_SET: u16 = 107;
    /// A required forum name parameter is not set.
    pub const FORUM_NAME_NOT_SET: u16 = 108;
    /// The forum does not exist.
    pub const FORUM_IS_NOT_FOUND: u16 = 109;
    /// The forum still has threads.
    pub const FORUM_HAS_THREADS: u16 = 110;
    /// A required thread id parameter is not set.
    pub const THREAD_ID_NOT_SET: u16 = 111;
    /// A required thread name parameter is not set.
    pub const THREAD_NAME_NOT_SET: u16 = 112;
    /// The thread does not exist.
    pub const THREAD_IS_NOT_FOUND: u16 = 113;
    /// The thread still has messages.
    pub const THREAD_IS_NOT_EMPTY: u16 = 114;
    /// A required message id parameter is not set.
    pub const MESSAGE_ID_NOT_SET: u16 = 115;
    /// A required message text parameter is not set.
    pub const MESSAGE_TEXT_NOT_SET: u16 = 116;
    /// The message does not exist.
    pub const MESSAGE_IS_NOT_FOUND: u16 = 117;
    /// The section move would create a containment cycle.
    pub const CYCLIC_SECTION_MOVE: u16 = 118;
}

/// An RPC-visible error: stable code plus human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
#[error("rpc error {code}: {message}")]
pub struct RpcError {
    /// Stable numeric code from [`codes`].
    pub code: u16,
    /// Human-readable message.
    pub message: String,
}

impl RpcError {
    /// Builds an error from a code and message.
    pub fn new(code: u16, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// The shared permission error.
    pub fn permission() -> Self {
        Self::new(codes::PERMISSION, "permission is denied")
    }

    /// The shared authorisation error.
    pub fn authorisation() -> Self {
        Self::new(codes::AUTHORISATION, "authorisation is required")
    }

    /// The shared database error. Details stay in the log.
    pub fn database() -> Self {
        Self::new(codes::DATABASE, "database error")
    }

    /// The shared malformed-parameters error.
    pub fn parameters() -> Self {
        Self::new(codes::PARAMETERS, "parameters error")
    }

    /// The shared outbound-call error.
    pub fn rpc_call() -> Self {
        Self::new(codes::RPC_CALL, "rpc call error")
    }

    /// The shared module-synchronisation error.
    pub fn module_synchronisation() -> Self {
        Self::new(
            codes::MODULE_SYNCHRONISATION,
            "module synchronisation error",
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wire_shape() {
        let err = RpcError::new(codes::THREAD_IS_NOT_FOUND, "thread is not found");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"code": 113, "message": "thread is not found"})
        );
    }
}
