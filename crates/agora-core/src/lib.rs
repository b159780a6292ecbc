//! # Agora Core - Foundation Types
//!
//! Foundation types shared by every Agora module crate. This crate has no
//! storage, transport, or runtime dependencies; everything in it is plain
//! data and pure logic.
//!
//! **Key Types**:
//! - **UidList**: ordered, duplicate-free identifier list; the denormalized
//!   encoding of every parent→children relationship in the board hierarchy
//! - **SystemEvent**: tagged notification of a board mutation, validated
//!   against a fixed per-kind requirement table before transmission
//! - **DKey**: process-lifetime shared secret authenticating module-to-module
//!   system calls
//! - **RpcError**: stable numeric error codes carried on the wire
//! - **Actor / Roles**: the yes/no answer the access-control module gives
//!   about a caller

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod actor;
pub mod dkey;
pub mod event;
pub mod rpc;
pub mod uid_list;

/// Identifier of a persisted entity (section, forum, thread, message, user).
///
/// Ids are allocated by auto-increment table counters and are strictly
/// positive in live data; `0` never refers to an existing row.
pub type Uid = u64;

pub use actor::{Actor, Roles};
pub use dkey::{DKey, DKeyError};
pub use event::{SystemEvent, SystemEventKind, SystemEventError};
pub use rpc::{codes, RpcError};
pub use uid_list::{UidList, UidListError};
