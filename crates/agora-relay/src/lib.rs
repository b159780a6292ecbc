//! # Agora Relay - Inter-Module RPC Client & Event Relay
//!
//! Modules talk to each other over a small JSON-RPC envelope. This crate
//! holds the client half of that conversation for the board module:
//!
//! - [`RpcTransport`] is the outbound call seam, with an HTTP implementation
//!   ([`HttpTransport`]) for production and in-memory doubles for tests.
//! - [`fetch_dkey`] performs module synchronisation at startup: one
//!   `GetDKey` call whose failure (or an empty key) must abort the caller's
//!   boot — system calls have no other authentication.
//! - [`EventRelay`] validates a [`agora_core::SystemEvent`] against the
//!   per-kind requirement table and delivers it to the notification module,
//!   authenticated with the fetched key. Delivery is best-effort and happens
//!   after the local mutation committed; a failure surfaces to the caller
//!   but never rolls the mutation back.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod relay;
pub mod transport;
pub mod wire;

pub use relay::{fetch_dkey, EventRelay, RelayError};
pub use transport::{HttpTransport, RpcTransport};
pub use wire::{RpcRequest, RpcResponse};
