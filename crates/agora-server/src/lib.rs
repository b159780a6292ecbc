//! # Agora Server - Board Module Runtime
//!
//! The board (messages) module of the Agora platform: the RPC surface over
//! the hierarchy in `agora-board`, the module-wide lock, the role policy,
//! and the process lifecycle (boot-time audit, scheduler, store-error
//! listener, graceful shutdown).

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod access;
pub mod config;
pub mod methods;
pub mod rpc;
pub mod server;
pub mod service;

pub use config::Settings;
pub use server::{Server, ServerError};
pub use service::BoardService;
