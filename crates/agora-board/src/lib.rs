//! # Agora Board - Hierarchy Link Maintenance & Audit
//!
//! Every parent→children relationship in the board (section→forum→thread→
//! message) is a denormalized pair: the parent's ordered children list and
//! the child's parent pointer. Nothing in storage enforces that the two
//! sides agree, so this crate is the *only* code path allowed to touch both:
//!
//! - [`LinkMaintainer`] runs the add/move/reorder/delete protocols that keep
//!   the pair consistent. Callers must hold the module's write lock for the
//!   whole protocol.
//! - [`audit`] walks the entire hierarchy read-only and fails loudly on the
//!   first inconsistency — the safety net for any code path that forgot one
//!   side of a link.
//!
//! Protocols validate everything before mutating anything, so a rejected
//! request never leaves a half-linked pair behind.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod audit;
pub mod error;
pub mod links;

pub use audit::{check_consistency, AuditError};
pub use error::BoardError;
pub use links::LinkMaintainer;
