//! # Agora Store - Persisted Data Model
//!
//! The board hierarchy is persisted without foreign keys: each level is one
//! table with an auto-increment id, a nullable parent id (root section only),
//! a JSON children column holding a [`agora_core::UidList`], and
//! creator/editor audit data. Relational integrity is an application-level
//! discipline — the link-maintenance and audit code in `agora-board` is the
//! only consumer allowed to interpret the parent/children columns.
//!
//! [`BoardStore`] keeps the four tables in memory and commits them as one
//! JSON snapshot file written atomically (temp file + rename). Store errors
//! are split the way the RPC contract needs them: I/O errors feed the
//! module's reconnect listener, corrupt-data errors surface as logical
//! database errors.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod record;
pub mod store;
pub mod table;

pub use record::{
    EventData, EventParameters, Forum, Message, MessageLink, Section, SectionChildKind, Thread,
    ThreadLink,
};
pub use store::{BoardStore, StoreError};
pub use table::Table;
