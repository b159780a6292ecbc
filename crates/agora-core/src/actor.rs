//! Callers and their roles.
//!
//! Role resolution is owned by the access-control module; the board module
//! only consumes the answer. An [`Actor`] is the resolved identity of one
//! RPC caller for the duration of one call.

use serde::{Deserialize, Serialize};

use crate::Uid;

/// Role flags of a user, as reported by the access-control module.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roles {
    /// May administer board structure (sections, forums, moves, deletions).
    #[serde(default)]
    pub administrator: bool,
    /// May edit any user's messages.
    #[serde(default)]
    pub moderator: bool,
    /// May create threads.
    #[serde(default)]
    pub author: bool,
    /// May write and edit own messages.
    #[serde(default)]
    pub writer: bool,
    /// May read the board.
    #[serde(default)]
    pub reader: bool,
}

/// A resolved RPC caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// The caller's user id.
    #[serde(rename = "userId")]
    pub user_id: Uid,
    /// The caller's role flags.
    pub roles: Roles,
}

impl Actor {
    /// An actor with every role, for tests and tooling.
    pub fn omnipotent(user_id: Uid) -> Self {
        Self {
            user_id,
            roles: Roles {
                administrator: true,
                moderator: true,
                author: true,
                writer: true,
                reader: true,
            },
        }
    }
}
