//! Structural errors of the link-maintenance protocols.

use agora_core::{Uid, UidListError};

/// Errors a mutation protocol can reject a request with.
///
/// Every variant is detected before any state is touched, so a returned
/// error never implies a partial mutation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The section does not exist.
    #[error("section is not found, id={0}")]
    SectionNotFound(Uid),

    /// The forum does not exist.
    #[error("forum is not found, id={0}")]
    ForumNotFound(Uid),

    /// The thread does not exist.
    #[error("thread is not found, id={0}")]
    ThreadNotFound(Uid),

    /// The message does not exist.
    #[error("message is not found, id={0}")]
    MessageNotFound(Uid),

    /// Only a single root section may exist.
    #[error("root section already exists")]
    RootSectionAlreadyExists,

    /// The root section has no parent to move within or out of.
    #[error("root section can not be moved")]
    RootSectionCannotBeMoved,

    /// The target section's child kind disagrees with the inserted child.
    #[error("incompatible child kind")]
    IncompatibleChildKind,

    /// The section still has children and can not be deleted.
    #[error("section has children, id={0}")]
    SectionHasChildren(Uid),

    /// The forum still has threads and can not be deleted.
    #[error("forum has threads, id={0}")]
    ForumHasThreads(Uid),

    /// The thread still has messages and can not be deleted.
    #[error("thread is not empty, id={0}")]
    ThreadIsNotEmpty(Uid),

    /// Moving the section here would make it its own ancestor.
    #[error("section can not be moved under its own descendant, id={0}")]
    CyclicSectionMove(Uid),

    /// A children-list operation failed. Outside of reorder edge positions
    /// this means the stored links are damaged.
    #[error("uid list error: {0}")]
    UidList(#[from] UidListError),
}
