//! The consistency audit.
//!
//! A read-only walk over the whole hierarchy, level by level: sections to
//! sub-sections, sections to forums, forums to threads, threads to messages.
//! Each level gets a downward pass (every listed child exists and points
//! back at its container) and an upward pass (every child's declared parent
//! exists, carries the right child kind, and lists the child); sections
//! additionally get a root-uniqueness pass.
//!
//! Messages are checked through the id-and-owner projection only, and the
//! upward message→thread pass is omitted: with the message table being by
//! far the largest, that pass costs more than the corruption class it would
//! catch is worth. The downward pass still proves every listed message id.
//!
//! The first inconsistency aborts the audit. The caller decides severity:
//! fatal at module startup, logged-only from the scheduler.

use tracing::info;

use agora_core::Uid;
use agora_store::{BoardStore, SectionChildKind};

/// An inconsistency found by the audit. `NotFound` names a dangling id;
/// `Damaged` names the record whose links disagree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuditError {
    /// A referenced section does not exist.
    #[error("section is not found, id={0}")]
    SectionNotFound(Uid),
    /// A section's links disagree with its surroundings.
    #[error("section is damaged, id={0}")]
    SectionDamaged(Uid),
    /// More than one parent-less section exists.
    #[error("too many root sections")]
    TooManyRootSections,
    /// A referenced forum does not exist.
    #[error("forum is not found, id={0}")]
    ForumNotFound(Uid),
    /// A forum's links disagree with its surroundings.
    #[error("forum is damaged, id={0}")]
    ForumDamaged(Uid),
    /// A referenced thread does not exist.
    #[error("thread is not found, id={0}")]
    ThreadNotFound(Uid),
    /// A thread's links disagree with its surroundings.
    #[error("thread is damaged, id={0}")]
    ThreadDamaged(Uid),
    /// A referenced message does not exist.
    #[error("message is not found, id={0}")]
    MessageNotFound(Uid),
    /// A message's links disagree with its surroundings.
    #[error("message is damaged, id={0}")]
    MessageDamaged(Uid),
}

/// Walks the whole hierarchy under the caller's read lock.
pub fn check_consistency(store: &BoardStore) -> Result<(), AuditError> {
    info!("database consistency check");
    check_sections(store)?;
    check_forums(store)?;
    check_threads(store)?;
    check_messages(store)?;
    info!("database consistency check: ok");
    Ok(())
}

fn check_sections(store: &BoardStore) -> Result<(), AuditError> {
    // Step I. Downward check (parent to child).
    for section in store.sections.values() {
        if section.child_kind != SectionChildKind::Sections {
            continue;
        }
        for child_id in &section.children {
            let child = store
                .sections
                .get(child_id)
                .ok_or(AuditError::SectionNotFound(child_id))?;
            if child.parent != Some(section.id) {
                return Err(AuditError::SectionDamaged(child_id));
            }
        }
    }

    // Step II. Root section.
    if store.count_root_sections() > 1 {
        return Err(AuditError::TooManyRootSections);
    }

    // Step III. Upward check (child to parent).
    for section in store.sections.values() {
        let Some(parent_id) = section.parent else {
            continue;
        };
        let parent = store
            .sections
            .get(parent_id)
            .ok_or(AuditError::SectionNotFound(parent_id))?;
        if parent.child_kind != SectionChildKind::Sections
            || parent.children.is_empty()
            || !parent.children.contains(section.id)
        {
            return Err(AuditError::SectionDamaged(parent_id));
        }
    }

    Ok(())
}

fn check_forums(store: &BoardStore) -> Result<(), AuditError> {
    // Step I. Downward check (parent to child).
    for section in store.sections.values() {
        if section.child_kind != SectionChildKind::Forums {
            continue;
        }
        for child_id in &section.children {
            let forum = store
                .forums
                .get(child_id)
                .ok_or(AuditError::ForumNotFound(child_id))?;
            if forum.section_id != section.id {
                return Err(AuditError::ForumDamaged(child_id));
            }
        }
    }

    // Step II. Upward check (child to parent).
    for forum in store.forums.values() {
        let parent = store
            .sections
            .get(forum.section_id)
            .ok_or(AuditError::SectionNotFound(forum.section_id))?;
        if parent.child_kind != SectionChildKind::Forums
            || parent.children.is_empty()
            || !parent.children.contains(forum.id)
        {
            return Err(AuditError::SectionDamaged(forum.section_id));
        }
    }

    Ok(())
}

fn check_threads(store: &BoardStore) -> Result<(), AuditError> {
    // Step I. Downward check (parent to child).
    for forum in store.forums.values() {
        for child_id in &forum.threads {
            let thread = store
                .threads
                .get(child_id)
                .ok_or(AuditError::ThreadNotFound(child_id))?;
            if thread.forum_id != forum.id {
                return Err(AuditError::ThreadDamaged(child_id));
            }
        }
    }

    // Step II. Upward check (child to parent).
    for thread in store.threads.values() {
        let forum = store
            .forums
            .get(thread.forum_id)
            .ok_or(AuditError::ForumNotFound(thread.forum_id))?;
        if forum.threads.is_empty() || !forum.threads.contains(thread.id) {
            return Err(AuditError::ForumDamaged(thread.forum_id));
        }
    }

    Ok(())
}

fn check_messages(store: &BoardStore) -> Result<(), AuditError> {
    // Step I. Downward check (parent to child), one thread's worth of
    // message links at a time.
    for thread in store.thread_links() {
        for message_id in &thread.messages {
            let link = store
                .message_link(message_id)
                .ok_or(AuditError::MessageNotFound(message_id))?;
            if link.thread_id != thread.id {
                return Err(AuditError::MessageDamaged(message_id));
            }
        }
    }

    // Step II. Upward check (child to parent).
    // Walking every message back to its thread takes a huge amount of time
    // on a full table; it is intentionally not implemented.

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::links::LinkMaintainer;

    fn populated_store() -> BoardStore {
        let links = LinkMaintainer::new(false);
        let mut store = BoardStore::in_memory();
        let root = links.add_section(&mut store, None, "root", 1).unwrap();
        let sub = links.add_section(&mut store, Some(root), "sub", 1).unwrap();
        let forum = links.add_forum(&mut store, sub, "general", 1).unwrap();
        let thread = links.add_thread(&mut store, forum, "hello", 1).unwrap();
        links
            .add_message(&mut store, thread, "hi", "00", 1)
            .unwrap();
        store
    }

    #[test]
    fn consistent_store_passes() {
        let store = populated_store();
        assert_eq!(check_consistency(&store), Ok(()));
    }

    #[test]
    fn dangling_child_id_is_not_found() {
        let mut store = populated_store();
        let root = store.root_section().unwrap().id;
        store
            .sections
            .get_mut(root)
            .unwrap()
            .children
            .add(999, false)
            .unwrap();
        assert_eq!(
            check_consistency(&store),
            Err(AuditError::SectionNotFound(999))
        );
    }

    #[test]
    fn mismatched_parent_pointer_is_damaged() {
        let mut store = populated_store();
        // Point the sub-section at a different parent than its container.
        let sub = store
            .sections
            .values()
            .find(|s| s.parent.is_some())
            .unwrap()
            .id;
        store.sections.get_mut(sub).unwrap().parent = Some(sub);
        assert_eq!(check_consistency(&store), Err(AuditError::SectionDamaged(sub)));
    }

    #[test]
    fn second_root_section_is_detected() {
        let mut store = populated_store();
        store.sections.insert_with(|id| agora_store::Section {
            id,
            parent: None,
            child_kind: SectionChildKind::None,
            children: agora_core::UidList::new(),
            name: "rogue root".into(),
            event_data: agora_store::EventData::created_by(1),
        });
        assert_eq!(
            check_consistency(&store),
            Err(AuditError::TooManyRootSections)
        );
    }

    #[test]
    fn unlisted_forum_damages_its_section() {
        let mut store = populated_store();
        let (forum_id, section_id) = {
            let forum = store.forums.values().next().unwrap();
            (forum.id, forum.section_id)
        };
        store
            .sections
            .get_mut(section_id)
            .unwrap()
            .children
            .remove(forum_id)
            .unwrap();
        assert_eq!(
            check_consistency(&store),
            Err(AuditError::SectionDamaged(section_id))
        );
    }

    #[test]
    fn message_pointing_at_wrong_thread_is_damaged() {
        let mut store = populated_store();
        let message_id = {
            let message = store.messages.values().next().unwrap();
            message.id
        };
        store.messages.get_mut(message_id).unwrap().thread_id = 777;
        assert_eq!(
            check_consistency(&store),
            Err(AuditError::MessageDamaged(message_id))
        );
    }
}
