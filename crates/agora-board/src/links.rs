//! The link-maintenance protocols.
//!
//! Every mutation follows the same shape: verify the target and both parents
//! exist, enforce the section child-kind discipline, then update the moved
//! record, the new parent's children list, and the old parent's children
//! list, resetting an emptied section's child kind to `None`. All of it runs
//! inside one write-lock hold; the caller commits the store afterwards.

use agora_core::{Uid, UidList, UidListError};
use agora_store::{BoardStore, EventData, Forum, Message, Section, SectionChildKind, Thread};

use crate::error::BoardError;

/// Runs the hierarchy mutation protocols.
///
/// Holds the entity placement policy: with `new_threads_at_top` enabled, new
/// threads enter their forum at the top and a thread is raised back to the
/// top when a message is added to it.
#[derive(Debug, Clone, Copy)]
pub struct LinkMaintainer {
    new_threads_at_top: bool,
}

impl LinkMaintainer {
    /// Creates a maintainer with the given placement policy.
    pub fn new(new_threads_at_top: bool) -> Self {
        Self { new_threads_at_top }
    }

    // Sections.

    /// Inserts a section. `parent == None` creates the root; only a single
    /// root may exist.
    pub fn add_section(
        &self,
        store: &mut BoardStore,
        parent: Option<Uid>,
        name: &str,
        actor: Uid,
    ) -> Result<Uid, BoardError> {
        let Some(parent_id) = parent else {
            if store.count_root_sections() > 0 {
                return Err(BoardError::RootSectionAlreadyExists);
            }
            return Ok(store.sections.insert_with(|id| Section {
                id,
                parent: None,
                child_kind: SectionChildKind::None,
                children: UidList::new(),
                name: name.to_owned(),
                event_data: EventData::created_by(actor),
            }));
        };

        admits_child(section(store, parent_id)?, SectionChildKind::Sections)?;

        let id = store.sections.insert_with(|id| Section {
            id,
            parent: Some(parent_id),
            child_kind: SectionChildKind::None,
            children: UidList::new(),
            name: name.to_owned(),
            event_data: EventData::created_by(actor),
        });
        let parent = section_mut(store, parent_id)?;
        parent.child_kind = SectionChildKind::Sections;
        parent.children.add(id, false)?;
        Ok(id)
    }

    /// Renames a section.
    pub fn rename_section(
        &self,
        store: &mut BoardStore,
        id: Uid,
        name: &str,
        actor: Uid,
    ) -> Result<(), BoardError> {
        let target = section_mut(store, id)?;
        target.name = name.to_owned();
        target.event_data.touch(actor);
        Ok(())
    }

    /// Moves a section under a new parent section.
    pub fn move_section(
        &self,
        store: &mut BoardStore,
        id: Uid,
        new_parent_id: Uid,
        actor: Uid,
    ) -> Result<(), BoardError> {
        let old_parent_id = section(store, id)?
            .parent
            .ok_or(BoardError::RootSectionCannotBeMoved)?;
        section(store, old_parent_id)?;
        let new_parent = section(store, new_parent_id)?;
        admits_child(new_parent, SectionChildKind::Sections)?;
        if new_parent.children.contains(id) {
            return Err(UidListError::Duplicate(id).into());
        }
        if !section(store, old_parent_id)?.children.contains(id) {
            return Err(UidListError::NotFound(id).into());
        }
        // The new parent must not sit inside the moved section's subtree.
        self.ensure_not_descendant(store, id, new_parent_id)?;

        let moved = section_mut(store, id)?;
        moved.parent = Some(new_parent_id);
        moved.event_data.touch(actor);

        let new_parent = section_mut(store, new_parent_id)?;
        new_parent.child_kind = SectionChildKind::Sections;
        new_parent.children.add(id, false)?;

        let old_parent = section_mut(store, old_parent_id)?;
        old_parent.children.remove(id)?;
        if old_parent.children.is_empty() {
            old_parent.child_kind = SectionChildKind::None;
        }
        Ok(())
    }

    fn ensure_not_descendant(
        &self,
        store: &BoardStore,
        root: Uid,
        candidate: Uid,
    ) -> Result<(), BoardError> {
        let mut cursor = Some(candidate);
        // The chain is bounded by the table size even if the data is damaged.
        for _ in 0..=store.sections.len() {
            let Some(id) = cursor else {
                return Ok(());
            };
            if id == root {
                return Err(BoardError::CyclicSectionMove(root));
            }
            cursor = section(store, id)?.parent;
        }
        Err(BoardError::CyclicSectionMove(root))
    }

    /// Swaps a section with its predecessor in the parent's children.
    pub fn move_section_up(&self, store: &mut BoardStore, id: Uid) -> Result<(), BoardError> {
        let parent_id = section(store, id)?
            .parent
            .ok_or(BoardError::RootSectionCannotBeMoved)?;
        section_mut(store, parent_id)?.children.move_up(id)?;
        Ok(())
    }

    /// Swaps a section with its successor in the parent's children.
    pub fn move_section_down(&self, store: &mut BoardStore, id: Uid) -> Result<(), BoardError> {
        let parent_id = section(store, id)?
            .parent
            .ok_or(BoardError::RootSectionCannotBeMoved)?;
        section_mut(store, parent_id)?.children.move_down(id)?;
        Ok(())
    }

    /// Deletes an empty section and unlinks it from its parent.
    pub fn delete_section(&self, store: &mut BoardStore, id: Uid) -> Result<(), BoardError> {
        let target = section(store, id)?;
        if !target.children.is_empty() {
            return Err(BoardError::SectionHasChildren(id));
        }
        if let Some(parent_id) = target.parent {
            let parent = section_mut(store, parent_id)?;
            parent.children.remove(id)?;
            if parent.children.is_empty() {
                parent.child_kind = SectionChildKind::None;
            }
        }
        store.sections.remove(id);
        Ok(())
    }

    // Forums.

    /// Inserts a forum into a section.
    pub fn add_forum(
        &self,
        store: &mut BoardStore,
        section_id: Uid,
        name: &str,
        actor: Uid,
    ) -> Result<Uid, BoardError> {
        admits_child(section(store, section_id)?, SectionChildKind::Forums)?;

        let id = store.forums.insert_with(|id| Forum {
            id,
            section_id,
            name: name.to_owned(),
            threads: UidList::new(),
            event_data: EventData::created_by(actor),
        });
        let parent = section_mut(store, section_id)?;
        parent.child_kind = SectionChildKind::Forums;
        parent.children.add(id, false)?;
        Ok(id)
    }

    /// Renames a forum.
    pub fn rename_forum(
        &self,
        store: &mut BoardStore,
        id: Uid,
        name: &str,
        actor: Uid,
    ) -> Result<(), BoardError> {
        let target = forum_mut(store, id)?;
        target.name = name.to_owned();
        target.event_data.touch(actor);
        Ok(())
    }

    /// Moves a forum into a new section.
    pub fn move_forum(
        &self,
        store: &mut BoardStore,
        id: Uid,
        new_section_id: Uid,
        actor: Uid,
    ) -> Result<(), BoardError> {
        let old_section_id = forum(store, id)?.section_id;
        section(store, old_section_id)?;
        let new_section = section(store, new_section_id)?;
        admits_child(new_section, SectionChildKind::Forums)?;
        if new_section.children.contains(id) {
            return Err(UidListError::Duplicate(id).into());
        }
        if !section(store, old_section_id)?.children.contains(id) {
            return Err(UidListError::NotFound(id).into());
        }

        let moved = forum_mut(store, id)?;
        moved.section_id = new_section_id;
        moved.event_data.touch(actor);

        let new_section = section_mut(store, new_section_id)?;
        new_section.child_kind = SectionChildKind::Forums;
        new_section.children.add(id, false)?;

        let old_section = section_mut(store, old_section_id)?;
        old_section.children.remove(id)?;
        if old_section.children.is_empty() {
            old_section.child_kind = SectionChildKind::None;
        }
        Ok(())
    }

    /// Swaps a forum with its predecessor in the section's children.
    pub fn move_forum_up(&self, store: &mut BoardStore, id: Uid) -> Result<(), BoardError> {
        let section_id = forum(store, id)?.section_id;
        section_mut(store, section_id)?.children.move_up(id)?;
        Ok(())
    }

    /// Swaps a forum with its successor in the section's children.
    pub fn move_forum_down(&self, store: &mut BoardStore, id: Uid) -> Result<(), BoardError> {
        let section_id = forum(store, id)?.section_id;
        section_mut(store, section_id)?.children.move_down(id)?;
        Ok(())
    }

    /// Deletes a forum that has no threads and unlinks it from its section.
    pub fn delete_forum(&self, store: &mut BoardStore, id: Uid) -> Result<(), BoardError> {
        let target = forum(store, id)?;
        if !target.threads.is_empty() {
            return Err(BoardError::ForumHasThreads(id));
        }
        let section_id = target.section_id;
        let parent = section_mut(store, section_id)?;
        parent.children.remove(id)?;
        if parent.children.is_empty() {
            parent.child_kind = SectionChildKind::None;
        }
        store.forums.remove(id);
        Ok(())
    }

    // Threads.

    /// Inserts a thread into a forum, at the top or bottom per policy.
    pub fn add_thread(
        &self,
        store: &mut BoardStore,
        forum_id: Uid,
        name: &str,
        actor: Uid,
    ) -> Result<Uid, BoardError> {
        forum(store, forum_id)?;
        let id = store.threads.insert_with(|id| Thread {
            id,
            forum_id,
            name: name.to_owned(),
            messages: UidList::new(),
            event_data: EventData::created_by(actor),
        });
        forum_mut(store, forum_id)?
            .threads
            .add(id, self.new_threads_at_top)?;
        Ok(id)
    }

    /// Renames a thread.
    pub fn rename_thread(
        &self,
        store: &mut BoardStore,
        id: Uid,
        name: &str,
        actor: Uid,
    ) -> Result<(), BoardError> {
        let target = thread_mut(store, id)?;
        target.name = name.to_owned();
        target.event_data.touch(actor);
        Ok(())
    }

    /// Moves a thread into a new forum.
    pub fn move_thread(
        &self,
        store: &mut BoardStore,
        id: Uid,
        new_forum_id: Uid,
        actor: Uid,
    ) -> Result<(), BoardError> {
        let old_forum_id = thread(store, id)?.forum_id;
        forum(store, old_forum_id)?;
        let new_forum = forum(store, new_forum_id)?;
        if new_forum.threads.contains(id) {
            return Err(UidListError::Duplicate(id).into());
        }
        if !forum(store, old_forum_id)?.threads.contains(id) {
            return Err(UidListError::NotFound(id).into());
        }

        let moved = thread_mut(store, id)?;
        moved.forum_id = new_forum_id;
        moved.event_data.touch(actor);

        forum_mut(store, new_forum_id)?.threads.add(id, false)?;
        forum_mut(store, old_forum_id)?.threads.remove(id)?;
        Ok(())
    }

    /// Swaps a thread with its predecessor in the forum's threads.
    pub fn move_thread_up(&self, store: &mut BoardStore, id: Uid) -> Result<(), BoardError> {
        let forum_id = thread(store, id)?.forum_id;
        forum_mut(store, forum_id)?.threads.move_up(id)?;
        Ok(())
    }

    /// Swaps a thread with its successor in the forum's threads.
    pub fn move_thread_down(&self, store: &mut BoardStore, id: Uid) -> Result<(), BoardError> {
        let forum_id = thread(store, id)?.forum_id;
        forum_mut(store, forum_id)?.threads.move_down(id)?;
        Ok(())
    }

    /// Deletes a thread that has no messages and unlinks it from its forum.
    pub fn delete_thread(&self, store: &mut BoardStore, id: Uid) -> Result<(), BoardError> {
        let target = thread(store, id)?;
        if !target.messages.is_empty() {
            return Err(BoardError::ThreadIsNotEmpty(id));
        }
        let forum_id = target.forum_id;
        forum_mut(store, forum_id)?.threads.remove(id)?;
        store.threads.remove(id);
        Ok(())
    }

    // Messages.

    /// Inserts a message into a thread. With `new_threads_at_top` enabled
    /// the thread is raised back to the top of its forum.
    pub fn add_message(
        &self,
        store: &mut BoardStore,
        thread_id: Uid,
        text: &str,
        text_checksum: &str,
        actor: Uid,
    ) -> Result<Uid, BoardError> {
        let forum_id = thread(store, thread_id)?.forum_id;
        let id = store.messages.insert_with(|id| Message {
            id,
            thread_id,
            text: text.to_owned(),
            text_checksum: text_checksum.to_owned(),
            event_data: EventData::created_by(actor),
        });
        thread_mut(store, thread_id)?.messages.add(id, false)?;

        if self.new_threads_at_top {
            forum_mut(store, forum_id)?.threads.raise(thread_id)?;
        }
        Ok(id)
    }

    /// Replaces a message's text, returning the message as it was before the
    /// edit.
    pub fn edit_message(
        &self,
        store: &mut BoardStore,
        id: Uid,
        text: &str,
        text_checksum: &str,
        actor: Uid,
    ) -> Result<Message, BoardError> {
        let prior = message(store, id)?.clone();
        let target = message_mut(store, id)?;
        target.text = text.to_owned();
        target.text_checksum = text_checksum.to_owned();
        target.event_data.touch(actor);
        Ok(prior)
    }

    /// Moves a message into a new thread, returning the message as it was
    /// before the move (its `thread_id` is the old thread).
    pub fn move_message(
        &self,
        store: &mut BoardStore,
        id: Uid,
        new_thread_id: Uid,
        actor: Uid,
    ) -> Result<Message, BoardError> {
        let prior = message(store, id)?.clone();
        let old_thread_id = prior.thread_id;
        thread(store, old_thread_id)?;
        let new_thread = thread(store, new_thread_id)?;
        if new_thread.messages.contains(id) {
            return Err(UidListError::Duplicate(id).into());
        }
        if !thread(store, old_thread_id)?.messages.contains(id) {
            return Err(UidListError::NotFound(id).into());
        }

        let moved = message_mut(store, id)?;
        moved.thread_id = new_thread_id;
        moved.event_data.touch(actor);

        thread_mut(store, new_thread_id)?.messages.add(id, false)?;
        thread_mut(store, old_thread_id)?.messages.remove(id)?;
        Ok(prior)
    }

    /// Deletes a message and unlinks it from its thread, returning the
    /// removed record.
    pub fn delete_message(&self, store: &mut BoardStore, id: Uid) -> Result<Message, BoardError> {
        let thread_id = message(store, id)?.thread_id;
        thread_mut(store, thread_id)?.messages.remove(id)?;
        store
            .messages
            .remove(id)
            .ok_or(BoardError::MessageNotFound(id))
    }
}

// Row lookups with the protocol's not-found errors.

fn section(store: &BoardStore, id: Uid) -> Result<&Section, BoardError> {
    store.sections.get(id).ok_or(BoardError::SectionNotFound(id))
}

fn section_mut(store: &mut BoardStore, id: Uid) -> Result<&mut Section, BoardError> {
    store
        .sections
        .get_mut(id)
        .ok_or(BoardError::SectionNotFound(id))
}

fn forum(store: &BoardStore, id: Uid) -> Result<&Forum, BoardError> {
    store.forums.get(id).ok_or(BoardError::ForumNotFound(id))
}

fn forum_mut(store: &mut BoardStore, id: Uid) -> Result<&mut Forum, BoardError> {
    store.forums.get_mut(id).ok_or(BoardError::ForumNotFound(id))
}

fn thread(store: &BoardStore, id: Uid) -> Result<&Thread, BoardError> {
    store.threads.get(id).ok_or(BoardError::ThreadNotFound(id))
}

fn thread_mut(store: &mut BoardStore, id: Uid) -> Result<&mut Thread, BoardError> {
    store
        .threads
        .get_mut(id)
        .ok_or(BoardError::ThreadNotFound(id))
}

fn message(store: &BoardStore, id: Uid) -> Result<&Message, BoardError> {
    store
        .messages
        .get(id)
        .ok_or(BoardError::MessageNotFound(id))
}

fn message_mut(store: &mut BoardStore, id: Uid) -> Result<&mut Message, BoardError> {
    store
        .messages
        .get_mut(id)
        .ok_or(BoardError::MessageNotFound(id))
}

/// Checks that `section` may accept a child of `kind`.
fn admits_child(section: &Section, kind: SectionChildKind) -> Result<(), BoardError> {
    if section.child_kind != SectionChildKind::None && section.child_kind != kind {
        return Err(BoardError::IncompatibleChildKind);
    }
    Ok(())
}
