//! The board snapshot store.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use agora_core::Uid;

use crate::record::{Forum, Message, MessageLink, Section, Thread, ThreadLink};
use crate::table::Table;

/// Storage failures, split the way the error contract needs them.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The backing file could not be read or written. Treated like a
    /// database network error: fed to the reconnect listener and retried.
    #[error("store i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The snapshot exists but does not parse. A logical error; retrying
    /// will not help.
    #[error("store snapshot is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl StoreError {
    /// Whether the failure is transient (I/O) rather than logical.
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io(_))
    }
}

/// The four hierarchy tables plus the backing snapshot file.
///
/// All reads and writes happen through the owning module's read/write lock;
/// the store itself performs no locking. A mutation protocol edits the
/// tables in place and calls [`BoardStore::flush`] as its commit point.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct BoardStore {
    /// Sections table.
    pub sections: Table<Section>,
    /// Forums table.
    pub forums: Table<Forum>,
    /// Threads table.
    pub threads: Table<Thread>,
    /// Messages table.
    pub messages: Table<Message>,

    #[serde(skip)]
    path: Option<PathBuf>,
    #[serde(skip)]
    dirty: bool,
}

impl BoardStore {
    /// An unbacked store; flushes are no-ops. For tests and tooling.
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Opens the snapshot at `path`, or starts empty when the file does not
    /// exist yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let mut store = match fs::read(&path) {
            Ok(bytes) => serde_json::from_slice::<Self>(&bytes)?,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(err) => return Err(err.into()),
        };
        store.path = Some(path);
        Ok(store)
    }

    /// Writes the snapshot atomically (temp file + rename).
    ///
    /// On failure the store stays marked dirty so a later retry (the
    /// reconnect listener or the housekeeping job) picks it up.
    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.dirty = true;
        let Some(path) = self.path.clone() else {
            self.dirty = false;
            return Ok(());
        };
        self.write_snapshot(&path)?;
        self.dirty = false;
        Ok(())
    }

    fn write_snapshot(&self, path: &Path) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec_pretty(self)?;
        let tmp = path.with_extension("tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(&bytes)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)?;
        debug!(path = %path.display(), bytes = bytes.len(), "snapshot written");
        Ok(())
    }

    /// Flushes only when a previous flush failed and left the store dirty.
    pub fn flush_if_dirty(&mut self) -> Result<(), StoreError> {
        if self.dirty {
            self.flush()
        } else {
            Ok(())
        }
    }

    /// Whether the last flush failed.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    // Projections for the consistency audit.

    /// Thread projections (id, owner, children) for every thread.
    pub fn thread_links(&self) -> Vec<ThreadLink> {
        self.threads.values().map(ThreadLink::from).collect()
    }

    /// Message projection for one message.
    pub fn message_link(&self, id: Uid) -> Option<MessageLink> {
        self.messages.get(id).map(MessageLink::from)
    }

    // Ordered reads at the storage boundary. The children list's own order
    // is the display order, so multi-row reads follow the id list, not the
    // table order.

    /// Messages in the order of `ids`; rows that vanished are skipped.
    pub fn messages_in_order(&self, ids: &[Uid]) -> Vec<&Message> {
        ids.iter().filter_map(|id| self.messages.get(*id)).collect()
    }

    /// Threads in the order of `ids`; rows that vanished are skipped.
    pub fn threads_in_order(&self, ids: &[Uid]) -> Vec<&Thread> {
        ids.iter().filter_map(|id| self.threads.get(*id)).collect()
    }

    /// Forums in the order of `ids`; rows that vanished are skipped.
    pub fn forums_in_order(&self, ids: &[Uid]) -> Vec<&Forum> {
        ids.iter().filter_map(|id| self.forums.get(*id)).collect()
    }

    /// The root section, if one exists.
    pub fn root_section(&self) -> Option<&Section> {
        self.sections.values().find(|s| s.parent.is_none())
    }

    /// Number of parent-less sections.
    pub fn count_root_sections(&self) -> usize {
        self.sections.values().filter(|s| s.parent.is_none()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::EventData;

    fn sample_store() -> BoardStore {
        let mut store = BoardStore::in_memory();
        let root = store.sections.insert_with(|id| Section {
            id,
            parent: None,
            child_kind: crate::record::SectionChildKind::None,
            children: agora_core::UidList::new(),
            name: "root".into(),
            event_data: EventData::created_by(1),
        });
        store.forums.insert_with(|id| Forum {
            id,
            section_id: root,
            name: "general".into(),
            threads: agora_core::UidList::new(),
            event_data: EventData::created_by(1),
        });
        store
    }

    #[test]
    fn snapshot_round_trips_through_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");

        let mut store = sample_store();
        store.path = Some(path.clone());
        store.flush().unwrap();

        let reloaded = BoardStore::open(&path).unwrap();
        assert_eq!(reloaded.sections.len(), 1);
        assert_eq!(reloaded.forums.len(), 1);
        assert_eq!(reloaded.root_section().unwrap().name, "root");
    }

    #[test]
    fn missing_snapshot_opens_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = BoardStore::open(dir.path().join("absent.json")).unwrap();
        assert!(store.sections.is_empty());
    }

    #[test]
    fn corrupt_snapshot_is_a_logical_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("board.json");
        fs::write(&path, b"{not json").unwrap();
        let err = BoardStore::open(&path).unwrap_err();
        assert!(!err.is_io());
    }

    #[test]
    fn failed_flush_leaves_the_store_dirty() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = sample_store();
        // A path whose parent directory does not exist fails the flush.
        store.path = Some(dir.path().join("missing").join("board.json"));
        let err = store.flush().unwrap_err();
        assert!(err.is_io());
        assert!(store.is_dirty());
    }

    #[test]
    fn ordered_reads_follow_the_id_list() {
        let mut store = BoardStore::in_memory();
        for name in ["a", "b", "c"] {
            store.threads.insert_with(|id| Thread {
                id,
                forum_id: 1,
                name: name.into(),
                messages: agora_core::UidList::new(),
                event_data: EventData::created_by(1),
            });
        }
        let names: Vec<&str> = store
            .threads_in_order(&[3, 1])
            .iter()
            .map(|t| t.name.as_str())
            .collect();
        assert_eq!(names, ["c", "a"]);
    }
}
