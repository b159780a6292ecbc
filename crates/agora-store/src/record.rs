//! Board hierarchy records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use agora_core::{uid_list, Uid, UidList};

/// Who touched a record, and when.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventParameters {
    /// The user who performed the action.
    #[serde(rename = "userId")]
    pub user_id: Uid,
    /// When the action happened.
    pub time: DateTime<Utc>,
}

/// Creator/editor audit data carried by every record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventData {
    /// Creation stamp.
    pub creator: EventParameters,
    /// Last-edit stamp, absent while the record was never edited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor: Option<EventParameters>,
}

impl EventData {
    /// A fresh audit record for a row created by `user_id` now.
    pub fn created_by(user_id: Uid) -> Self {
        Self {
            creator: EventParameters {
                user_id,
                time: Utc::now(),
            },
            editor: None,
        }
    }

    /// Stamps an edit by `user_id` now.
    pub fn touch(&mut self, user_id: Uid) {
        self.editor = Some(EventParameters {
            user_id,
            time: Utc::now(),
        });
    }

    /// The edit time if the record was edited, otherwise the creation time.
    pub fn last_touch_time(&self) -> DateTime<Utc> {
        self.editor.map_or(self.creator.time, |e| e.time)
    }
}

/// What kind of children a section holds.
///
/// A section's children are homogeneous: either sub-sections or forums,
/// never both. `None` means the section is empty and accepts either kind;
/// the tag is set on first insertion and reset when the last child leaves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SectionChildKind {
    /// No children yet; either kind may be inserted.
    #[default]
    None,
    /// Children are sub-sections.
    Sections,
    /// Children are forums.
    Forums,
}

/// A section: an inner node grouping sub-sections or forums.
///
/// Exactly one section — the root — has no parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Auto-increment id.
    pub id: Uid,
    /// Parent section; `None` only for the root.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<Uid>,
    /// Kind of the children in `children`.
    #[serde(rename = "childType", default)]
    pub child_kind: SectionChildKind,
    /// Ordered child ids (sub-sections or forums, per `child_kind`).
    #[serde(default, deserialize_with = "uid_list::nullable")]
    pub children: UidList,
    /// Display name.
    pub name: String,
    /// Audit data.
    #[serde(rename = "eventData")]
    pub event_data: EventData,
}

/// A forum: holds an ordered list of threads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Forum {
    /// Auto-increment id.
    pub id: Uid,
    /// Owning section.
    #[serde(rename = "sectionId")]
    pub section_id: Uid,
    /// Display name.
    pub name: String,
    /// Ordered thread ids.
    #[serde(default, deserialize_with = "uid_list::nullable")]
    pub threads: UidList,
    /// Audit data.
    #[serde(rename = "eventData")]
    pub event_data: EventData,
}

/// A thread: holds an ordered list of messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Thread {
    /// Auto-increment id.
    pub id: Uid,
    /// Owning forum.
    #[serde(rename = "forumId")]
    pub forum_id: Uid,
    /// Display name.
    pub name: String,
    /// Ordered message ids.
    #[serde(default, deserialize_with = "uid_list::nullable")]
    pub messages: UidList,
    /// Audit data.
    #[serde(rename = "eventData")]
    pub event_data: EventData,
}

/// A message: the leaf of the hierarchy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Auto-increment id.
    pub id: Uid,
    /// Owning thread.
    #[serde(rename = "threadId")]
    pub thread_id: Uid,
    /// Message body.
    pub text: String,
    /// Hex digest of `text`, kept alongside it.
    #[serde(rename = "textChecksum")]
    pub text_checksum: String,
    /// Audit data.
    #[serde(rename = "eventData")]
    pub event_data: EventData,
}

/// Thread projection for the consistency audit: id, owner, children only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThreadLink {
    /// Thread id.
    pub id: Uid,
    /// Owning forum.
    pub forum_id: Uid,
    /// Ordered message ids.
    pub messages: UidList,
}

/// Message projection for the consistency audit: id and owner only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MessageLink {
    /// Message id.
    pub id: Uid,
    /// Owning thread.
    pub thread_id: Uid,
}

impl From<&Thread> for ThreadLink {
    fn from(thread: &Thread) -> Self {
        Self {
            id: thread.id,
            forum_id: thread.forum_id,
            messages: thread.messages.clone(),
        }
    }
}

impl From<&Message> for MessageLink {
    fn from(message: &Message) -> Self {
        Self {
            id: message.id,
            thread_id: message.thread_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_touch_prefers_editor() {
        let mut data = EventData::created_by(1);
        assert_eq!(data.last_touch_time(), data.creator.time);
        data.touch(2);
        let editor = data.editor.unwrap();
        assert_eq!(editor.user_id, 2);
        assert_eq!(data.last_touch_time(), editor.time);
    }

    #[test]
    fn section_children_column_defaults_to_empty() {
        let json = serde_json::json!({
            "id": 1,
            "name": "root",
            "children": null,
            "eventData": { "creator": { "userId": 1, "time": "2026-01-01T00:00:00Z" } },
        });
        let section: Section = serde_json::from_value(json).unwrap();
        assert!(section.children.is_empty());
        assert_eq!(section.child_kind, SectionChildKind::None);
        assert_eq!(section.parent, None);
    }
}
