//! System events.
//!
//! A system event describes a board mutation that sibling modules must react
//! to. Which identifier fields are mandatory is determined purely by the
//! event kind, from the fixed table in [`SystemEventKind::requirements`] —
//! nothing is inferred from which fields happen to be set.
//!
//! Events are transient: the sender constructs one, validates it, ships it to
//! the notification module, and discards it.

use serde::{Deserialize, Serialize};

use crate::Uid;

/// Kind of a system event.
///
/// The kinds fall into three requirement groups: thread-level events need a
/// thread and an acting user; message-level thread events additionally need
/// the message; message-ownership events also need the original creator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SystemEventKind {
    /// A thread was moved to another forum.
    ThreadParentChange,
    /// A thread was renamed.
    ThreadNameChange,
    /// A thread was deleted.
    ThreadDeletion,
    /// A new message appeared in a thread.
    ThreadNewMessage,
    /// A message of a thread was edited.
    ThreadMessageEdit,
    /// A message of a thread was deleted.
    ThreadMessageDeletion,
    /// A message's text was edited (carries the original creator).
    MessageTextEdit,
    /// A message was moved to another thread (carries the original creator).
    MessageParentChange,
    /// A message was deleted (carries the original creator).
    MessageDeletion,
}

/// Mandatory-field set for one event kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FieldRequirements {
    /// `threadId` must be set.
    pub thread_id: bool,
    /// `messageId` must be set.
    pub message_id: bool,
    /// `userId` must be set.
    pub user_id: bool,
    /// `creator` must be set.
    pub creator: bool,
}

impl SystemEventKind {
    /// The fixed mandatory-field table.
    pub fn requirements(self) -> FieldRequirements {
        // Every kind requires the thread and the acting user.
        let base = FieldRequirements {
            thread_id: true,
            user_id: true,
            ..FieldRequirements::default()
        };
        match self {
            Self::ThreadParentChange | Self::ThreadNameChange | Self::ThreadDeletion => base,
            Self::ThreadNewMessage | Self::ThreadMessageEdit | Self::ThreadMessageDeletion => {
                FieldRequirements {
                    message_id: true,
                    ..base
                }
            }
            Self::MessageTextEdit | Self::MessageParentChange | Self::MessageDeletion => {
                FieldRequirements {
                    message_id: true,
                    creator: true,
                    ..base
                }
            }
        }
    }
}

/// Validation failure of a system event.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SystemEventError {
    /// A field the event kind requires is absent or zero.
    #[error("system event parameters error: {field} is required")]
    MissingParameter {
        /// Wire name of the missing field.
        field: &'static str,
    },
}

/// A tagged notification of a board mutation.
///
/// `userId` is always the acting user. For events that involve two users the
/// original creator of the object goes into `creator` and the user who
/// touched it stays in `userId`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemEvent {
    /// Event kind. All other fields are optional; the kind decides which of
    /// them are mandatory.
    #[serde(rename = "type")]
    pub kind: SystemEventKind,

    /// Thread mentioned in the event.
    #[serde(rename = "threadId", default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<Uid>,

    /// Message mentioned in the event.
    #[serde(rename = "messageId", default, skip_serializing_if = "Option::is_none")]
    pub message_id: Option<Uid>,

    /// Acting user.
    #[serde(rename = "userId", default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<Uid>,

    /// Original creator of the touched object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creator: Option<Uid>,
}

impl SystemEvent {
    /// Builds an event for a thread-level mutation.
    pub fn thread(kind: SystemEventKind, thread_id: Uid, user_id: Uid) -> Self {
        Self {
            kind,
            thread_id: Some(thread_id),
            message_id: None,
            user_id: Some(user_id),
            creator: None,
        }
    }

    /// Builds an event for a message-level mutation.
    pub fn message(kind: SystemEventKind, thread_id: Uid, message_id: Uid, user_id: Uid) -> Self {
        Self {
            kind,
            thread_id: Some(thread_id),
            message_id: Some(message_id),
            user_id: Some(user_id),
            creator: None,
        }
    }

    /// Attaches the original creator.
    pub fn with_creator(mut self, creator: Uid) -> Self {
        self.creator = Some(creator);
        self
    }

    /// Checks the event against the mandatory-field table of its kind.
    pub fn check(&self) -> Result<(), SystemEventError> {
        let req = self.kind.requirements();
        if req.thread_id && !is_set(self.thread_id) {
            return Err(SystemEventError::MissingParameter { field: "threadId" });
        }
        if req.message_id && !is_set(self.message_id) {
            return Err(SystemEventError::MissingParameter { field: "messageId" });
        }
        if req.user_id && !is_set(self.user_id) {
            return Err(SystemEventError::MissingParameter { field: "userId" });
        }
        if req.creator && !is_set(self.creator) {
            return Err(SystemEventError::MissingParameter { field: "creator" });
        }
        Ok(())
    }
}

fn is_set(field: Option<Uid>) -> bool {
    matches!(field, Some(uid) if uid > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thread_events_need_thread_and_user() {
        let event = SystemEvent::thread(SystemEventKind::ThreadNameChange, 3, 7);
        assert_eq!(event.check(), Ok(()));

        let mut bad = event.clone();
        bad.thread_id = None;
        assert_eq!(
            bad.check(),
            Err(SystemEventError::MissingParameter { field: "threadId" })
        );

        let mut bad = event;
        bad.user_id = Some(0);
        assert_eq!(
            bad.check(),
            Err(SystemEventError::MissingParameter { field: "userId" })
        );
    }

    #[test]
    fn message_events_need_the_message() {
        let event = SystemEvent::thread(SystemEventKind::ThreadNewMessage, 3, 7);
        assert_eq!(
            event.check(),
            Err(SystemEventError::MissingParameter { field: "messageId" })
        );
        let event = SystemEvent::message(SystemEventKind::ThreadNewMessage, 3, 4, 7);
        assert_eq!(event.check(), Ok(()));
    }

    #[test]
    fn ownership_events_need_the_creator() {
        let event = SystemEvent::message(SystemEventKind::MessageDeletion, 3, 4, 7);
        assert_eq!(
            event.check(),
            Err(SystemEventError::MissingParameter { field: "creator" })
        );
        assert_eq!(event.with_creator(9).check(), Ok(()));
    }

    #[test]
    fn wire_shape() {
        let event = SystemEvent::message(SystemEventKind::MessageTextEdit, 1, 2, 3).with_creator(4);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "type": "MessageTextEdit",
                "threadId": 1,
                "messageId": 2,
                "userId": 3,
                "creator": 4,
            })
        );
        let back: SystemEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, event);
    }
}
