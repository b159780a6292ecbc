//! Wire shapes of the board module's RPC methods.

use serde::{Deserialize, Serialize};

use agora_core::Uid;
use agora_store::{Forum, Message, Section, Thread};

use crate::access::Auth;

/// The plain success result shared by mutations without a payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OkResult {
    /// Always `true`.
    pub ok: bool,
}

impl OkResult {
    pub(crate) fn new() -> Self {
        Self { ok: true }
    }
}

/// Pagination metadata attached to paged listings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageData {
    /// Requested page, 1-based.
    pub page: usize,
    /// Items per page.
    #[serde(rename = "pageSize")]
    pub page_size: usize,
    /// Total items across all pages.
    #[serde(rename = "totalItems")]
    pub total_items: usize,
    /// Total number of pages.
    #[serde(rename = "totalPages")]
    pub total_pages: usize,
}

// Sections.

/// `AddSection` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddSectionParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Parent section; absent to create the root section.
    #[serde(default)]
    pub parent: Option<Uid>,
    /// Section name.
    #[serde(default)]
    pub name: String,
}

/// `AddSection` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddSectionResult {
    /// Id of the inserted section.
    #[serde(rename = "sectionId")]
    pub section_id: Uid,
}

/// `ChangeSectionName` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeSectionNameParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target section.
    #[serde(rename = "sectionId", default)]
    pub section_id: Uid,
    /// New name.
    #[serde(default)]
    pub name: String,
}

/// `ChangeSectionParent` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeSectionParentParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target section.
    #[serde(rename = "sectionId", default)]
    pub section_id: Uid,
    /// New parent section.
    #[serde(default)]
    pub parent: Uid,
}

/// `GetSection` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct GetSectionParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target section.
    #[serde(rename = "sectionId", default)]
    pub section_id: Uid,
}

/// `GetSection` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetSectionResult {
    /// The section record.
    pub section: Section,
}

/// Parameters of `MoveSectionUp`, `MoveSectionDown` and `DeleteSection`.
#[derive(Debug, Clone, Deserialize)]
pub struct SectionIdParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target section.
    #[serde(rename = "sectionId", default)]
    pub section_id: Uid,
}

// Forums.

/// `AddForum` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddForumParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Owning section.
    #[serde(rename = "sectionId", default)]
    pub section_id: Uid,
    /// Forum name.
    #[serde(default)]
    pub name: String,
}

/// `AddForum` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddForumResult {
    /// Id of the inserted forum.
    #[serde(rename = "forumId")]
    pub forum_id: Uid,
}

/// `ChangeForumName` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeForumNameParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target forum.
    #[serde(rename = "forumId", default)]
    pub forum_id: Uid,
    /// New name.
    #[serde(default)]
    pub name: String,
}

/// `ChangeForumSection` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeForumSectionParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target forum.
    #[serde(rename = "forumId", default)]
    pub forum_id: Uid,
    /// New owning section.
    #[serde(rename = "sectionId", default)]
    pub section_id: Uid,
}

/// `GetForum` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct GetForumParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target forum.
    #[serde(rename = "forumId", default)]
    pub forum_id: Uid,
}

/// `GetForum` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetForumResult {
    /// The forum record.
    pub forum: Forum,
}

/// Parameters of `MoveForumUp`, `MoveForumDown` and `DeleteForum`.
#[derive(Debug, Clone, Deserialize)]
pub struct ForumIdParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target forum.
    #[serde(rename = "forumId", default)]
    pub forum_id: Uid,
}

// Threads.

/// `AddThread` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddThreadParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Owning forum.
    #[serde(rename = "forumId", default)]
    pub forum_id: Uid,
    /// Thread name.
    #[serde(default)]
    pub name: String,
}

/// `AddThread` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddThreadResult {
    /// Id of the inserted thread.
    #[serde(rename = "threadId")]
    pub thread_id: Uid,
}

/// `ChangeThreadName` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeThreadNameParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target thread.
    #[serde(rename = "threadId", default)]
    pub thread_id: Uid,
    /// New name.
    #[serde(default)]
    pub name: String,
}

/// `ChangeThreadForum` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeThreadForumParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target thread.
    #[serde(rename = "threadId", default)]
    pub thread_id: Uid,
    /// New owning forum.
    #[serde(rename = "forumId", default)]
    pub forum_id: Uid,
}

/// `GetThread` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct GetThreadParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target thread.
    #[serde(rename = "threadId", default)]
    pub thread_id: Uid,
}

/// `GetThread` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetThreadResult {
    /// The thread record.
    pub thread: Thread,
}

/// Parameters of `MoveThreadUp`, `MoveThreadDown` and `DeleteThread`.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadIdParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target thread.
    #[serde(rename = "threadId", default)]
    pub thread_id: Uid,
}

// Messages.

/// `AddMessage` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct AddMessageParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Owning thread.
    #[serde(rename = "threadId", default)]
    pub thread_id: Uid,
    /// Message text.
    #[serde(default)]
    pub text: String,
}

/// `AddMessage` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AddMessageResult {
    /// Id of the inserted message.
    #[serde(rename = "messageId")]
    pub message_id: Uid,
}

/// `ChangeMessageText` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeMessageTextParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target message.
    #[serde(rename = "messageId", default)]
    pub message_id: Uid,
    /// New text.
    #[serde(default)]
    pub text: String,
}

/// `ChangeMessageThread` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangeMessageThreadParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target message.
    #[serde(rename = "messageId", default)]
    pub message_id: Uid,
    /// New owning thread.
    #[serde(rename = "threadId", default)]
    pub thread_id: Uid,
}

/// `GetMessage` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct GetMessageParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target message.
    #[serde(rename = "messageId", default)]
    pub message_id: Uid,
}

/// `GetMessage` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMessageResult {
    /// The message record.
    pub message: Message,
}

/// `GetLatestMessageOfThread` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LatestMessageResult {
    /// The latest message, absent while the thread is empty.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<Message>,
}

/// Parameters of `DeleteMessage`.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageIdParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target message.
    #[serde(rename = "messageId", default)]
    pub message_id: Uid,
}

// Composite listings.

/// `ListSectionsAndForums` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ListSectionsAndForumsParams {
    /// Caller authorisation.
    pub auth: Auth,
}

/// `ListSectionsAndForums` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListSectionsAndForumsResult {
    /// All sections, in id order.
    pub sections: Vec<Section>,
    /// All forums, in id order.
    pub forums: Vec<Forum>,
}

/// `ListForumAndThreadsOnPage` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ListForumAndThreadsOnPageParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target forum.
    #[serde(rename = "forumId", default)]
    pub forum_id: Uid,
    /// Requested page, 1-based.
    #[serde(default)]
    pub page: usize,
}

/// `ListForumAndThreadsOnPage` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListForumAndThreadsOnPageResult {
    /// The forum record.
    pub forum: Forum,
    /// The threads on the requested page, in display order.
    pub threads: Vec<Thread>,
    /// Pagination metadata.
    #[serde(rename = "pageData")]
    pub page_data: PageData,
}

/// `ListThreadAndMessagesOnPage` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ListThreadAndMessagesOnPageParams {
    /// Caller authorisation.
    pub auth: Auth,
    /// Target thread.
    #[serde(rename = "threadId", default)]
    pub thread_id: Uid,
    /// Requested page, 1-based.
    #[serde(default)]
    pub page: usize,
}

/// `ListThreadAndMessagesOnPage` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListThreadAndMessagesOnPageResult {
    /// The thread record.
    pub thread: Thread,
    /// The messages on the requested page, in display order.
    pub messages: Vec<Message>,
    /// Pagination metadata.
    #[serde(rename = "pageData")]
    pub page_data: PageData,
}

// System methods.

/// `GetDKey` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetDKeyResult {
    /// The module's DKey. Empty after the one allowed hand-out.
    #[serde(rename = "dKey")]
    pub dkey: String,
}

/// `ThreadExistsS` parameters.
#[derive(Debug, Clone, Deserialize)]
pub struct ThreadExistsSParams {
    /// The caller module's copy of this module's DKey.
    #[serde(rename = "dKey", default)]
    pub dkey: String,
    /// Thread to check.
    #[serde(rename = "threadId", default)]
    pub thread_id: Uid,
}

/// `ThreadExistsS` result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThreadExistsSResult {
    /// Whether the thread exists.
    pub exists: bool,
}
