//! The board service.
//!
//! One instance per module process. All hierarchy state sits behind a single
//! module-wide read/write lock: readers take the read lock, every mutation
//! protocol runs inside one write-lock hold with the store flush as its
//! commit point. The lock is never held across an `.await` — permission
//! resolution happens before it is taken and event relaying after it is
//! released, which also means event delivery is neither ordered with respect
//! to later mutations nor transactional with its own.

use chrono::{DateTime, Duration, Utc};
use parking_lot::RwLock;
use sha2::{Digest, Sha256};
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::error;

use agora_board::{audit, AuditError, BoardError, LinkMaintainer};
use agora_core::{codes, Actor, DKey, RpcError, SystemEvent, SystemEventKind, Uid};
use agora_relay::{EventRelay, RelayError};
use agora_store::{BoardStore, Message, StoreError};

use crate::access::{AccessControl, Auth};
use crate::config::Settings;
use crate::methods::*;

/// The board module's service state and RPC handlers.
pub struct BoardService {
    store: RwLock<BoardStore>,
    links: LinkMaintainer,
    settings: Settings,
    dkey: DKey,
    relay: EventRelay,
    access: Arc<dyn AccessControl>,
    store_errors: mpsc::UnboundedSender<StoreError>,
}

impl BoardService {
    /// Assembles the service from its parts.
    pub fn new(
        store: BoardStore,
        settings: Settings,
        dkey: DKey,
        relay: EventRelay,
        access: Arc<dyn AccessControl>,
        store_errors: mpsc::UnboundedSender<StoreError>,
    ) -> Self {
        Self {
            store: RwLock::new(store),
            links: LinkMaintainer::new(settings.new_threads_at_top),
            settings,
            dkey,
            relay,
            access,
            store_errors,
        }
    }

    // Shared plumbing.

    async fn must_be_auth_token(&self, auth: &Auth) -> Result<Actor, RpcError> {
        if auth.token.is_empty() || auth.user_ipa.is_empty() {
            return Err(RpcError::authorisation());
        }
        self.access.actor_for(auth).await
    }

    fn commit(&self, store: &mut BoardStore) -> Result<(), RpcError> {
        store.flush().map_err(|err| self.database_error(err))
    }

    /// Classifies a store failure: I/O errors go to the reconnect listener,
    /// logical errors are only logged. The caller always sees the generic
    /// database error.
    fn database_error(&self, err: StoreError) -> RpcError {
        if err.is_io() {
            error!(%err, "database network error");
            let _ = self.store_errors.send(err);
        } else {
            error!(%err, "database error");
        }
        RpcError::database()
    }

    async fn report(&self, event: SystemEvent) -> Result<(), RpcError> {
        self.relay.report(&event).await.map_err(|err| match err {
            RelayError::Event(_) => RpcError::new(codes::SYSTEM_EVENT, "system event error"),
            RelayError::Remote(remote) => remote,
            RelayError::ModuleSynchronisation => RpcError::module_synchronisation(),
            RelayError::Transport(_) => RpcError::rpc_call(),
        })
    }

    // Message policy.

    fn message_max_edit_time(&self, message: &Message) -> DateTime<Utc> {
        message.event_data.last_touch_time()
            + Duration::seconds(self.settings.message_edit_window_secs as i64)
    }

    fn can_edit_message(&self, actor: &Actor, message: &Message) -> bool {
        // Moderators have extended rights over messages of any user.
        if actor.roles.moderator {
            return true;
        }
        if !actor.roles.writer {
            return false;
        }
        if actor.user_id != message.event_data.creator.user_id {
            return false;
        }
        Utc::now() < self.message_max_edit_time(message)
    }

    fn can_add_message(&self, actor: &Actor, latest_in_thread: Option<&Message>) -> bool {
        if !actor.roles.writer {
            return false;
        }
        let Some(latest) = latest_in_thread else {
            return true;
        };
        if latest.event_data.creator.user_id != actor.user_id {
            return true;
        }
        // While the writer's own latest message is still editable it must be
        // edited instead of followed up.
        Utc::now() >= self.message_max_edit_time(latest)
    }

    fn latest_message(&self, store: &BoardStore, thread_id: Uid) -> Result<Option<Message>, RpcError> {
        let thread = store
            .threads
            .get(thread_id)
            .ok_or_else(|| to_rpc(BoardError::ThreadNotFound(thread_id)))?;
        let Some(latest_id) = thread.messages.last() else {
            return Ok(None);
        };
        let message = store
            .messages
            .get(latest_id)
            .ok_or_else(|| to_rpc(BoardError::MessageNotFound(latest_id)))?;
        Ok(Some(message.clone()))
    }

    // Sections.

    /// `AddSection`.
    pub async fn add_section(&self, p: AddSectionParams) -> Result<AddSectionResult, RpcError> {
        require_text(&p.name, codes::SECTION_NAME_NOT_SET, "section name")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        let section_id = self
            .links
            .add_section(&mut store, p.parent, &p.name, actor.user_id)
            .map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(AddSectionResult { section_id })
    }

    /// `ChangeSectionName`.
    pub async fn change_section_name(
        &self,
        p: ChangeSectionNameParams,
    ) -> Result<OkResult, RpcError> {
        require_id(p.section_id, codes::SECTION_ID_NOT_SET, "section id")?;
        require_text(&p.name, codes::SECTION_NAME_NOT_SET, "section name")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        self.links
            .rename_section(&mut store, p.section_id, &p.name, actor.user_id)
            .map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(OkResult::new())
    }

    /// `ChangeSectionParent`.
    pub async fn change_section_parent(
        &self,
        p: ChangeSectionParentParams,
    ) -> Result<OkResult, RpcError> {
        require_id(p.section_id, codes::SECTION_ID_NOT_SET, "section id")?;
        require_id(p.parent, codes::SECTION_ID_NOT_SET, "parent section id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        self.links
            .move_section(&mut store, p.section_id, p.parent, actor.user_id)
            .map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(OkResult::new())
    }

    /// `GetSection`.
    pub async fn get_section(&self, p: GetSectionParams) -> Result<GetSectionResult, RpcError> {
        require_id(p.section_id, codes::SECTION_ID_NOT_SET, "section id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.reader {
            return Err(RpcError::permission());
        }

        let store = self.store.read();
        let section = store
            .sections
            .get(p.section_id)
            .ok_or_else(|| to_rpc(BoardError::SectionNotFound(p.section_id)))?;
        Ok(GetSectionResult {
            section: section.clone(),
        })
    }

    /// `MoveSectionUp`.
    pub async fn move_section_up(&self, p: SectionIdParams) -> Result<OkResult, RpcError> {
        self.reorder_section(p, LinkMaintainer::move_section_up).await
    }

    /// `MoveSectionDown`.
    pub async fn move_section_down(&self, p: SectionIdParams) -> Result<OkResult, RpcError> {
        self.reorder_section(p, LinkMaintainer::move_section_down).await
    }

    async fn reorder_section(
        &self,
        p: SectionIdParams,
        op: fn(&LinkMaintainer, &mut BoardStore, Uid) -> Result<(), BoardError>,
    ) -> Result<OkResult, RpcError> {
        require_id(p.section_id, codes::SECTION_ID_NOT_SET, "section id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        op(&self.links, &mut store, p.section_id).map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(OkResult::new())
    }

    /// `DeleteSection`.
    pub async fn delete_section(&self, p: SectionIdParams) -> Result<OkResult, RpcError> {
        require_id(p.section_id, codes::SECTION_ID_NOT_SET, "section id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        self.links
            .delete_section(&mut store, p.section_id)
            .map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(OkResult::new())
    }

    // Forums.

    /// `AddForum`.
    pub async fn add_forum(&self, p: AddForumParams) -> Result<AddForumResult, RpcError> {
        require_id(p.section_id, codes::SECTION_ID_NOT_SET, "section id")?;
        require_text(&p.name, codes::FORUM_NAME_NOT_SET, "forum name")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        let forum_id = self
            .links
            .add_forum(&mut store, p.section_id, &p.name, actor.user_id)
            .map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(AddForumResult { forum_id })
    }

    /// `ChangeForumName`.
    pub async fn change_forum_name(&self, p: ChangeForumNameParams) -> Result<OkResult, RpcError> {
        require_id(p.forum_id, codes::FORUM_ID_NOT_SET, "forum id")?;
        require_text(&p.name, codes::FORUM_NAME_NOT_SET, "forum name")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        self.links
            .rename_forum(&mut store, p.forum_id, &p.name, actor.user_id)
            .map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(OkResult::new())
    }

    /// `ChangeForumSection`.
    pub async fn change_forum_section(
        &self,
        p: ChangeForumSectionParams,
    ) -> Result<OkResult, RpcError> {
        require_id(p.forum_id, codes::FORUM_ID_NOT_SET, "forum id")?;
        require_id(p.section_id, codes::SECTION_ID_NOT_SET, "section id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        self.links
            .move_forum(&mut store, p.forum_id, p.section_id, actor.user_id)
            .map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(OkResult::new())
    }

    /// `GetForum`.
    pub async fn get_forum(&self, p: GetForumParams) -> Result<GetForumResult, RpcError> {
        require_id(p.forum_id, codes::FORUM_ID_NOT_SET, "forum id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.reader {
            return Err(RpcError::permission());
        }

        let store = self.store.read();
        let forum = store
            .forums
            .get(p.forum_id)
            .ok_or_else(|| to_rpc(BoardError::ForumNotFound(p.forum_id)))?;
        Ok(GetForumResult {
            forum: forum.clone(),
        })
    }

    /// `MoveForumUp`.
    pub async fn move_forum_up(&self, p: ForumIdParams) -> Result<OkResult, RpcError> {
        self.reorder_forum(p, LinkMaintainer::move_forum_up).await
    }

    /// `MoveForumDown`.
    pub async fn move_forum_down(&self, p: ForumIdParams) -> Result<OkResult, RpcError> {
        self.reorder_forum(p, LinkMaintainer::move_forum_down).await
    }

    async fn reorder_forum(
        &self,
        p: ForumIdParams,
        op: fn(&LinkMaintainer, &mut BoardStore, Uid) -> Result<(), BoardError>,
    ) -> Result<OkResult, RpcError> {
        require_id(p.forum_id, codes::FORUM_ID_NOT_SET, "forum id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        op(&self.links, &mut store, p.forum_id).map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(OkResult::new())
    }

    /// `DeleteForum`.
    pub async fn delete_forum(&self, p: ForumIdParams) -> Result<OkResult, RpcError> {
        require_id(p.forum_id, codes::FORUM_ID_NOT_SET, "forum id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        self.links
            .delete_forum(&mut store, p.forum_id)
            .map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(OkResult::new())
    }

    // Threads.

    /// `AddThread`.
    pub async fn add_thread(&self, p: AddThreadParams) -> Result<AddThreadResult, RpcError> {
        require_id(p.forum_id, codes::FORUM_ID_NOT_SET, "forum id")?;
        require_text(&p.name, codes::THREAD_NAME_NOT_SET, "thread name")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.author {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        let thread_id = self
            .links
            .add_thread(&mut store, p.forum_id, &p.name, actor.user_id)
            .map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(AddThreadResult { thread_id })
    }

    /// `ChangeThreadName`.
    pub async fn change_thread_name(
        &self,
        p: ChangeThreadNameParams,
    ) -> Result<OkResult, RpcError> {
        require_id(p.thread_id, codes::THREAD_ID_NOT_SET, "thread id")?;
        require_text(&p.name, codes::THREAD_NAME_NOT_SET, "thread name")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        {
            let mut store = self.store.write();
            self.links
                .rename_thread(&mut store, p.thread_id, &p.name, actor.user_id)
                .map_err(to_rpc)?;
            self.commit(&mut store)?;
        }
        self.report(SystemEvent::thread(
            SystemEventKind::ThreadNameChange,
            p.thread_id,
            actor.user_id,
        ))
        .await?;
        Ok(OkResult::new())
    }

    /// `ChangeThreadForum`.
    pub async fn change_thread_forum(
        &self,
        p: ChangeThreadForumParams,
    ) -> Result<OkResult, RpcError> {
        require_id(p.thread_id, codes::THREAD_ID_NOT_SET, "thread id")?;
        require_id(p.forum_id, codes::FORUM_ID_NOT_SET, "forum id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        {
            let mut store = self.store.write();
            self.links
                .move_thread(&mut store, p.thread_id, p.forum_id, actor.user_id)
                .map_err(to_rpc)?;
            self.commit(&mut store)?;
        }
        self.report(SystemEvent::thread(
            SystemEventKind::ThreadParentChange,
            p.thread_id,
            actor.user_id,
        ))
        .await?;
        Ok(OkResult::new())
    }

    /// `GetThread`.
    pub async fn get_thread(&self, p: GetThreadParams) -> Result<GetThreadResult, RpcError> {
        require_id(p.thread_id, codes::THREAD_ID_NOT_SET, "thread id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.reader {
            return Err(RpcError::permission());
        }

        let store = self.store.read();
        let thread = store
            .threads
            .get(p.thread_id)
            .ok_or_else(|| to_rpc(BoardError::ThreadNotFound(p.thread_id)))?;
        Ok(GetThreadResult {
            thread: thread.clone(),
        })
    }

    /// `MoveThreadUp`.
    pub async fn move_thread_up(&self, p: ThreadIdParams) -> Result<OkResult, RpcError> {
        self.reorder_thread(p, LinkMaintainer::move_thread_up).await
    }

    /// `MoveThreadDown`.
    pub async fn move_thread_down(&self, p: ThreadIdParams) -> Result<OkResult, RpcError> {
        self.reorder_thread(p, LinkMaintainer::move_thread_down).await
    }

    async fn reorder_thread(
        &self,
        p: ThreadIdParams,
        op: fn(&LinkMaintainer, &mut BoardStore, Uid) -> Result<(), BoardError>,
    ) -> Result<OkResult, RpcError> {
        require_id(p.thread_id, codes::THREAD_ID_NOT_SET, "thread id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let mut store = self.store.write();
        op(&self.links, &mut store, p.thread_id).map_err(to_rpc)?;
        self.commit(&mut store)?;
        Ok(OkResult::new())
    }

    /// `DeleteThread`.
    pub async fn delete_thread(&self, p: ThreadIdParams) -> Result<OkResult, RpcError> {
        require_id(p.thread_id, codes::THREAD_ID_NOT_SET, "thread id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        {
            let mut store = self.store.write();
            self.links
                .delete_thread(&mut store, p.thread_id)
                .map_err(to_rpc)?;
            self.commit(&mut store)?;
        }
        self.report(SystemEvent::thread(
            SystemEventKind::ThreadDeletion,
            p.thread_id,
            actor.user_id,
        ))
        .await?;
        Ok(OkResult::new())
    }

    // Messages.

    /// `AddMessage`.
    pub async fn add_message(&self, p: AddMessageParams) -> Result<AddMessageResult, RpcError> {
        require_id(p.thread_id, codes::THREAD_ID_NOT_SET, "thread id")?;
        require_text(&p.text, codes::MESSAGE_TEXT_NOT_SET, "message text")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.reader {
            return Err(RpcError::permission());
        }

        let message_id = {
            let mut store = self.store.write();
            let latest = self.latest_message(&store, p.thread_id)?;
            if !self.can_add_message(&actor, latest.as_ref()) {
                return Err(RpcError::permission());
            }
            let checksum = text_checksum(&p.text);
            let id = self
                .links
                .add_message(&mut store, p.thread_id, &p.text, &checksum, actor.user_id)
                .map_err(to_rpc)?;
            self.commit(&mut store)?;
            id
        };
        self.report(SystemEvent::message(
            SystemEventKind::ThreadNewMessage,
            p.thread_id,
            message_id,
            actor.user_id,
        ))
        .await?;
        Ok(AddMessageResult { message_id })
    }

    /// `ChangeMessageText`.
    pub async fn change_message_text(
        &self,
        p: ChangeMessageTextParams,
    ) -> Result<OkResult, RpcError> {
        require_id(p.message_id, codes::MESSAGE_ID_NOT_SET, "message id")?;
        require_text(&p.text, codes::MESSAGE_TEXT_NOT_SET, "message text")?;
        let actor = self.must_be_auth_token(&p.auth).await?;

        let prior = {
            let mut store = self.store.write();
            let current = store
                .messages
                .get(p.message_id)
                .ok_or_else(|| to_rpc(BoardError::MessageNotFound(p.message_id)))?;
            if !self.can_edit_message(&actor, current) {
                return Err(RpcError::permission());
            }
            let checksum = text_checksum(&p.text);
            let prior = self
                .links
                .edit_message(&mut store, p.message_id, &p.text, &checksum, actor.user_id)
                .map_err(to_rpc)?;
            self.commit(&mut store)?;
            prior
        };

        self.report(SystemEvent::message(
            SystemEventKind::ThreadMessageEdit,
            prior.thread_id,
            p.message_id,
            actor.user_id,
        ))
        .await?;
        self.report(
            SystemEvent::message(
                SystemEventKind::MessageTextEdit,
                prior.thread_id,
                p.message_id,
                actor.user_id,
            )
            .with_creator(prior.event_data.creator.user_id),
        )
        .await?;
        Ok(OkResult::new())
    }

    /// `ChangeMessageThread`.
    pub async fn change_message_thread(
        &self,
        p: ChangeMessageThreadParams,
    ) -> Result<OkResult, RpcError> {
        require_id(p.message_id, codes::MESSAGE_ID_NOT_SET, "message id")?;
        require_id(p.thread_id, codes::THREAD_ID_NOT_SET, "thread id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let prior = {
            let mut store = self.store.write();
            let prior = self
                .links
                .move_message(&mut store, p.message_id, p.thread_id, actor.user_id)
                .map_err(to_rpc)?;
            self.commit(&mut store)?;
            prior
        };

        // The event names the thread the message came from.
        self.report(
            SystemEvent::message(
                SystemEventKind::MessageParentChange,
                prior.thread_id,
                p.message_id,
                actor.user_id,
            )
            .with_creator(prior.event_data.creator.user_id),
        )
        .await?;
        Ok(OkResult::new())
    }

    /// `GetMessage`.
    pub async fn get_message(&self, p: GetMessageParams) -> Result<GetMessageResult, RpcError> {
        require_id(p.message_id, codes::MESSAGE_ID_NOT_SET, "message id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.reader {
            return Err(RpcError::permission());
        }

        let store = self.store.read();
        let message = store
            .messages
            .get(p.message_id)
            .ok_or_else(|| to_rpc(BoardError::MessageNotFound(p.message_id)))?;
        Ok(GetMessageResult {
            message: message.clone(),
        })
    }

    /// `GetLatestMessageOfThread`.
    pub async fn get_latest_message_of_thread(
        &self,
        p: ThreadIdParams,
    ) -> Result<LatestMessageResult, RpcError> {
        require_id(p.thread_id, codes::THREAD_ID_NOT_SET, "thread id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.reader {
            return Err(RpcError::permission());
        }

        let store = self.store.read();
        let message = self.latest_message(&store, p.thread_id)?;
        Ok(LatestMessageResult { message })
    }

    /// `DeleteMessage`.
    pub async fn delete_message(&self, p: MessageIdParams) -> Result<OkResult, RpcError> {
        require_id(p.message_id, codes::MESSAGE_ID_NOT_SET, "message id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.administrator {
            return Err(RpcError::permission());
        }

        let removed = {
            let mut store = self.store.write();
            let removed = self
                .links
                .delete_message(&mut store, p.message_id)
                .map_err(to_rpc)?;
            self.commit(&mut store)?;
            removed
        };

        self.report(SystemEvent::message(
            SystemEventKind::ThreadMessageDeletion,
            removed.thread_id,
            p.message_id,
            actor.user_id,
        ))
        .await?;
        self.report(
            SystemEvent::message(
                SystemEventKind::MessageDeletion,
                removed.thread_id,
                p.message_id,
                actor.user_id,
            )
            .with_creator(removed.event_data.creator.user_id),
        )
        .await?;
        Ok(OkResult::new())
    }

    // Composite listings.

    /// `ListSectionsAndForums`.
    pub async fn list_sections_and_forums(
        &self,
        p: ListSectionsAndForumsParams,
    ) -> Result<ListSectionsAndForumsResult, RpcError> {
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.reader {
            return Err(RpcError::permission());
        }

        let store = self.store.read();
        Ok(ListSectionsAndForumsResult {
            sections: store.sections.values().cloned().collect(),
            forums: store.forums.values().cloned().collect(),
        })
    }

    /// `ListForumAndThreadsOnPage`.
    pub async fn list_forum_and_threads_on_page(
        &self,
        p: ListForumAndThreadsOnPageParams,
    ) -> Result<ListForumAndThreadsOnPageResult, RpcError> {
        require_id(p.forum_id, codes::FORUM_ID_NOT_SET, "forum id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.reader {
            return Err(RpcError::permission());
        }

        let page = p.page.max(1);
        let page_size = self.settings.page_size;
        let store = self.store.read();
        let forum = store
            .forums
            .get(p.forum_id)
            .ok_or_else(|| to_rpc(BoardError::ForumNotFound(p.forum_id)))?;
        let threads = store
            .threads_in_order(forum.threads.page(page, page_size))
            .into_iter()
            .cloned()
            .collect();
        Ok(ListForumAndThreadsOnPageResult {
            forum: forum.clone(),
            threads,
            page_data: page_data(page, page_size, forum.threads.len()),
        })
    }

    /// `ListThreadAndMessagesOnPage`.
    pub async fn list_thread_and_messages_on_page(
        &self,
        p: ListThreadAndMessagesOnPageParams,
    ) -> Result<ListThreadAndMessagesOnPageResult, RpcError> {
        require_id(p.thread_id, codes::THREAD_ID_NOT_SET, "thread id")?;
        let actor = self.must_be_auth_token(&p.auth).await?;
        if !actor.roles.reader {
            return Err(RpcError::permission());
        }

        let page = p.page.max(1);
        let page_size = self.settings.page_size;
        let store = self.store.read();
        let thread = store
            .threads
            .get(p.thread_id)
            .ok_or_else(|| to_rpc(BoardError::ThreadNotFound(p.thread_id)))?;
        let messages = store
            .messages_in_order(thread.messages.page(page, page_size))
            .into_iter()
            .cloned()
            .collect();
        Ok(ListThreadAndMessagesOnPageResult {
            thread: thread.clone(),
            messages,
            page_data: page_data(page, page_size, thread.messages.len()),
        })
    }

    // System methods.

    /// `GetDKey`. The key string leaves the module exactly once; later
    /// calls receive an empty string, which the dependent module treats as a
    /// synchronisation failure.
    pub async fn get_dkey(&self) -> Result<GetDKeyResult, RpcError> {
        Ok(GetDKeyResult {
            dkey: self.dkey.take_string().unwrap_or_default(),
        })
    }

    /// `ThreadExistsS`.
    pub async fn thread_exists_s(
        &self,
        p: ThreadExistsSParams,
    ) -> Result<ThreadExistsSResult, RpcError> {
        require_id(p.thread_id, codes::THREAD_ID_NOT_SET, "thread id")?;
        if !self.dkey.matches(&p.dkey) {
            return Err(RpcError::permission());
        }

        let store = self.store.read();
        Ok(ThreadExistsSResult {
            exists: store.threads.contains(p.thread_id),
        })
    }

    // Maintenance entry points.

    /// Runs the consistency audit under the read lock. Fatal at startup,
    /// logged-only when invoked from the scheduler.
    pub fn check_consistency(&self) -> Result<(), AuditError> {
        let store = self.store.read();
        audit::check_consistency(&store)
    }

    /// Retries a flush the last commit failed to complete. Used by the
    /// store-error listener and the housekeeping job.
    pub fn flush_dirty(&self) -> Result<(), StoreError> {
        let mut store = self.store.write();
        store.flush_if_dirty()
    }
}

fn page_data(page: usize, page_size: usize, total_items: usize) -> PageData {
    PageData {
        page,
        page_size,
        total_items,
        total_pages: total_items.div_ceil(page_size),
    }
}

fn text_checksum(text: &str) -> String {
    hex::encode(Sha256::digest(text.as_bytes()))
}

fn require_id(id: Uid, code: u16, what: &str) -> Result<(), RpcError> {
    if id == 0 {
        return Err(RpcError::new(code, format!("{what} is not set")));
    }
    Ok(())
}

fn require_text(text: &str, code: u16, what: &str) -> Result<(), RpcError> {
    if text.is_empty() {
        return Err(RpcError::new(code, format!("{what} is not set")));
    }
    Ok(())
}

/// Maps a protocol rejection onto its stable RPC code.
fn to_rpc(err: BoardError) -> RpcError {
    let code = match &err {
        BoardError::SectionNotFound(_) => codes::SECTION_IS_NOT_FOUND,
        BoardError::ForumNotFound(_) => codes::FORUM_IS_NOT_FOUND,
        BoardError::ThreadNotFound(_) => codes::THREAD_IS_NOT_FOUND,
        BoardError::MessageNotFound(_) => codes::MESSAGE_IS_NOT_FOUND,
        BoardError::RootSectionAlreadyExists => codes::ROOT_SECTION_ALREADY_EXISTS,
        BoardError::RootSectionCannotBeMoved => codes::ROOT_SECTION_CAN_NOT_BE_MOVED,
        BoardError::IncompatibleChildKind => codes::INCOMPATIBLE_CHILD_KIND,
        BoardError::SectionHasChildren(_) => codes::SECTION_HAS_CHILDREN,
        BoardError::ForumHasThreads(_) => codes::FORUM_HAS_THREADS,
        BoardError::ThreadIsNotEmpty(_) => codes::THREAD_IS_NOT_EMPTY,
        BoardError::CyclicSectionMove(_) => codes::CYCLIC_SECTION_MOVE,
        BoardError::UidList(_) => codes::UID_LIST,
    };
    RpcError::new(code, err.to_string())
}
