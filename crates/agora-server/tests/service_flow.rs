//! Service-level flows over an in-memory store with scripted collaborators.

#![allow(clippy::unwrap_used, missing_docs)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::mpsc;

use agora_core::{codes, Actor, DKey, Roles, RpcError};
use agora_relay::{EventRelay, RelayError, RpcTransport};
use agora_server::access::{AccessControl, Auth};
use agora_server::methods::*;
use agora_server::{BoardService, Settings};
use agora_store::BoardStore;

const ADMIN_TOKEN: &str = "admin-token";
const READER_TOKEN: &str = "reader-token";

/// Access control double: resolves two fixed tokens.
struct ScriptedAccess;

#[async_trait]
impl AccessControl for ScriptedAccess {
    async fn actor_for(&self, auth: &Auth) -> Result<Actor, RpcError> {
        match auth.token.as_str() {
            ADMIN_TOKEN => Ok(Actor::omnipotent(1)),
            READER_TOKEN => Ok(Actor {
                user_id: 2,
                roles: Roles {
                    reader: true,
                    ..Roles::default()
                },
            }),
            _ => Err(RpcError::authorisation()),
        }
    }
}

/// Transport double recording relayed events; optionally failing.
struct RecordingTransport {
    fail: bool,
    calls: Mutex<Vec<(String, Value)>>,
}

impl RecordingTransport {
    fn new(fail: bool) -> Self {
        Self {
            fail,
            calls: Mutex::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<(String, Value)> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl RpcTransport for RecordingTransport {
    async fn call(&self, method: &str, params: Value) -> Result<Value, RelayError> {
        self.calls
            .lock()
            .unwrap()
            .push((method.to_owned(), params));
        if self.fail {
            Err(RelayError::Transport("scripted failure".into()))
        } else {
            Ok(json!({"ok": true}))
        }
    }
}

fn settings() -> Settings {
    Settings {
        listen_addr: "127.0.0.1:0".into(),
        store_path: "unused".into(),
        access_endpoint: "unused".into(),
        notification_endpoint: "unused".into(),
        dkey_size: 16,
        new_threads_at_top: false,
        message_edit_window_secs: 3600,
        page_size: 2,
        store_retry_cooldown_secs: 1,
    }
}

fn service_with(transport: Arc<RecordingTransport>) -> BoardService {
    let (tx, _rx) = mpsc::unbounded_channel();
    BoardService::new(
        BoardStore::in_memory(),
        settings(),
        DKey::generate(16).unwrap(),
        EventRelay::with_dkey(transport, "NM-KEY"),
        Arc::new(ScriptedAccess),
        tx,
    )
}

fn auth(token: &str) -> Auth {
    Auth {
        token: token.into(),
        user_ipa: "127.0.0.1".into(),
    }
}

async fn build_thread(service: &BoardService) -> (u64, u64, u64) {
    let root = service
        .add_section(AddSectionParams {
            auth: auth(ADMIN_TOKEN),
            parent: None,
            name: "root".into(),
        })
        .await
        .unwrap()
        .section_id;
    let forum = service
        .add_forum(AddForumParams {
            auth: auth(ADMIN_TOKEN),
            section_id: root,
            name: "general".into(),
        })
        .await
        .unwrap()
        .forum_id;
    let thread = service
        .add_thread(AddThreadParams {
            auth: auth(ADMIN_TOKEN),
            forum_id: forum,
            name: "hello".into(),
        })
        .await
        .unwrap()
        .thread_id;
    (root, forum, thread)
}

#[tokio::test]
async fn structure_mutations_require_the_administrator_role() {
    let service = service_with(Arc::new(RecordingTransport::new(false)));
    let err = service
        .add_section(AddSectionParams {
            auth: auth(READER_TOKEN),
            parent: None,
            name: "root".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, codes::PERMISSION);

    let err = service
        .add_section(AddSectionParams {
            auth: auth("bogus"),
            parent: None,
            name: "root".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, codes::AUTHORISATION);
}

#[tokio::test]
async fn adding_a_message_emits_the_event_after_the_commit() {
    let transport = Arc::new(RecordingTransport::new(false));
    let service = service_with(Arc::clone(&transport));
    let (_, _, thread) = build_thread(&service).await;

    let message = service
        .add_message(AddMessageParams {
            auth: auth(ADMIN_TOKEN),
            thread_id: thread,
            text: "first".into(),
        })
        .await
        .unwrap()
        .message_id;

    let calls = transport.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "ProcessSystemEventS");
    assert_eq!(calls[0].1["dKey"], "NM-KEY");
    let event = &calls[0].1["systemEventData"];
    assert_eq!(event["type"], "ThreadNewMessage");
    assert_eq!(event["threadId"], thread);
    assert_eq!(event["messageId"], message);
    assert_eq!(event["userId"], 1);
}

#[tokio::test]
async fn a_failed_relay_surfaces_but_the_mutation_stands() {
    let transport = Arc::new(RecordingTransport::new(true));
    let service = service_with(Arc::clone(&transport));
    let (_, _, thread) = build_thread(&service).await;

    let err = service
        .add_message(AddMessageParams {
            auth: auth(ADMIN_TOKEN),
            thread_id: thread,
            text: "first".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, codes::RPC_CALL);

    // The message was committed before the relay attempt.
    let latest = service
        .get_latest_message_of_thread(ThreadIdParams {
            auth: auth(READER_TOKEN),
            thread_id: thread,
        })
        .await
        .unwrap();
    assert_eq!(latest.message.unwrap().text, "first");
}

#[tokio::test]
async fn deleting_a_message_emits_both_events_with_the_creator() {
    let transport = Arc::new(RecordingTransport::new(false));
    let service = service_with(Arc::clone(&transport));
    let (_, _, thread) = build_thread(&service).await;
    let message = service
        .add_message(AddMessageParams {
            auth: auth(ADMIN_TOKEN),
            thread_id: thread,
            text: "doomed".into(),
        })
        .await
        .unwrap()
        .message_id;

    service
        .delete_message(MessageIdParams {
            auth: auth(ADMIN_TOKEN),
            message_id: message,
        })
        .await
        .unwrap();

    let calls = transport.calls();
    // ThreadNewMessage, then the two deletion events.
    assert_eq!(calls.len(), 3);
    let first = &calls[1].1["systemEventData"];
    assert_eq!(first["type"], "ThreadMessageDeletion");
    let second = &calls[2].1["systemEventData"];
    assert_eq!(second["type"], "MessageDeletion");
    assert_eq!(second["creator"], 1);
}

#[tokio::test]
async fn consecutive_messages_inside_the_edit_window_are_rejected() {
    let service = service_with(Arc::new(RecordingTransport::new(false)));
    let (_, _, thread) = build_thread(&service).await;

    service
        .add_message(AddMessageParams {
            auth: auth(ADMIN_TOKEN),
            thread_id: thread,
            text: "first".into(),
        })
        .await
        .unwrap();

    // The same user's latest message is still editable, so a follow-up
    // message is rejected; the text should be edited instead.
    let err = service
        .add_message(AddMessageParams {
            auth: auth(ADMIN_TOKEN),
            thread_id: thread,
            text: "second".into(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, codes::PERMISSION);
}

#[tokio::test]
async fn paged_listing_partitions_threads_in_display_order() {
    let service = service_with(Arc::new(RecordingTransport::new(false)));
    let (_, forum, _) = build_thread(&service).await;
    for name in ["second", "third"] {
        service
            .add_thread(AddThreadParams {
                auth: auth(ADMIN_TOKEN),
                forum_id: forum,
                name: name.into(),
            })
            .await
            .unwrap();
    }

    // page_size is 2: three threads make two pages.
    let page1 = service
        .list_forum_and_threads_on_page(ListForumAndThreadsOnPageParams {
            auth: auth(READER_TOKEN),
            forum_id: forum,
            page: 1,
        })
        .await
        .unwrap();
    assert_eq!(page1.threads.len(), 2);
    assert_eq!(page1.page_data.total_items, 3);
    assert_eq!(page1.page_data.total_pages, 2);
    assert_eq!(page1.threads[0].name, "hello");

    let page2 = service
        .list_forum_and_threads_on_page(ListForumAndThreadsOnPageParams {
            auth: auth(READER_TOKEN),
            forum_id: forum,
            page: 2,
        })
        .await
        .unwrap();
    assert_eq!(page2.threads.len(), 1);
    assert_eq!(page2.threads[0].name, "third");
}

#[tokio::test]
async fn the_dkey_is_handed_out_once_and_guards_system_calls() {
    let service = service_with(Arc::new(RecordingTransport::new(false)));
    let (_, _, thread) = build_thread(&service).await;

    let dkey = service.get_dkey().await.unwrap().dkey;
    assert!(!dkey.is_empty());
    // The second hand-out yields nothing.
    assert!(service.get_dkey().await.unwrap().dkey.is_empty());

    let exists = service
        .thread_exists_s(ThreadExistsSParams {
            dkey: dkey.clone(),
            thread_id: thread,
        })
        .await
        .unwrap();
    assert!(exists.exists);

    let missing = service
        .thread_exists_s(ThreadExistsSParams {
            dkey,
            thread_id: thread + 100,
        })
        .await
        .unwrap();
    assert!(!missing.exists);

    let err = service
        .thread_exists_s(ThreadExistsSParams {
            dkey: "WRONG".into(),
            thread_id: thread,
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, codes::PERMISSION);
}

#[tokio::test]
async fn the_service_audit_sees_a_consistent_board() {
    let service = service_with(Arc::new(RecordingTransport::new(false)));
    build_thread(&service).await;
    service.check_consistency().unwrap();
}
