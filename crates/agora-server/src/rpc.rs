//! The inbound RPC endpoint.
//!
//! One POST route carrying the JSON-RPC envelope. The dispatcher maps the
//! method name onto the matching service handler; envelope handling and
//! method routing are the only things that live here.

use std::sync::Arc;

use axum::extract::State;
use axum::routing::post;
use axum::{Json, Router};
use serde_json::Value;

use agora_core::{codes, RpcError};
use agora_relay::{RpcRequest, RpcResponse};

use crate::service::BoardService;

/// Builds the module's router.
pub fn router(service: Arc<BoardService>) -> Router {
    Router::new().route("/", post(handle)).with_state(service)
}

async fn handle(
    State(service): State<Arc<BoardService>>,
    Json(request): Json<RpcRequest>,
) -> Json<RpcResponse> {
    let id = request.id;
    Json(match dispatch(&service, &request.method, request.params).await {
        Ok(result) => RpcResponse::result(id, result),
        Err(error) => RpcResponse::error(id, error),
    })
}

async fn dispatch(
    service: &BoardService,
    method: &str,
    params: Value,
) -> Result<Value, RpcError> {
    // Deserializes the params, runs one handler, serializes its result.
    macro_rules! call {
        ($handler:ident) => {{
            let params =
                serde_json::from_value(params).map_err(|_| RpcError::parameters())?;
            let result = service.$handler(params).await?;
            serde_json::to_value(result).map_err(|_| RpcError::database())
        }};
    }

    match method {
        // Sections.
        "AddSection" => call!(add_section),
        "ChangeSectionName" => call!(change_section_name),
        "ChangeSectionParent" => call!(change_section_parent),
        "GetSection" => call!(get_section),
        "MoveSectionUp" => call!(move_section_up),
        "MoveSectionDown" => call!(move_section_down),
        "DeleteSection" => call!(delete_section),

        // Forums.
        "AddForum" => call!(add_forum),
        "ChangeForumName" => call!(change_forum_name),
        "ChangeForumSection" => call!(change_forum_section),
        "GetForum" => call!(get_forum),
        "MoveForumUp" => call!(move_forum_up),
        "MoveForumDown" => call!(move_forum_down),
        "DeleteForum" => call!(delete_forum),

        // Threads.
        "AddThread" => call!(add_thread),
        "ChangeThreadName" => call!(change_thread_name),
        "ChangeThreadForum" => call!(change_thread_forum),
        "GetThread" => call!(get_thread),
        "MoveThreadUp" => call!(move_thread_up),
        "MoveThreadDown" => call!(move_thread_down),
        "DeleteThread" => call!(delete_thread),

        // Messages.
        "AddMessage" => call!(add_message),
        "ChangeMessageText" => call!(change_message_text),
        "ChangeMessageThread" => call!(change_message_thread),
        "GetMessage" => call!(get_message),
        "GetLatestMessageOfThread" => call!(get_latest_message_of_thread),
        "DeleteMessage" => call!(delete_message),

        // Composite listings.
        "ListSectionsAndForums" => call!(list_sections_and_forums),
        "ListForumAndThreadsOnPage" => call!(list_forum_and_threads_on_page),
        "ListThreadAndMessagesOnPage" => call!(list_thread_and_messages_on_page),

        // System methods.
        "GetDKey" => {
            let result = service.get_dkey().await?;
            serde_json::to_value(result).map_err(|_| RpcError::database())
        }
        "ThreadExistsS" => call!(thread_exists_s),

        _ => Err(RpcError::new(codes::UNKNOWN_METHOD, "unknown method")),
    }
}
