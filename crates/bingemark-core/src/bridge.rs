//! Messaging bridge
//!
//! UI pages talk to the background service with small request/response
//! messages. Requests carry either an `action` or a `type` discriminator:
//!
//! - `{"action": "getBookmarks"}` -> `{"success": true, "bookmarks": [...]}`
//! - `{"action": "ping"}` -> `{"success": true, "message": "..."}`
//! - `{"type": "openImportExportTab"}` -> `{"success": true, "tabId": 7}`
//!
//! The store only emits requests and consumes responses. `LocalBridge`
//! answers them in-process from a `NativeBookmarkSource`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::native::{flatten_tree, NativeBookmark, NativeBookmarkSource};

/// Reply to a successful ping
pub const PING_REPLY: &str = "Background service is active";

/// Requests discriminated by `action`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ActionRequest {
    GetBookmarks,
    Ping,
}

/// Requests discriminated by `type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum TypedRequest {
    OpenImportExportTab,
}

/// A message sent to the background service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BridgeRequest {
    Action(ActionRequest),
    Typed(TypedRequest),
}

impl BridgeRequest {
    pub const GET_BOOKMARKS: BridgeRequest = BridgeRequest::Action(ActionRequest::GetBookmarks);
    pub const PING: BridgeRequest = BridgeRequest::Action(ActionRequest::Ping);
    pub const OPEN_IMPORT_EXPORT_TAB: BridgeRequest =
        BridgeRequest::Typed(TypedRequest::OpenImportExportTab);
}

/// The background service's answer
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BridgeResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bookmarks: Option<Vec<NativeBookmark>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tab_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl BridgeResponse {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            error: Some(error.into()),
            ..Self::default()
        }
    }
}

/// Errors delivering a message
#[derive(Error, Debug)]
pub enum BridgeError {
    /// The message never reached a responder
    #[error("Background service unavailable: {0}")]
    Unavailable(String),

    /// The responder answered with `success: false`
    #[error("Request failed: {0}")]
    Failed(String),
}

/// Request/response channel to the background service
#[async_trait]
pub trait MessageBridge: Send + Sync {
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError>;
}

/// Check that the background service answers
pub async fn ping(bridge: &dyn MessageBridge) -> Result<String, BridgeError> {
    let response = expect_success(bridge.send(BridgeRequest::PING).await?)?;
    Ok(response.message.unwrap_or_default())
}

/// Ask the background service for the browser's bookmarks, flattened
pub async fn fetch_native_bookmarks(
    bridge: &dyn MessageBridge,
) -> Result<Vec<NativeBookmark>, BridgeError> {
    let response = expect_success(bridge.send(BridgeRequest::GET_BOOKMARKS).await?)?;
    Ok(response.bookmarks.unwrap_or_default())
}

fn expect_success(response: BridgeResponse) -> Result<BridgeResponse, BridgeError> {
    if response.success {
        Ok(response)
    } else {
        Err(BridgeError::Failed(
            response.error.unwrap_or_else(|| "unknown error".to_string()),
        ))
    }
}

/// In-process responder backed by a native bookmark source
pub struct LocalBridge<S> {
    source: S,
}

impl<S: NativeBookmarkSource> LocalBridge<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }
}

#[async_trait]
impl<S: NativeBookmarkSource> MessageBridge for LocalBridge<S> {
    async fn send(&self, request: BridgeRequest) -> Result<BridgeResponse, BridgeError> {
        debug!(?request, "Bridge received message");

        match request {
            BridgeRequest::Action(ActionRequest::Ping) => Ok(BridgeResponse {
                message: Some(PING_REPLY.to_string()),
                ..BridgeResponse::ok()
            }),
            BridgeRequest::Action(ActionRequest::GetBookmarks) => {
                match self.source.get_tree().await {
                    Ok(tree) => Ok(BridgeResponse {
                        bookmarks: Some(flatten_tree(&tree)),
                        ..BridgeResponse::ok()
                    }),
                    Err(e) => Ok(BridgeResponse::failure(e.to_string())),
                }
            }
            BridgeRequest::Typed(TypedRequest::OpenImportExportTab) => Ok(BridgeResponse::failure(
                "tabs are not available outside the browser",
            )),
        }
    }
}
