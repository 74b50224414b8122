//! The four-operation bridge between the UI process and the agent.
//!
//! Frames are JSON text: `{"id": 7, "request": {"op": "get-version"}}` in,
//! `{"id": 7, "response": {"op": "get-version", "result": {...}}}` out. Arguments
//! arrive as untyped JSON so a non-string payload turns into the per-operation
//! "Invalid ..." result instead of a framing error.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::dirlist::list_dir;
use crate::metrics::collect_snapshot;
use crate::state::AppState;
use crate::types::{CommandResult, DirectoryListing, SystemSnapshot, VersionInfo};
use crate::VERSION;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "kebab-case")]
pub enum Request {
    GetSystemInfo,
    ExecuteCommand {
        #[serde(default, rename = "commandLine")]
        command_line: Value,
    },
    GetDirContents {
        #[serde(default)]
        path: Value,
    },
    GetVersion,
}

impl Request {
    fn op(&self) -> &'static str {
        match self {
            Request::GetSystemInfo => "get-system-info",
            Request::ExecuteCommand { .. } => "execute-command",
            Request::GetDirContents { .. } => "get-dir-contents",
            Request::GetVersion => "get-version",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rejection {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", content = "result", rename_all = "kebab-case")]
pub enum Response {
    GetSystemInfo(SystemSnapshot),
    ExecuteCommand(CommandResult),
    GetDirContents(DirectoryListing),
    GetVersion(VersionInfo),
    Rejected(Rejection),
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Call {
    pub id: u64,
    pub request: Request,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reply {
    pub id: Option<u64>,
    pub response: Response,
}

#[derive(Clone)]
pub struct Bridge {
    state: AppState,
}

impl Bridge {
    pub fn new(state: AppState) -> Self {
        Self { state }
    }

    pub async fn dispatch(&self, request: Request) -> Response {
        debug!(op = request.op(), "dispatch");
        match request {
            Request::GetSystemInfo => Response::GetSystemInfo(collect_snapshot(&self.state).await),
            Request::ExecuteCommand { command_line } => Response::ExecuteCommand(
                self.state.executor.execute(command_line.as_str()).await,
            ),
            Request::GetDirContents { path } => {
                Response::GetDirContents(list_dir(path.as_str()).await)
            }
            Request::GetVersion => Response::GetVersion(VersionInfo {
                version: VERSION.to_string(),
            }),
        }
    }

    /// Decode one text frame, run it, and build the reply. Never fails.
    pub async fn handle_frame(&self, text: &str) -> Reply {
        match serde_json::from_str::<Call>(text) {
            Ok(call) => Reply {
                id: Some(call.id),
                response: self.dispatch(call.request).await,
            },
            Err(e) => {
                debug!(error = %e, "malformed frame");
                Reply {
                    id: peek_id(text),
                    response: Response::Rejected(Rejection {
                        error: format!("Malformed request: {e}"),
                    }),
                }
            }
        }
    }
}

// Best effort so the caller can still match the rejection to its request
fn peek_id(text: &str) -> Option<u64> {
    serde_json::from_str::<Value>(text)
        .ok()?
        .get("id")?
        .as_u64()
}
