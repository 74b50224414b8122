//! WebSocket client for the agent bridge.
//!
//! One socket carries any number of in-flight calls. Each call gets a fresh id;
//! a reader task routes replies back to the waiting caller by that id.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, Mutex};
use tokio_tungstenite::{connect_async, tungstenite::Message};

use crate::types::{
    Call, CommandResult, DirectoryListing, Reply, Request, Response, SystemSnapshot, VersionInfo,
};

/// Upper bound for a single call; the agent's own command timeout is shorter.
pub const CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("cannot reach agent: {0}")]
    Connect(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("agent connection closed")]
    Disconnected,

    #[error("agent did not answer within {0:?}")]
    Timeout(Duration),

    #[error("agent rejected request: {0}")]
    Rejected(String),

    #[error("agent answered with the wrong operation")]
    UnexpectedReply,

    #[error("failed to encode request: {0}")]
    Encode(#[from] serde_json::Error),
}

type Pending = Mutex<HashMap<u64, oneshot::Sender<Response>>>;

struct Inner {
    next_id: AtomicU64,
    outgoing: mpsc::UnboundedSender<Message>,
    pending: Pending,
    closed: AtomicBool,
}

#[derive(Clone)]
pub struct BridgeClient {
    inner: Arc<Inner>,
}

impl BridgeClient {
    pub async fn connect(url: &str) -> Result<Self, BridgeError> {
        let (ws, _) = connect_async(url).await?;
        let (mut sink, mut stream) = ws.split();
        let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

        let inner = Arc::new(Inner {
            next_id: AtomicU64::new(1),
            outgoing: tx,
            pending: Mutex::new(HashMap::new()),
            closed: AtomicBool::new(false),
        });

        tokio::spawn(async move {
            while let Some(msg) = rx.recv().await {
                if sink.send(msg).await.is_err() {
                    break;
                }
            }
            let _ = sink.close().await;
        });

        let reader = inner.clone();
        tokio::spawn(async move {
            while let Some(Ok(msg)) = stream.next().await {
                match msg {
                    Message::Text(text) => route_reply(&reader.pending, &text).await,
                    Message::Close(_) => break,
                    _ => {}
                }
            }
            // Wake every waiter with a closed channel
            reader.closed.store(true, Ordering::Release);
            reader.pending.lock().await.clear();
        });

        Ok(Self { inner })
    }

    /// Keep trying until the agent accepts or `within` has passed.
    pub async fn connect_with_retry(url: &str, within: Duration) -> Result<Self, BridgeError> {
        let deadline = Instant::now() + within;
        loop {
            match Self::connect(url).await {
                Ok(c) => return Ok(c),
                Err(e) if Instant::now() >= deadline => return Err(e),
                Err(_) => tokio::time::sleep(Duration::from_millis(100)).await,
            }
        }
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    pub async fn call(&self, request: Request) -> Result<Response, BridgeError> {
        let id = self.inner.next_id.fetch_add(1, Ordering::Relaxed);
        let frame = serde_json::to_string(&Call {
            id,
            request: &request,
        })?;

        let (tx, rx) = oneshot::channel();
        self.inner.pending.lock().await.insert(id, tx);
        if self.is_closed() || self.inner.outgoing.send(Message::Text(frame)).is_err() {
            self.inner.pending.lock().await.remove(&id);
            return Err(BridgeError::Disconnected);
        }

        match tokio::time::timeout(CALL_TIMEOUT, rx).await {
            Ok(Ok(Response::Rejected(r))) => Err(BridgeError::Rejected(r.error)),
            Ok(Ok(resp)) => Ok(resp),
            Ok(Err(_)) => Err(BridgeError::Disconnected),
            Err(_) => {
                self.inner.pending.lock().await.remove(&id);
                Err(BridgeError::Timeout(CALL_TIMEOUT))
            }
        }
    }

    pub async fn system_info(&self) -> Result<SystemSnapshot, BridgeError> {
        match self.call(Request::GetSystemInfo).await? {
            Response::GetSystemInfo(s) => Ok(s),
            _ => Err(BridgeError::UnexpectedReply),
        }
    }

    pub async fn execute(&self, command_line: &str) -> Result<CommandResult, BridgeError> {
        let request = Request::ExecuteCommand {
            command_line: Value::from(command_line),
        };
        match self.call(request).await? {
            Response::ExecuteCommand(r) => Ok(r),
            _ => Err(BridgeError::UnexpectedReply),
        }
    }

    pub async fn dir_contents(&self, path: &str) -> Result<DirectoryListing, BridgeError> {
        let request = Request::GetDirContents {
            path: Value::from(path),
        };
        match self.call(request).await? {
            Response::GetDirContents(l) => Ok(l),
            _ => Err(BridgeError::UnexpectedReply),
        }
    }

    pub async fn version(&self) -> Result<VersionInfo, BridgeError> {
        match self.call(Request::GetVersion).await? {
            Response::GetVersion(v) => Ok(v),
            _ => Err(BridgeError::UnexpectedReply),
        }
    }
}

// Replies without a known id (late, or rejected before the id was readable) are dropped.
async fn route_reply(pending: &Pending, text: &str) {
    let Ok(reply) = serde_json::from_str::<Reply>(text) else {
        return;
    };
    let Some(id) = reply.id else {
        return;
    };
    if let Some(waiter) = pending.lock().await.remove(&id) {
        let _ = waiter.send(reply.response);
    }
}
