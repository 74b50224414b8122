//! WebSocket upgrade and per-connection handler for the bridge.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    http::{header::ORIGIN, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::bridge::Bridge;

pub fn router(bridge: Bridge) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .with_state(bridge)
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(bridge): State<Bridge>,
    headers: HeaderMap,
) -> Response {
    // Browsers always send Origin; the UI process never does.
    if let Some(origin) = headers.get(ORIGIN) {
        warn!(origin = ?origin, "refusing upgrade with Origin header");
        return StatusCode::FORBIDDEN.into_response();
    }
    ws.on_upgrade(move |socket| handle_socket(socket, bridge))
}

async fn handle_socket(socket: WebSocket, bridge: Bridge) {
    info!("ui connected");
    let (mut sink, mut stream) = socket.split();

    // Requests run concurrently; replies funnel through one writer.
    let (tx, mut rx) = mpsc::unbounded_channel::<String>();
    let writer = tokio::spawn(async move {
        while let Some(frame) = rx.recv().await {
            if sink.send(Message::Text(frame)).await.is_err() {
                break;
            }
        }
    });

    while let Some(Ok(msg)) = stream.next().await {
        match msg {
            Message::Text(text) => {
                let bridge = bridge.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    let reply = bridge.handle_frame(&text).await;
                    match serde_json::to_string(&reply) {
                        Ok(js) => {
                            let _ = tx.send(js);
                        }
                        Err(e) => warn!(error = %e, "failed to encode reply"),
                    }
                });
            }
            Message::Close(_) => break,
            other => debug!(?other, "ignoring non-text frame"),
        }
    }

    drop(tx);
    // In-flight handlers hold senders; the writer exits once they finish or the socket is gone.
    let _ = writer.await;
    info!("ui disconnected");
}
