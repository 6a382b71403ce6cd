//! WebSocket connection handlers.
//!
//! Each connection runs two tasks:
//! - reader: decodes client frames, hands them to `SendMessageUseCase`, and
//!   enforces the read deadline (extended only by pong frames)
//! - writer: drains the outbound queue filled by the hub and sends pings
//!
//! When the reader ends, the connection is unregistered so the hub closes its
//! queue; the writer then flushes what is left, sends a close frame and exits.
//! When the writer ends first (write failure, or the hub closed the queue),
//! the reader is aborted.

use std::{sync::Arc, time::Duration};

use axum::{
    body::Bytes,
    extract::{
        State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade, close_code},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, SplitStream, StreamExt},
};
use thiserror::Error;
use tokio::{
    sync::mpsc,
    task::JoinHandle,
    time::{Instant, MissedTickBehavior},
};

use crate::{
    domain::ConnectionId,
    infrastructure::{dto::websocket::InboundMessage, hub::OutboundFrame},
    ui::state::AppState,
};

#[derive(Debug, Error)]
enum WriteError {
    #[error("write deadline of {0:?} exceeded")]
    Timeout(Duration),

    #[error(transparent)]
    Socket(#[from] axum::Error),
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    tracing::info!("WebSocket connection from {}", client_address(&headers));

    let max_frame_bytes = state.config.max_frame_bytes;
    ws.max_message_size(max_frame_bytes)
        .max_frame_size(max_frame_bytes)
        .on_failed_upgrade(|e| tracing::warn!(error = %e, "WebSocket upgrade failed"))
        .on_upgrade(move |socket| handle_socket(socket, state))
}

/// First address in `X-Forwarded-For`, if the relay sits behind a proxy
fn client_address(headers: &HeaderMap) -> &str {
    headers
        .get("x-forwarded-for")
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.split(',').next())
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .unwrap_or("unknown")
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let _running = state.active_connections.track();
    let (connection_id, queue) = state.connect_participant_usecase.execute().await;
    let (sender, receiver) = socket.split();

    let mut send_task = pusher_loop(
        connection_id,
        queue,
        sender,
        state.config.ping_interval,
        state.config.write_timeout,
    );
    let mut recv_task = reader_loop(connection_id, receiver, state.clone());

    tokio::select! {
        _ = &mut recv_task => {
            state.disconnect_participant_usecase.execute(connection_id).await;
            // Hub がキューを閉じたので、書き込みループは残りを送って close フレームで終わる
            let _ = send_task.await;
        }
        _ = &mut send_task => {
            recv_task.abort();
            state.disconnect_participant_usecase.execute(connection_id).await;
        }
    };

    tracing::info!(%connection_id, "Connection closed");
}

/// Spawns the inbound loop for one connection.
///
/// The loop exits on read error, end of stream, a close frame, or when no pong
/// arrives before the read deadline. A frame that fails to decode is logged
/// and skipped.
fn reader_loop(
    connection_id: ConnectionId,
    mut receiver: SplitStream<WebSocket>,
    state: Arc<AppState>,
) -> JoinHandle<()> {
    let read_timeout = state.config.read_timeout;

    tokio::spawn(async move {
        let mut deadline = Instant::now() + read_timeout;

        loop {
            let msg = match tokio::time::timeout_at(deadline, receiver.next()).await {
                Ok(Some(Ok(msg))) => msg,
                Ok(Some(Err(e))) => {
                    tracing::info!(%connection_id, error = %e, "WebSocket read error");
                    break;
                }
                Ok(None) => {
                    tracing::debug!(%connection_id, "WebSocket stream ended");
                    break;
                }
                Err(_) => {
                    tracing::info!(
                        %connection_id,
                        "No pong within {:?}, closing connection",
                        read_timeout
                    );
                    break;
                }
            };

            match msg {
                Message::Text(text) => {
                    handle_inbound_frame(connection_id, text.as_str().as_bytes(), &state).await
                }
                Message::Binary(data) => handle_inbound_frame(connection_id, &data, &state).await,
                Message::Pong(_) => {
                    deadline = Instant::now() + read_timeout;
                    tracing::trace!(%connection_id, "Received pong");
                }
                Message::Ping(_) => {
                    // Ping/pong is handled automatically by the WebSocket protocol
                    tracing::debug!(%connection_id, "Received ping");
                }
                Message::Close(_) => {
                    tracing::info!(%connection_id, "Client requested close");
                    break;
                }
            }
        }
    })
}

async fn handle_inbound_frame(connection_id: ConnectionId, payload: &[u8], state: &AppState) {
    let inbound = match InboundMessage::decode(payload) {
        Ok(inbound) => inbound,
        Err(e) => {
            tracing::warn!(%connection_id, error = %e, "Invalid message format, frame dropped");
            return;
        }
    };

    match state
        .send_message_usecase
        .execute(inbound.name.unwrap_or_default(), inbound.content)
        .await
    {
        Ok(message) => {
            tracing::debug!(
                %connection_id,
                name = %message.name,
                "Broadcasting message"
            );
        }
        Err(e) => {
            tracing::warn!(%connection_id, error = %e, "Failed to send message");
        }
    }
}

/// Spawns the outbound loop for one connection.
///
/// Frames from the hub are written in queue order. Every write, including
/// pings, must finish within `write_timeout`; a failed write ends the loop
/// without retry. When the hub closes the queue the loop sends a close frame
/// and exits.
fn pusher_loop(
    connection_id: ConnectionId,
    mut queue: mpsc::Receiver<OutboundFrame>,
    mut sender: SplitSink<WebSocket, Message>,
    ping_interval: Duration,
    write_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval_at(Instant::now() + ping_interval, ping_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                frame = queue.recv() => {
                    let Some(frame) = frame else {
                        let close = Message::Close(Some(CloseFrame {
                            code: close_code::AWAY,
                            reason: Utf8Bytes::from_static("server closed the connection"),
                        }));
                        if let Err(e) = send_with_deadline(&mut sender, close, write_timeout).await {
                            tracing::debug!(%connection_id, error = %e, "Failed to send close frame");
                        }
                        break;
                    };

                    let text = Message::Text(Utf8Bytes::from(&*frame));
                    if let Err(e) = send_with_deadline(&mut sender, text, write_timeout).await {
                        tracing::warn!(%connection_id, error = %e, "Write error");
                        break;
                    }
                }
                _ = ticker.tick() => {
                    let ping = Message::Ping(Bytes::new());
                    if let Err(e) = send_with_deadline(&mut sender, ping, write_timeout).await {
                        tracing::warn!(%connection_id, error = %e, "Ping error");
                        break;
                    }
                }
            }
        }

        let _ = tokio::time::timeout(write_timeout, sender.close()).await;
    })
}

async fn send_with_deadline(
    sender: &mut SplitSink<WebSocket, Message>,
    message: Message,
    write_timeout: Duration,
) -> Result<(), WriteError> {
    tokio::time::timeout(write_timeout, sender.send(message))
        .await
        .map_err(|_| WriteError::Timeout(write_timeout))??;
    Ok(())
}
