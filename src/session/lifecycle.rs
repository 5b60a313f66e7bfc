//! Per-connection lifecycle
//!
//! Register on accept, read until the peer closes or errors, deregister on
//! every exit path.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::ws::{Message, WebSocket};
use futures::{Stream, StreamExt};

use super::connection::WsConnection;
use crate::registry::{Connection, ConnectionId, ConnectionRegistry};

/// Upper bound on completing the close handshake with a departing peer
const CLOSE_FLUSH_TIMEOUT: Duration = Duration::from_secs(1);

/// Why a session's receive loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Peer sent a close frame
    PeerClosed,
    /// Stream ended without a close frame
    StreamEnded,
    /// Removed from the registry after a failed or timed-out send
    Evicted,
    /// Transport error while reading
    Error(String),
}

impl std::fmt::Display for CloseReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CloseReason::PeerClosed => write!(f, "peer closed"),
            CloseReason::StreamEnded => write!(f, "stream ended"),
            CloseReason::Evicted => write!(f, "evicted"),
            CloseReason::Error(e) => write!(f, "error: {}", e),
        }
    }
}

/// Drive one upgraded WebSocket until it closes
///
/// The socket is registered for broadcasts immediately. Inbound frames are
/// treated as keep-alive and discarded; the session never writes application
/// data itself. The session also ends when the registry evicts the
/// connection. The registration guard deregisters the connection when this
/// future completes or is dropped.
pub async fn handle_socket(socket: WebSocket, registry: Arc<ConnectionRegistry<WsConnection>>) {
    let id = registry.next_connection_id();
    let (sink, mut stream) = socket.split();
    let connection = Arc::new(WsConnection::new(id, sink));

    let _registration = registry.register(Arc::clone(&connection));
    tracing::info!(
        connection_id = %id,
        connections = registry.len(),
        "WebSocket connected"
    );

    let reason = tokio::select! {
        reason = receive_until_closed(&mut stream, id) => reason,
        _ = connection.closed() => CloseReason::Evicted,
    };
    connection.close();

    // Evicted peers are not reading and a broken transport cannot be flushed
    if matches!(reason, CloseReason::PeerClosed | CloseReason::StreamEnded) {
        match tokio::time::timeout(CLOSE_FLUSH_TIMEOUT, connection.finish()).await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => {
                tracing::debug!(connection_id = %id, error = %e, "Close handshake failed");
            }
            Err(_) => {
                tracing::debug!(connection_id = %id, "Close handshake timed out");
            }
        }
    }

    tracing::info!(connection_id = %id, reason = %reason, "WebSocket disconnected");
}

/// Read frames until a close frame, end of stream, or error
pub async fn receive_until_closed<S, E>(stream: &mut S, id: ConnectionId) -> CloseReason
where
    S: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(Message::Close(frame)) => {
                tracing::debug!(connection_id = %id, frame = ?frame, "Close frame received");
                return CloseReason::PeerClosed;
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                tracing::trace!(connection_id = %id, "Keep-alive frame");
            }
            Ok(Message::Text(_)) | Ok(Message::Binary(_)) => {
                tracing::trace!(connection_id = %id, "Ignoring inbound data frame");
            }
            Err(e) => {
                tracing::debug!(connection_id = %id, error = %e, "WebSocket read failed");
                return CloseReason::Error(e.to_string());
            }
        }
    }

    CloseReason::StreamEnded
}
