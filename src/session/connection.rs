//! Registry handle for one WebSocket peer

use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use bytes::Bytes;
use futures::stream::SplitSink;
use futures::SinkExt;
use tokio::sync::Mutex;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};

use crate::registry::{Connection, ConnectionError, ConnectionId};

/// Write half of an upgraded WebSocket, shared with the registry
///
/// UTF-8 payloads go out as text frames, anything else as binary. Closing
/// the handle, from either side, cancels a token the owning session waits
/// on, so an evicted peer's socket is torn down rather than left idle.
pub struct WsConnection {
    id: ConnectionId,
    sink: Mutex<SplitSink<WebSocket, Message>>,
    shutdown: CancellationToken,
}

impl WsConnection {
    /// Wrap the sink half of a split socket
    pub fn new(id: ConnectionId, sink: SplitSink<WebSocket, Message>) -> Self {
        Self {
            id,
            sink: Mutex::new(sink),
            shutdown: CancellationToken::new(),
        }
    }

    /// Resolves once the handle has been closed
    pub fn closed(&self) -> WaitForCancellationFuture<'_> {
        self.shutdown.cancelled()
    }

    /// Flush anything queued on the socket (such as a close reply) and close
    /// the write half
    pub async fn finish(&self) -> Result<(), ConnectionError> {
        let mut sink = self.sink.lock().await;
        sink.close()
            .await
            .map_err(|e| ConnectionError::Transport(e.to_string()))
    }
}

/// Frame a serialized payload without copying it
pub(crate) fn frame_for(payload: Bytes) -> Message {
    match Utf8Bytes::try_from(payload.clone()) {
        Ok(text) => Message::Text(text),
        Err(_) => Message::Binary(payload),
    }
}

impl Connection for WsConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_open(&self) -> bool {
        !self.shutdown.is_cancelled()
    }

    fn close(&self) {
        self.shutdown.cancel();
    }

    async fn send(&self, payload: Bytes) -> Result<(), ConnectionError> {
        if !self.is_open() {
            return Err(ConnectionError::Closed);
        }

        let mut sink = self.sink.lock().await;
        if let Err(e) = sink.send(frame_for(payload)).await {
            self.close();
            return Err(ConnectionError::Transport(e.to_string()));
        }

        Ok(())
    }
}
