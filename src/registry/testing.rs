//! In-memory connection used by unit tests

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bytes::Bytes;

use super::connection::{Connection, ConnectionId};
use super::error::ConnectionError;

/// Connection that records every payload it is sent
pub(crate) struct MockConnection {
    id: ConnectionId,
    open: AtomicBool,
    fail_sends: bool,
    stall: Option<Duration>,
    received: Mutex<Vec<Bytes>>,
}

impl MockConnection {
    fn build(id: ConnectionId, fail_sends: bool, stall: Option<Duration>) -> Arc<Self> {
        Arc::new(Self {
            id,
            open: AtomicBool::new(true),
            fail_sends,
            stall,
            received: Mutex::new(Vec::new()),
        })
    }

    pub(crate) fn open(id: ConnectionId) -> Arc<Self> {
        Self::build(id, false, None)
    }

    /// Reports open but every send errors
    pub(crate) fn failing(id: ConnectionId) -> Arc<Self> {
        Self::build(id, true, None)
    }

    /// Reports open but each send blocks for `stall`
    pub(crate) fn stalled(id: ConnectionId, stall: Duration) -> Arc<Self> {
        Self::build(id, false, Some(stall))
    }

    pub(crate) fn received(&self) -> Vec<Bytes> {
        self.received.lock().unwrap().clone()
    }
}

impl Connection for MockConnection {
    fn id(&self) -> ConnectionId {
        self.id
    }

    fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
    }

    async fn send(&self, payload: Bytes) -> Result<(), ConnectionError> {
        if let Some(stall) = self.stall {
            tokio::time::sleep(stall).await;
        }
        if !self.is_open() {
            return Err(ConnectionError::Closed);
        }
        if self.fail_sends {
            return Err(ConnectionError::Transport("broken pipe".into()));
        }
        self.received.lock().unwrap().push(payload);
        Ok(())
    }
}
