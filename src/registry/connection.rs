//! Connection handle abstraction
//!
//! The registry never owns a socket. It holds a shared handle that can report
//! whether the peer is still open and can push one serialized payload.

use std::future::Future;

use bytes::Bytes;

use super::error::ConnectionError;

/// Process-unique identifier for a registered connection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(pub u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A live bidirectional streaming handle to one client
///
/// Implementations must be cheap to share (`Arc<C>`) and safe to call from
/// several tasks at once; `send` may be invoked concurrently with the
/// owning task's receive loop.
pub trait Connection: Send + Sync + 'static {
    /// Identity used for add/remove
    fn id(&self) -> ConnectionId;

    /// Last observed open state
    ///
    /// May lag reality. A `true` here does not guarantee the next send
    /// succeeds.
    fn is_open(&self) -> bool;

    /// Mark the connection closed and signal its owning task to tear it down
    ///
    /// Called by the broadcast sweep for every handle it evicts. Must be
    /// idempotent.
    fn close(&self);

    /// Send one payload to the peer
    fn send(&self, payload: Bytes) -> impl Future<Output = Result<(), ConnectionError>> + Send;
}
