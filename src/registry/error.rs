//! Registry error types
//!
//! Per-connection send failures. These never leave the registry; a failed
//! send marks the connection for removal in the post-broadcast sweep.

use std::time::Duration;

/// Error returned by [`Connection::send`](super::Connection::send)
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionError {
    /// Peer already closed the connection
    Closed,
    /// Send did not complete within the registry's send timeout
    Timeout(Duration),
    /// Underlying transport reported a write error
    Transport(String),
}

impl std::fmt::Display for ConnectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConnectionError::Closed => write!(f, "Connection closed"),
            ConnectionError::Timeout(after) => {
                write!(f, "Send timed out after {}ms", after.as_millis())
            }
            ConnectionError::Transport(msg) => write!(f, "Transport error: {}", msg),
        }
    }
}

impl std::error::Error for ConnectionError {}
