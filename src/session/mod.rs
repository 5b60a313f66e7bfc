//! WebSocket session handling
//!
//! Each upgraded connection is split in two: the sink half is wrapped in a
//! [`WsConnection`] and handed to the registry for broadcasts, while the
//! stream half stays with the session task, which only reads until the peer
//! goes away.

pub mod connection;
pub mod lifecycle;

pub use connection::WsConnection;
pub use lifecycle::{handle_socket, CloseReason};
