//! Music sheet catalogue backend with live WebSocket broadcast
//!
//! The interesting part of this crate is the broadcast path: a background
//! producer periodically generates a music sheet, stores it, and pushes it to
//! every connected WebSocket client through a shared connection registry.
//!
//! ```text
//!   RecordGenerator ──► Producer ──► RecordStore::persist
//!                          │
//!                          ▼
//!                 ConnectionRegistry::broadcast ──► [WsConnection] x N
//!                          ▲
//!   /ws upgrade ──► session::handle_socket (register / receive / deregister)
//! ```
//!
//! # Example
//!
//! ```no_run
//! use harmonic_archive::{ArchiveServer, ServerConfig};
//!
//! # async fn run() -> harmonic_archive::Result<()> {
//! let server = ArchiveServer::new(ServerConfig::default());
//! server.run_until(async { let _ = tokio::signal::ctrl_c().await; }).await
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod producer;
pub mod registry;
pub mod server;
pub mod session;
pub mod stats;

pub use error::{Error, Result};
pub use producer::{Producer, ProducerConfig, ProducerState};
pub use registry::{ConnectionRegistry, RegistryConfig};
pub use server::{ArchiveServer, ServerConfig};
