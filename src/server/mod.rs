//! HTTP server
//!
//! Serves the WebSocket broadcast endpoint, the producer control surface and
//! read-only catalogue endpoints.

pub mod config;
pub mod listener;
pub mod routes;

pub use config::ServerConfig;
pub use listener::{AppState, ArchiveServer, SheetProducer, SheetRegistry};
pub use routes::router;
