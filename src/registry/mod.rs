//! Connection registry for live broadcast
//!
//! The registry tracks every connected WebSocket client and fans a serialized
//! payload out to all of them. Removal happens in two places: the owning
//! session task deregisters on exit, and each broadcast sweeps connections
//! that failed or were observed closed.
//!
//! # Architecture
//!
//! ```text
//!                    Arc<ConnectionRegistry<C>>
//!                 ┌──────────────────────────────┐
//!                 │ connections: DashMap<        │
//!                 │   ConnectionId, Arc<C>       │
//!                 │ >                            │
//!                 └──────────────┬───────────────┘
//!                                │
//!        ┌───────────────────────┼───────────────────────┐
//!        │                       │                       │
//!        ▼                       ▼                       ▼
//!   [Producer]              [Session]               [Session]
//!   broadcast()             register()              register()
//!        │                  recv loop               recv loop
//!        │                  drop guard ─► remove()  drop guard ─► remove()
//!        │
//!        └──► snapshot ──► send (timeout) x N ──► sweep
//! ```
//!
//! # Zero-Copy Design
//!
//! The payload is serialized once into `bytes::Bytes`; every per-connection
//! send clones the reference-counted handle, not the data.

pub mod config;
pub mod connection;
pub mod error;
pub mod store;

#[cfg(test)]
pub(crate) mod testing;

pub use config::RegistryConfig;
pub use connection::{Connection, ConnectionId};
pub use error::ConnectionError;
pub use store::{BroadcastOutcome, ConnectionRegistry, Registration};
