//! Periodic record producer
//!
//! While running, the producer repeats one cycle per interval:
//!
//! ```text
//! generate_one() ──► RecordStore::persist() ──► serialize ──► registry.broadcast_bytes()
//!        ▲                                                              │
//!        └──────────── wait(interval) or cancelled ◄────────────────────┘
//! ```
//!
//! A failed cycle is logged and skipped; only `stop()` ends the loop.

pub mod config;
pub mod source;
pub mod state;
pub mod worker;

pub use config::ProducerConfig;
pub use source::{RecordGenerator, RecordStore, StoreError};
pub use state::ProducerState;
pub use worker::Producer;
