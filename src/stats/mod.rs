//! Activity counters for the registry and the producer

pub mod metrics;

pub use metrics::{ProducerStats, ProducerStatsSnapshot, RegistryStats, RegistryStatsSnapshot};
