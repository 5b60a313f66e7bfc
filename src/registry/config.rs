//! Registry configuration

use std::time::Duration;

/// Connection registry configuration
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Upper bound on a single send to one connection
    ///
    /// A peer that stops reading must not stall delivery to the others.
    pub send_timeout: Duration,

    /// Initial capacity of the connection map
    pub initial_capacity: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            send_timeout: Duration::from_secs(5),
            initial_capacity: 64,
        }
    }
}

impl RegistryConfig {
    /// Set the per-send timeout
    pub fn send_timeout(mut self, timeout: Duration) -> Self {
        self.send_timeout = timeout;
        self
    }

    /// Set the initial map capacity
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = capacity;
        self
    }
}
