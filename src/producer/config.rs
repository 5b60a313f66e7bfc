//! Producer configuration

use std::time::Duration;

/// Periodic producer configuration
#[derive(Debug, Clone)]
pub struct ProducerConfig {
    /// Wait between the end of one cycle and the start of the next
    pub interval: Duration,

    /// Start producing as soon as the server starts
    pub start_enabled: bool,
}

impl Default for ProducerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(5),
            start_enabled: false,
        }
    }
}

impl ProducerConfig {
    /// Set the cycle interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Start the producer together with the server
    pub fn start_enabled(mut self, enabled: bool) -> Self {
        self.start_enabled = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ProducerConfig::default();

        assert_eq!(config.interval, Duration::from_secs(5));
        assert!(!config.start_enabled);
    }

    #[test]
    fn test_builder_chaining() {
        let config = ProducerConfig::default()
            .interval(Duration::from_millis(500))
            .start_enabled(true);

        assert_eq!(config.interval, Duration::from_millis(500));
        assert!(config.start_enabled);
    }
}
