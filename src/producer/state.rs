//! Producer run state

use std::sync::atomic::{AtomicU8, Ordering};

/// Whether the producer loop is emitting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ProducerState {
    /// No loop running
    Idle = 0,
    /// Loop running, cycling every interval
    Running = 1,
}

impl ProducerState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => ProducerState::Running,
            _ => ProducerState::Idle,
        }
    }

    /// Human-readable name used in logs and responses
    pub fn as_str(&self) -> &'static str {
        match self {
            ProducerState::Idle => "stopped",
            ProducerState::Running => "running",
        }
    }
}

impl std::fmt::Display for ProducerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Atomic cell holding a [`ProducerState`]
#[derive(Debug)]
pub(crate) struct AtomicProducerState(AtomicU8);

impl AtomicProducerState {
    pub(crate) fn new(state: ProducerState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub(crate) fn load(&self) -> ProducerState {
        ProducerState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Swap `from` for `to`; returns false if the current state was not `from`
    pub(crate) fn transition(&self, from: ProducerState, to: ProducerState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}
