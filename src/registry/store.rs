//! Connection registry implementation
//!
//! The central registry that tracks every live WebSocket connection and fans
//! a serialized payload out to all of them.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use dashmap::DashMap;
use futures::future::join_all;
use serde::Serialize;

use super::config::RegistryConfig;
use super::connection::{Connection, ConnectionId};
use super::error::ConnectionError;
use crate::stats::RegistryStats;

/// Result of one broadcast sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastOutcome {
    /// Connections the payload was written to
    pub delivered: usize,
    /// Open connections whose send failed or timed out
    pub failed: usize,
    /// Connections removed by the post-broadcast sweep
    pub swept: usize,
}

/// Registry of live streaming connections
///
/// Backed by a sharded map, so `add`, `remove` and `broadcast` may run
/// concurrently from independent tasks. Shard locks are only held while
/// touching the map and never across an `.await`.
///
/// A connection added while a broadcast is in flight may or may not receive
/// that broadcast; the member set is snapshotted when the broadcast starts.
pub struct ConnectionRegistry<C: Connection> {
    /// Registered connections
    connections: DashMap<ConnectionId, Arc<C>>,

    /// Next identifier handed out by `next_connection_id`
    next_id: AtomicU64,

    /// Activity counters
    stats: RegistryStats,

    /// Configuration
    config: RegistryConfig,
}

impl<C: Connection> ConnectionRegistry<C> {
    /// Create a new registry with default configuration
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    /// Create a new registry with custom configuration
    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            connections: DashMap::with_capacity(config.initial_capacity),
            next_id: AtomicU64::new(1),
            stats: RegistryStats::default(),
            config,
        }
    }

    /// Get the registry configuration
    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Get the activity counters
    pub fn stats(&self) -> &RegistryStats {
        &self.stats
    }

    /// Allocate an identifier for a connection about to be registered
    pub fn next_connection_id(&self) -> ConnectionId {
        ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    /// Add a connection
    ///
    /// Never fails. Re-adding an id replaces the previous handle.
    pub fn add(&self, connection: Arc<C>) {
        let id = connection.id();
        if self.connections.insert(id, connection).is_none() {
            self.stats.on_added();
        }

        tracing::debug!(
            connection_id = %id,
            connections = self.connections.len(),
            "Connection added"
        );
    }

    /// Remove a connection
    ///
    /// Absent ids are ignored. Returns `true` only for the call that actually
    /// removed the entry, so concurrent removal by the sweep and by the
    /// lifecycle handler is counted once.
    pub fn remove(&self, id: ConnectionId) -> bool {
        if self.connections.remove(&id).is_some() {
            self.stats.on_removed();
            tracing::debug!(
                connection_id = %id,
                connections = self.connections.len(),
                "Connection removed"
            );
            true
        } else {
            false
        }
    }

    /// Add a connection and return a guard that removes it on drop
    pub fn register(self: &Arc<Self>, connection: Arc<C>) -> Registration<C> {
        let id = connection.id();
        self.add(connection);
        Registration {
            registry: Arc::clone(self),
            id,
        }
    }

    /// Check whether a connection is currently registered
    pub fn contains(&self, id: ConnectionId) -> bool {
        self.connections.contains_key(&id)
    }

    /// Number of registered connections, including ones not yet swept
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    /// Whether no connections are registered
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Serialize a payload as JSON and broadcast it
    ///
    /// A payload that fails to serialize is logged and not sent.
    pub async fn broadcast<T: Serialize + ?Sized>(&self, payload: &T) -> BroadcastOutcome {
        match serde_json::to_vec(payload) {
            Ok(bytes) => self.broadcast_bytes(Bytes::from(bytes)).await,
            Err(e) => {
                tracing::error!(error = %e, "Failed to serialize broadcast payload");
                BroadcastOutcome::default()
            }
        }
    }

    /// Send an already-serialized payload to every open connection
    ///
    /// Sends run concurrently, each bounded by the configured send timeout.
    /// Failures are isolated per connection. Once every send has settled,
    /// connections that failed or are no longer open are closed and swept
    /// from the registry before this returns.
    pub async fn broadcast_bytes(&self, payload: Bytes) -> BroadcastOutcome {
        // Copy the member set out so no shard lock is held across the sends
        let (live, mut evict): (Vec<Arc<C>>, Vec<Arc<C>>) = self
            .connections
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .partition(|conn| conn.is_open());

        let timeout = self.config.send_timeout;
        let results = join_all(
            live.iter()
                .map(|conn| send_with_timeout(conn.as_ref(), payload.clone(), timeout)),
        )
        .await;

        let mut outcome = BroadcastOutcome::default();
        for (conn, result) in live.into_iter().zip(results) {
            match result {
                Ok(()) => {
                    outcome.delivered += 1;
                    // Closed by its session while the broadcast was in flight
                    if !conn.is_open() {
                        evict.push(conn);
                    }
                }
                Err(e) => {
                    tracing::debug!(connection_id = %conn.id(), error = %e, "Broadcast send failed");
                    outcome.failed += 1;
                    evict.push(conn);
                }
            }
        }

        // Sweep: only snapshot entries, and only if still the same handle
        for conn in &evict {
            conn.close();
            if self
                .connections
                .remove_if(&conn.id(), |_, current| Arc::ptr_eq(current, conn))
                .is_some()
            {
                self.stats.on_removed();
                outcome.swept += 1;
            }
        }

        self.stats.on_broadcast(&outcome);

        tracing::debug!(
            bytes = payload.len(),
            delivered = outcome.delivered,
            failed = outcome.failed,
            swept = outcome.swept,
            connections = self.connections.len(),
            "Broadcast complete"
        );

        outcome
    }
}

impl<C: Connection> Default for ConnectionRegistry<C> {
    fn default() -> Self {
        Self::new()
    }
}

async fn send_with_timeout<C: Connection>(
    conn: &C,
    payload: Bytes,
    timeout: Duration,
) -> Result<(), ConnectionError> {
    match tokio::time::timeout(timeout, conn.send(payload)).await {
        Ok(result) => result,
        Err(_) => Err(ConnectionError::Timeout(timeout)),
    }
}

/// Guard returned by [`ConnectionRegistry::register`]
///
/// Removes the connection when dropped, so every exit path of the owning
/// task (normal close, error, cancellation) deregisters it.
pub struct Registration<C: Connection> {
    registry: Arc<ConnectionRegistry<C>>,
    id: ConnectionId,
}

impl<C: Connection> Registration<C> {
    /// Identifier of the registered connection
    pub fn id(&self) -> ConnectionId {
        self.id
    }
}

impl<C: Connection> Drop for Registration<C> {
    fn drop(&mut self) {
        self.registry.remove(self.id);
    }
}
