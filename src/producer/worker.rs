//! Producer loop and start/stop control

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use bytes::Bytes;
use serde::Serialize;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::config::ProducerConfig;
use super::source::{RecordGenerator, RecordStore};
use super::state::{AtomicProducerState, ProducerState};
use crate::error::Result;
use crate::registry::{BroadcastOutcome, Connection, ConnectionRegistry};
use crate::stats::ProducerStats;

/// Handles for the loop task currently owned by the producer
#[derive(Default)]
struct LoopControl {
    /// Cancels the running loop; `None` while idle
    token: Option<CancellationToken>,
    /// Most recently spawned loop task, possibly still finishing a cycle
    task: Option<JoinHandle<()>>,
}

/// Periodic producer that generates, persists and broadcasts records
///
/// Construct once and share through an `Arc`; `start` and `stop` may be
/// called from any task. At most one loop runs at a time: a loop started
/// right after a stop first waits for the previous loop to finish its
/// in-flight cycle.
pub struct Producer<G, S, C>
where
    G: RecordGenerator,
    S: RecordStore<G::Record>,
    C: Connection,
{
    generator: G,
    store: Arc<S>,
    registry: Arc<ConnectionRegistry<C>>,
    config: ProducerConfig,
    state: AtomicProducerState,
    control: Mutex<LoopControl>,
    stats: ProducerStats,
}

impl<G, S, C> Producer<G, S, C>
where
    G: RecordGenerator,
    G::Record: Serialize,
    S: RecordStore<G::Record>,
    C: Connection,
{
    /// Create an idle producer
    pub fn new(
        generator: G,
        store: Arc<S>,
        registry: Arc<ConnectionRegistry<C>>,
        config: ProducerConfig,
    ) -> Self {
        Self {
            generator,
            store,
            registry,
            config,
            state: AtomicProducerState::new(ProducerState::Idle),
            control: Mutex::new(LoopControl::default()),
            stats: ProducerStats::default(),
        }
    }

    /// Current run state
    pub fn state(&self) -> ProducerState {
        self.state.load()
    }

    /// Whether the loop is running
    pub fn is_running(&self) -> bool {
        self.state() == ProducerState::Running
    }

    /// Get the producer configuration
    pub fn config(&self) -> &ProducerConfig {
        &self.config
    }

    /// Get the activity counters
    pub fn stats(&self) -> &ProducerStats {
        &self.stats
    }

    /// Get the store records are persisted to
    pub fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// Get the registry records are broadcast to
    pub fn registry(&self) -> &Arc<ConnectionRegistry<C>> {
        &self.registry
    }

    /// Enable the producer (control surface for `start`)
    pub fn enable(self: &Arc<Self>) -> bool {
        self.start()
    }

    /// Disable the producer (control surface for `stop`)
    pub fn disable(&self) -> bool {
        self.stop()
    }

    /// Transition Idle → Running and spawn the loop
    ///
    /// Returns `false` without side effects if already running. Must be
    /// called from within a Tokio runtime.
    pub fn start(self: &Arc<Self>) -> bool {
        let mut control = self.lock_control();

        if !self
            .state
            .transition(ProducerState::Idle, ProducerState::Running)
        {
            tracing::debug!("Producer already running");
            return false;
        }

        let token = CancellationToken::new();
        let previous = control.task.take();
        let producer = Arc::clone(self);
        let loop_token = token.clone();

        control.task = Some(tokio::spawn(async move {
            if let Some(previous) = previous {
                // Previous loop was cancelled; let it finish its current cycle
                let _ = previous.await;
            }
            producer.run(loop_token).await;
        }));
        control.token = Some(token);

        self.stats.on_start();
        tracing::info!(
            interval_ms = self.config.interval.as_millis() as u64,
            "Producer is now running"
        );

        true
    }

    /// Transition Running → Idle by cancelling the loop
    ///
    /// Returns `false` if already idle. Does not wait for an in-flight cycle;
    /// the loop exits at its next wait or before its next cycle.
    pub fn stop(&self) -> bool {
        let mut control = self.lock_control();

        if !self
            .state
            .transition(ProducerState::Running, ProducerState::Idle)
        {
            tracing::debug!("Producer already stopped");
            return false;
        }

        if let Some(token) = control.token.take() {
            token.cancel();
        }

        self.stats.on_stop();
        tracing::info!("Producer is now stopped");

        true
    }

    /// Stop the producer and wait for the loop task to exit
    pub async fn shutdown(&self) {
        self.stop();

        let task = self.lock_control().task.take();
        if let Some(task) = task {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "Producer task ended abnormally");
            }
        }
    }

    /// Run a single generate → persist → broadcast cycle
    pub async fn run_once(&self) -> Result<BroadcastOutcome> {
        let record = self.generator.generate_one();
        self.store.persist(&record).await?;

        let payload = Bytes::from(serde_json::to_vec(&record)?);
        Ok(self.registry.broadcast_bytes(payload).await)
    }

    async fn run(&self, token: CancellationToken) {
        tracing::debug!("Producer loop started");

        while !token.is_cancelled() {
            match self.run_once().await {
                Ok(outcome) => {
                    self.stats.on_cycle();
                    tracing::info!(
                        delivered = outcome.delivered,
                        swept = outcome.swept,
                        "Sent new record to connected clients"
                    );
                }
                Err(e) => {
                    self.stats.on_failed_cycle();
                    tracing::error!(error = %e, "Producer cycle failed");
                }
            }

            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = tokio::time::sleep(self.config.interval) => {}
            }
        }

        tracing::debug!("Producer loop exited");
    }

    fn lock_control(&self) -> MutexGuard<'_, LoopControl> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    use std::time::Duration;

    use super::*;
    use crate::producer::StoreError;
    use crate::registry::testing::MockConnection;

    #[derive(Debug, Clone, PartialEq, Serialize)]
    struct Note {
        seq: u32,
    }

    #[derive(Default)]
    struct CountingGenerator {
        next: AtomicU32,
    }

    impl RecordGenerator for CountingGenerator {
        type Record = Note;

        fn generate_one(&self) -> Note {
            Note {
                seq: self.next.fetch_add(1, Ordering::SeqCst),
            }
        }
    }

    #[derive(Default)]
    struct RecordingStore {
        persisted: Mutex<Vec<Note>>,
        failures_left: AtomicUsize,
    }

    impl RecordingStore {
        fn failing_first(n: usize) -> Self {
            Self {
                persisted: Mutex::new(Vec::new()),
                failures_left: AtomicUsize::new(n),
            }
        }

        fn calls(&self) -> Vec<Note> {
            self.persisted.lock().unwrap().clone()
        }
    }

    impl RecordStore<Note> for RecordingStore {
        async fn persist(&self, record: &Note) -> std::result::Result<(), StoreError> {
            let should_fail = self
                .failures_left
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok();
            if should_fail {
                return Err(StoreError::Unavailable("database offline".into()));
            }
            self.persisted.lock().unwrap().push(record.clone());
            Ok(())
        }
    }

    type TestProducer = Producer<CountingGenerator, RecordingStore, MockConnection>;

    fn producer_with(store: RecordingStore) -> Arc<TestProducer> {
        Arc::new(Producer::new(
            CountingGenerator::default(),
            Arc::new(store),
            Arc::new(ConnectionRegistry::new()),
            ProducerConfig::default().interval(Duration::from_secs(1)),
        ))
    }

    fn producer() -> Arc<TestProducer> {
        producer_with(RecordingStore::default())
    }

    #[tokio::test]
    async fn test_cycle_persists_once_and_broadcasts_to_all() {
        let producer = producer();
        let registry = producer.registry();
        let a = MockConnection::open(registry.next_connection_id());
        let b = MockConnection::open(registry.next_connection_id());
        registry.add(Arc::clone(&a));
        registry.add(Arc::clone(&b));

        let outcome = producer.run_once().await.unwrap();

        let expected = Bytes::from(serde_json::to_vec(&Note { seq: 0 }).unwrap());
        assert_eq!(producer.store().calls(), vec![Note { seq: 0 }]);
        assert_eq!(outcome.delivered, 2);
        assert_eq!(a.received(), vec![expected.clone()]);
        assert_eq!(b.received(), vec![expected]);
    }

    #[tokio::test]
    async fn test_store_failure_skips_broadcast() {
        let producer = producer_with(RecordingStore::failing_first(1));
        let conn = MockConnection::open(producer.registry().next_connection_id());
        producer.registry().add(Arc::clone(&conn));

        let result = producer.run_once().await;

        assert!(matches!(result, Err(crate::Error::Store(_))));
        assert!(conn.received().is_empty());
    }

    #[tokio::test(start_paused = true)]
    async fn test_double_start_runs_one_loop() {
        let producer = producer();

        assert!(producer.start());
        assert!(!producer.start());
        assert_eq!(producer.state(), ProducerState::Running);

        tokio::time::sleep(Duration::from_millis(3500)).await;

        // Cycles at t = 0, 1, 2, 3
        assert_eq!(producer.store().calls().len(), 4);
        producer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_during_wait_prevents_next_cycle() {
        let producer = producer();

        producer.start();
        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(producer.store().calls().len(), 2);

        assert!(producer.stop());
        assert!(!producer.stop());
        tokio::time::sleep(Duration::from_secs(5)).await;

        assert_eq!(producer.store().calls().len(), 2);
        assert_eq!(producer.state(), ProducerState::Idle);
        producer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop_resumes_cycling() {
        let producer = producer();

        producer.start();
        tokio::time::sleep(Duration::from_millis(500)).await;
        producer.stop();
        assert!(producer.start());
        tokio::time::sleep(Duration::from_millis(500)).await;

        assert_eq!(producer.store().calls().len(), 2);
        let stats = producer.stats().snapshot();
        assert_eq!(stats.starts, 2);
        assert_eq!(stats.stops, 1);
        producer.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_cycle_does_not_stop_loop() {
        let producer = producer_with(RecordingStore::failing_first(1));

        producer.enable();
        tokio::time::sleep(Duration::from_millis(2500)).await;
        producer.disable();

        let stats = producer.stats().snapshot();
        assert_eq!(stats.failed_cycles, 1);
        assert_eq!(stats.cycles, 2);
        assert_eq!(producer.store().calls().len(), 2);
        producer.shutdown().await;
    }

    #[tokio::test]
    async fn test_shutdown_when_idle_is_noop() {
        let producer = producer();
        producer.shutdown().await;

        assert_eq!(producer.state(), ProducerState::Idle);
        assert_eq!(producer.stats().snapshot().stops, 0);
    }
}
