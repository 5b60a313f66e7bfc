//! HTTP server listener
//!
//! Binds the TCP listener, wires the shared state, and runs the axum router
//! until shutdown.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Semaphore;

use crate::catalog::{FakeSheetGenerator, InMemoryCatalog};
use crate::error::Result;
use crate::producer::Producer;
use crate::registry::ConnectionRegistry;
use crate::server::config::ServerConfig;
use crate::server::routes::router;
use crate::session::WsConnection;

/// Registry of live WebSocket clients
pub type SheetRegistry = ConnectionRegistry<WsConnection>;

/// Producer pushing generated sheets to WebSocket clients
pub type SheetProducer = Producer<FakeSheetGenerator, InMemoryCatalog, WsConnection>;

/// State shared by all request handlers
#[derive(Clone)]
pub struct AppState {
    /// Producer, and through it the registry and the catalogue
    pub producer: Arc<SheetProducer>,
    /// Maximum concurrent WebSocket connections (0 = unlimited)
    pub max_connections: usize,
    /// One permit per allowed WebSocket session; `None` when unlimited
    pub connection_slots: Option<Arc<Semaphore>>,
}

impl AppState {
    /// Registry of live WebSocket clients
    pub fn registry(&self) -> &Arc<SheetRegistry> {
        self.producer.registry()
    }

    /// Music sheet store
    pub fn catalog(&self) -> &Arc<InMemoryCatalog> {
        self.producer.store()
    }
}

/// Music sheet archive server
pub struct ArchiveServer {
    config: ServerConfig,
    producer: Arc<SheetProducer>,
    connection_slots: Option<Arc<Semaphore>>,
}

impl ArchiveServer {
    /// Create a server with a randomly seeded generator and an empty catalogue
    pub fn new(config: ServerConfig) -> Self {
        Self::with_generator(config, FakeSheetGenerator::new())
    }

    /// Create a server with a specific generator
    pub fn with_generator(config: ServerConfig, generator: FakeSheetGenerator) -> Self {
        let registry = Arc::new(ConnectionRegistry::with_config(config.registry.clone()));
        let catalog = Arc::new(InMemoryCatalog::new());
        let producer = Arc::new(Producer::new(
            generator,
            catalog,
            registry,
            config.producer.clone(),
        ));

        let connection_slots =
            (config.max_connections > 0).then(|| Arc::new(Semaphore::new(config.max_connections)));

        Self {
            config,
            producer,
            connection_slots,
        }
    }

    /// Get the producer
    pub fn producer(&self) -> &Arc<SheetProducer> {
        &self.producer
    }

    /// Get the connection registry
    pub fn registry(&self) -> &Arc<SheetRegistry> {
        self.producer.registry()
    }

    /// Get the catalogue
    pub fn catalog(&self) -> &Arc<InMemoryCatalog> {
        self.producer.store()
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }

    /// Shared state for the router
    pub fn state(&self) -> AppState {
        AppState {
            producer: Arc::clone(&self.producer),
            max_connections: self.config.max_connections,
            connection_slots: self.connection_slots.clone(),
        }
    }

    /// Run the server
    ///
    /// This method blocks until the listener fails.
    pub async fn run(&self) -> Result<()> {
        self.run_until(std::future::pending()).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let listener = TcpListener::bind(self.config.bind_addr).await?;
        self.serve_until(listener, shutdown).await
    }

    /// Serve on an already-bound listener until `shutdown` resolves
    ///
    /// The producer is stopped and its loop awaited before returning.
    pub async fn serve_until<F>(&self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr = listener.local_addr()?;
        tracing::info!(addr = %addr, "Archive server listening");

        if self.config.producer.start_enabled {
            self.producer.start();
        }

        let result = axum::serve(listener, router(self.state()))
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("Shutdown signal received");
            })
            .await;

        self.producer.shutdown().await;

        result.map_err(Into::into)
    }
}
