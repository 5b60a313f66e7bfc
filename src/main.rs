//! Harmonic archive server
//!
//! Run with: harmonic-archive [BIND_ADDR]
//!
//! Examples:
//!   harmonic-archive                  # binds to 0.0.0.0:8080
//!   harmonic-archive localhost        # binds to 127.0.0.1:8080
//!   harmonic-archive 127.0.0.1:9000   # binds to 127.0.0.1:9000
//!
//! Producer overrides:
//!   HARMONIC_WORKER_INTERVAL_MS=1000  # cycle every second
//!   HARMONIC_WORKER_ENABLED=true      # start producing immediately
//!
//! Watch live sheets with any WebSocket client:
//!   websocat ws://localhost:8080/ws
//!   curl -X POST 'http://localhost:8080/api/MusicSheets/toggle-worker?isRunning=true'

use harmonic_archive::server::config::parse_bind_addr;
use harmonic_archive::{ArchiveServer, ServerConfig};

fn print_usage() {
    eprintln!("Usage: harmonic-archive [BIND_ADDR]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  BIND_ADDR    Address to bind to (default: 0.0.0.0:8080)");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = std::env::args().collect();

    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_usage();
        return Ok(());
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let mut config = ServerConfig::from_env();
    if let Some(addr_str) = args.get(1) {
        match parse_bind_addr(addr_str) {
            Ok(addr) => config = config.bind(addr),
            Err(e) => {
                eprintln!("Error: {}", e);
                eprintln!();
                print_usage();
                std::process::exit(1);
            }
        }
    }

    tracing::info!(
        addr = %config.bind_addr,
        interval_ms = config.producer.interval.as_millis() as u64,
        worker_enabled = config.producer.start_enabled,
        "Starting harmonic archive"
    );

    let server = ArchiveServer::new(config);
    server
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}
