//! Prometheus exporter for Arista switches.

use std::sync::Arc;
use std::time::Duration;

use arista_eapi::EapiClient;
use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info};

use arista_exporter::{ExporterConfig, HttpServer, Scraper, init_tracing};

/// Prometheus exporter for Arista switches.
#[derive(Parser, Debug)]
#[command(name = "arista-exporter")]
#[command(about = "Probe Arista switches over eAPI and expose the results as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error; overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config = match &args.config {
        Some(path) => ExporterConfig::load_from_file(path)?,
        None => ExporterConfig::default(),
    };

    if let Some(listen) = args.listen {
        config.web.listen = listen;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    init_tracing(&config.logging)?;

    info!(
        version = env!("CARGO_PKG_VERSION"),
        listen = %config.web.listen,
        profiles = config.eapi.connections.len(),
        default_profile = config.eapi.defaults.is_some(),
        "Starting Arista exporter"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let listen_addr = config.listen_addr()?;
    let client = Arc::new(EapiClient::new(config.eapi.clone()));
    let scraper = Scraper::new(client, config.metrics.prefix.clone());
    let http_server = HttpServer::new(scraper, listen_addr, config.web.clone());

    let mut http_task = tokio::spawn(http_server.run(shutdown_rx));

    tokio::select! {
        result = &mut http_task => {
            // Server ended on its own, typically a bind failure
            return result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate() => {
            info!("Received SIGTERM, shutting down...");
        }
    }

    let _ = shutdown_tx.send(true);

    match tokio::time::timeout(Duration::from_secs(5), http_task).await {
        Ok(Ok(Err(e))) => error!("HTTP server error: {}", e),
        Err(_) => error!("HTTP server did not stop in time"),
        _ => {}
    }

    info!("Exporter stopped");
    Ok(())
}

#[cfg(unix)]
async fn terminate() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate() {
    std::future::pending::<()>().await;
}
