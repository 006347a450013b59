//! Prometheus exporter for Arista switches.
//!
//! Every request to the probe endpoint opens an eAPI connection to the
//! requested target, runs the show commands of the requested modules in one
//! batch and renders the answers as gauges. Nothing is cached between
//! requests.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐   GET /arista?target=..&module=..   ┌──────────────┐
//! │  Prometheus  │────────────────────────────────────>│  HTTP Server │
//! └──────────────┘                                     └──────┬───────┘
//!                                                             │
//!                 ┌──────────────┐   runCmds batch    ┌───────▼──────┐
//!                 │ Arista eAPI  │<───────────────────│   Scraper    │
//!                 └──────────────┘                    │  (probers)   │
//!                                                     └──────────────┘
//! ```
//!
//! # Modules
//!
//! | Module        | Command                           |
//! |---------------|-----------------------------------|
//! | `power`       | `show system environment power`   |
//! | `mlag`        | `show mlag detail`                |
//! | `portchannel` | `show port-channel detailed`      |
//! | `redundancy`  | `show redundancy status`          |
//! | `switchover`  | `show redundancy switchover sso`  |
//!
//! # Usage
//!
//! ```bash
//! arista-exporter --config config.json5
//! curl 'http://localhost:9465/arista?target=spine1&module=power,mlag'
//! ```
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod collection;
pub mod config;
pub mod error;
pub mod http;
pub mod mapping;
pub mod prober;
pub mod scrape;
pub mod stats;

pub use collection::{MetricsCollection, MetricsError};
pub use config::{ExporterConfig, LogFormat, LoggingConfig};
pub use error::ScrapeError;
pub use http::{HttpServer, create_router};
pub use prober::{ModuleKind, Prober};
pub use scrape::{ScrapeRequest, Scraper};

/// Initialize tracing with the given configuration.
///
/// `RUST_LOG` takes precedence over the configured level.
pub fn init_tracing(config: &LoggingConfig) -> anyhow::Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| anyhow::anyhow!("Failed to initialize tracing: {}", e))?;
        }
    }

    Ok(())
}
