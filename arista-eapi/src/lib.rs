//! Arista eAPI client
//!
//! This crate provides the device side of the Arista exporter:
//!
//! - [`client`] - The [`DeviceClient`] / [`Connection`] capability and the
//!   HTTP(S) [`EapiClient`] implementation
//! - [`config`] - Connection profiles keyed by target name
//! - [`jsonrpc`] - The `runCmds` JSON-RPC envelope
//! - [`error`] - Error types
//!
//! A scrape opens one connection and sends all of its show commands in a
//! single `runCmds` batch:
//!
//! ```ignore
//! use arista_eapi::{DeviceClient, EapiClient, EapiConfig};
//!
//! let client = EapiClient::new(config.eapi.clone());
//! let conn = client.connect("spine1").await?;
//! let results = conn.run_commands(&["show mlag detail"]).await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod jsonrpc;

pub use client::{Connection, DeviceClient, EapiClient};
pub use config::{ConnectionProfile, EapiConfig, Transport};
pub use error::{EapiError, Result};
