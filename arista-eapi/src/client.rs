//! Device client capability and its eAPI implementation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;
use tracing::{debug, trace};

use crate::config::{ConnectionProfile, EapiConfig};
use crate::error::{EapiError, Result};
use crate::jsonrpc::{Command, Request, Response};

/// Opens connections to devices by target name.
#[async_trait]
pub trait DeviceClient: Send + Sync {
    /// Open a connection to `target`.
    async fn connect(&self, target: &str) -> Result<Box<dyn Connection>>;
}

/// A connection able to run a batch of show commands in one round trip.
#[async_trait]
pub trait Connection: Send + Sync {
    /// Printable endpoint, for logging.
    fn endpoint(&self) -> &str;

    /// Run `commands` and return one decoded JSON document per command,
    /// in request order.
    async fn run_commands(&self, commands: &[&str]) -> Result<Vec<Value>>;
}

/// [`DeviceClient`] speaking Arista eAPI over HTTP(S).
#[derive(Debug, Clone, Default)]
pub struct EapiClient {
    config: EapiConfig,
}

impl EapiClient {
    /// Create a client over the given connection profiles.
    pub fn new(config: EapiConfig) -> Self {
        Self { config }
    }

    fn build_http_client(target: &str, profile: &ConnectionProfile) -> Result<reqwest::Client> {
        let mut builder =
            reqwest::Client::builder().danger_accept_invalid_certs(!profile.verify_tls);

        if let Some(secs) = profile.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        builder.build().map_err(|e| EapiError::InvalidEndpoint {
            target: target.to_string(),
            message: e.to_string(),
        })
    }
}

#[async_trait]
impl DeviceClient for EapiClient {
    async fn connect(&self, target: &str) -> Result<Box<dyn Connection>> {
        let (host, profile) = self
            .config
            .resolve(target)
            .ok_or_else(|| EapiError::UnknownTarget(target.to_string()))?;

        let endpoint = profile.endpoint(target, &host)?.to_string();
        let http = Self::build_http_client(target, profile)?;

        debug!(
            target = %target,
            endpoint = %endpoint,
            username = %profile.username,
            "Opened eAPI connection"
        );

        Ok(Box::new(EapiConnection {
            http,
            endpoint,
            username: profile.username.clone(),
            password: profile.password.clone(),
            enable_password: profile.enable_password.clone(),
            next_id: AtomicU64::new(1),
        }))
    }
}

/// A resolved eAPI endpoint with credentials.
pub struct EapiConnection {
    http: reqwest::Client,
    endpoint: String,
    username: String,
    password: String,
    enable_password: Option<String>,
    next_id: AtomicU64,
}

#[async_trait]
impl Connection for EapiConnection {
    fn endpoint(&self) -> &str {
        &self.endpoint
    }

    async fn run_commands(&self, commands: &[&str]) -> Result<Vec<Value>> {
        let mut cmds = Vec::with_capacity(commands.len() + 1);
        cmds.push(Command::enable(self.enable_password.as_deref()));
        cmds.extend(commands.iter().map(|c| Command::Plain(c.to_string())));

        let id = self.next_id.fetch_add(1, Ordering::Relaxed).to_string();
        let request = Request::run_cmds(id, cmds);

        trace!(endpoint = %self.endpoint, commands = ?commands, "Sending runCmds");

        let response = self
            .http
            .post(&self.endpoint)
            .basic_auth(&self.username, Some(&self.password))
            .json(&request)
            .send()
            .await
            .map_err(|e| EapiError::Unreachable {
                endpoint: self.endpoint.clone(),
                source: e,
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(EapiError::Unauthorized {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }
        if !status.is_success() {
            return Err(EapiError::Http {
                endpoint: self.endpoint.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        let envelope: Response = serde_json::from_slice(&body)
            .map_err(|e| EapiError::Protocol(format!("invalid JSON-RPC body: {}", e)))?;

        let mut results = envelope.into_results(commands.len() + 1)?;
        // Drop the `enable` output
        results.remove(0);

        debug!(
            endpoint = %self.endpoint,
            commands = commands.len(),
            bytes = body.len(),
            "runCmds completed"
        );

        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn test_connect_unknown_target() {
        let client = EapiClient::new(EapiConfig::default());

        let err = client.connect("sw1").await.err().unwrap();
        assert!(matches!(err, EapiError::UnknownTarget(ref t) if t == "sw1"));
        assert!(err.is_connection_error());
    }

    #[tokio::test]
    async fn test_connect_rejects_target_that_is_not_a_host() {
        let client = EapiClient::new(EapiConfig {
            defaults: Some(ConnectionProfile::default()),
            connections: HashMap::new(),
        });

        for target in ["sw1:8443", "evil.example/steal?", "user@evil.example"] {
            let err = client.connect(target).await.err().unwrap();
            assert!(matches!(err, EapiError::InvalidEndpoint { .. }), "{target}");
            assert!(err.is_connection_error());
        }

        let conn = client.connect("2001:db8::1").await.unwrap();
        assert_eq!(conn.endpoint(), "https://[2001:db8::1]/command-api");
    }

    #[tokio::test]
    async fn test_connect_named_profile_endpoint() {
        let mut connections = HashMap::new();
        connections.insert(
            "spine1".to_string(),
            ConnectionProfile {
                host: Some("192.0.2.10".to_string()),
                port: Some(8443),
                ..Default::default()
            },
        );
        let client = EapiClient::new(EapiConfig {
            defaults: None,
            connections,
        });

        let conn = client.connect("spine1").await.unwrap();
        assert_eq!(conn.endpoint(), "https://192.0.2.10:8443/command-api");
    }

    #[tokio::test]
    async fn test_connect_falls_back_to_defaults() {
        let client = EapiClient::new(EapiConfig {
            defaults: Some(ConnectionProfile::default()),
            connections: HashMap::new(),
        });

        let conn = client.connect("leaf7").await.unwrap();
        assert_eq!(conn.endpoint(), "https://leaf7/command-api");
    }
}
