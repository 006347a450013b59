//! The exporter served over TCP, probing a mock eAPI endpoint.

mod common;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use arista_eapi::EapiClient;
use arista_exporter::{ExporterConfig, HttpServer, Scraper};
use axum::Json;
use axum::Router;
use axum::routing::post;
use serde_json::{Value, json};
use tokio::sync::watch;
use tokio::task::JoinHandle;

use common::sample_value;

/// Answer every `runCmds` with canned per-command output.
async fn command_api(Json(request): Json<Value>) -> Json<Value> {
    let cmds = request["params"]["cmds"].as_array().cloned().unwrap_or_default();
    let result: Vec<Value> = cmds
        .iter()
        .map(|cmd| match cmd.as_str() {
            Some("show system environment power") => json!({
                "powerSupplies": {
                    "1": {"state": "ok", "modelName": "PWR-745AC-F"},
                    "2": {"state": "ok", "modelName": "PWR-745AC-F"}
                }
            }),
            Some("show redundancy status") => json!({
                "slotId": 1,
                "unitDesc": "Primary",
                "myMode": "active",
                "peerMode": "standby",
                "communicationDesc": "Up",
                "switchoverReady": true,
                "allAgentSsoReady": true,
                "lastRedundancyModeChangeTime": 1718000000.0,
                "lastRedundancyModeChangeReason": "Supervisor has control of the active supervisor lock"
            }),
            // enable, or the enable object carrying a password
            _ => json!({}),
        })
        .collect();

    Json(json!({"jsonrpc": "2.0", "id": request["id"], "result": result}))
}

async fn spawn_device() -> SocketAddr {
    let router = Router::new().route("/command-api", post(command_api));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Start the exporter with one profile, `chassis1`, pointing at `device`.
async fn spawn_exporter(
    device: SocketAddr,
) -> (
    SocketAddr,
    watch::Sender<bool>,
    JoinHandle<anyhow::Result<()>>,
) {
    let config = ExporterConfig::parse(&format!(
        r#"{{
            web: {{ listen: "127.0.0.1:0" }},
            eapi: {{
                connections: {{
                    chassis1: {{
                        host: "{}",
                        port: {},
                        transport: "http",
                        username: "prometheus",
                        password: "pw",
                        timeout_secs: 5,
                    }},
                }},
            }},
        }}"#,
        device.ip(),
        device.port()
    ))
    .unwrap();

    let client = Arc::new(EapiClient::new(config.eapi.clone()));
    let scraper = Scraper::new(client, config.metrics.prefix.clone());
    let server = HttpServer::new(scraper, config.listen_addr().unwrap(), config.web.clone());

    let listener = tokio::net::TcpListener::bind(config.listen_addr().unwrap())
        .await
        .unwrap();
    let addr = listener.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(server.serve(listener, shutdown_rx));

    (addr, shutdown_tx, handle)
}

#[tokio::test]
async fn test_probe_over_http() {
    let device = spawn_device().await;
    let (exporter, _shutdown, _) = spawn_exporter(device).await;

    let response = reqwest::get(format!(
        "http://{}/arista?target=chassis1&module=power,redundancy",
        exporter
    ))
    .await
    .unwrap();
    assert_eq!(response.status(), 200);

    let body = response.text().await.unwrap();
    assert_eq!(
        sample_value(&body, "arista_power_supply_state{powerSupply=\"1\",state=\"ok\"}"),
        Some(1.0)
    );
    assert_eq!(
        sample_value(&body, "arista_power_supply_state{powerSupply=\"2\",state=\"ok\"}"),
        Some(1.0)
    );
    assert_eq!(
        sample_value(&body, "arista_redundancy_mode{status=\"active\"}"),
        Some(1.0)
    );
    assert_eq!(
        sample_value(&body, "arista_redundancy_switchover_ready"),
        Some(1.0)
    );
    assert!(body.ends_with("# EOF\n"));
}

#[tokio::test]
async fn test_unconfigured_target_over_http() {
    let device = spawn_device().await;
    let (exporter, _shutdown, _) = spawn_exporter(device).await;

    let response = reqwest::get(format!("http://{}/arista?target=elsewhere", exporter))
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    assert_eq!(
        response.text().await.unwrap(),
        "Failed to connect to \"elsewhere\"\n"
    );
}

#[tokio::test]
async fn test_graceful_shutdown() {
    let device = spawn_device().await;
    let (exporter, shutdown, handle) = spawn_exporter(device).await;

    let health = reqwest::get(format!("http://{}/health", exporter))
        .await
        .unwrap();
    assert_eq!(health.status(), 200);
    assert_eq!(health.text().await.unwrap(), "healthy\n");

    shutdown.send(true).unwrap();
    let stopped = tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("server did not stop")
        .unwrap();
    assert!(stopped.is_ok());

    assert!(
        reqwest::get(format!("http://{}/health", exporter))
            .await
            .is_err()
    );
}
