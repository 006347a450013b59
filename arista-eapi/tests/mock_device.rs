//! Integration tests running [`EapiClient`] against a mock eAPI endpoint.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use arista_eapi::{DeviceClient, EapiClient, EapiConfig, EapiError};
use axum::Json;
use axum::Router;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use serde_json::{Value, json};

/// What the mock device answers and what it last received.
#[derive(Clone)]
struct MockDevice {
    status: StatusCode,
    reply: Value,
    last_request: Arc<Mutex<Option<Value>>>,
    last_auth: Arc<Mutex<Option<String>>>,
}

impl MockDevice {
    fn new(status: StatusCode, reply: Value) -> Self {
        Self {
            status,
            reply,
            last_request: Arc::new(Mutex::new(None)),
            last_auth: Arc::new(Mutex::new(None)),
        }
    }
}

async fn command_api(
    State(device): State<MockDevice>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    *device.last_request.lock().unwrap() = Some(body);
    *device.last_auth.lock().unwrap() = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    (device.status, Json(device.reply.clone())).into_response()
}

/// Start the mock on an ephemeral port.
async fn spawn_device(device: MockDevice) -> SocketAddr {
    let router = Router::new()
        .route("/command-api", post(command_api))
        .with_state(device);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let _ = axum::serve(listener, router).await;
    });
    addr
}

/// Client config with one plain-HTTP profile named `sw1` pointing at `addr`.
fn client_for(addr: SocketAddr, extra: &str) -> EapiClient {
    let config = format!(
        r#"{{
            connections: {{
                sw1: {{
                    host: "{}",
                    port: {},
                    transport: "http",
                    username: "monitor",
                    password: "pw",
                    {}
                }},
            }},
        }}"#,
        addr.ip(),
        addr.port(),
        extra
    );
    let config: EapiConfig = json5::from_str(&config).unwrap();
    EapiClient::new(config)
}

#[tokio::test]
async fn test_batch_round_trip() {
    let device = MockDevice::new(
        StatusCode::OK,
        json!({
            "jsonrpc": "2.0",
            "id": "1",
            "result": [
                {},
                {"switchoverCount": 3},
                {"slotId": 1, "myMode": "active"}
            ]
        }),
    );
    let addr = spawn_device(device.clone()).await;
    let client = client_for(addr, "");

    let conn = client.connect("sw1").await.unwrap();
    let results = conn
        .run_commands(&["show redundancy switchover sso", "show redundancy status"])
        .await
        .unwrap();

    // The enable result is stripped
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["switchoverCount"], 3);
    assert_eq!(results[1]["myMode"], "active");

    let request = device.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(request["method"], "runCmds");
    assert_eq!(request["params"]["format"], "json");
    assert_eq!(
        request["params"]["cmds"],
        json!([
            "enable",
            "show redundancy switchover sso",
            "show redundancy status"
        ])
    );

    let auth = device.last_auth.lock().unwrap().clone().unwrap();
    assert!(auth.starts_with("Basic "), "expected basic auth, got {auth}");
}

#[tokio::test]
async fn test_enable_password_is_sent_as_input() {
    let device = MockDevice::new(
        StatusCode::OK,
        json!({"jsonrpc": "2.0", "id": "1", "result": [{}, {}]}),
    );
    let addr = spawn_device(device.clone()).await;
    let client = client_for(addr, r#"enable_password: "en-pw","#);

    let conn = client.connect("sw1").await.unwrap();
    conn.run_commands(&["show mlag detail"]).await.unwrap();

    let request = device.last_request.lock().unwrap().clone().unwrap();
    assert_eq!(
        request["params"]["cmds"][0],
        json!({"cmd": "enable", "input": "en-pw"})
    );
}

#[tokio::test]
async fn test_unauthorized_is_connection_error() {
    let device = MockDevice::new(StatusCode::UNAUTHORIZED, json!({}));
    let addr = spawn_device(device).await;
    let client = client_for(addr, "");

    let conn = client.connect("sw1").await.unwrap();
    let err = conn.run_commands(&["show mlag detail"]).await.unwrap_err();

    assert!(matches!(err, EapiError::Unauthorized { status: 401, .. }));
    assert!(err.is_connection_error());
}

#[tokio::test]
async fn test_command_error_is_execution_error() {
    let device = MockDevice::new(
        StatusCode::OK,
        json!({
            "jsonrpc": "2.0",
            "id": "1",
            "error": {
                "code": 1002,
                "message": "CLI command 2 of 2 'show redundancy status' failed: invalid command",
                "data": [{}, {"errors": ["Unavailable command (not supported on this hardware platform)"]}]
            }
        }),
    );
    let addr = spawn_device(device).await;
    let client = client_for(addr, "");

    let conn = client.connect("sw1").await.unwrap();
    let err = conn
        .run_commands(&["show redundancy status"])
        .await
        .unwrap_err();

    assert!(!err.is_connection_error());
    match err {
        EapiError::Command { code, errors, .. } => {
            assert_eq!(code, 1002);
            assert_eq!(errors.len(), 1);
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_server_error_status() {
    let device = MockDevice::new(StatusCode::INTERNAL_SERVER_ERROR, json!({}));
    let addr = spawn_device(device).await;
    let client = client_for(addr, "");

    let conn = client.connect("sw1").await.unwrap();
    let err = conn.run_commands(&["show mlag detail"]).await.unwrap_err();

    assert!(matches!(err, EapiError::Http { status: 500, .. }));
    assert!(!err.is_connection_error());
}

#[tokio::test]
async fn test_unreachable_device() {
    // Grab a free port, then release it so nothing is listening
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = client_for(addr, "");
    let conn = client.connect("sw1").await.unwrap();
    let err = conn.run_commands(&["show mlag detail"]).await.unwrap_err();

    assert!(matches!(err, EapiError::Unreachable { .. }));
    assert!(err.is_connection_error());
}
