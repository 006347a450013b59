//! JSON-RPC 2.0 envelope for the eAPI `runCmds` method.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{EapiError, Result};

/// A single entry in the `cmds` array.
///
/// Plain commands serialize as strings; commands that need interactive
/// input (such as `enable` with a password) serialize as objects.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum Command {
    Plain(String),
    WithInput { cmd: String, input: String },
}

impl Command {
    /// The privilege escalation command prefixed to every batch.
    pub fn enable(password: Option<&str>) -> Self {
        match password {
            Some(input) => Command::WithInput {
                cmd: "enable".to_string(),
                input: input.to_string(),
            },
            None => Command::Plain("enable".to_string()),
        }
    }
}

/// `runCmds` request body.
#[derive(Debug, Serialize)]
pub struct Request {
    jsonrpc: &'static str,
    method: &'static str,
    params: Params,
    id: String,
}

#[derive(Debug, Serialize)]
struct Params {
    version: u32,
    cmds: Vec<Command>,
    format: &'static str,
}

impl Request {
    /// Build a JSON-format `runCmds` request.
    pub fn run_cmds(id: impl Into<String>, cmds: Vec<Command>) -> Self {
        Self {
            jsonrpc: "2.0",
            method: "runCmds",
            params: Params {
                version: 1,
                cmds,
                format: "json",
            },
            id: id.into(),
        }
    }
}

/// `runCmds` response body.
#[derive(Debug, Deserialize)]
pub struct Response {
    #[serde(default)]
    pub id: Option<Value>,
    #[serde(default)]
    pub result: Option<Vec<Value>>,
    #[serde(default)]
    pub error: Option<RpcError>,
}

/// JSON-RPC error object.
#[derive(Debug, Deserialize)]
pub struct RpcError {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    /// Per-command outputs up to and including the failing command.
    #[serde(default)]
    pub data: Vec<Value>,
}

impl RpcError {
    /// Collect the per-command `errors` strings the device reports in `data`.
    pub fn command_errors(&self) -> Vec<String> {
        self.data
            .iter()
            .filter_map(|entry| entry.get("errors"))
            .filter_map(Value::as_array)
            .flatten()
            .filter_map(|e| e.as_str().map(str::to_string))
            .collect()
    }
}

impl Response {
    /// Turn the envelope into the per-command results, checking that the
    /// device answered every command it was sent.
    pub fn into_results(self, expected: usize) -> Result<Vec<Value>> {
        if let Some(error) = self.error {
            let errors = error.command_errors();
            return Err(EapiError::Command {
                code: error.code,
                message: error.message,
                errors,
            });
        }

        let results = self
            .result
            .ok_or_else(|| EapiError::Protocol("response has neither result nor error".into()))?;

        if results.len() != expected {
            return Err(EapiError::Protocol(format!(
                "expected {} results, got {}",
                expected,
                results.len()
            )));
        }

        Ok(results)
    }
}
