//! Stdio protocol server.
//!
//! Newline-delimited JSON-RPC 2.0: one request per line in, one response per
//! line out. Requests are handled strictly in order, each running to
//! completion before the next line is read.

use std::io::{BufRead, Write};

use serde_json::{json, Value};

use crate::config::ServerConfig;
use crate::error::{Error, Result};
use crate::resources::{self, JSON_MIME};
use crate::task::TaskStore;
use crate::tools;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub mod error_codes {
    pub const PARSE_ERROR: i64 = -32700;
    pub const INVALID_REQUEST: i64 = -32600;
    pub const METHOD_NOT_FOUND: i64 = -32601;
    pub const INVALID_PARAMS: i64 = -32602;
    pub const INTERNAL_ERROR: i64 = -32603;
}

pub struct Server {
    store: TaskStore,
    config: ServerConfig,
}

impl Server {
    pub fn new(store: TaskStore, config: ServerConfig) -> Self {
        Self { store, config }
    }

    /// Serve until `reader` reaches end of input
    ///
    /// Lines that are not UTF-8 get a parse error reply; only reader and
    /// writer failures end the loop.
    pub fn run<R: BufRead, W: Write>(&self, mut reader: R, mut writer: W) -> Result<()> {
        tracing::info!(
            name = %self.config.name,
            root = %self.store.storage().root().display(),
            "server started"
        );
        let mut buf = Vec::new();
        loop {
            buf.clear();
            if reader.read_until(b'\n', &mut buf)? == 0 {
                break;
            }
            let response = match std::str::from_utf8(&buf) {
                Ok(line) if line.trim().is_empty() => continue,
                Ok(line) => self.handle_line(line.trim_end_matches(['\n', '\r'])),
                Err(err) => Some(error_response(
                    Value::Null,
                    error_codes::PARSE_ERROR,
                    format!("Parse error: {err}"),
                )),
            };
            if let Some(response) = response {
                writeln!(writer, "{response}")?;
                writer.flush()?;
            }
        }
        tracing::info!("input closed, server stopping");
        Ok(())
    }

    /// Handle one raw line; `None` for notifications
    pub fn handle_line(&self, line: &str) -> Option<Value> {
        match serde_json::from_str::<Value>(line) {
            Ok(request) => self.handle_request(&request),
            Err(err) => Some(error_response(
                Value::Null,
                error_codes::PARSE_ERROR,
                format!("Parse error: {err}"),
            )),
        }
    }

    pub fn handle_request(&self, request: &Value) -> Option<Value> {
        let id = request.get("id").cloned();
        let Some(method) = request.get("method").and_then(Value::as_str) else {
            return id.map(|id| {
                error_response(id, error_codes::INVALID_REQUEST, "Missing method".to_string())
            });
        };
        let params = request.get("params").cloned().unwrap_or_else(|| json!({}));

        if method.starts_with("notifications/") {
            tracing::debug!(method, "notification");
            return None;
        }
        let id = id?;

        tracing::debug!(method, "request");
        let outcome = match method {
            "initialize" => Ok(self.initialize()),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": tools::tool_definitions() })),
            "tools/call" => self.call_tool(&params),
            "resources/list" => Ok(json!({
                "resources": resources::list_resources(&self.store, &self.config.uri_scheme)
            })),
            "resources/read" => self.read_resource(&params),
            _ => {
                return Some(error_response(
                    id,
                    error_codes::METHOD_NOT_FOUND,
                    format!("Method not found: {method}"),
                ))
            }
        };

        Some(match outcome {
            Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
            Err(err) => {
                let code = rpc_code(&err);
                if code == error_codes::INTERNAL_ERROR {
                    tracing::error!(method, error = %err, "request failed");
                }
                error_response(id, code, err.to_string())
            }
        })
    }

    fn initialize(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {},
                "resources": {}
            },
            "serverInfo": {
                "name": self.config.name,
                "version": env!("CARGO_PKG_VERSION")
            }
        })
    }

    fn call_tool(&self, params: &Value) -> Result<Value> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidArguments("tools/call requires a tool name".to_string()))?;
        let arguments = match params.get("arguments") {
            None | Some(Value::Null) => json!({}),
            Some(arguments) => arguments.clone(),
        };
        let output = tools::call_tool(&self.store, name, &arguments)?;
        Ok(serde_json::to_value(output)?)
    }

    fn read_resource(&self, params: &Value) -> Result<Value> {
        let uri = params
            .get("uri")
            .and_then(Value::as_str)
            .ok_or_else(|| Error::InvalidArguments("resources/read requires a uri".to_string()))?;
        let text = resources::read_resource(&self.store, &self.config.uri_scheme, uri)?;
        Ok(json!({
            "contents": [{ "uri": uri, "mimeType": JSON_MIME, "text": text }]
        }))
    }
}

fn rpc_code(err: &Error) -> i64 {
    match err {
        Error::UnknownOperation(_)
        | Error::InvalidArguments(_)
        | Error::UnknownResource(_)
        | Error::Validation(_) => error_codes::INVALID_PARAMS,
        _ => error_codes::INTERNAL_ERROR,
    }
}

fn error_response(id: Value, code: i64, message: String) -> Value {
    json!({
        "jsonrpc": "2.0",
        "id": id,
        "error": { "code": code, "message": message }
    })
}
