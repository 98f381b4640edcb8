// src/transport/stdio.rs
// The JSON-RPC 2.0 stream transport (§4.1, §6): newline-delimited
// messages on stdin/stdout, log output exclusively on stderr.
//
// Grounded structurally on crates/mira-server/src/cli/serve.rs's
// init-then-serve shape (build collaborators once, then loop), with the
// framing itself written by hand since the teacher delegates framing to
// `rmcp`, which this crate does not depend on.

use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};

use crate::catalog;
use crate::dispatcher::{self, AppState, RequestContext};
use crate::error::AidisError;
use crate::orchestrator::STDIO_SESSION_KEY;

const SERVER_NAME: &str = "aidis";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

const PARSE_ERROR: i64 = -32700;
const INVALID_REQUEST: i64 = -32600;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;
const INTERNAL_ERROR: i64 = -32603;

/// Run the stdio loop until stdin closes or `cancel` fires. One logical
/// client per process, so every call uses the same fixed session key
/// (§4.4).
pub async fn serve(state: std::sync::Arc<AppState>, cancel: CancellationToken) -> std::io::Result<()> {
    let stdin = tokio::io::stdin();
    let mut stdout = tokio::io::stdout();
    let mut reader = BufReader::new(stdin).lines();

    loop {
        let line = tokio::select! {
            line = reader.next_line() => line,
            _ = cancel.cancelled() => break,
        };

        let Some(line) = line? else {
            break; // stdin closed
        };
        if line.trim().is_empty() {
            continue;
        }

        if let Some(response) = handle_line(&state, &line).await {
            let mut out = serde_json::to_string(&response).unwrap_or_else(|_| {
                json!({"jsonrpc": "2.0", "id": Value::Null, "error": {"code": INTERNAL_ERROR, "message": "failed to serialize response"}}).to_string()
            });
            out.push('\n');
            if stdout.write_all(out.as_bytes()).await.is_err() {
                error!("stdout closed, stopping stream transport");
                break;
            }
            let _ = stdout.flush().await;
        }
    }

    Ok(())
}

/// Parse and dispatch one line. Returns `None` for notifications (no
/// response is sent), `Some(response)` otherwise.
async fn handle_line(state: &std::sync::Arc<AppState>, line: &str) -> Option<Value> {
    let parsed: Result<Value, _> = serde_json::from_str(line);
    let request = match parsed {
        Ok(v) => v,
        Err(e) => {
            debug!(error = %e, "malformed JSON-RPC frame");
            return Some(error_response(Value::Null, PARSE_ERROR, "parse error"));
        }
    };

    let Value::Object(ref obj) = request else {
        return Some(error_response(Value::Null, INVALID_REQUEST, "request must be an object"));
    };

    let id = obj.get("id").cloned().unwrap_or(Value::Null);
    let is_notification = !obj.contains_key("id");

    let Some(method) = obj.get("method").and_then(|v| v.as_str()) else {
        return Some(error_response(id, INVALID_REQUEST, "missing method"));
    };
    let params = obj.get("params").cloned().unwrap_or(Value::Null);

    if method.starts_with("notifications/") {
        debug!(method, "received notification");
        return None;
    }

    let result = dispatch_method(state, method, params).await;
    if is_notification {
        return None;
    }

    Some(match result {
        Ok(value) => json!({ "jsonrpc": "2.0", "id": id, "result": value }),
        Err((code, message)) => error_response(id, code, &message),
    })
}

fn error_response(id: Value, code: i64, message: &str) -> Value {
    json!({ "jsonrpc": "2.0", "id": id, "error": { "code": code, "message": message } })
}

async fn dispatch_method(
    state: &std::sync::Arc<AppState>,
    method: &str,
    params: Value,
) -> Result<Value, (i64, String)> {
    match method {
        "initialize" => Ok(json!({
            "serverInfo": { "name": SERVER_NAME, "version": SERVER_VERSION },
            "capabilities": { "tools": { "listChanged": false } },
        })),
        "tools/list" => Ok(json!({
            "tools": catalog::CATALOG.iter().map(tool_list_entry).collect::<Vec<_>>(),
        })),
        "tools/call" => call_tool(state, params).await,
        "resources/list" => Ok(json!({ "resources": [] })),
        "resources/read" => {
            let uri = params.get("uri").and_then(|v| v.as_str()).unwrap_or_default();
            call_tool(state, json!({ "name": uri, "arguments": {} })).await
        }
        other => Err((METHOD_NOT_FOUND, format!("unknown method '{other}'"))),
    }
}

fn tool_list_entry(entry: &catalog::ToolCatalogEntry) -> Value {
    json!({ "name": entry.name, "description": entry.description, "category": entry.category })
}

async fn call_tool(state: &std::sync::Arc<AppState>, params: Value) -> Result<Value, (i64, String)> {
    let Some(name) = params.get("name").and_then(|v| v.as_str()) else {
        return Err((INVALID_PARAMS, "params.name is required".to_string()));
    };
    let arguments = params.get("arguments").cloned().unwrap_or(json!({}));

    let ctx = RequestContext::new(state.clone(), STDIO_SESSION_KEY);
    match dispatcher::dispatch(&ctx, name, arguments).await {
        Ok(value) => Ok(json!({
            "content": [{ "type": "text", "text": value.to_string() }],
        })),
        Err(err) => Err((err.json_rpc_code(), error_message(&err))),
    }
}

fn error_message(err: &AidisError) -> String {
    err.to_user_string()
}
