// src/transport/http.rs
// The HTTP/JSON transport (§4.1, §6).
//
// Grounded on the route-table/axum-Router shape used throughout the pack
// for HTTP surfaces (trace + timeout middleware layered over a small
// handler set); the teacher does not expose tools over HTTP itself, so
// the handlers are new, but the middleware stack and readiness/liveness
// split follow conventional axum service wiring.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::extract::{ConnectInfo, Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::catalog;
use crate::dispatcher::{self, AppState, RequestContext};

const READYZ_STALENESS: Duration = Duration::from_secs(30);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Caches the last successful connectivity check so `/readyz` (§4.1) only
/// hits the database when the cached result has gone stale, rather than
/// on every probe.
struct ReadinessCache {
    last_ok: Mutex<Option<Instant>>,
}

impl ReadinessCache {
    fn new() -> Self {
        Self {
            last_ok: Mutex::new(None),
        }
    }

    async fn is_ready(&self, pool: &crate::db::pool::DatabasePool) -> bool {
        {
            let last = self.last_ok.lock().await;
            if let Some(t) = *last {
                if t.elapsed() < READYZ_STALENESS {
                    return true;
                }
            }
        }
        let ok = pool.check_connectivity().await;
        if ok {
            *self.last_ok.lock().await = Some(Instant::now());
        }
        ok
    }
}

#[derive(Clone)]
struct HttpState {
    app: Arc<AppState>,
    readiness: Arc<ReadinessCache>,
}

pub fn router(app: Arc<AppState>) -> Router {
    let state = HttpState {
        app,
        readiness: Arc::new(ReadinessCache::new()),
    };

    Router::new()
        .route("/mcp/tools/{tool_name}", post(call_tool))
        .route("/mcp/tools", get(list_tools))
        .route("/mcp/tools/schemas", get(list_schemas))
        .route("/healthz", get(healthz))
        .route("/readyz", get(readyz))
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

#[derive(Debug, Deserialize, Default)]
struct CallToolBody {
    #[serde(default)]
    arguments: Value,
}

/// `X-Session-Id` identifies the caller's logical session across
/// requests; callers that omit it fall back to their remote address,
/// which is stable enough for a single long-lived HTTP client but not
/// across a client restart (see DESIGN.md's Open Question decision).
fn resolve_session_key(headers: &HeaderMap, addr: SocketAddr) -> String {
    headers
        .get("x-session-id")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| addr.to_string())
}

async fn call_tool(
    State(state): State<HttpState>,
    headers: HeaderMap,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Path(tool_name): Path<String>,
    body: Option<Json<CallToolBody>>,
) -> impl IntoResponse {
    let session_key = resolve_session_key(&headers, addr);
    let arguments = body.map(|Json(b)| b.arguments).unwrap_or(Value::Null);

    let ctx = RequestContext::new(state.app.clone(), session_key);
    match dispatcher::dispatch(&ctx, &tool_name, arguments).await {
        Ok(result) => (StatusCode::OK, Json(json!({ "success": true, "result": result }))),
        Err(err) => {
            let status = StatusCode::from_u16(err.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (status, Json(json!({ "success": false, "error": err.to_user_string() })))
        }
    }
}

async fn list_tools() -> Json<Value> {
    let tools: Vec<Value> = catalog::CATALOG
        .iter()
        .map(|e| json!({ "name": e.name, "description": e.description, "category": e.category }))
        .collect();
    Json(json!({ "tools": tools }))
}

/// Must report the same name set and argument schemas as `aidis_help` and
/// the stream transport's `tools/list` (P1) — all three read from
/// `catalog::CATALOG`.
async fn list_schemas() -> Json<Value> {
    Json(serde_json::to_value(catalog::CATALOG.iter().collect::<Vec<_>>()).unwrap_or_else(|_| json!([])))
}

async fn healthz() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn readyz(State(state): State<HttpState>) -> impl IntoResponse {
    if state.readiness.is_ready(&state.app.pool).await {
        (StatusCode::OK, Json(json!({ "status": "ok" })))
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, Json(json!({ "status": "unavailable" })))
    }
}
