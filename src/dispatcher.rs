// src/dispatcher.rs
// Tool dispatch algorithm (§4.2): catalog lookup, introspection bypass,
// the validation pipeline, session/project resolution, handler
// invocation, error wrapping.
//
// Grounded on crates/mira-server/src/mcp/mod.rs's call_tool loop (catalog
// lookup -> deserialize args -> call handler -> wrap result), adapted to
// run validation explicitly instead of relying on rmcp's schemars-derived
// deserialization.

use std::sync::Arc;
use std::time::Instant;

use serde_json::Value;
use tracing::{info, warn};

use crate::catalog::{self, is_introspection_tool};
use crate::db::pool::DatabasePool;
use crate::embeddings::Embedder;
use crate::error::{AidisError, Result};
use crate::handlers;
use crate::orchestrator::SessionOrchestrator;
use crate::validation;

/// Process-lifetime collaborators shared by every dispatched call.
pub struct AppState {
    pub pool: Arc<DatabasePool>,
    pub embedder: Arc<dyn Embedder>,
    pub orchestrator: Arc<SessionOrchestrator>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pool: Arc<DatabasePool>, embedder: Arc<dyn Embedder>, orchestrator: Arc<SessionOrchestrator>) -> Self {
        Self {
            pool,
            embedder,
            orchestrator,
            started_at: Instant::now(),
        }
    }
}

/// Everything a handler needs for one call: the shared state plus which
/// session is calling (§4.4).
pub struct RequestContext {
    pub state: Arc<AppState>,
    pub session_key: String,
}

impl RequestContext {
    pub fn new(state: Arc<AppState>, session_key: impl Into<String>) -> Self {
        Self {
            state,
            session_key: session_key.into(),
        }
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.state.pool
    }

    pub fn embedder(&self) -> &Arc<dyn Embedder> {
        &self.state.embedder
    }

    pub fn orchestrator(&self) -> &SessionOrchestrator {
        &self.state.orchestrator
    }
}

/// Run one tool call end to end. Returns the handler's JSON result or a
/// structured `AidisError`; never panics on bad input (§7).
pub async fn dispatch(ctx: &RequestContext, tool_name: &str, raw_args: Value) -> Result<Value> {
    let started = Instant::now();

    let Some(entry) = catalog::lookup(tool_name) else {
        warn!(tool = tool_name, "unknown tool requested");
        return Err(AidisError::UnknownTool(tool_name.to_string()));
    };

    // Introspection tools bypass the full pipeline: no session/project
    // resolution is attempted, and they accept loose input (§4.2).
    let result = if is_introspection_tool(tool_name) {
        handlers::introspection::dispatch(ctx, tool_name, &raw_args).await
    } else {
        let args = validation::validate(&entry.schema, &raw_args)?;
        handlers::dispatch(ctx, tool_name, args).await
    };

    log_outcome(tool_name, started, &result);
    result
}

fn log_outcome(tool_name: &str, started: Instant, result: &Result<Value>) {
    let elapsed_ms = started.elapsed().as_millis();
    match result {
        Ok(_) => info!(tool = tool_name, elapsed_ms, "tool call succeeded"),
        Err(e) => warn!(tool = tool_name, elapsed_ms, kind = e.kind(), "tool call failed"),
    }
}
