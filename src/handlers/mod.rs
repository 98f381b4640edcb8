// src/handlers/mod.rs
// One module per tool category (§10), dispatched by name after the
// validation pipeline has already normalized and checked the arguments.

pub mod args;
pub mod context;
pub mod decision;
pub mod introspection;
pub mod project;
pub mod session;
pub mod task;

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::dispatcher::RequestContext;
use crate::error::{AidisError, Result};
use crate::handlers::args::get_opt_str;

pub async fn dispatch(ctx: &RequestContext, tool_name: &str, args: Map<String, Value>) -> Result<Value> {
    match tool_name {
        "project_create" => project::create(ctx, args).await,
        "project_list" => project::list(ctx, args).await,
        "project_current" => project::current(ctx, args).await,
        "project_switch" => project::switch(ctx, args).await,
        "project_set_primary" => project::set_primary(ctx, args).await,

        "session_status" => session::status(ctx, args).await,
        "session_end" => session::end(ctx, args).await,

        "context_store" => context::store(ctx, args).await,
        "context_search" => context::search(ctx, args).await,
        "context_get_recent" => context::get_recent(ctx, args).await,
        "context_stats" => context::stats(ctx, args).await,

        "decision_record" => decision::record(ctx, args).await,
        "decision_list" => decision::list(ctx, args).await,
        "decision_update" => decision::update(ctx, args).await,

        "task_create" => task::create(ctx, args).await,
        "task_list" => task::list(ctx, args).await,
        "task_update" => task::update(ctx, args).await,

        other => Err(AidisError::UnknownTool(other.to_string())),
    }
}

/// Shared by context/decision/task handlers: an explicit `projectId`
/// argument wins; otherwise fall back to the calling session's resolved
/// current project (§4.4 cascade step 5 raises `MissingProject` if that
/// is also absent).
pub(crate) async fn resolve_project_id(ctx: &RequestContext, args: &Map<String, Value>) -> Result<Uuid> {
    if let Some(id_str) = get_opt_str(args, "projectId") {
        return Uuid::parse_str(id_str).map_err(|_| AidisError::validation("projectId", "not a valid uuid"));
    }
    ctx.orchestrator().require_current_project(&ctx.session_key).await
}
