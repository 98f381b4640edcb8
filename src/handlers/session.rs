// src/handlers/session.rs
// session_status / session_end (§4.4, §10).

use serde_json::{Map, Value};

use crate::db::session as session_db;
use crate::dispatcher::RequestContext;
use crate::error::Result;
use crate::orchestrator::SessionLifecycle;

pub async fn status(ctx: &RequestContext, _args: Map<String, Value>) -> Result<Value> {
    let Some((session_id, project_id, lifecycle)) = ctx.orchestrator().session_status(&ctx.session_key).await else {
        return Ok(serde_json::json!({ "lifecycle": "new" }));
    };

    let session = session_db::get_session(ctx.pool(), session_id).await?;
    let lifecycle = match lifecycle {
        SessionLifecycle::Active => "active",
        SessionLifecycle::Ended => "ended",
    };

    Ok(serde_json::json!({
        "sessionId": session.id,
        "lifecycle": lifecycle,
        "currentProjectId": project_id,
        "inputTokens": session.input_tokens,
        "outputTokens": session.output_tokens,
        "totalTokens": session.total_tokens,
        "contextsCreated": session.contexts_created,
        "tasksCreated": session.tasks_created,
        "tasksUpdated": session.tasks_updated,
        "tasksCompleted": session.tasks_completed,
    }))
}

pub async fn end(ctx: &RequestContext, _args: Map<String, Value>) -> Result<Value> {
    ctx.orchestrator().end_session(&ctx.session_key).await?;
    Ok(serde_json::json!({ "ended": true }))
}
