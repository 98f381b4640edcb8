// src/handlers/project.rs
// project_create / project_list / project_current / project_switch /
// project_set_primary (§3, §4.4, §10).

use serde_json::{Map, Value};
use uuid::Uuid;

use crate::db::project as project_db;
use crate::dispatcher::RequestContext;
use crate::error::{AidisError, Result};
use crate::handlers::args::{get_opt_str, get_str};
use crate::models::Project;

pub async fn create(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let name = get_str(&args, "name")?;
    let description = get_opt_str(&args, "description");
    let project = project_db::create_project(ctx.pool(), name, description).await?;
    Ok(serde_json::to_value(project)?)
}

pub async fn list(ctx: &RequestContext, _args: Map<String, Value>) -> Result<Value> {
    let projects = project_db::list_projects(ctx.pool()).await?;
    Ok(serde_json::to_value(projects)?)
}

pub async fn current(ctx: &RequestContext, _args: Map<String, Value>) -> Result<Value> {
    let project_id = ctx.orchestrator().require_current_project(&ctx.session_key).await?;
    let project = project_db::get_project_by_id(ctx.pool(), project_id).await?;
    Ok(serde_json::to_value(project)?)
}

/// `project_switch` and `project_set_primary` both accept either a
/// `projectId` or a `name` to identify the target project.
async fn resolve_project_ref(ctx: &RequestContext, args: &Map<String, Value>) -> Result<Project> {
    if let Some(id) = get_opt_str(args, "projectId") {
        let id = Uuid::parse_str(id).map_err(|_| AidisError::validation("projectId", "not a valid uuid"))?;
        return project_db::get_project_by_id(ctx.pool(), id).await;
    }
    if let Some(name) = get_opt_str(args, "name") {
        return project_db::get_project_by_name(ctx.pool(), name).await;
    }
    Err(AidisError::validation("projectId", "either projectId or name is required"))
}

pub async fn switch(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let project = resolve_project_ref(ctx, &args).await?;
    ctx.orchestrator().set_current_project(&ctx.session_key, project.id).await?;
    Ok(serde_json::to_value(project)?)
}

/// Promotes a project to primary, then clears the orchestrator's session
/// cache so every session's next lookup re-runs the cascade and observes
/// the new primary immediately (§4.4's "primary-first, not cache-first").
pub async fn set_primary(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let target = resolve_project_ref(ctx, &args).await?;
    let promoted = project_db::set_primary_project(ctx.pool(), target.id).await?;
    ctx.orchestrator().clear().await;
    Ok(serde_json::to_value(promoted)?)
}
