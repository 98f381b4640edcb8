// src/handlers/task.rs
// task_create / task_list / task_update (§3, §10, P11).

use serde_json::{Map, Value};

use crate::db::task as task_db;
use crate::dispatcher::RequestContext;
use crate::error::Result;
use crate::handlers::args::{get_opt_str, get_str, get_uuid, get_uuid_vec};
use crate::handlers::resolve_project_id;
use crate::orchestrator::ActivityKind;

pub async fn create(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let project_id = resolve_project_id(ctx, &args).await?;
    let title = get_str(&args, "title")?;
    let description = get_opt_str(&args, "description");
    let priority = get_str(&args, "priority")?;
    let depends_on = get_uuid_vec(&args, "dependsOn")?;

    let (session_id, _) = ctx.orchestrator().resolve(&ctx.session_key, None).await?;

    let task = task_db::create_task(
        ctx.pool(),
        task_db::CreateTaskParams {
            project_id,
            session_id: Some(session_id),
            title,
            description,
            priority,
            depends_on: &depends_on,
        },
    )
    .await?;

    ctx.orchestrator()
        .record(&ctx.session_key, ActivityKind::TaskCreated)
        .await?;

    Ok(serde_json::to_value(task)?)
}

pub async fn list(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let project_id = resolve_project_id(ctx, &args).await?;
    let status = get_opt_str(&args, "status");
    let tasks = task_db::list_tasks(ctx.pool(), project_id, status).await?;
    Ok(serde_json::to_value(tasks)?)
}

/// Records `TaskCompleted` instead of `TaskUpdated` when the update moves
/// a task into the `completed` status, matching §4.4's separate counter
/// for completions. A `dependsOn` rewrite is applied first so a status
/// change to `completed` in the same call observes the new dependency
/// list (P11 covers both creating and updating a task's dependencies).
pub async fn update(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let id = get_uuid(&args, "taskId")?;
    let status = get_opt_str(&args, "status");
    let priority = get_opt_str(&args, "priority");
    let completing = status == Some("completed");

    if args.contains_key("dependsOn") {
        let depends_on = get_uuid_vec(&args, "dependsOn")?;
        task_db::set_task_dependencies(ctx.pool(), id, &depends_on).await?;
    }

    let task = task_db::update_task(ctx.pool(), id, status, priority).await?;

    let kind = if completing {
        ActivityKind::TaskCompleted
    } else {
        ActivityKind::TaskUpdated
    };
    ctx.orchestrator().record(&ctx.session_key, kind).await?;

    Ok(serde_json::to_value(task)?)
}
