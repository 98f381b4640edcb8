// src/db/task.rs
// Task CRUD with acyclic-dependency enforcement (§3, P11).

use uuid::Uuid;

use crate::db::pool::DatabasePool;
use crate::error::{AidisError, Result};
use crate::models::Task;

pub struct CreateTaskParams<'a> {
    pub project_id: Uuid,
    pub session_id: Option<Uuid>,
    pub title: &'a str,
    pub description: Option<&'a str>,
    pub priority: &'a str,
    pub depends_on: &'a [Uuid],
}

/// Returns `Conflict` if `depends_on` is not entirely within `project_id`'s
/// tasks (cross-project dependency is never valid, and a dangling
/// reference would otherwise silently pass).
pub async fn create_task(pool: &DatabasePool, params: CreateTaskParams<'_>) -> Result<Task> {
    if !params.depends_on.is_empty() {
        validate_dependency_ids(pool, params.project_id, params.depends_on).await?;
    }

    let task: Task = sqlx::query_as(
        r#"
        INSERT INTO tasks (project_id, session_id, title, description, priority, depends_on)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, project_id, session_id, title, description, status, priority, assignee,
                  depends_on, created_at, updated_at
        "#,
    )
    .bind(params.project_id)
    .bind(params.session_id)
    .bind(params.title)
    .bind(params.description)
    .bind(params.priority)
    .bind(params.depends_on)
    .fetch_one(pool.pg())
    .await?;
    Ok(task)
}

pub async fn list_tasks(
    pool: &DatabasePool,
    project_id: Uuid,
    status_filter: Option<&str>,
) -> Result<Vec<Task>> {
    let tasks = sqlx::query_as::<_, Task>(
        r#"
        SELECT id, project_id, session_id, title, description, status, priority, assignee,
               depends_on, created_at, updated_at
        FROM tasks
        WHERE project_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(project_id)
    .bind(status_filter)
    .fetch_all(pool.pg())
    .await?;
    Ok(tasks)
}

pub async fn get_task(pool: &DatabasePool, id: Uuid) -> Result<Task> {
    sqlx::query_as::<_, Task>(
        r#"
        SELECT id, project_id, session_id, title, description, status, priority, assignee,
               depends_on, created_at, updated_at
        FROM tasks WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool.pg())
    .await?
    .ok_or_else(|| AidisError::not_found("task"))
}

/// Update a task's status/priority. Enforces the two invariants in §3:
/// the dependency graph stays acyclic, and a task may only enter
/// `completed` if all its dependencies are `completed` or `cancelled`.
pub async fn update_task(
    pool: &DatabasePool,
    id: Uuid,
    status: Option<&str>,
    priority: Option<&str>,
) -> Result<Task> {
    let current = get_task(pool, id).await?;

    if status == Some("completed") {
        let unmet = unmet_dependencies(pool, &current.depends_on).await?;
        if !unmet.is_empty() {
            return Err(AidisError::Conflict(
                "task has dependencies that are neither completed nor cancelled".to_string(),
            ));
        }
    }

    let task: Option<Task> = sqlx::query_as(
        r#"
        UPDATE tasks SET
            status = COALESCE($2, status),
            priority = COALESCE($3, priority),
            updated_at = now()
        WHERE id = $1
        RETURNING id, project_id, session_id, title, description, status, priority, assignee,
                  depends_on, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(priority)
    .fetch_optional(pool.pg())
    .await?;

    task.ok_or_else(|| AidisError::not_found("task"))
}

/// Rewrite a task's dependency list, rejecting any change that would
/// introduce a cycle (P11). No row is written if the graph would become
/// cyclic.
pub async fn set_task_dependencies(pool: &DatabasePool, id: Uuid, depends_on: &[Uuid]) -> Result<Task> {
    let current = get_task(pool, id).await?;
    validate_dependency_ids(pool, current.project_id, depends_on).await?;

    if would_create_cycle(pool, id, depends_on).await? {
        return Err(AidisError::Conflict(
            "dependency graph would contain a cycle".to_string(),
        ));
    }

    let task: Task = sqlx::query_as(
        r#"
        UPDATE tasks SET depends_on = $2, updated_at = now()
        WHERE id = $1
        RETURNING id, project_id, session_id, title, description, status, priority, assignee,
                  depends_on, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(depends_on)
    .fetch_one(pool.pg())
    .await?;
    Ok(task)
}

async fn validate_dependency_ids(pool: &DatabasePool, project_id: Uuid, ids: &[Uuid]) -> Result<()> {
    let (count,): (i64,) = sqlx::query_as(
        "SELECT count(*) FROM tasks WHERE project_id = $1 AND id = ANY($2)",
    )
    .bind(project_id)
    .bind(ids)
    .fetch_one(pool.pg())
    .await?;
    if count as usize != ids.len() {
        return Err(AidisError::validation(
            "dependsOn",
            "one or more dependency ids do not exist in this project",
        ));
    }
    Ok(())
}

async fn unmet_dependencies(pool: &DatabasePool, depends_on: &[Uuid]) -> Result<Vec<Uuid>> {
    if depends_on.is_empty() {
        return Ok(Vec::new());
    }
    let unmet: Vec<(Uuid,)> = sqlx::query_as(
        "SELECT id FROM tasks WHERE id = ANY($1) AND status NOT IN ('completed', 'cancelled')",
    )
    .bind(depends_on)
    .fetch_all(pool.pg())
    .await?;
    Ok(unmet.into_iter().map(|(id,)| id).collect())
}

/// Whether adding `new_depends_on` as `task_id`'s dependency list would
/// make the graph cyclic, i.e. whether `task_id` is transitively reachable
/// from any of `new_depends_on` via the existing `depends_on` edges.
async fn would_create_cycle(pool: &DatabasePool, task_id: Uuid, new_depends_on: &[Uuid]) -> Result<bool> {
    if new_depends_on.contains(&task_id) {
        return Ok(true);
    }
    if new_depends_on.is_empty() {
        return Ok(false);
    }

    let reachable: Vec<(Uuid,)> = sqlx::query_as(
        r#"
        WITH RECURSIVE reach(id) AS (
            SELECT unnest($1::uuid[])
            UNION
            SELECT unnest(t.depends_on)
            FROM tasks t
            JOIN reach r ON t.id = r.id
        )
        SELECT id FROM reach WHERE id = $2
        "#,
    )
    .bind(new_depends_on)
    .bind(task_id)
    .fetch_all(pool.pg())
    .await?;

    Ok(!reachable.is_empty())
}

// The recursive cycle-detection query above requires a live Postgres
// instance to exercise; validation.rs and orchestrator::tests carry this
// crate's unit coverage that doesn't need one.
