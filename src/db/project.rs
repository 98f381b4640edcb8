// src/db/project.rs
// Project CRUD and primary-project promotion (§3, §4.4, §6, P5, P6).
//
// Grounded on crates/mira-server/src/db/project.rs's get_or_create_project
// shape, adapted from integer-PK SQLite upserts to UUID-PK Postgres rows
// with a JSONB `is_primary` flag.

use uuid::Uuid;

use crate::db::pool::DatabasePool;
use crate::error::{AidisError, Result};
use crate::models::Project;

pub async fn create_project(
    pool: &DatabasePool,
    name: &str,
    description: Option<&str>,
) -> Result<Project> {
    let existing: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM projects WHERE name = $1")
        .bind(name)
        .fetch_optional(pool.pg())
        .await?;
    if existing.is_some() {
        return Err(AidisError::Conflict(format!(
            "a project named '{}' already exists",
            name
        )));
    }

    let project: Project = sqlx::query_as(
        r#"
        INSERT INTO projects (name, description)
        VALUES ($1, $2)
        RETURNING id, name, description, metadata, created_at, updated_at
        "#,
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool.pg())
    .await?;

    Ok(project)
}

pub async fn list_projects(pool: &DatabasePool) -> Result<Vec<Project>> {
    let projects = sqlx::query_as::<_, Project>(
        "SELECT id, name, description, metadata, created_at, updated_at FROM projects ORDER BY name",
    )
    .fetch_all(pool.pg())
    .await?;
    Ok(projects)
}

pub async fn get_project_by_id(pool: &DatabasePool, id: Uuid) -> Result<Project> {
    sqlx::query_as::<_, Project>(
        "SELECT id, name, description, metadata, created_at, updated_at FROM projects WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool.pg())
    .await?
    .ok_or_else(|| AidisError::not_found("project"))
}

pub async fn get_project_by_name(pool: &DatabasePool, name: &str) -> Result<Project> {
    sqlx::query_as::<_, Project>(
        "SELECT id, name, description, metadata, created_at, updated_at FROM projects WHERE name = $1",
    )
    .bind(name)
    .fetch_optional(pool.pg())
    .await?
    .ok_or_else(|| AidisError::not_found("project"))
}

/// The project flagged `is_primary=true`, if any (§4.4 cascade step 1).
pub async fn get_primary_project(pool: &DatabasePool) -> Result<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(
        r#"
        SELECT id, name, description, metadata, created_at, updated_at
        FROM projects
        WHERE metadata->>'is_primary' = 'true'
        LIMIT 1
        "#,
    )
    .fetch_optional(pool.pg())
    .await?;
    Ok(project)
}

/// The conventionally-named bootstrap project (§4.4 cascade step 3, see
/// DESIGN.md Open Question: fixed to the literal name "default").
pub async fn get_bootstrap_project(pool: &DatabasePool) -> Result<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(
        "SELECT id, name, description, metadata, created_at, updated_at FROM projects WHERE name = 'default'",
    )
    .fetch_optional(pool.pg())
    .await?;
    Ok(project)
}

/// Any project, for the unordered-scan fallback (§4.4 cascade step 4).
pub async fn get_any_project(pool: &DatabasePool) -> Result<Option<Project>> {
    let project = sqlx::query_as::<_, Project>(
        "SELECT id, name, description, metadata, created_at, updated_at FROM projects LIMIT 1",
    )
    .fetch_optional(pool.pg())
    .await?;
    Ok(project)
}

/// Promote `id` to primary, atomically clearing the previous primary in
/// the same transaction (§4.4's "Rule — primary-first, not cache-first").
/// The caller is responsible for clearing the orchestrator's session map
/// afterward (see `orchestrator::SessionOrchestrator::clear`). Wrapped in
/// §7's at-most-once retry since a transient pool timeout here would
/// otherwise surface as a user-visible `DatabaseError` on an operation
/// P6 requires to be atomic and reliable.
pub async fn set_primary_project(pool: &DatabasePool, id: Uuid) -> Result<Project> {
    pool.run_with_retry(|| set_primary_project_once(pool, id)).await
}

async fn set_primary_project_once(pool: &DatabasePool, id: Uuid) -> Result<Project> {
    let mut tx = pool.pg().begin().await?;

    sqlx::query(
        r#"
        UPDATE projects
        SET metadata = metadata - 'is_primary', updated_at = now()
        WHERE metadata->>'is_primary' = 'true'
        "#,
    )
    .execute(&mut *tx)
    .await?;

    let project: Option<Project> = sqlx::query_as(
        r#"
        UPDATE projects
        SET metadata = jsonb_set(metadata, '{is_primary}', 'true'::jsonb, true), updated_at = now()
        WHERE id = $1
        RETURNING id, name, description, metadata, created_at, updated_at
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *tx)
    .await?;

    let project = match project {
        Some(p) => p,
        None => {
            tx.rollback().await?;
            return Err(AidisError::not_found("project"));
        }
    };

    tx.commit().await?;
    Ok(project)
}

// This module's queries require a live Postgres instance to exercise and
// have no meaningful fake to substitute; the cascade logic built on top
// of them (orchestrator::resolve_current_project) is covered by
// orchestrator::tests instead.
