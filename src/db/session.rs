// src/db/session.rs
// Session row persistence: creation, counter flush, idle-expiry close
// (§3, §4.4).

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::db::pool::DatabasePool;
use crate::error::{AidisError, Result};
use crate::models::Session;
use crate::orchestrator::ActivityCounters;

pub async fn create_session(
    pool: &DatabasePool,
    display_id: &str,
    project_id: Option<Uuid>,
    agent_type: Option<&str>,
) -> Result<Session> {
    let session: Session = sqlx::query_as(
        r#"
        INSERT INTO sessions (display_id, project_id, agent_type)
        VALUES ($1, $2, $3)
        RETURNING id, display_id, project_id, agent_type, title, description,
                  started_at, ended_at, input_tokens, output_tokens, total_tokens,
                  contexts_created, tasks_created, tasks_updated, tasks_completed
        "#,
    )
    .bind(display_id)
    .bind(project_id)
    .bind(agent_type)
    .fetch_one(pool.pg())
    .await?;
    Ok(session)
}

pub async fn get_session(pool: &DatabasePool, id: Uuid) -> Result<Session> {
    sqlx::query_as::<_, Session>(
        r#"
        SELECT id, display_id, project_id, agent_type, title, description,
               started_at, ended_at, input_tokens, output_tokens, total_tokens,
               contexts_created, tasks_created, tasks_updated, tasks_completed
        FROM sessions WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool.pg())
    .await?
    .ok_or_else(|| AidisError::not_found("session"))
}

/// Flush in-memory activity counters to the database (§4.4's periodic
/// flush timer and end-of-session flush). Additive: counters are
/// monotonically non-decreasing, so this adds the delta accumulated since
/// the last flush rather than overwriting.
pub async fn add_activity_counters(
    pool: &DatabasePool,
    session_id: Uuid,
    delta: &ActivityCounters,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE sessions SET
            input_tokens = input_tokens + $2,
            output_tokens = output_tokens + $3,
            total_tokens = total_tokens + $4,
            contexts_created = contexts_created + $5,
            tasks_created = tasks_created + $6,
            tasks_updated = tasks_updated + $7,
            tasks_completed = tasks_completed + $8
        WHERE id = $1
        "#,
    )
    .bind(session_id)
    .bind(delta.input_tokens)
    .bind(delta.output_tokens)
    .bind(delta.total_tokens)
    .bind(delta.contexts_created)
    .bind(delta.tasks_created)
    .bind(delta.tasks_updated)
    .bind(delta.tasks_completed)
    .execute(pool.pg())
    .await?;
    Ok(())
}

/// Mark a session ended (§4.4 lifecycle: ACTIVE/IDLE_EXPIRED → ENDED).
pub async fn end_session(pool: &DatabasePool, session_id: Uuid, ended_at: DateTime<Utc>) -> Result<()> {
    sqlx::query("UPDATE sessions SET ended_at = $2 WHERE id = $1 AND ended_at IS NULL")
        .bind(session_id)
        .bind(ended_at)
        .execute(pool.pg())
        .await?;
    Ok(())
}

pub async fn update_session_project(
    pool: &DatabasePool,
    session_id: Uuid,
    project_id: Uuid,
) -> Result<()> {
    sqlx::query("UPDATE sessions SET project_id = $2 WHERE id = $1")
        .bind(session_id)
        .bind(project_id)
        .execute(pool.pg())
        .await?;
    Ok(())
}

/// Count of sessions with `ended_at IS NULL`, for `aidis_status` (§4.2).
pub async fn count_open_sessions(pool: &DatabasePool) -> Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT count(*) FROM sessions WHERE ended_at IS NULL")
        .fetch_one(pool.pg())
        .await?;
    Ok(count)
}
