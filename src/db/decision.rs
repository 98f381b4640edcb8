// src/db/decision.rs
// Technical decision CRUD (§3).

use uuid::Uuid;

use crate::db::pool::DatabasePool;
use crate::error::{AidisError, Result};
use crate::models::TechnicalDecision;

pub struct RecordDecisionParams<'a> {
    pub project_id: Uuid,
    pub title: &'a str,
    pub problem: &'a str,
    pub decision: &'a str,
    pub rationale: &'a str,
    pub alternatives_considered: &'a [String],
    pub impact_level: &'a str,
    pub decision_type: &'a str,
}

pub async fn record_decision(
    pool: &DatabasePool,
    params: RecordDecisionParams<'_>,
) -> Result<TechnicalDecision> {
    let decision: TechnicalDecision = sqlx::query_as(
        r#"
        INSERT INTO technical_decisions
            (project_id, title, problem, decision, rationale, alternatives_considered, impact_level, decision_type)
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
        RETURNING id, project_id, title, problem, decision, rationale, alternatives_considered,
                  impact_level, decision_type, status, superseded_by, outcome, created_at, updated_at
        "#,
    )
    .bind(params.project_id)
    .bind(params.title)
    .bind(params.problem)
    .bind(params.decision)
    .bind(params.rationale)
    .bind(params.alternatives_considered)
    .bind(params.impact_level)
    .bind(params.decision_type)
    .fetch_one(pool.pg())
    .await?;
    Ok(decision)
}

pub async fn list_decisions(
    pool: &DatabasePool,
    project_id: Uuid,
    status_filter: Option<&str>,
) -> Result<Vec<TechnicalDecision>> {
    let decisions = sqlx::query_as::<_, TechnicalDecision>(
        r#"
        SELECT id, project_id, title, problem, decision, rationale, alternatives_considered,
               impact_level, decision_type, status, superseded_by, outcome, created_at, updated_at
        FROM technical_decisions
        WHERE project_id = $1 AND ($2::text IS NULL OR status = $2)
        ORDER BY created_at DESC
        "#,
    )
    .bind(project_id)
    .bind(status_filter)
    .fetch_all(pool.pg())
    .await?;
    Ok(decisions)
}

pub async fn get_decision(pool: &DatabasePool, id: Uuid) -> Result<TechnicalDecision> {
    sqlx::query_as::<_, TechnicalDecision>(
        r#"
        SELECT id, project_id, title, problem, decision, rationale, alternatives_considered,
               impact_level, decision_type, status, superseded_by, outcome, created_at, updated_at
        FROM technical_decisions WHERE id = $1
        "#,
    )
    .bind(id)
    .fetch_optional(pool.pg())
    .await?
    .ok_or_else(|| AidisError::not_found("technical_decision"))
}

/// Update status/outcome. Enforces §3's invariant: a decision moving into
/// `superseded` must carry a `superseded_by` reference.
pub async fn update_decision(
    pool: &DatabasePool,
    id: Uuid,
    status: Option<&str>,
    superseded_by: Option<Uuid>,
    outcome: Option<&str>,
) -> Result<TechnicalDecision> {
    if status == Some("superseded") && superseded_by.is_none() {
        return Err(AidisError::validation(
            "supersededBy",
            "required when status is 'superseded'",
        ));
    }

    let decision: Option<TechnicalDecision> = sqlx::query_as(
        r#"
        UPDATE technical_decisions SET
            status = COALESCE($2, status),
            superseded_by = COALESCE($3, superseded_by),
            outcome = COALESCE($4, outcome),
            updated_at = now()
        WHERE id = $1
        RETURNING id, project_id, title, problem, decision, rationale, alternatives_considered,
                  impact_level, decision_type, status, superseded_by, outcome, created_at, updated_at
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(superseded_by)
    .bind(outcome)
    .fetch_optional(pool.pg())
    .await?;

    decision.ok_or_else(|| AidisError::not_found("technical_decision"))
}
