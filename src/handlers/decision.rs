// src/handlers/decision.rs
// decision_record / decision_list / decision_update (§3, §10).

use serde_json::{Map, Value};

use crate::db::decision as decision_db;
use crate::dispatcher::RequestContext;
use crate::error::Result;
use crate::handlers::args::{get_opt_str, get_opt_string_vec, get_opt_uuid, get_str, get_uuid};
use crate::handlers::resolve_project_id;

pub async fn record(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let project_id = resolve_project_id(ctx, &args).await?;
    let title = get_str(&args, "title")?;
    let problem = get_str(&args, "problem")?;
    let decision_text = get_str(&args, "decision")?;
    let rationale = get_str(&args, "rationale")?;
    let alternatives = get_opt_string_vec(&args, "alternativesConsidered");
    let impact_level = get_str(&args, "impactLevel")?;
    let decision_type = get_str(&args, "decisionType")?;

    let decision = decision_db::record_decision(
        ctx.pool(),
        decision_db::RecordDecisionParams {
            project_id,
            title,
            problem,
            decision: decision_text,
            rationale,
            alternatives_considered: &alternatives,
            impact_level,
            decision_type,
        },
    )
    .await?;

    Ok(serde_json::to_value(decision)?)
}

pub async fn list(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let project_id = resolve_project_id(ctx, &args).await?;
    let status = get_opt_str(&args, "status");
    let decisions = decision_db::list_decisions(ctx.pool(), project_id, status).await?;
    Ok(serde_json::to_value(decisions)?)
}

pub async fn update(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let id = get_uuid(&args, "decisionId")?;
    let status = get_opt_str(&args, "status");
    let superseded_by = get_opt_uuid(&args, "supersededBy")?;
    let outcome = get_opt_str(&args, "outcome");
    let decision = decision_db::update_decision(ctx.pool(), id, status, superseded_by, outcome).await?;
    Ok(serde_json::to_value(decision)?)
}
