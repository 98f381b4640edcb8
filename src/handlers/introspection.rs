// src/handlers/introspection.rs
// aidis_help / aidis_explain / aidis_examples / aidis_ping / aidis_status
// (§4.2): always available, bypass the validation pipeline, never require
// a session or project.

use std::collections::BTreeMap;

use serde_json::Value;

use crate::catalog;
use crate::db::session as session_db;
use crate::dispatcher::RequestContext;
use crate::error::{AidisError, Result};

pub async fn dispatch(ctx: &RequestContext, tool_name: &str, raw_args: &Value) -> Result<Value> {
    match tool_name {
        "aidis_help" => Ok(help()),
        "aidis_explain" => explain(raw_args),
        "aidis_examples" => examples(raw_args),
        "aidis_ping" => Ok(ping(raw_args)),
        "aidis_status" => status(ctx).await,
        other => Err(AidisError::UnknownTool(other.to_string())),
    }
}

/// The same catalog identity backs `aidis_help`, `GET /mcp/tools/schemas`,
/// and the stream `tools/list` method (P1) — all three read from
/// `catalog::CATALOG`.
fn help() -> Value {
    let mut by_category: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for entry in catalog::CATALOG.iter() {
        by_category.entry(entry.category).or_default().push(entry.name);
    }
    serde_json::json!({ "tool_count": catalog::CATALOG.len(), "categories": by_category })
}

fn tool_name_arg(raw_args: &Value) -> Result<&str> {
    raw_args
        .get("name")
        .and_then(|v| v.as_str())
        .ok_or_else(|| AidisError::validation("name", "missing"))
}

fn explain(raw_args: &Value) -> Result<Value> {
    let name = tool_name_arg(raw_args)?;
    let entry = catalog::lookup(name).ok_or_else(|| AidisError::UnknownTool(name.to_string()))?;
    Ok(serde_json::to_value(entry)?)
}

fn examples(raw_args: &Value) -> Result<Value> {
    let name = tool_name_arg(raw_args)?;
    let entry = catalog::lookup(name).ok_or_else(|| AidisError::UnknownTool(name.to_string()))?;
    Ok(serde_json::json!({ "name": entry.name, "examples": entry.examples }))
}

fn ping(raw_args: &Value) -> Value {
    let message = raw_args.get("message").and_then(|v| v.as_str()).unwrap_or("pong");
    serde_json::json!({ "message": message })
}

async fn status(ctx: &RequestContext) -> Result<Value> {
    let database_connected = ctx.pool().check_connectivity().await;
    let open_sessions = ctx
        .pool()
        .try_run(|| session_db::count_open_sessions(ctx.pool()))
        .await
        .unwrap_or(0);

    Ok(serde_json::json!({
        "database_connected": database_connected,
        "tool_count": catalog::CATALOG.len(),
        "open_sessions": open_sessions,
        "uptime_secs": ctx.state.started_at.elapsed().as_secs(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn help_groups_every_catalog_entry_by_category() {
        let value = help();
        let categories = value.get("categories").expect("categories key");
        let total: usize = categories
            .as_object()
            .expect("object")
            .values()
            .map(|v| v.as_array().expect("array").len())
            .sum();
        assert_eq!(total, catalog::CATALOG.len());
    }

    #[test]
    fn explain_rejects_unknown_tool_names() {
        let raw = serde_json::json!({"name": "not_a_real_tool"});
        assert!(explain(&raw).is_err());
    }

    #[test]
    fn ping_echoes_provided_message() {
        let raw = serde_json::json!({"message": "hello"});
        let value = ping(&raw);
        assert_eq!(value.get("message").and_then(|v| v.as_str()), Some("hello"));
    }

    #[test]
    fn ping_defaults_when_message_absent() {
        let raw = serde_json::json!({});
        let value = ping(&raw);
        assert_eq!(value.get("message").and_then(|v| v.as_str()), Some("pong"));
    }
}
