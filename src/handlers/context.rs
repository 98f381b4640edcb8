// src/handlers/context.rs
// context_store / context_search / context_get_recent / context_stats
// (§4.5, §10, P7, P8).

use serde_json::{Map, Value};

use crate::db::context as context_db;
use crate::dispatcher::RequestContext;
use crate::error::{AidisError, Result};
use crate::handlers::args::{get_i64, get_opt_str, get_opt_string_vec, get_str};
use crate::handlers::resolve_project_id;
use crate::orchestrator::ActivityKind;

/// `context.store` (§4.5): resolve project, embed the content, fail fast
/// on a dimension mismatch before writing (P8's backstop is the
/// database's own CHECK constraint, but the handler checks first so a
/// misconfigured embedder never reaches the database at all), then
/// persist and record the session's activity counter.
pub async fn store(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let project_id = resolve_project_id(ctx, &args).await?;
    let context_type = get_str(&args, "type")?;
    let content = get_str(&args, "content")?;
    let tags = get_opt_string_vec(&args, "tags");

    let embedding = ctx.embedder().embed(content).await?;
    let expected_dim = ctx.embedder().dimensions();
    if embedding.len() != expected_dim {
        return Err(AidisError::EmbeddingDimensionMismatch {
            expected: expected_dim,
            got: embedding.len(),
        });
    }

    let (session_id, _) = ctx.orchestrator().resolve(&ctx.session_key, None).await?;

    let entry = context_db::store_context(
        ctx.pool(),
        context_db::StoreContextParams {
            project_id,
            session_id: Some(session_id),
            context_type,
            content,
            tags: &tags,
            embedding: &embedding,
        },
    )
    .await?;

    ctx.orchestrator()
        .record(&ctx.session_key, ActivityKind::ContextCreated)
        .await?;

    Ok(serde_json::to_value(entry)?)
}

/// `context.search` (§4.5): embed the query, then rank by cosine
/// similarity, project-scoped (P7).
pub async fn search(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let project_id = resolve_project_id(ctx, &args).await?;
    let query = get_str(&args, "query")?;
    let limit = get_i64(&args, "limit", 10);
    let type_filter = get_opt_str(&args, "typeFilter");
    let tag_filter = get_opt_string_vec(&args, "tagFilter");
    let tag_filter = if tag_filter.is_empty() { None } else { Some(tag_filter.as_slice()) };

    let embedding = ctx.embedder().embed(query).await?;

    let results = context_db::search_contexts(
        ctx.pool(),
        context_db::SearchContextParams {
            project_id,
            query_embedding: &embedding,
            limit,
            type_filter,
            tag_filter,
        },
    )
    .await?;

    Ok(serde_json::to_value(results)?)
}

/// `context.get_recent` (§4.5): no embedding work.
pub async fn get_recent(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let project_id = resolve_project_id(ctx, &args).await?;
    let limit = get_i64(&args, "limit", 5);
    let entries = context_db::get_recent_contexts(ctx.pool(), project_id, limit).await?;
    Ok(serde_json::to_value(entries)?)
}

/// `context.stats` (§4.5).
pub async fn stats(ctx: &RequestContext, args: Map<String, Value>) -> Result<Value> {
    let project_id = resolve_project_id(ctx, &args).await?;
    let stats = context_db::context_stats(ctx.pool(), project_id).await?;
    Ok(serde_json::to_value(stats)?)
}
