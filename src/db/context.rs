// src/db/context.rs
// Context store persistence: insert, similarity search, recent, stats
// (§4.5, §6, P7, P8).
//
// Grounded on crates/mira-server/src/db/memory/store.rs's insert-params
// shape and crates/mira-server/src/db/memory/recall.rs's vector-distance
// query construction, simplified to the plain project-scoped query §4.5
// specifies (no branch/entity/team/recency/staleness boosting — that
// machinery is Mira-specific and has no counterpart in this spec).

use chrono::{DateTime, Utc};
use pgvector::Vector;
use uuid::Uuid;

use crate::db::pool::DatabasePool;
use crate::error::Result;
use crate::models::{ContextEntry, ScoredContextEntry};

pub struct StoreContextParams<'a> {
    pub project_id: Uuid,
    pub session_id: Option<Uuid>,
    pub context_type: &'a str,
    pub content: &'a str,
    pub tags: &'a [String],
    pub embedding: &'a [f32],
}

/// `context.store` step 4: insert the row in a single statement with the
/// vector column populated. The embedding-dimension check (step 3) has
/// already happened in the handler before this is called; the database's
/// own CHECK constraint is the final backstop (P8).
pub async fn store_context(pool: &DatabasePool, params: StoreContextParams<'_>) -> Result<ContextEntry> {
    let row: (Uuid, DateTime<Utc>) = sqlx::query_as(
        r#"
        INSERT INTO contexts (project_id, session_id, context_type, content, tags, embedding)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, created_at
        "#,
    )
    .bind(params.project_id)
    .bind(params.session_id)
    .bind(params.context_type)
    .bind(params.content)
    .bind(params.tags)
    .bind(Vector::from(params.embedding.to_vec()))
    .fetch_one(pool.pg())
    .await?;

    Ok(ContextEntry {
        id: row.0,
        project_id: params.project_id,
        session_id: params.session_id,
        context_type: params.context_type.to_string(),
        content: params.content.to_string(),
        tags: params.tags.to_vec(),
        created_at: row.1,
    })
}

pub struct SearchContextParams<'a> {
    pub project_id: Uuid,
    pub query_embedding: &'a [f32],
    pub limit: i64,
    pub type_filter: Option<&'a str>,
    pub tag_filter: Option<&'a [String]>,
}

/// `context.search` (§4.5): project-scoped (P7), ordered by cosine
/// distance ascending, ties broken by `created_at DESC`, similarity
/// derived as `1 - distance` (cosine distance is in [0, 2] but for
/// normalized embeddings in practice lands in [0, 1]; clamped below).
pub async fn search_contexts(
    pool: &DatabasePool,
    params: SearchContextParams<'_>,
) -> Result<Vec<ScoredContextEntry>> {
    let query_vec = Vector::from(params.query_embedding.to_vec());

    let rows: Vec<(Uuid, Uuid, Option<Uuid>, String, String, Vec<String>, DateTime<Utc>, f64)> = sqlx::query_as(
        r#"
        SELECT id, project_id, session_id, context_type, content, tags, created_at,
               (embedding <=> $1) AS distance
        FROM contexts
        WHERE project_id = $2
          AND ($3::text IS NULL OR context_type = $3)
          AND ($4::text[] IS NULL OR tags && $4)
        ORDER BY embedding <=> $1 ASC, created_at DESC
        LIMIT $5
        "#,
    )
    .bind(&query_vec)
    .bind(params.project_id)
    .bind(params.type_filter)
    .bind(params.tag_filter)
    .bind(params.limit)
    .fetch_all(pool.pg())
    .await?;

    Ok(rows
        .into_iter()
        .map(|(id, project_id, session_id, context_type, content, tags, created_at, distance)| {
            let similarity = (1.0 - distance).clamp(0.0, 1.0);
            ScoredContextEntry {
                entry: ContextEntry {
                    id,
                    project_id,
                    session_id,
                    context_type,
                    content,
                    tags,
                    created_at,
                },
                similarity,
            }
        })
        .collect())
}

/// `context.get_recent` (§4.5): no embedding work.
pub async fn get_recent_contexts(
    pool: &DatabasePool,
    project_id: Uuid,
    limit: i64,
) -> Result<Vec<ContextEntry>> {
    let rows: Vec<(Uuid, Uuid, Option<Uuid>, String, String, Vec<String>, DateTime<Utc>)> = sqlx::query_as(
        r#"
        SELECT id, project_id, session_id, context_type, content, tags, created_at
        FROM contexts
        WHERE project_id = $1
        ORDER BY created_at DESC
        LIMIT $2
        "#,
    )
    .bind(project_id)
    .bind(limit)
    .fetch_all(pool.pg())
    .await?;

    Ok(rows
        .into_iter()
        .map(
            |(id, project_id, session_id, context_type, content, tags, created_at)| ContextEntry {
                id,
                project_id,
                session_id,
                context_type,
                content,
                tags,
                created_at,
            },
        )
        .collect())
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct ContextStats {
    pub total: i64,
    pub by_type: Vec<(String, i64)>,
}

/// `context.stats` (§4.5): counts by type and total, single aggregate
/// query.
pub async fn context_stats(pool: &DatabasePool, project_id: Uuid) -> Result<ContextStats> {
    let by_type: Vec<(String, i64)> = sqlx::query_as(
        r#"
        SELECT context_type, count(*) FROM contexts
        WHERE project_id = $1
        GROUP BY context_type
        ORDER BY context_type
        "#,
    )
    .bind(project_id)
    .fetch_all(pool.pg())
    .await?;

    let total = by_type.iter().map(|(_, c)| c).sum();

    Ok(ContextStats { total, by_type })
}
