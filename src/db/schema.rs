// src/db/schema.rs
// Authoritative schema (§6). A real deployment applies this via an
// external migration runner (out of scope per §1); the core still ships
// it as an idempotent bootstrap for local/dev runs and tests, mirroring
// the teacher's db/schema/mod.rs::run_all_migrations idempotency
// discipline (every statement is `IF NOT EXISTS`).

use tracing::info;

use crate::db::pool::DatabasePool;
use crate::error::Result;

/// Apply the schema in §6, including the `contexts.embedding` column sized
/// to `embedding_dim`. Safe to call repeatedly.
pub async fn ensure_schema(pool: &DatabasePool, embedding_dim: usize) -> Result<()> {
    info!(embedding_dim, "ensuring database schema");
    let pg = pool.pg();

    sqlx::query("CREATE EXTENSION IF NOT EXISTS vector")
        .execute(pg)
        .await?;
    sqlx::query("CREATE EXTENSION IF NOT EXISTS pgcrypto")
        .execute(pg)
        .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS projects (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            name TEXT UNIQUE NOT NULL,
            description TEXT,
            metadata JSONB NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pg)
    .await?;

    // At most one project may have metadata->>'is_primary' = 'true'.
    sqlx::query(
        r#"
        CREATE UNIQUE INDEX IF NOT EXISTS idx_projects_single_primary
        ON projects ((metadata->>'is_primary'))
        WHERE metadata->>'is_primary' = 'true'
        "#,
    )
    .execute(pg)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            display_id TEXT NOT NULL,
            project_id UUID NULL REFERENCES projects(id),
            agent_type TEXT,
            title TEXT,
            description TEXT,
            started_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            ended_at TIMESTAMPTZ NULL,
            input_tokens BIGINT NOT NULL DEFAULT 0,
            output_tokens BIGINT NOT NULL DEFAULT 0,
            total_tokens BIGINT NOT NULL DEFAULT 0,
            contexts_created INTEGER NOT NULL DEFAULT 0,
            tasks_created INTEGER NOT NULL DEFAULT 0,
            tasks_updated INTEGER NOT NULL DEFAULT 0,
            tasks_completed INTEGER NOT NULL DEFAULT 0,
            metadata JSONB
        )
        "#,
    )
    .execute(pg)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_sessions_project ON sessions(project_id)")
        .execute(pg)
        .await?;

    let create_contexts = format!(
        r#"
        CREATE TABLE IF NOT EXISTS contexts (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            session_id UUID NULL REFERENCES sessions(id),
            context_type TEXT NOT NULL CHECK (context_type IN
                ('code','decision','error','discussion','planning','completion','milestone','reflections','handoff')),
            content TEXT NOT NULL,
            tags TEXT[] NOT NULL DEFAULT '{{}}',
            embedding VECTOR({dim}) NOT NULL CHECK (vector_dims(embedding) = {dim}),
            created_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
        dim = embedding_dim
    );
    sqlx::query(&create_contexts).execute(pg).await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_contexts_project ON contexts(project_id, created_at DESC)")
        .execute(pg)
        .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_contexts_embedding ON contexts USING ivfflat (embedding vector_cosine_ops)",
    )
    .execute(pg)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS technical_decisions (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            title TEXT NOT NULL,
            problem TEXT NOT NULL,
            decision TEXT NOT NULL,
            rationale TEXT NOT NULL,
            alternatives_considered TEXT[] NOT NULL DEFAULT '{}',
            impact_level TEXT NOT NULL CHECK (impact_level IN ('low','medium','high','critical')),
            decision_type TEXT NOT NULL,
            status TEXT NOT NULL DEFAULT 'active' CHECK (status IN ('active','deprecated','superseded','under_review')),
            superseded_by UUID NULL REFERENCES technical_decisions(id),
            outcome TEXT,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pg)
    .await?;
    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_decisions_project ON technical_decisions(project_id, created_at DESC)",
    )
    .execute(pg)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS tasks (
            id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
            project_id UUID NOT NULL REFERENCES projects(id) ON DELETE CASCADE,
            session_id UUID NULL REFERENCES sessions(id),
            title TEXT NOT NULL,
            description TEXT,
            status TEXT NOT NULL DEFAULT 'todo' CHECK (status IN ('todo','in_progress','blocked','completed','cancelled')),
            priority TEXT NOT NULL DEFAULT 'medium',
            assignee TEXT,
            depends_on UUID[] NOT NULL DEFAULT '{}',
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now()
        )
        "#,
    )
    .execute(pg)
    .await?;
    sqlx::query("CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id, status)")
        .execute(pg)
        .await?;

    Ok(())
}

/// Read back the configured dimensionality of `contexts.embedding` from
/// the database's own declared check, per §9: "the core... refuses to
/// start if it disagrees with the database's declared check."
pub async fn declared_embedding_dim(pool: &DatabasePool) -> Result<Option<usize>> {
    let row: Option<(Option<i32>,)> = sqlx::query_as(
        r#"
        SELECT atttypmod
        FROM pg_attribute
        WHERE attrelid = 'contexts'::regclass
          AND attname = 'embedding'
        "#,
    )
    .fetch_optional(pool.pg())
    .await?;

    // pgvector stores the declared dimension directly in atttypmod (no -4
    // offset, unlike varchar); a typmod <= 0 means "unconstrained".
    Ok(row.and_then(|(typmod,)| typmod).and_then(|t| {
        if t > 0 {
            Some(t as usize)
        } else {
            None
        }
    }))
}
