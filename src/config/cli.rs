// src/config/cli.rs
// CLI surface (§6): a single server binary with flags, env fallback via
// clap so flags win over env automatically.

use clap::Parser;

#[derive(Parser, Debug, Clone)]
#[command(name = "aidis")]
#[command(about = "AIDIS tool dispatch & session orchestration core")]
#[command(version)]
pub struct Cli {
    /// HTTP listen address.
    #[arg(long, env = "AIDIS_BIND_ADDR", default_value = "127.0.0.1:8080")]
    pub bind: String,

    /// Enable the stream transport on stdio.
    #[arg(long)]
    pub stdio: bool,

    /// Postgres connection string.
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: String,

    /// Configured embedding dimensionality; must match the deployed schema.
    #[arg(long, env = "AIDIS_EMBEDDING_DIM", default_value_t = 1536)]
    pub embedding_dim: usize,

    /// Log verbosity.
    #[arg(long, env = "AIDIS_LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Embedding provider endpoint (OpenAI-compatible `/embeddings` API).
    #[arg(
        long,
        env = "AIDIS_EMBEDDING_API_URL",
        default_value = "https://api.openai.com/v1/embeddings"
    )]
    pub embedding_api_url: String,

    /// API key for the embedding provider. Empty disables embedding-backed
    /// tools, which then fail with `EmbeddingUnavailable`.
    #[arg(long, env = "AIDIS_EMBEDDING_API_KEY", default_value = "")]
    pub embedding_api_key: String,

    /// Embedding model name.
    #[arg(long, env = "AIDIS_EMBEDDING_MODEL", default_value = "text-embedding-3-small")]
    pub embedding_model: String,
}

/// Process exit codes, per §6.
pub mod exit_code {
    pub const OK: i32 = 0;
    pub const CONFIG_ERROR: i32 = 2;
    pub const DATABASE_ERROR: i32 = 3;
}
