// src/db/pool.rs
// Persistence abstraction (§4.6): a bounded connection pool, typed query
// helpers, and a retry wrapper for recoverable conditions.
//
// Grounded on crates/mira-server/src/db/pool.rs's DatabasePool wrapper and
// its run()/interact()/try_interact() two-tier API, adapted for sqlx's
// native async model (no blocking-thread-pool indirection is needed since
// sqlx, unlike rusqlite, is async top to bottom).

use std::time::Duration;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tracing::{debug, warn};

use crate::error::{AidisError, Result};

/// Default bounded pool size (§4.6, §5).
pub const DEFAULT_POOL_SIZE: u32 = 20;

/// §7: "retried at most once with exponential backoff up to 1 second."
const RETRY_DELAY_MS: u64 = 1000;

#[derive(Debug, Clone, Copy)]
pub struct PoolStatus {
    pub size: u32,
    pub idle: usize,
}

/// Thin wrapper over `sqlx::PgPool`. Handler code should prefer calling
/// query helpers directly (they already return `Result<T, AidisError>`
/// thanks to `#[from] sqlx::Error`); `run_with_retry` exists for the one
/// recoverable case §7 calls out explicitly.
#[derive(Clone)]
pub struct DatabasePool {
    pool: PgPool,
}

impl DatabasePool {
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(DEFAULT_POOL_SIZE)
            .acquire_timeout(Duration::from_secs(10))
            .connect(database_url)
            .await?;
        Ok(Self { pool })
    }

    pub fn pg(&self) -> &PgPool {
        &self.pool
    }

    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            size: self.pool.size(),
            idle: self.pool.num_idle(),
        }
    }

    /// Readiness probe: verifies connectivity with a trivial round-trip.
    /// Backs `GET /readyz` (§4.1).
    pub async fn check_connectivity(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }

    /// At-most-one retry with a 1 second backoff, per §7's propagation
    /// policy ("Recoverable conditions... retried at most once with
    /// exponential backoff up to 1 second").
    pub async fn run_with_retry<F, Fut, T>(&self, mut f: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        match f().await {
            Ok(v) => Ok(v),
            Err(e) if is_recoverable(&e) => {
                warn!(error = %e, "retrying recoverable database error");
                tokio::time::sleep(Duration::from_millis(RETRY_DELAY_MS)).await;
                f().await
            }
            Err(e) => Err(e),
        }
    }

    /// Best-effort variant: logs failures instead of propagating them.
    /// Used for background flush operations where an occasional miss is
    /// acceptable (counters are re-flushed on the next timer tick).
    pub async fn try_run<F, Fut, T>(&self, f: F) -> Option<T>
    where
        F: FnOnce() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        match f().await {
            Ok(v) => Some(v),
            Err(e) => {
                debug!(error = %e, "best-effort database operation failed");
                None
            }
        }
    }
}

fn is_recoverable(err: &AidisError) -> bool {
    matches!(err, AidisError::Database(sqlx::Error::PoolTimedOut))
        || matches!(err, AidisError::Database(sqlx::Error::Io(_)))
}
