// src/orchestrator/mod.rs
// Session & project orchestrator (§4.4, §5, P5, P6, P9, P10).
//
// Grounded on crates/mira-server/src/mcp/mod.rs's Arc<RwLock<...>> session/
// project state fields and crates/mira-server/src/cli/serve.rs's
// restore-from-db-on-startup pattern; the primary-first cascade and the
// explicit clear() hook are new logic with no teacher precedent (the
// teacher has no primary-project concept).

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::pool::DatabasePool;
use crate::db::{project as project_db, session as session_db};
use crate::error::{AidisError, Result};
use crate::models::Session;

/// The fixed session key used by the stream transport (§4.4: "one logical
/// client per process").
pub const STDIO_SESSION_KEY: &str = "default-session";

pub const IDLE_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);
pub const IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60 * 60);
pub const COUNTER_FLUSH_INTERVAL: Duration = Duration::from_secs(60);

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ActivityCounters {
    pub input_tokens: i64,
    pub output_tokens: i64,
    pub total_tokens: i64,
    pub contexts_created: i32,
    pub tasks_created: i32,
    pub tasks_updated: i32,
    pub tasks_completed: i32,
}

impl ActivityCounters {
    fn is_zero(&self) -> bool {
        *self == ActivityCounters::default()
    }
}

/// What kind of activity a handler recorded; maps to one counter field.
#[derive(Debug, Clone, Copy)]
pub enum ActivityKind {
    InputTokens(i64),
    OutputTokens(i64),
    TotalTokens(i64),
    ContextCreated,
    TaskCreated,
    TaskUpdated,
    TaskCompleted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionLifecycle {
    Active,
    Ended,
}

/// In-memory per-session record. The database row for the session is
/// updated on state transitions but is not consulted on every request —
/// this struct is the only authoritative source of "current project for
/// this session" while the session is active (§4.4).
pub struct SessionState {
    pub session_id: Uuid,
    pub current_project_id: Option<Uuid>,
    pub agent_type: Option<String>,
    pub lifecycle: SessionLifecycle,
    pub last_activity: Instant,
    /// Counters accumulated since the last flush to the database.
    pub pending_counters: ActivityCounters,
}

/// The orchestrator's session map is `read_mostly` (§5): an RwLock permits
/// concurrent lookups while promotions to ACTIVE/ENDED serialize. Each
/// entry additionally carries its own mutex so that concurrent requests
/// against the *same* session serialize their counter read-modify-write
/// without blocking lookups of other sessions.
pub struct SessionOrchestrator {
    pool: Arc<DatabasePool>,
    sessions: RwLock<HashMap<String, Arc<Mutex<SessionState>>>>,
}

impl SessionOrchestrator {
    pub fn new(pool: Arc<DatabasePool>) -> Self {
        Self {
            pool,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn pool(&self) -> &Arc<DatabasePool> {
        &self.pool
    }

    pub async fn open_session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Resolve (creating if needed) the session for `session_key`, running
    /// the §4.4 priority cascade whenever the session is (re)initialized.
    /// Returns the session's database id and resolved current project.
    pub async fn resolve(
        &self,
        session_key: &str,
        agent_type: Option<&str>,
    ) -> Result<(Uuid, Option<Uuid>)> {
        {
            let sessions = self.sessions.read().await;
            if let Some(entry) = sessions.get(session_key) {
                let state = entry.lock().await;
                if state.lifecycle == SessionLifecycle::Active {
                    return Ok((state.session_id, state.current_project_id));
                }
            }
        }

        // NEW -> ACTIVE: create a session row and a cache entry, running
        // the primary-first cascade.
        let current_project_id = self.resolve_current_project(session_key).await?;
        let session = session_db::create_session(&self.pool, session_key, current_project_id, agent_type).await?;

        let state = SessionState {
            session_id: session.id,
            current_project_id,
            agent_type: agent_type.map(|s| s.to_string()),
            lifecycle: SessionLifecycle::Active,
            last_activity: Instant::now(),
            pending_counters: ActivityCounters::default(),
        };

        let mut sessions = self.sessions.write().await;
        sessions.insert(session_key.to_string(), Arc::new(Mutex::new(state)));
        Ok((session.id, current_project_id))
    }

    /// §4.4's priority cascade, steps 1-4. Step 1 (the primary flag) is
    /// re-checked unconditionally, never short-circuited by a cached
    /// value, per the "Rule — primary-first, not cache-first."
    async fn resolve_current_project(&self, session_key: &str) -> Result<Option<Uuid>> {
        if let Some(primary) = project_db::get_primary_project(&self.pool).await? {
            return Ok(Some(primary.id));
        }

        if let Some(cached) = self.cached_project_id(session_key).await {
            return Ok(Some(cached));
        }

        if let Some(bootstrap) = project_db::get_bootstrap_project(&self.pool).await? {
            return Ok(Some(bootstrap.id));
        }

        if let Some(any) = project_db::get_any_project(&self.pool).await? {
            return Ok(Some(any.id));
        }

        Ok(None)
    }

    async fn cached_project_id(&self, session_key: &str) -> Option<Uuid> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(session_key)?;
        let state = entry.lock().await;
        state.current_project_id
    }

    /// Require a resolved current project, failing `MissingProject` per
    /// §4.4 cascade step 5.
    pub async fn require_current_project(&self, session_key: &str) -> Result<Uuid> {
        let (_, project_id) = self.resolve(session_key, None).await?;
        project_id.ok_or(AidisError::MissingProject)
    }

    /// Explicitly set a session's current project (the `project_switch`
    /// tool), bypassing the cascade for this session only.
    pub async fn set_current_project(&self, session_key: &str, project_id: Uuid) -> Result<()> {
        let (session_id, _) = self.resolve(session_key, None).await?;
        {
            let sessions = self.sessions.read().await;
            if let Some(entry) = sessions.get(session_key) {
                let mut state = entry.lock().await;
                state.current_project_id = Some(project_id);
            }
        }
        session_db::update_session_project(&self.pool, session_id, project_id).await?;
        Ok(())
    }

    /// The in-memory session map MUST expose this explicit clear()
    /// operation, usable from the primary-promotion path — without it the
    /// primary-first rule cannot be honored (§9). Called after
    /// `project_set_primary` commits its transaction (P5).
    pub async fn clear(&self) {
        let mut sessions = self.sessions.write().await;
        sessions.clear();
    }

    pub async fn record(&self, session_key: &str, kind: ActivityKind) -> Result<()> {
        let (session_id, _) = self.resolve(session_key, None).await?;
        let sessions = self.sessions.read().await;
        let Some(entry) = sessions.get(session_key) else {
            return Ok(());
        };
        let mut state = entry.lock().await;
        debug_assert_eq!(state.session_id, session_id);
        apply_activity(&mut state.pending_counters, kind);
        state.last_activity = Instant::now();
        Ok(())
    }

    pub async fn session_status(&self, session_key: &str) -> Option<(Uuid, Option<Uuid>, SessionLifecycle)> {
        let sessions = self.sessions.read().await;
        let entry = sessions.get(session_key)?;
        let state = entry.lock().await;
        Some((state.session_id, state.current_project_id, state.lifecycle))
    }

    /// Explicit end of a session (the `session_end` tool, or shutdown).
    /// Flushes counters, sets `ended_at`, drops the cache entry. Terminal.
    pub async fn end_session(&self, session_key: &str) -> Result<()> {
        let entry = {
            let mut sessions = self.sessions.write().await;
            sessions.remove(session_key)
        };
        let Some(entry) = entry else {
            return Ok(());
        };
        let (session_id, counters) = {
            let mut state = entry.lock().await;
            state.lifecycle = SessionLifecycle::Ended;
            (state.session_id, std::mem::take(&mut state.pending_counters))
        };
        if !counters.is_zero() {
            session_db::add_activity_counters(&self.pool, session_id, &counters).await?;
        }
        session_db::end_session(&self.pool, session_id, Utc::now()).await?;
        Ok(())
    }

    /// Flush every session's pending counters without ending them (the
    /// periodic flush timer, §4.4).
    pub async fn flush_all_counters(&self) {
        let entries: Vec<Arc<Mutex<SessionState>>> = {
            let sessions = self.sessions.read().await;
            sessions.values().cloned().collect()
        };
        for entry in entries {
            let (session_id, counters) = {
                let mut state = entry.lock().await;
                if state.pending_counters.is_zero() {
                    continue;
                }
                (state.session_id, std::mem::take(&mut state.pending_counters))
            };
            self.pool
                .try_run(|| session_db::add_activity_counters(&self.pool, session_id, &counters))
                .await;
        }
    }

    /// The idle-expiry sweep (§4.4): scans for sessions whose last
    /// activity is older than `IDLE_TIMEOUT` and ends them (P9).
    pub async fn sweep_idle_sessions(&self) {
        let stale_keys: Vec<String> = {
            let sessions = self.sessions.read().await;
            let mut keys = Vec::new();
            for (key, entry) in sessions.iter() {
                let state = entry.lock().await;
                if state.last_activity.elapsed() > IDLE_TIMEOUT {
                    keys.push(key.clone());
                }
            }
            keys
        };

        for key in stale_keys {
            info!(session_key = %key, "ending idle session");
            if let Err(e) = self.end_session(&key).await {
                warn!(session_key = %key, error = %e, "failed to end idle session");
            }
        }
    }
}

fn apply_activity(counters: &mut ActivityCounters, kind: ActivityKind) {
    match kind {
        ActivityKind::InputTokens(n) => counters.input_tokens += n,
        ActivityKind::OutputTokens(n) => counters.output_tokens += n,
        ActivityKind::TotalTokens(n) => counters.total_tokens += n,
        ActivityKind::ContextCreated => counters.contexts_created += 1,
        ActivityKind::TaskCreated => counters.tasks_created += 1,
        ActivityKind::TaskUpdated => counters.tasks_updated += 1,
        ActivityKind::TaskCompleted => counters.tasks_completed += 1,
    }
}

/// Spawn the idle-sweep and counter-flush background tasks (§4.4, §11.5).
/// Both stop cooperatively when `cancel` is triggered.
pub fn spawn_background_tasks(
    orchestrator: Arc<SessionOrchestrator>,
    cancel: CancellationToken,
) -> (tokio::task::JoinHandle<()>, tokio::task::JoinHandle<()>) {
    let sweep_orchestrator = orchestrator.clone();
    let sweep_cancel = cancel.clone();
    let sweep_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(IDLE_SWEEP_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => sweep_orchestrator.sweep_idle_sessions().await,
                _ = sweep_cancel.cancelled() => break,
            }
        }
    });

    let flush_orchestrator = orchestrator;
    let flush_cancel = cancel;
    let flush_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(COUNTER_FLUSH_INTERVAL);
        loop {
            tokio::select! {
                _ = interval.tick() => flush_orchestrator.flush_all_counters().await,
                _ = flush_cancel.cancelled() => {
                    flush_orchestrator.flush_all_counters().await;
                    break;
                }
            }
        }
    });

    (sweep_handle, flush_handle)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn activity_counters_accumulate_per_kind() {
        let mut counters = ActivityCounters::default();
        apply_activity(&mut counters, ActivityKind::ContextCreated);
        apply_activity(&mut counters, ActivityKind::ContextCreated);
        apply_activity(&mut counters, ActivityKind::TaskCompleted);
        apply_activity(&mut counters, ActivityKind::TotalTokens(42));
        assert_eq!(counters.contexts_created, 2);
        assert_eq!(counters.tasks_completed, 1);
        assert_eq!(counters.total_tokens, 42);
    }

    #[test]
    fn zero_counters_are_detected() {
        assert!(ActivityCounters::default().is_zero());
        let mut counters = ActivityCounters::default();
        apply_activity(&mut counters, ActivityKind::TaskCreated);
        assert!(!counters.is_zero());
    }
}
