// src/main.rs
// Process entry point (§6 CLI surface): load config, open the pool, wire
// the shared collaborators, then run whichever transports were selected.
//
// Grounded on crates/mira-server/src/main.rs's parse-then-dispatch shape
// and crates/mira-server/src/cli/serve.rs's init_server_context wiring
// order (load config -> open pool -> construct embeddings -> construct
// shared state -> start transports); the teacher's per-subcommand log
// level table collapses here to a single `--log-level` flag since this
// binary has one mode (serve), not Mira's dozen CLI subcommands.

use std::net::SocketAddr;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use aidis::config::cli::exit_code;
use aidis::config::{Cli, EnvConfig};
use aidis::db::pool::DatabasePool;
use aidis::db::schema;
use aidis::dispatcher::AppState;
use aidis::embeddings::{Embedder, HttpEmbedder};
use aidis::orchestrator::{self, SessionOrchestrator};
use aidis::transport::{http, stdio};

#[tokio::main]
async fn main() -> ExitCode {
    // .env is optional and local to the working directory; never required.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    let config = EnvConfig::load(&cli);

    init_logging(&config.log_level);

    let validation = config.validate();
    for warning in &validation.warnings {
        warn!("{}", warning);
    }
    if !validation.is_valid() {
        for err in &validation.errors {
            error!("{}", err);
        }
        eprintln!("{}", validation.report());
        return ExitCode::from(exit_code::CONFIG_ERROR as u8);
    }

    let pool = match DatabasePool::connect(&config.database_url).await {
        Ok(pool) => Arc::new(pool),
        Err(e) => {
            error!(error = %e, "failed to connect to the database");
            return ExitCode::from(exit_code::DATABASE_ERROR as u8);
        }
    };

    if let Err(e) = schema::ensure_schema(&pool, config.embedding_dim).await {
        error!(error = %e, "failed to apply database schema");
        return ExitCode::from(exit_code::DATABASE_ERROR as u8);
    }

    // §9: the core treats the embedding dimensionality as a constant
    // loaded at startup and refuses to start if it disagrees with the
    // database's declared check.
    match schema::declared_embedding_dim(&pool).await {
        Ok(Some(declared)) if declared != config.embedding_dim => {
            error!(
                declared,
                configured = config.embedding_dim,
                "--embedding-dim disagrees with the database's declared check constraint"
            );
            return ExitCode::from(exit_code::CONFIG_ERROR as u8);
        }
        Ok(_) => {}
        Err(e) => {
            error!(error = %e, "failed to read declared embedding dimensionality");
            return ExitCode::from(exit_code::DATABASE_ERROR as u8);
        }
    }

    let embedder: Arc<dyn Embedder> = Arc::new(HttpEmbedder::new(
        config.embedding_api_url.clone(),
        config.embedding_api_key.clone(),
        config.embedding_model.clone(),
        config.embedding_dim,
    ));

    let orchestrator = Arc::new(SessionOrchestrator::new(pool.clone()));
    let state = Arc::new(AppState::new(pool.clone(), embedder, orchestrator.clone()));

    let cancel = tokio_util::sync::CancellationToken::new();
    let (sweep_handle, flush_handle) = orchestrator::spawn_background_tasks(orchestrator.clone(), cancel.clone());

    let mut transport_handles = Vec::new();

    if cli.stdio {
        info!("starting stream transport on stdio");
        let stdio_state = state.clone();
        let stdio_cancel = cancel.clone();
        transport_handles.push(tokio::spawn(async move {
            if let Err(e) = stdio::serve(stdio_state, stdio_cancel).await {
                error!(error = %e, "stream transport exited with an error");
            }
        }));
    }

    // HTTP and stdio are concurrent by default (§6: "mutually exclusive
    // ... when the host disallows stderr logging, else concurrent" — this
    // binary has no way to detect that restriction itself, so it always
    // runs HTTP alongside an enabled stdio transport).
    let addr: SocketAddr = match config.bind.parse() {
        Ok(addr) => addr,
        Err(e) => {
            error!(error = %e, bind = %config.bind, "invalid --bind address");
            return ExitCode::from(exit_code::CONFIG_ERROR as u8);
        }
    };

    info!(%addr, "starting HTTP transport");
    let router = http::router(state.clone());
    let http_cancel = cancel.clone();
    let http_handle = tokio::spawn(async move {
        let listener = match tokio::net::TcpListener::bind(addr).await {
            Ok(l) => l,
            Err(e) => {
                error!(error = %e, %addr, "failed to bind HTTP listener");
                return;
            }
        };
        let serve = axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .with_graceful_shutdown(async move {
            http_cancel.cancelled().await;
        });
        if let Err(e) = serve.await {
            error!(error = %e, "HTTP transport exited with an error");
        }
    });
    transport_handles.push(http_handle);

    wait_for_shutdown_signal().await;
    info!("shutdown signal received, draining in-flight requests");
    cancel.cancel();

    // §5: wait up to 10 seconds for in-flight requests to complete.
    let drain = tokio::time::timeout(std::time::Duration::from_secs(10), async {
        for handle in transport_handles {
            let _ = handle.await;
        }
    });
    if drain.await.is_err() {
        warn!("graceful shutdown timed out after 10s, forcing exit");
    }

    orchestrator.flush_all_counters().await;
    let _ = sweep_handle.await;
    let _ = flush_handle.await;
    pool.pg().close().await;

    info!("shutdown complete");
    ExitCode::from(exit_code::OK as u8)
}

fn init_logging(log_level: &str) {
    let filter = EnvFilter::try_new(log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    // Log output goes exclusively to standard error (§4.1), so the stdio
    // transport's stdout stream never mixes with log lines.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

#[cfg(unix)]
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};
    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(s) => s,
        Err(_) => {
            let _ = tokio::signal::ctrl_c().await;
            return;
        }
    };
    tokio::select! {
        _ = sigterm.recv() => {},
        _ = tokio::signal::ctrl_c() => {},
    }
}

#[cfg(not(unix))]
async fn wait_for_shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
}
