use crate::catalog::ReturnCodeCatalog;
use crate::config::Config;
use crate::logging::LogWriter;
use crate::registry::DeviceRegistry;
use crate::services::DeviceService;
use crate::{routes, state};
use anyhow::Context;
use sqlx::migrate::Migrator;
use sqlx::sqlite;
use std::net::SocketAddr;
use std::path::Path;
use tokio::{net::TcpListener, signal, task::JoinSet};
use tokio_util::sync::CancellationToken;

pub struct ServerArgs<'a> {
    pub logs: Option<LogWriter>,
    pub config: &'a Config,
}

static MIGRATOR: Migrator = sqlx::migrate!();

async fn connect_database(dir: &Path) -> anyhow::Result<sqlx::SqlitePool> {
    let path = dir.join("fleetd.db");
    let options = sqlite::SqliteConnectOptions::new()
        .filename(&path)
        .create_if_missing(true);
    let pool = sqlx::SqlitePool::connect_with(options)
        .await
        .with_context(|| format!("Failed to connect to SQLite database: {}", path.display()))?;
    MIGRATOR
        .run(&pool)
        .await
        .context("Failed to migrate SQLite database")?;
    Ok(pool)
}

/// Loads everything the service needs, then serves until a shutdown signal arrives.
///
/// Any failure before the listener is bound (catalog, database, hydration) is
/// returned without serving a single request.
pub async fn run_until_done(args: ServerArgs<'_>, bind: TcpListener) -> anyhow::Result<()> {
    let config = args.config;
    let codes_path = config.registry.return_codes_path(&config.root);
    let catalog = ReturnCodeCatalog::load(codes_path.as_deref())?;
    tracing::info!("Loaded {} return codes", catalog.len());
    let dir = config.storage.parse_dir(&config.root)?;
    let pool = connect_database(&dir).await?;
    tracing::info!("Using database {}", dir.join("fleetd.db").display());
    let registry = DeviceRegistry::new(config.registry.key_scheme);
    let (state, persist_writer) =
        state::AppState::build(registry, catalog, DeviceService::new(pool.clone())).await?;

    let shutdown_signal = CancellationToken::new();
    // axum serve
    let server = {
        let shutdown_signal = shutdown_signal.clone();
        let routes = routes::build().with_state(state);
        tracing::info!("Listening on http://{}", bind.local_addr()?);
        tokio::spawn(async move {
            axum::serve(
                bind,
                routes.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .with_graceful_shutdown(async move {
                shutdown_signal.cancelled().await;
            })
            .await
            .context("HTTP server terminated")
        })
    };
    let mut join_set = JoinSet::new();
    // ctrl+c
    {
        let shutdown_signal = shutdown_signal.clone();
        join_set.spawn(async move {
            let _ = signal::ctrl_c().await;
            tracing::info!("Received Ctrl+C, shutting down");
            shutdown_signal.cancel();
        });
    }
    // SIGTERM stops the server, SIGUSR1 reopens the log file
    #[cfg(unix)]
    {
        let shutdown_signal = shutdown_signal.clone();
        let logs = args.logs.clone();
        join_set.spawn(async move {
            if let Err(err) = watch_unix_signals(shutdown_signal, logs).await {
                tracing::error!("Failed to install signal handlers: {err:?}");
            }
        });
    }

    let served = server.await;
    shutdown_signal.cancel();
    join_set.shutdown().await;
    // the server task owned the last state handle, so the queue is closed by now
    if persist_writer.await.is_err() {
        tracing::error!("Persist writer panicked");
    }
    pool.close().await;
    tracing::info!("Shutdown complete");
    match served {
        Ok(result) => result,
        Err(e) => anyhow::bail!("Internal error in spawn: {e}"),
    }
}

#[cfg(unix)]
async fn watch_unix_signals(
    shutdown_signal: CancellationToken,
    logs: Option<LogWriter>,
) -> anyhow::Result<()> {
    let mut usr1 = signal::unix::signal(signal::unix::SignalKind::user_defined1())?;
    let mut sigterm = signal::unix::signal(signal::unix::SignalKind::terminate())?;
    loop {
        tokio::select! {
            _ = sigterm.recv() => {
                tracing::debug!("Received SIGTERM signal, start terminating");
                shutdown_signal.cancel();
                return Ok(());
            }
            _ = usr1.recv() => {
                let Some(logs) = logs.as_ref() else { continue };
                match logs.reopen() {
                    Ok(_) => tracing::info!("Log file reopened"),
                    Err(err) => eprintln!("Failed to reopen log file: {err:?}"),
                }
            }
        }
    }
}
