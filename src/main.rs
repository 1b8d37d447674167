use anyhow::Context;
use std::net::ToSocketAddrs;
use tokio::net::TcpListener;

mod catalog;
mod config;
mod errors;
mod logging;
mod middlewares;
mod models;
mod registry;
mod routes;
mod server;
mod services;
mod state;
mod utils;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = config::load()?;
    let log_dir = if config.logs.enable_file_logging {
        Some(
            config
                .logs
                .parse_dir(&config.root)
                .unwrap_or_else(|| config.root.join("logs")),
        )
    } else {
        None
    };
    let logs = logging::registry_logs(config.logs.level, log_dir)?;
    let (writer, log_task) = logs.unzip();
    let result = serve(&config, writer.clone()).await;
    if let Err(err) = &result {
        tracing::error!("fleetd stopped: {err:?}");
    }
    // the subscriber keeps its own clone, so the task only ends on an explicit shutdown
    if let (Some(writer), Some(handle)) = (writer, log_task) {
        writer.finish(handle).await;
    }
    result
}

async fn serve(config: &config::Config, logs: Option<logging::LogWriter>) -> anyhow::Result<()> {
    let addr = format!("{}:{}", config.server.host, config.server.port)
        .to_socket_addrs()?
        .next()
        .ok_or_else(|| anyhow::anyhow!("'{}' resolves to no address", config.server.host))?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    server::run_until_done(server::ServerArgs { logs, config }, listener).await
}
