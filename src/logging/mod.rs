use crate::logging::format::Formatter;
pub use log_writer::LogWriter;
use std::path::PathBuf;
use tokio::task::JoinHandle;
use tracing::Level;
use tracing_subscriber::Layer;
use tracing_subscriber::{filter, layer::SubscriberExt, util::SubscriberInitExt};

mod format;
mod log_writer;

fn is_own(metadata: &tracing::Metadata<'_>) -> bool {
    metadata.target().starts_with("fleetd")
}

/// Installs the global subscriber.
///
/// Events of this crate go to `dir/fleetd.log` when `dir` is given, to stdout
/// otherwise. Everything else (sqlx, tower-http, ...) goes to stdout at `WARN`.
pub fn registry_logs(
    level: Level,
    dir: Option<PathBuf>,
) -> anyhow::Result<Option<(LogWriter, JoinHandle<()>)>> {
    let mut layers = Vec::new();
    let mut file_writer = None;
    if let Some(dir) = dir {
        std::fs::create_dir_all(&dir)?;
        let (writer, handle) = LogWriter::open(dir.join("fleetd.log"))?;
        let file_layer = tracing_subscriber::fmt::layer()
            .with_ansi(false)
            .event_format(Formatter::new(false))
            .with_writer(writer.clone())
            .with_filter(filter::filter_fn(move |metadata| {
                is_own(metadata) && metadata.level() <= &level
            }));
        layers.push(file_layer.boxed());
        file_writer = Some((writer, handle));
    } else {
        let stdio_layer = tracing_subscriber::fmt::layer()
            .event_format(Formatter::new(true))
            .with_filter(filter::filter_fn(move |metadata| {
                is_own(metadata) && metadata.level() <= &level
            }));
        layers.push(stdio_layer.boxed());
    }
    let general_layer = tracing_subscriber::fmt::layer()
        .event_format(Formatter::new(true))
        .with_filter(filter::filter_fn(|metadata| {
            !is_own(metadata) && metadata.level() <= &Level::WARN
        }));
    layers.push(general_layer.boxed());
    tracing_subscriber::registry()
        .with(layers)
        .with(tracing_error::ErrorLayer::default())
        .try_init()?;
    Ok(file_writer)
}
