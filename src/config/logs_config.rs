use crate::utils::resolve_path;
use serde::{Deserialize, Deserializer};
use std::path::{Path, PathBuf};
use tracing::Level;

#[derive(Deserialize, Debug, Clone)]
pub struct LogsConfig {
    #[serde(deserialize_with = "level_deserialize", default = "default_level")]
    pub level: Level,
    #[serde(default)]
    pub enable_file_logging: bool,
    pub storage_path: Option<String>,
}

impl Default for LogsConfig {
    fn default() -> Self {
        Self {
            level: default_level(),
            enable_file_logging: false,
            storage_path: None,
        }
    }
}

impl LogsConfig {
    pub fn parse_dir(&self, root: &Path) -> Option<PathBuf> {
        self.storage_path
            .as_deref()
            .map(|path| resolve_path(root, path))
    }
}

fn default_level() -> Level {
    Level::INFO
}

fn level_deserialize<'de, D>(deserializer: D) -> Result<Level, D::Error>
where
    D: Deserializer<'de>,
{
    let s: String = Deserialize::deserialize(deserializer)?;
    match s.to_lowercase().as_str() {
        "error" => Ok(Level::ERROR),
        "warn" => Ok(Level::WARN),
        "info" => Ok(Level::INFO),
        "debug" => Ok(Level::DEBUG),
        "trace" => Ok(Level::TRACE),
        _ => Err(serde::de::Error::custom(format!(
            "Unsupported log level: {}",
            s
        ))),
    }
}
