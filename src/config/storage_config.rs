use crate::utils::resolve_path;
use anyhow::Context;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone)]
pub struct StorageConfig {
    /// Directory holding the SQLite database.
    pub storage_path: String,
}

impl StorageConfig {
    pub fn parse_dir(&self, root: &Path) -> anyhow::Result<PathBuf> {
        let path = resolve_path(root, &self.storage_path);
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create storage directory {path:?}"))?;
        path.canonicalize()
            .with_context(|| format!("Failed to parse storage directory {path:?}"))
    }
}
