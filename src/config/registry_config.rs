use crate::registry::KeyScheme;
use crate::utils::resolve_path;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Deserialize, Debug, Clone, Default)]
pub struct RegistryConfig {
    #[serde(default)]
    pub key_scheme: KeyScheme,
    /// Return code catalog, the bundled one is used when unset.
    pub return_codes: Option<String>,
}

impl RegistryConfig {
    pub fn return_codes_path(&self, root: &Path) -> Option<PathBuf> {
        self.return_codes
            .as_deref()
            .map(|path| resolve_path(root, path))
    }
}
