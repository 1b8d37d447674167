use anyhow::{Context, anyhow};
use serde::Deserialize;
use std::path::{Path, PathBuf};

mod logs_config;
mod registry_config;
mod server_config;
mod storage_config;

pub use logs_config::LogsConfig;
pub use registry_config::RegistryConfig;
pub use server_config::ServerConfig;
pub use storage_config::StorageConfig;

#[derive(Deserialize, Debug, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub logs: LogsConfig,
    pub storage: StorageConfig,
    #[serde(default)]
    pub registry: RegistryConfig,
    /// Directory of the configuration file, relative paths resolve against it.
    #[serde(skip)]
    pub root: PathBuf,
}

fn parse_config_path(mut args: impl Iterator<Item = String>) -> anyhow::Result<PathBuf> {
    while let Some(arg) = args.next() {
        if arg == "-c" || arg == "--config" {
            return args
                .next()
                .map(PathBuf::from)
                .ok_or_else(|| anyhow!("Please specify path string for -c argument."));
        }
    }
    Err(anyhow!(
        "Please specify configuration file argument. Usage: -c <config_file>"
    ))
}

pub fn parse(content: &str, root: &Path) -> anyhow::Result<Config> {
    let mut config: Config = toml::from_str(content).with_context(|| {
        "Failed to parse configuration file.\n\
        Please check the file syntax is valid TOML syntax"
    })?;
    config.root = root.to_path_buf();
    Ok(config)
}

pub fn load() -> anyhow::Result<Config> {
    let path = parse_config_path(std::env::args().skip(1))?;
    if !path.is_file() {
        return Err(anyhow!(
            "Configuration file not found or invalid.\n\
        Please make sure that the configuration file exists and is a valid TOML file.\n\
        Expected file path: {:?}",
            path
        ));
    }
    let content = std::fs::read_to_string(&path).with_context(|| {
        "Failed to read configuration file.\n\
        Please check the file path and file permissions, and make sure the file is valid accessible"
    })?;
    let root = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().context("Failed to read current directory")?,
    };
    parse(&content, &root)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::KeyScheme;
    use tracing::Level;

    #[test]
    fn full_config() {
        let content = r#"
            [server]
            host = "127.0.0.1"
            port = 9000

            [logs]
            level = "DEBUG"
            enable_file_logging = true
            storage_path = "logs"

            [storage]
            storage_path = "/var/lib/fleetd"

            [registry]
            key_scheme = "legacy"
            return_codes = "codes.json"
        "#;
        let config = parse(content, Path::new("/etc/fleetd")).unwrap();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.logs.level, Level::DEBUG);
        assert!(config.logs.enable_file_logging);
        assert_eq!(
            config.logs.parse_dir(&config.root),
            Some(PathBuf::from("/etc/fleetd/logs"))
        );
        assert_eq!(config.registry.key_scheme, KeyScheme::Legacy);
        assert_eq!(
            config.registry.return_codes_path(&config.root),
            Some(PathBuf::from("/etc/fleetd/codes.json"))
        );
    }

    #[test]
    fn defaults_apply() {
        let content = r#"
            [storage]
            storage_path = "data"
        "#;
        let config = parse(content, Path::new("/srv")).unwrap();
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.logs.level, Level::INFO);
        assert_eq!(config.registry.key_scheme, KeyScheme::Random);
        assert!(config.registry.return_codes_path(&config.root).is_none());
    }

    #[test]
    fn rejects_unknown_level_and_scheme() {
        let storage = "[storage]\nstorage_path = \"data\"\n";
        assert!(parse(&format!("{storage}[logs]\nlevel = \"loud\"\n"), Path::new("/")).is_err());
        assert!(
            parse(
                &format!("{storage}[registry]\nkey_scheme = \"md5\"\n"),
                Path::new("/")
            )
            .is_err()
        );
    }

    #[test]
    fn config_flag() {
        let args = ["-c", "fleetd.toml"].map(String::from).into_iter();
        assert_eq!(
            parse_config_path(args).unwrap(),
            PathBuf::from("fleetd.toml")
        );
        let args = ["--config"].map(String::from).into_iter();
        assert!(parse_config_path(args).is_err());
        assert!(parse_config_path(std::iter::empty()).is_err());
    }
}
