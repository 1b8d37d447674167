mod rfc3339;

pub use rfc3339::*;

/// Resolves `path` against `base` unless it is already absolute.
pub fn resolve_path(base: &std::path::Path, path: &str) -> std::path::PathBuf {
    let path = std::path::Path::new(path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn test_resolve_path() {
        assert_eq!(
            resolve_path(Path::new("/etc/fleetd"), "data"),
            Path::new("/etc/fleetd/data")
        );
        assert_eq!(
            resolve_path(Path::new("/etc/fleetd"), "/var/lib/fleetd"),
            Path::new("/var/lib/fleetd")
        );
    }
}
