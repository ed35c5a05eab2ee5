use std::path::{Path, PathBuf};

/// Returns the directory next to the running executable.
///
/// When run from `target/debug` or `target/release` the project root is returned instead,
/// so a settings file kept in the checkout is found during development.
pub fn get_app_dir() -> PathBuf {
    let mut path = std::env::current_exe()
        .unwrap_or_default()
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();

    if path.ends_with("target/debug") || path.ends_with("target/release") {
        path.pop();
        path.pop();
    }
    path
}

/// Ensures the parent directory of `path` exists, creating it if necessary
pub fn ensure_parent_dir(path: &Path) -> Result<(), std::io::Error> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() && !parent.exists() => {
            std::fs::create_dir_all(parent)
        }
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_missing_parents() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("a").join("b").join("map.svg");

        ensure_parent_dir(&target).unwrap();
        assert!(dir.path().join("a").join("b").is_dir());
        // already there
        ensure_parent_dir(&target).unwrap();
    }

    #[test]
    fn bare_file_name_needs_no_directory() {
        ensure_parent_dir(Path::new("map.svg")).unwrap();
    }
}
