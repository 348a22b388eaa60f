//! Host lookups: executables on the search path and per-user directories.
//!
//! Executable lookups walk `PATH` on every call. Nothing is cached, so a
//! tool installed or removed between two scans is seen by the next one.

use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Parse the `PATH` environment variable into a list of directories.
pub fn search_path() -> Vec<PathBuf> {
    std::env::var_os("PATH")
        .map(|path| std::env::split_paths(&path).collect())
        .unwrap_or_default()
}

/// Check whether a file has executable permission bits set.
#[cfg(unix)]
pub fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

/// On Windows, executability is determined by file extension, not permission bits.
#[cfg(not(unix))]
pub fn is_executable(path: &Path) -> bool {
    path.is_file()
}

/// File names to try for `name` in a single directory.
fn candidate_names(name: &str) -> Vec<OsString> {
    let mut names = vec![OsString::from(name)];
    if cfg!(windows) {
        let exts = std::env::var("PATHEXT").unwrap_or_else(|_| ".EXE;.CMD;.BAT;.COM".to_string());
        for ext in exts.split(';').filter(|e| !e.is_empty()) {
            names.push(OsString::from(format!("{}{}", name, ext.to_lowercase())));
        }
    }
    names
}

/// Resolve `name` against the given directories.
pub fn resolve_in(name: &str, dirs: &[PathBuf]) -> Option<PathBuf> {
    let names = candidate_names(name);
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |n| dir.join(n)))
        .find(|candidate| is_executable(candidate))
}

/// Resolve `name` against the current `PATH`.
pub fn find_executable(name: &str) -> Option<PathBuf> {
    resolve_in(name, &search_path())
}

/// True if every named executable is on the current `PATH`.
pub fn has_executables(names: &[&str]) -> bool {
    let dirs = search_path();
    names.iter().all(|name| resolve_in(name, &dirs).is_some())
}

/// Returns the per-user configuration directory.
///
/// Falls back to the working directory if none can be determined.
pub fn config_dir() -> PathBuf {
    dirs::config_dir().unwrap_or_else(|| PathBuf::from("."))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::fs;
    use std::os::unix::fs::PermissionsExt;

    fn write_file(dir: &Path, name: &str, mode: u32) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, "#!/bin/sh\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(mode)).unwrap();
        path
    }

    #[test]
    fn test_resolve_finds_executable() {
        let dir = tempfile::tempdir().unwrap();
        let expected = write_file(dir.path(), "flatpak", 0o755);

        let found = resolve_in("flatpak", &[dir.path().to_path_buf()]);
        assert_eq!(found, Some(expected));
    }

    #[test]
    fn test_resolve_skips_non_executable() {
        let dir = tempfile::tempdir().unwrap();
        write_file(dir.path(), "snap", 0o644);

        assert_eq!(resolve_in("snap", &[dir.path().to_path_buf()]), None);
    }

    #[test]
    fn test_resolve_uses_first_directory() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        let expected = write_file(first.path(), "pip3", 0o755);
        write_file(second.path(), "pip3", 0o755);

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(resolve_in("pip3", &dirs), Some(expected));
    }

    #[test]
    fn test_resolve_ignores_directories() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("brew")).unwrap();

        assert_eq!(resolve_in("brew", &[dir.path().to_path_buf()]), None);
    }

    #[test]
    fn test_missing_tool_not_found() {
        assert!(find_executable("upd8-definitely-not-installed").is_none());
        assert!(!has_executables(&["sh", "upd8-definitely-not-installed"]));
    }
}
