//! Path normalization utilities.

use std::path::{Component, Path, PathBuf};

/// Normalize a file system path to absolute form.
///
/// Tries `canonicalize()` first (resolves symlinks, `.`, `..`).
/// Falls back to:
/// - Return as-is if already absolute
/// - Join with current directory if relative
#[inline]
pub fn normalize_path(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            std::env::current_dir().map_or_else(|_| path.to_path_buf(), |cwd| cwd.join(path))
        }
    })
}

/// Normalize a path that may not exist (yet).
///
/// Canonicalizes the longest existing ancestor and re-appends the rest, so
/// a removed file still compares equal to paths built from a canonical root.
pub fn normalize_lossy(path: &Path) -> PathBuf {
    if let Ok(canonical) = path.canonicalize() {
        return canonical;
    }
    match (path.parent(), path.file_name()) {
        (Some(parent), Some(name)) if !parent.as_os_str().is_empty() => {
            normalize_lossy(parent).join(name)
        }
        _ => normalize_path(path),
    }
}

/// Render `path` relative to `base` with forward slashes, for logs and URLs.
pub fn display_relative(path: &Path, base: &Path) -> String {
    let rel = path.strip_prefix(base).unwrap_or(path);
    rel.components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_normalize_path_relative() {
        let normalized = normalize_path(Path::new("relative/path/file.txt"));
        assert!(normalized.is_absolute());
    }

    #[test]
    fn test_normalize_lossy_missing_file() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone").join("file.css");
        let normalized = normalize_lossy(&missing);

        let root = dir.path().canonicalize().unwrap();
        assert_eq!(normalized, root.join("gone").join("file.css"));
    }

    #[test]
    fn test_display_relative() {
        let base = Path::new("/site/dist");
        assert_eq!(
            display_relative(Path::new("/site/dist/css/index.css"), base),
            "css/index.css"
        );
        assert_eq!(display_relative(Path::new("/elsewhere/a.js"), base), "elsewhere/a.js");
    }
}
