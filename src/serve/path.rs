//! URL to filesystem path resolution.

use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;

/// Resolve a request URL under `root`, mapping directories to `index.html`.
///
/// Returns `None` for anything that does not exist or escapes `root`.
pub fn resolve_path(url: &str, root: &Path) -> Option<PathBuf> {
    let clean = normalize_url(url)?;
    if clean.split('/').any(|segment| segment == "..") {
        return None;
    }

    // Canonicalize so symlinks cannot lead outside the root either.
    let canonical = root.join(&clean).canonicalize().ok()?;
    let root = root.canonicalize().ok()?;
    if !canonical.starts_with(&root) {
        return None;
    }

    if canonical.is_file() {
        return Some(canonical);
    }
    if canonical.is_dir() {
        let index = canonical.join("index.html");
        if index.is_file() {
            return Some(index);
        }
    }
    None
}

/// Strip query and fragment, percent-decode, trim slashes.
fn normalize_url(url: &str) -> Option<String> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let decoded = percent_decode_str(path).decode_utf8().ok()?;
    Some(decoded.replace('\\', "/").trim_matches('/').to_string())
}
