//! Mtime-based freshness detection for derived artifacts.
//!
//! An artifact is fresh when it exists and was modified no earlier than the
//! source it was produced from. Missing artifacts and unreadable timestamps
//! are always stale.

use std::path::Path;
use std::time::SystemTime;

/// Check if output file is at least as new as the given source mtime
///
/// Returns `true` if the output exists and `output_mtime >= source_mtime`,
/// meaning the output is fresh and processing can be skipped
pub fn is_output_fresh(output: &Path, source_mtime: Option<SystemTime>) -> bool {
    let Some(source_time) = source_mtime else {
        return false;
    };

    get_mtime(output)
        .map(|output_time| output_time >= source_time)
        .unwrap_or(false)
}

/// Get the modification time of a file
///
/// Returns `None` if the file doesn't exist or mtime cannot be read
pub fn get_mtime(path: &Path) -> Option<SystemTime> {
    path.metadata().and_then(|m| m.modified()).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn set_mtime(path: &Path, time: SystemTime) {
        fs::File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(time)
            .unwrap();
    }

    #[test]
    fn test_missing_output_is_stale() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("a.webp");
        assert!(!is_output_fresh(&output, Some(SystemTime::now())));
    }

    #[test]
    fn test_unknown_source_mtime_is_stale() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("a.webp");
        fs::write(&output, "x").unwrap();
        assert!(!is_output_fresh(&output, None));
    }

    #[test]
    fn test_newer_output_is_fresh() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("a.webp");
        fs::write(&output, "x").unwrap();

        let base = SystemTime::UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        set_mtime(&output, base + Duration::from_secs(10));

        assert!(is_output_fresh(&output, Some(base)));
        assert!(is_output_fresh(&output, Some(base + Duration::from_secs(10))));
        assert!(!is_output_fresh(&output, Some(base + Duration::from_secs(11))));
    }
}
