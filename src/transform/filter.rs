//! Filtering stages.

use std::path::PathBuf;

use crate::debug;
use crate::freshness::is_output_fresh;
use crate::pipeline::{FileSet, Stage, StageError};

/// `select` stage: keeps files whose extension is listed (case-insensitive).
pub struct Select(pub &'static [&'static str]);

impl Stage for Select {
    fn name(&self) -> &'static str {
        "select"
    }

    fn apply(&self, files: FileSet) -> Result<FileSet, StageError> {
        Ok(files
            .into_iter()
            .filter(|f| f.ext().is_some_and(|ext| self.0.contains(&ext.as_str())))
            .collect())
    }
}

/// `newer` stage: the staleness filter.
///
/// Drops every file whose artifact under `dest` is at least as new as the
/// file's source. The artifact path is the file's output path with the
/// extension swapped to `ext`, when given.
pub struct Newer {
    dest: PathBuf,
    ext: Option<&'static str>,
}

impl Newer {
    /// Compare against artifacts with the same name.
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self {
            dest: dest.into(),
            ext: None,
        }
    }

    /// Compare against artifacts renamed to `ext` by a later stage.
    pub fn with_ext(dest: impl Into<PathBuf>, ext: &'static str) -> Self {
        Self {
            dest: dest.into(),
            ext: Some(ext),
        }
    }
}

impl Stage for Newer {
    fn name(&self) -> &'static str {
        "newer"
    }

    fn apply(&self, files: FileSet) -> Result<FileSet, StageError> {
        Ok(files
            .into_iter()
            .filter(|file| {
                let mut artifact = file.dest_path(&self.dest);
                if let Some(ext) = self.ext {
                    artifact.set_extension(ext);
                }
                let fresh = is_output_fresh(&artifact, file.mtime);
                if fresh {
                    debug!("task"; "up to date: {}", artifact.display());
                }
                !fresh
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::VirtualFile;
    use std::fs;
    use std::path::Path;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    fn file_at(rel: &str, mtime: SystemTime) -> VirtualFile {
        let mut file = VirtualFile::generated(rel, Vec::new());
        file.mtime = Some(mtime);
        file
    }

    #[test]
    fn test_select() {
        let files = vec![
            VirtualFile::generated("a.PNG", vec![]),
            VirtualFile::generated("b.svg", vec![]),
            VirtualFile::generated("c", vec![]),
        ];
        let out = Select(&["png", "jpg"]).apply(files).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].rel, Path::new("a.PNG"));
    }

    #[test]
    fn test_newer_missing_artifact_is_stale() {
        let dir = TempDir::new().unwrap();
        let out = Newer::new(dir.path())
            .apply(vec![file_at("a.svg", SystemTime::now())])
            .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_newer_compares_renamed_artifact() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("photo.webp"), b"webp").unwrap();
        let old_source = SystemTime::now() - Duration::from_secs(3600);

        // The .webp exists and is newer: skip.
        let out = Newer::with_ext(dir.path(), "webp")
            .apply(vec![file_at("photo.png", old_source)])
            .unwrap();
        assert!(out.is_empty());

        // The .png artifact does not exist: keep.
        let out = Newer::new(dir.path())
            .apply(vec![file_at("photo.png", old_source)])
            .unwrap();
        assert_eq!(out.len(), 1);
    }

    #[test]
    fn test_newer_source_modified_after_artifact() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("logo.svg"), b"<svg/>").unwrap();
        let future = SystemTime::now() + Duration::from_secs(3600);

        let out = Newer::new(dir.path())
            .apply(vec![file_at("logo.svg", future)])
            .unwrap();
        assert_eq!(out.len(), 1);
    }
}
