//! In-memory files flowing through a pipeline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::StageError;

/// Ordered set of files handed from stage to stage.
pub type FileSet = Vec<VirtualFile>;

/// A file read from a source directory, possibly renamed or rewritten by
/// earlier stages.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VirtualFile {
    /// Absolute path of the file this one was derived from
    pub source: PathBuf,
    /// Output path relative to the task's destination
    pub rel: PathBuf,
    pub contents: Vec<u8>,
    /// Modification time of `source`, used by the staleness filter
    pub mtime: Option<SystemTime>,
}

impl VirtualFile {
    /// Read `source`, keeping its path relative to `base` as output path.
    pub fn read(source: &Path, base: &Path) -> io::Result<Self> {
        let contents = fs::read(source)?;
        let mtime = source.metadata().and_then(|m| m.modified()).ok();
        let rel = source
            .strip_prefix(base)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| PathBuf::from(source.file_name().unwrap_or_default()));

        Ok(Self {
            source: source.to_path_buf(),
            rel,
            contents,
            mtime,
        })
    }

    /// A file produced by a stage rather than read from disk.
    pub fn generated(rel: impl Into<PathBuf>, contents: Vec<u8>) -> Self {
        let rel = rel.into();
        Self {
            source: rel.clone(),
            rel,
            contents,
            mtime: None,
        }
    }

    /// Lowercased extension of the output path.
    pub fn ext(&self) -> Option<String> {
        self.rel
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
    }

    /// Rename the output, keeping its directory and stem.
    pub fn with_extension(mut self, ext: &str) -> Self {
        self.rel.set_extension(ext);
        self
    }

    pub fn with_contents(mut self, contents: Vec<u8>) -> Self {
        self.contents = contents;
        self
    }

    /// Contents as UTF-8 text.
    pub fn text(&self) -> Result<&str, StageError> {
        std::str::from_utf8(&self.contents)
            .map_err(|e| StageError::new(format!("not valid UTF-8: {e}")).for_file(&self.source))
    }

    /// Where this file lands under `dest`.
    pub fn dest_path(&self, dest: &Path) -> PathBuf {
        dest.join(&self.rel)
    }
}
