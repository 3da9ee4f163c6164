//! Tasks: one source, one destination, one or more pipelines.
//!
//! A task resolves its [`PathSpec`] when it runs, reads the matching files,
//! feeds them through each branch pipeline in order and writes every
//! resulting file under its destination. Branches see the same input set,
//! so one source can yield several independent artifacts (`a.png` →
//! `a.webp` and an optimized `a.png`).

mod registry;

pub use registry::{TaskRegistry, names};

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use crate::pipeline::{FileSet, PathSpec, Pipeline, StageError, VirtualFile};

/// What connected browsers should do after a task wrote new artifacts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReloadKind {
    /// Reload the page
    Full,
    /// Re-fetch the written stylesheets in place
    Css,
    /// Production output, nothing is watching it
    None,
}

#[derive(Debug, Error)]
pub enum TaskError {
    /// A resolved source vanished or became unreadable before it was read.
    #[error("failed to read {}", .path.display())]
    Source {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(transparent)]
    Transform(#[from] StageError),

    /// The destination could not be written.
    #[error("failed to write {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl TaskError {
    /// Destination I/O failures abort the whole run; everything else only
    /// fails the task.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

/// Files a task run wrote, in write order.
#[derive(Debug, Default)]
pub struct TaskReport {
    pub inputs: usize,
    pub written: Vec<PathBuf>,
}

pub struct Task {
    name: String,
    source: PathSpec,
    dest: PathBuf,
    branches: Vec<Pipeline>,
    reload: ReloadKind,
}

impl Task {
    pub fn new(name: impl Into<String>, source: PathSpec, dest: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source,
            dest: dest.into(),
            branches: Vec::new(),
            reload: ReloadKind::None,
        }
    }

    /// Add a pipeline fed with the full source set.
    pub fn branch(mut self, pipeline: Pipeline) -> Self {
        self.branches.push(pipeline);
        self
    }

    pub fn reload(mut self, kind: ReloadKind) -> Self {
        self.reload = kind;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn source(&self) -> &PathSpec {
        &self.source
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn reload_kind(&self) -> ReloadKind {
        self.reload
    }

    pub fn branches(&self) -> &[Pipeline] {
        &self.branches
    }

    /// Run every branch and write its output.
    ///
    /// A failing branch stops the task; artifacts of earlier branches stay
    /// written.
    pub fn run(&self) -> Result<TaskReport, TaskError> {
        let files = self.read_sources()?;
        let mut report = TaskReport {
            inputs: files.len(),
            written: Vec::new(),
        };

        for branch in &self.branches {
            let output = branch.run(files.clone())?;
            report.written.extend(self.write(&output)?);
        }

        Ok(report)
    }

    fn read_sources(&self) -> Result<FileSet, TaskError> {
        self.source
            .resolve()
            .par_iter()
            .map(|path| {
                VirtualFile::read(path, self.source.base()).map_err(|source| TaskError::Source {
                    path: path.clone(),
                    source,
                })
            })
            .collect()
    }

    fn write(&self, files: &[VirtualFile]) -> Result<Vec<PathBuf>, TaskError> {
        files
            .iter()
            .map(|file| {
                let path = file.dest_path(&self.dest);
                write_artifact(&path, &file.contents)
                    .map(|()| path.clone())
                    .map_err(|source| TaskError::Io { path, source })
            })
            .collect()
    }
}

fn write_artifact(path: &Path, contents: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, contents)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{FileTransform, Stage};
    use crate::transform::Select;
    use tempfile::TempDir;

    struct Suffix(&'static str);

    impl FileTransform for Suffix {
        fn name(&self) -> &'static str {
            "suffix"
        }

        fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError> {
            let mut contents = file.contents.clone();
            contents.extend_from_slice(self.0.as_bytes());
            Ok(file.with_contents(contents))
        }
    }

    struct Reject;

    impl Stage for Reject {
        fn name(&self) -> &'static str {
            "reject"
        }

        fn apply(&self, _: FileSet) -> Result<FileSet, StageError> {
            Err(StageError::new("always fails"))
        }
    }

    fn setup() -> (TempDir, PathBuf, PathBuf) {
        let dir = TempDir::new().unwrap();
        let src = dir.path().join("src");
        let dest = dir.path().join("dist");
        fs::create_dir_all(src.join("nested")).unwrap();
        fs::write(src.join("a.txt"), "a").unwrap();
        fs::write(src.join("b.md"), "b").unwrap();
        fs::write(src.join("nested/c.txt"), "c").unwrap();
        (dir, src, dest)
    }

    #[test]
    fn test_one_artifact_per_input() {
        let (_dir, src, dest) = setup();
        let task = Task::new("copy", PathSpec::new(&src, &["**/*.txt"]).unwrap(), &dest)
            .branch(Pipeline::new().map(Suffix("!")));

        let report = task.run().unwrap();
        assert_eq!(report.inputs, 2);
        assert_eq!(report.written, vec![dest.join("a.txt"), dest.join("nested/c.txt")]);
        assert_eq!(fs::read_to_string(dest.join("nested/c.txt")).unwrap(), "c!");
        assert!(!dest.join("b.md").exists());
    }

    #[test]
    fn test_branches_share_input() {
        let (_dir, src, dest) = setup();
        let task = Task::new("multi", PathSpec::new(&src, &["*"]).unwrap(), &dest)
            .branch(Pipeline::new().pipe(Select(&["txt"])).map(Suffix("1")))
            .branch(Pipeline::new().pipe(Select(&["md"])));

        let report = task.run().unwrap();
        assert_eq!(report.written.len(), 2);
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "a1");
        assert_eq!(fs::read_to_string(dest.join("b.md")).unwrap(), "b");
    }

    #[test]
    fn test_transform_failure_is_not_fatal() {
        let (_dir, src, dest) = setup();
        let task = Task::new("bad", PathSpec::new(&src, &["*.txt"]).unwrap(), &dest)
            .branch(Pipeline::new().pipe(Reject));

        let err = task.run().unwrap_err();
        assert!(matches!(err, TaskError::Transform(ref e) if e.stage == "reject"));
        assert!(!err.is_fatal());
        assert!(!dest.exists());
    }

    #[test]
    fn test_unwritable_destination_is_fatal() {
        let (dir, src, _) = setup();
        // A file where the destination directory should be.
        let dest = dir.path().join("blocked");
        fs::write(&dest, "file").unwrap();

        let task = Task::new("copy", PathSpec::new(&src, &["*.txt"]).unwrap(), &dest)
            .branch(Pipeline::new());
        let err = task.run().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn test_missing_source_dir_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let task = Task::new(
            "empty",
            PathSpec::new(dir.path().join("nope"), &["*"]).unwrap(),
            dir.path().join("out"),
        )
        .branch(Pipeline::new());

        let report = task.run().unwrap();
        assert_eq!(report.inputs, 0);
        assert!(report.written.is_empty());
    }
}
