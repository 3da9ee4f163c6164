//! Stage trait and the pipeline builder.

use std::fmt;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use thiserror::Error;

use super::{FileSet, VirtualFile};

/// A transform stage could not process its input.
#[derive(Debug, Error)]
#[error("{stage}: {}{message}", file_prefix(.file))]
pub struct StageError {
    /// Name of the failing stage, filled in by [`Pipeline::run`]
    pub stage: &'static str,
    /// Offending input, when the failure is tied to one file
    pub file: Option<PathBuf>,
    pub message: String,
}

fn file_prefix(file: &Option<PathBuf>) -> String {
    file.as_ref()
        .map(|f| format!("{}: ", f.display()))
        .unwrap_or_default()
}

impl StageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            stage: "",
            file: None,
            message: message.into(),
        }
    }

    pub fn for_file(mut self, path: &Path) -> Self {
        self.file = Some(path.to_path_buf());
        self
    }

    fn in_stage(mut self, name: &'static str) -> Self {
        if self.stage.is_empty() {
            self.stage = name;
        }
        self
    }
}

/// A named file-set → file-set operation.
///
/// Stages are stateless across invocations and must not reorder files unless
/// reducing many files to one.
pub trait Stage: Send + Sync {
    fn name(&self) -> &'static str;
    fn apply(&self, files: FileSet) -> Result<FileSet, StageError>;
}

/// A per-file transform, lifted to a [`Stage`] with [`EachFile`].
pub trait FileTransform: Send + Sync {
    fn name(&self) -> &'static str;
    fn transform(&self, file: VirtualFile) -> Result<VirtualFile, StageError>;
}

/// Runs a [`FileTransform`] over every file in parallel, preserving order.
pub struct EachFile<T>(pub T);

impl<T: FileTransform> Stage for EachFile<T> {
    fn name(&self) -> &'static str {
        self.0.name()
    }

    fn apply(&self, files: FileSet) -> Result<FileSet, StageError> {
        files
            .into_par_iter()
            .map(|file| {
                let source = file.source.clone();
                self.0.transform(file).map_err(|e| {
                    if e.file.is_none() {
                        e.for_file(&source)
                    } else {
                        e
                    }
                })
            })
            .collect()
    }
}

/// An ordered chain of stages.
#[derive(Default)]
pub struct Pipeline {
    stages: Vec<Box<dyn Stage>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a whole-set stage.
    pub fn pipe(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Append a per-file transform.
    pub fn map(self, transform: impl FileTransform + 'static) -> Self {
        self.pipe(EachFile(transform))
    }

    pub fn stage_names(&self) -> Vec<&'static str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    /// Run every stage in order. Stops early once the set is empty, so
    /// reducing stages never see an empty input.
    pub fn run(&self, mut files: FileSet) -> Result<FileSet, StageError> {
        for stage in &self.stages {
            if files.is_empty() {
                break;
            }
            files = stage.apply(files).map_err(|e| e.in_stage(stage.name()))?;
        }
        Ok(files)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.stage_names()).finish()
    }
}
