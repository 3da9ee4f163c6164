//! Lazily resolved glob sources.

use std::fmt;
use std::path::{Path, PathBuf};

use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use jwalk::WalkDir;

const IGNORED_FILES: &[&str] = &[".DS_Store", "Thumbs.db"];

/// Glob patterns relative to a base directory.
///
/// Nothing touches the filesystem until [`PathSpec::resolve`], so a task
/// always sees the files present when it runs. `*` does not cross `/`;
/// use `**` for nested directories.
#[derive(Clone)]
pub struct PathSpec {
    base: PathBuf,
    patterns: Vec<String>,
    set: GlobSet,
}

impl PathSpec {
    pub fn new(base: impl Into<PathBuf>, patterns: &[&str]) -> Result<Self, globset::Error> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            builder.add(GlobBuilder::new(pattern).literal_separator(true).build()?);
        }
        Ok(Self {
            base: base.into(),
            patterns: patterns.iter().map(|p| p.to_string()).collect(),
            set: builder.build()?,
        })
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    /// Matching files in walk order (directories sorted by name).
    ///
    /// A missing base directory resolves to an empty set.
    pub fn resolve(&self) -> Vec<PathBuf> {
        if !self.base.is_dir() {
            return Vec::new();
        }

        WalkDir::new(&self.base)
            .sort(true)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.file_type().is_file())
            .filter(|e| {
                let name = e.file_name().to_str().unwrap_or_default();
                !IGNORED_FILES.contains(&name)
            })
            .map(|e| e.path())
            .filter(|path| self.matches(path))
            .collect()
    }

    /// Whether an absolute path (under the base) matches any pattern.
    pub fn matches(&self, path: &Path) -> bool {
        path.strip_prefix(&self.base)
            .is_ok_and(|rel| self.set.is_match(rel))
    }
}

impl fmt::Debug for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PathSpec")
            .field("base", &self.base)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let base = self.base.display();
        match self.patterns.as_slice() {
            [single] => write!(f, "{base}/{single}"),
            many => write!(f, "{base}/{{{}}}", many.join(",")),
        }
    }
}
