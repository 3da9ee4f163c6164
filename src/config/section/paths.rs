//! `[paths]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [paths]
//! src = "src"       # sources (html, styles, scripts, images, fonts)
//! dist = "dist"     # development preview output
//! build = "build"   # production output, derived from dist
//! ```
//!
//! Relative paths are resolved against the project root when the config is
//! loaded.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Directory layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    pub src: PathBuf,
    pub dist: PathBuf,
    pub build: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            src: "src".into(),
            dist: "dist".into(),
            build: "build".into(),
        }
    }
}

impl PathsConfig {
    /// Resolve every directory against `root`.
    pub fn normalize(&mut self, root: &Path) {
        for dir in [&mut self.src, &mut self.dist, &mut self.build] {
            if dir.is_relative() {
                *dir = root.join(&*dir);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use crate::config::test_parse_config;

    #[test]
    fn test_paths_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.paths.src, Path::new("src"));
        assert_eq!(config.paths.dist, Path::new("dist"));
        assert_eq!(config.paths.build, Path::new("build"));
    }

    #[test]
    fn test_paths_normalize_keeps_absolute() {
        let mut config = test_parse_config("[paths]\ndist = \"/tmp/preview\"");
        config.paths.normalize(Path::new("/site"));
        assert_eq!(config.paths.src, Path::new("/site/src"));
        assert_eq!(config.paths.dist, Path::new("/tmp/preview"));
    }
}
