//! Project configuration (`gust.toml`).
//!
//! # Module Structure
//!
//! ```text
//! config/
//! ├── section/       # One module per TOML section
//! ├── error          # ConfigError
//! ├── util           # Config file discovery
//! └── mod.rs         # GustConfig (this file)
//! ```
//!
//! The config file is optional: without one, the defaults describe the
//! conventional `src/` → `dist/` → `build/` layout rooted at the current
//! directory. Once loaded, a [`GustConfig`] is never mutated; it is shared
//! as `Arc<GustConfig>` by the task registry, scheduler, watcher and server.

mod error;
pub mod section;
mod util;

pub use error::ConfigError;
pub use section::{
    BrowserTargets, ImagesConfig, PathsConfig, ScriptsConfig, ServeConfig, StylesConfig,
    WatchConfig,
};

use crate::{
    cli::{Cli, Commands},
    log,
    utils::path::normalize_path,
};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use util::find_config_file;

/// Default config file name, searched upward from the current directory.
pub const DEFAULT_CONFIG: &str = "gust.toml";

/// Root configuration structure representing gust.toml
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GustConfig {
    /// Absolute path to the config file, if one was found (internal use only)
    #[serde(skip)]
    pub config_path: Option<PathBuf>,

    /// Project root directory (internal use only)
    #[serde(skip)]
    pub root: PathBuf,

    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub serve: ServeConfig,

    #[serde(default)]
    pub styles: StylesConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub images: ImagesConfig,

    #[serde(default)]
    pub watch: WatchConfig,
}

impl GustConfig {
    /// Load configuration for the given CLI invocation.
    ///
    /// Searches upward from cwd for the config file. The project root is the
    /// config file's directory, or cwd when no config file exists. An
    /// explicitly named config file (`-C`) must exist.
    pub fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to get current working directory")?;

        let (mut config, root) = match find_config_file(&cli.config, &cwd) {
            Some(path) => {
                let mut config = Self::from_path(&path)?;
                let root = path.parent().map(Path::to_path_buf).unwrap_or(cwd);
                config.config_path = Some(normalize_path(&path));
                (config, root)
            }
            None if cli.config != Path::new(DEFAULT_CONFIG) => {
                return Err(ConfigError::NotFound(cli.config.clone()).into());
            }
            None => (Self::default(), cwd),
        };

        config.finalize(&root);
        config.apply_command_options(cli);
        config.validate()?;
        Ok(config)
    }

    /// Build a config rooted at `root` from defaults (used by tests and `Default`-like callers).
    pub fn with_root(root: &Path) -> Self {
        let mut config = Self::default();
        config.finalize(root);
        config
    }

    /// Parse configuration from TOML string
    pub fn from_str(content: &str) -> Result<Self> {
        let (config, _) = Self::parse_with_ignored(content)?;
        Ok(config)
    }

    /// Load configuration from file path with unknown field detection.
    fn from_path(path: &Path) -> Result<Self> {
        let content =
            fs::read_to_string(path).map_err(|err| ConfigError::Io(path.to_path_buf(), err))?;

        let (config, ignored) = Self::parse_with_ignored(&content)?;
        if !ignored.is_empty() {
            Self::print_unknown_fields_warning(&ignored, path);
        }

        Ok(config)
    }

    /// Parse TOML content, collecting any unknown fields.
    fn parse_with_ignored(content: &str) -> Result<(Self, Vec<String>), ConfigError> {
        let mut ignored = Vec::new();
        let deserializer = toml::Deserializer::new(content);
        let config = serde_ignored::deserialize(deserializer, |path: serde_ignored::Path| {
            ignored.push(path.to_string());
        })?;
        Ok((config, ignored))
    }

    /// Print warning about unknown fields.
    fn print_unknown_fields_warning(fields: &[String], path: &Path) {
        let display_path = path
            .file_name()
            .map(|n| n.to_string_lossy())
            .unwrap_or_else(|| path.to_string_lossy());
        log!("warning"; "unknown fields in {}, ignoring:", display_path);
        for field in fields {
            eprintln!("- {}", field);
        }
    }

    /// Resolve the root and every configured directory to absolute paths.
    fn finalize(&mut self, root: &Path) {
        self.root = normalize_path(root);
        self.paths.normalize(&self.root);
    }

    /// Apply command-specific overrides.
    fn apply_command_options(&mut self, cli: &Cli) {
        if let Some(Commands::Dev { interface, port }) = &cli.command {
            if let Some(interface) = interface {
                self.serve.interface = *interface;
            }
            if let Some(port) = port {
                self.serve.port = *port;
            }
        }
    }

    /// Reject settings no task can work with.
    fn validate(&self) -> Result<(), ConfigError> {
        let fail = |msg: &str| Err(ConfigError::Validation(msg.to_string()));

        if self.styles.sass.is_empty() {
            return fail("[styles] sass must name a command");
        }
        if !(1..=100).contains(&self.images.jpeg_quality) {
            return fail("[images] jpeg_quality must be between 1 and 100");
        }
        let bundle = &self.scripts.bundle;
        if bundle.is_empty() || bundle.contains(['/', '\\']) {
            return fail("[scripts] bundle must be a plain file name");
        }
        if self.serve.port == self.serve.ws_port {
            return fail("[serve] port and ws_port must differ");
        }
        for (name, dir) in [("dist", &self.paths.dist), ("build", &self.paths.build)] {
            if dir == &self.paths.src || self.paths.src.starts_with(dir) {
                return Err(ConfigError::Validation(format!(
                    "[paths] {name} must not contain the source directory"
                )));
            }
        }
        if self.paths.dist == self.paths.build {
            return fail("[paths] dist and build must differ");
        }
        Ok(())
    }

    /// Get the root directory path
    pub fn get_root(&self) -> &Path {
        &self.root
    }

    /// Get path relative to the project root, for display
    pub fn root_relative(&self, path: impl AsRef<Path>) -> PathBuf {
        path.as_ref()
            .strip_prefix(&self.root)
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.as_ref().to_path_buf())
    }
}

/// Parse a config snippet, failing the test on unknown fields.
#[cfg(test)]
pub fn test_parse_config(content: &str) -> GustConfig {
    let (parsed, ignored) = GustConfig::parse_with_ignored(content).unwrap();
    assert!(
        ignored.is_empty(),
        "test config has unknown fields: {:?}",
        ignored
    );
    parsed
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_unknown_fields_collected() {
        let (_, ignored) =
            GustConfig::parse_with_ignored("[serve]\nport = 4000\nopen = true\n[extra]\na = 1")
                .unwrap();
        assert_eq!(ignored, vec!["serve.open".to_string(), "extra".to_string()]);
    }

    #[test]
    fn test_invalid_toml() {
        assert!(GustConfig::from_str("[serve\nport = 1").is_err());
    }

    #[test]
    fn test_with_root_normalizes_paths() {
        let dir = TempDir::new().unwrap();
        let config = GustConfig::with_root(dir.path());
        let root = dir.path().canonicalize().unwrap();

        assert_eq!(config.root, root);
        assert_eq!(config.paths.src, root.join("src"));
        assert_eq!(config.paths.dist, root.join("dist"));
        assert_eq!(config.paths.build, root.join("build"));
    }

    #[test]
    fn test_validate_defaults_ok() {
        let dir = TempDir::new().unwrap();
        assert!(GustConfig::with_root(dir.path()).validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let dir = TempDir::new().unwrap();

        let mut config = GustConfig::with_root(dir.path());
        config.images.jpeg_quality = 0;
        assert!(config.validate().is_err());

        let mut config = GustConfig::with_root(dir.path());
        config.scripts.bundle = "js/app.js".to_string();
        assert!(config.validate().is_err());

        let mut config = GustConfig::with_root(dir.path());
        config.serve.ws_port = config.serve.port;
        assert!(config.validate().is_err());

        let mut config = GustConfig::with_root(dir.path());
        config.paths.dist = config.root.clone();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_root_relative() {
        let dir = TempDir::new().unwrap();
        let config = GustConfig::with_root(dir.path());
        let css = config.paths.dist.join("css").join("index.css");
        assert_eq!(config.root_relative(&css), Path::new("dist/css/index.css"));
    }
}
