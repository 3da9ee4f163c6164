//! `gust clean`: remove generated output.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};

use crate::config::GustConfig;
use crate::{debug, log};

/// Remove the preview directory, and the production directory with `all`.
pub fn clean(config: &GustConfig, all: bool) -> Result<()> {
    remove_output(config, &config.paths.dist)?;
    if all {
        remove_output(config, &config.paths.build)?;
    }
    Ok(())
}

fn remove_output(config: &GustConfig, dir: &Path) -> Result<()> {
    let display = config.root_relative(dir);
    if !dir.exists() {
        debug!("clean"; "{} does not exist", display.display());
        return Ok(());
    }
    fs::remove_dir_all(dir).with_context(|| format!("failed to remove {}", dir.display()))?;
    log!("clean"; "removed {}", display.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn project() -> (TempDir, GustConfig) {
        let dir = TempDir::new().unwrap();
        let config = GustConfig::with_root(dir.path());
        for out in [&config.paths.dist, &config.paths.build] {
            fs::create_dir_all(out.join("css")).unwrap();
            fs::write(out.join("css/index.css"), "a{}").unwrap();
        }
        fs::create_dir_all(&config.paths.src).unwrap();
        (dir, config)
    }

    #[test]
    fn test_clean_keeps_production_output() {
        let (_dir, config) = project();
        clean(&config, false).unwrap();

        assert!(!config.paths.dist.exists());
        assert!(config.paths.build.join("css/index.css").exists());
        assert!(config.paths.src.exists());
    }

    #[test]
    fn test_clean_all() {
        let (_dir, config) = project();
        clean(&config, true).unwrap();

        assert!(!config.paths.dist.exists());
        assert!(!config.paths.build.exists());
    }

    #[test]
    fn test_clean_missing_is_ok() {
        let dir = TempDir::new().unwrap();
        let config = GustConfig::with_root(dir.path());
        assert!(clean(&config, true).is_ok());
    }
}
