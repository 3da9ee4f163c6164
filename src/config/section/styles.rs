//! `[styles]` section configuration.
//!
//! # Example
//!
//! ```toml
//! [styles]
//! sass = ["npx", "sass"]   # Sass compiler command (default: ["sass"])
//!
//! [styles.targets]         # Oldest browser major versions to support
//! chrome = 100
//! safari = 15
//! ```
//!
//! Targets drive vendor prefixing and lowering of newer syntax such as
//! media query ranges.

use serde::{Deserialize, Serialize};

/// Style pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StylesConfig {
    /// Command used to compile `.scss`/`.sass` entries.
    pub sass: Vec<String>,

    /// Browser targets for prefixing and syntax lowering.
    pub targets: BrowserTargets,
}

impl Default for StylesConfig {
    fn default() -> Self {
        Self {
            sass: vec!["sass".to_string()],
            targets: BrowserTargets::default(),
        }
    }
}

/// Oldest supported browser major versions. `None` leaves a browser out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserTargets {
    pub chrome: Option<u32>,
    pub edge: Option<u32>,
    pub firefox: Option<u32>,
    pub safari: Option<u32>,
    pub ios_safari: Option<u32>,
    pub samsung: Option<u32>,
}

impl Default for BrowserTargets {
    fn default() -> Self {
        Self {
            chrome: Some(95),
            edge: Some(95),
            firefox: Some(91),
            safari: Some(14),
            ios_safari: Some(14),
            samsung: Some(15),
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::config::test_parse_config;

    #[test]
    fn test_styles_defaults() {
        let config = test_parse_config("");
        assert_eq!(config.styles.sass, vec!["sass".to_string()]);
        assert_eq!(config.styles.targets.chrome, Some(95));
    }

    #[test]
    fn test_styles_targets_partial_override() {
        let config = test_parse_config(
            "[styles]\nsass = [\"npx\", \"sass\"]\n[styles.targets]\nchrome = 110\nsafari = 16",
        );
        assert_eq!(config.styles.sass, vec!["npx".to_string(), "sass".to_string()]);
        assert_eq!(config.styles.targets.chrome, Some(110));
        assert_eq!(config.styles.targets.safari, Some(16));
        // Unlisted browsers keep their defaults.
        assert_eq!(config.styles.targets.firefox, Some(91));
    }
}
