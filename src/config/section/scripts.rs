//! `[scripts]` section configuration.
//!
//! ```toml
//! [scripts]
//! bundle = "index.min.js"   # name of the concatenated bundle
//! ```

use serde::{Deserialize, Serialize};

/// Script pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScriptsConfig {
    /// File name of the concatenated, minified bundle.
    pub bundle: String,
}

impl Default for ScriptsConfig {
    fn default() -> Self {
        Self {
            bundle: "index.min.js".to_string(),
        }
    }
}
