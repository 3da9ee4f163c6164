//! `[watch]` section configuration.
//!
//! ```toml
//! [watch]
//! debounce_ms = 100   # coalescing window for filesystem events
//! ```

use serde::{Deserialize, Serialize};

/// File watcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WatchConfig {
    /// Events closer together than this are handled as one batch.
    pub debounce_ms: u64,
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}
