//! `[images]` section configuration.
//!
//! ```toml
//! [images]
//! jpeg_quality = 80   # re-encode quality for JPEG optimization (1-100)
//! webp = true         # also emit a .webp next to every raster image
//! ```

use serde::{Deserialize, Serialize};

/// Image pipeline settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImagesConfig {
    pub jpeg_quality: u8,
    pub webp: bool,
}

impl Default for ImagesConfig {
    fn default() -> Self {
        Self {
            jpeg_quality: 80,
            webp: true,
        }
    }
}
