//! Configuration section definitions.
//!
//! Each module corresponds to a section in `gust.toml`:
//!
//! | Module    | TOML Section | Purpose                                   |
//! |-----------|--------------|-------------------------------------------|
//! | `paths`   | `[paths]`    | Source, preview and production directories |
//! | `serve`   | `[serve]`    | Dev server and live-reload ports          |
//! | `styles`  | `[styles]`   | Sass command and browser targets          |
//! | `scripts` | `[scripts]`  | Bundle name                               |
//! | `images`  | `[images]`   | Encoder settings                          |
//! | `watch`   | `[watch]`    | Event coalescing window                   |

mod images;
mod paths;
mod scripts;
mod serve;
mod styles;
mod watch;

pub use images::ImagesConfig;
pub use paths::PathsConfig;
pub use scripts::ScriptsConfig;
pub use serve::ServeConfig;
pub use styles::{BrowserTargets, StylesConfig};
pub use watch::WatchConfig;
