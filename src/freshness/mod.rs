//! Freshness detection by modification time.

pub mod mtime;

pub use mtime::is_output_fresh;
