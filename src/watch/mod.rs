//! Source watching.
//!
//! Filesystem events are coalesced by the debouncer, matched against the
//! [`registrar::WatchRegistrar`] bindings, and turned into task re-runs or
//! reload-only notifications. Bindings are independent: one change fires every binding
//! whose pattern matches it, each at most once per batch.

// Pure timing and deduplication.
mod debouncer;
// Path pattern → reaction table.
mod registrar;
// notify bridge, watch roots and dispatch.
mod watcher;


pub use watcher::run;
