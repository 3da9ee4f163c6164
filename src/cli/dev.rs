//! `gust dev`: build the preview, then watch and serve it.

use std::sync::Arc;

use anyhow::Result;

use super::common::execute_graph;
use crate::config::GustConfig;
use crate::core::Lifecycle;
use crate::scheduler::TaskGraph;

/// Runs until Ctrl+C. Returns an error if the initial build fails or a
/// fatal error stops the watcher or server.
pub fn start(config: Arc<GustConfig>, lifecycle: Arc<Lifecycle>) -> Result<()> {
    execute_graph(config, lifecycle, &TaskGraph::dev(), true)
}
