//! `gust run <task>...`

use std::sync::Arc;

use anyhow::Result;

use super::common::execute_graph;
use crate::config::GustConfig;
use crate::core::Lifecycle;
use crate::scheduler::TaskGraph;

/// Run the named tasks in order, stopping at the first failure.
pub fn run_tasks(
    config: Arc<GustConfig>,
    lifecycle: Arc<Lifecycle>,
    tasks: &[String],
) -> Result<()> {
    execute_graph(config, lifecycle, &TaskGraph::tasks(tasks), false)
}
