//! Shared plumbing for the commands that execute a task graph.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};

use crate::config::GustConfig;
use crate::core::Lifecycle;
use crate::scheduler::{Scheduler, TaskGraph};
use crate::task::TaskRegistry;

/// Grace period for blocking work still in flight when a graph returns.
const RUNTIME_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// Register the tasks and execute `graph` on a fresh multi-thread runtime.
pub fn execute_graph(
    config: Arc<GustConfig>,
    lifecycle: Arc<Lifecycle>,
    graph: &TaskGraph,
    live_reload: bool,
) -> Result<()> {
    let registry = Arc::new(TaskRegistry::from_config(&config)?);

    let mut scheduler = Scheduler::new(config, registry, lifecycle);
    if live_reload {
        scheduler = scheduler.with_live_reload();
    }
    let scheduler = Arc::new(scheduler);

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;

    let result = runtime.block_on(scheduler.run_graph(graph));
    runtime.shutdown_timeout(RUNTIME_SHUTDOWN_TIMEOUT);
    result.with_context(|| format!("'{}' failed", graph.name))
}
