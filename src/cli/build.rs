//! `gust build`: derive the production directory from the preview directory.
//!
//! The preview directory is not rebuilt first; run `gust dev` (or the
//! development tasks through `gust run`) to refresh it.

use std::sync::Arc;
use std::time::Instant;

use anyhow::Result;

use super::common::execute_graph;
use crate::config::GustConfig;
use crate::core::Lifecycle;
use crate::log;
use crate::scheduler::TaskGraph;

pub fn build(config: Arc<GustConfig>, lifecycle: Arc<Lifecycle>) -> Result<()> {
    let dist = &config.paths.dist;
    if !dist.is_dir() {
        log!(
            "warning";
            "{} does not exist, production output will be empty",
            config.root_relative(dist).display()
        );
    }

    let start = Instant::now();
    let build = config.root_relative(&config.paths.build);
    execute_graph(Arc::clone(&config), lifecycle, &TaskGraph::build(), false)?;
    log!(
        "build";
        "{} ready in {:.2} s",
        build.display(),
        start.elapsed().as_secs_f64()
    );
    Ok(())
}
