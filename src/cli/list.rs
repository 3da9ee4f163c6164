//! `gust list`: registered tasks and pipeline compositions.

use std::fmt::Write;

use anyhow::Result;
use owo_colors::OwoColorize;

use crate::config::GustConfig;
use crate::scheduler::TaskGraph;
use crate::task::{Task, TaskRegistry};

pub fn list_tasks(config: &GustConfig) -> Result<()> {
    let registry = TaskRegistry::from_config(config)?;
    print!("{}", render(config, &registry));
    Ok(())
}

fn render(config: &GustConfig, registry: &TaskRegistry) -> String {
    let width = registry.iter().map(|t| t.name().len()).max().unwrap_or(0);
    let mut out = String::new();

    let _ = writeln!(out, "{}", "tasks".bold());
    for task in registry.iter() {
        let _ = writeln!(
            out,
            "  {:<width$}  {} -> {}  {}",
            task.name().cyan(),
            source_display(config, task),
            config.root_relative(task.dest()).display(),
            branches_display(task).dimmed(),
        );
    }

    let _ = writeln!(out, "{}", "pipelines".bold());
    for graph in [TaskGraph::dev(), TaskGraph::build()] {
        let _ = writeln!(out, "  {graph}");
    }
    out
}

fn source_display(config: &GustConfig, task: &Task) -> String {
    let source = task.source();
    let base = config.root_relative(source.base());
    let patterns = source.patterns();
    let pattern = match patterns {
        [single] => single.clone(),
        _ => format!("{{{}}}", patterns.join(",")),
    };
    format!("{}/{}", base.display(), pattern)
}

/// `[a, b] | [c]`, one bracket per branch.
fn branches_display(task: &Task) -> String {
    task.branches()
        .iter()
        .map(|branch| {
            let names = branch.stage_names();
            if names.is_empty() {
                "[copy]".to_string()
            } else {
                format!("[{}]", names.join(", "))
            }
        })
        .collect::<Vec<_>>()
        .join(" | ")
}
