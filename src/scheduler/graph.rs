//! Task graphs: named compositions of tasks.

use std::fmt;

use super::ScheduleError;
use crate::task::{TaskRegistry, names};

/// A leaf of the graph.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Run a registered task once
    Task(String),
    /// Watch sources and re-run tasks until shutdown
    Watch,
    /// Serve the preview directory until shutdown
    Serve,
}

/// Sequence and parallel composition over steps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Step(Step),
    /// Members run in order; the first failure aborts the rest
    Sequence(Vec<Node>),
    /// Members run concurrently; completes when all members complete
    Parallel(Vec<Node>),
}

impl Node {
    pub fn task(name: &str) -> Self {
        Self::Step(Step::Task(name.to_string()))
    }

    /// Task names in execution order, for validation and listing.
    pub fn task_names(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_tasks(&mut out);
        out
    }

    fn collect_tasks<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Self::Step(Step::Task(name)) => out.push(name),
            Self::Step(_) => {}
            Self::Sequence(nodes) | Self::Parallel(nodes) => {
                for node in nodes {
                    node.collect_tasks(out);
                }
            }
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (label, nodes) = match self {
            Self::Step(Step::Task(name)) => return f.write_str(name),
            Self::Step(Step::Watch) => return f.write_str("watch"),
            Self::Step(Step::Serve) => return f.write_str("serve"),
            Self::Sequence(nodes) => ("series", nodes),
            Self::Parallel(nodes) => ("parallel", nodes),
        };

        write!(f, "{label}(")?;
        for (i, node) in nodes.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{node}")?;
        }
        f.write_str(")")
    }
}

/// A named root composition.
#[derive(Debug, Clone)]
pub struct TaskGraph {
    pub name: &'static str,
    pub root: Node,
}

impl TaskGraph {
    /// `default`: build the preview, then watch and serve until shutdown.
    pub fn dev() -> Self {
        Self {
            name: "default",
            root: Node::Sequence(vec![
                Node::Parallel(vec![
                    Node::task(names::HTML),
                    Node::task(names::STYLES),
                    Node::task(names::SCRIPTS),
                ]),
                Node::Parallel(vec![Node::task(names::IMAGES), Node::task(names::FONTS)]),
                Node::Parallel(vec![Node::Step(Step::Watch), Node::Step(Step::Serve)]),
            ]),
        }
    }

    /// `build`: derive the production output from the preview, strictly in order.
    pub fn build() -> Self {
        Self {
            name: "build",
            root: Node::Sequence(vec![
                Node::task(names::HTML_BUILD),
                Node::task(names::STYLES_BUILD),
                Node::task(names::SCRIPTS_BUILD),
                Node::task(names::COPY_STATIC_ASSETS),
            ]),
        }
    }

    /// Run the named tasks one after another.
    pub fn tasks(names: &[String]) -> Self {
        Self {
            name: "run",
            root: Node::Sequence(names.iter().map(|n| Node::task(n)).collect()),
        }
    }

    /// Every task referenced by the graph must be registered.
    pub fn validate(&self, registry: &TaskRegistry) -> Result<(), ScheduleError> {
        match self
            .root
            .task_names()
            .into_iter()
            .find(|name| !registry.contains(name))
        {
            Some(name) => Err(ScheduleError::UnknownTask(name.to_string())),
            None => Ok(()),
        }
    }
}

impl fmt::Display for TaskGraph {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.name, self.root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GustConfig;
    use tempfile::TempDir;

    #[test]
    fn test_display() {
        assert_eq!(
            TaskGraph::dev().to_string(),
            "default: series(parallel(html, styles, scripts), parallel(images, fonts), parallel(watch, serve))"
        );
        assert_eq!(
            TaskGraph::build().root.to_string(),
            "series(htmlBuild, stylesBuild, scriptsBuild, copyStaticAssets)"
        );
    }

    #[test]
    fn test_task_names_in_order() {
        assert_eq!(
            TaskGraph::dev().root.task_names(),
            ["html", "styles", "scripts", "images", "fonts"]
        );
    }

    #[test]
    fn test_validate() {
        let dir = TempDir::new().unwrap();
        let registry = TaskRegistry::from_config(&GustConfig::with_root(dir.path())).unwrap();

        assert!(TaskGraph::dev().validate(&registry).is_ok());
        assert!(TaskGraph::build().validate(&registry).is_ok());

        let graph = TaskGraph::tasks(&["styles".into(), "sprites".into()]);
        assert!(matches!(
            graph.validate(&registry),
            Err(ScheduleError::UnknownTask(name)) if name == "sprites"
        ));
    }
}
