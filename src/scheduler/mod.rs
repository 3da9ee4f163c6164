//! Task scheduling.
//!
//! A [`TaskGraph`] is executed by walking its [`Node`]s:
//!
//! - `Sequence`: members run strictly in order, the first failure aborts the
//!   remaining members
//! - `Parallel`: members start together and are joined; a failing member does
//!   not cancel its siblings, the node reports the first failure once all
//!   members are done
//!
//! Tasks run on the blocking pool (their stages fan out over rayon), so the
//! runtime stays free for the watcher, the reload hub and the dev server.
//!
//! A fatal error (artifact write failure, service failure) additionally shuts
//! the [`Lifecycle`] down, which stops long-running siblings such as `watch`
//! and `serve`.

mod error;
mod graph;
#[cfg(test)]
mod tests;

pub use error::ScheduleError;
pub use graph::{Node, Step, TaskGraph};

use std::error::Error;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use parking_lot::Mutex;
use rustc_hash::FxHashSet;

use crate::config::GustConfig;
use crate::core::Lifecycle;
use crate::reload::{ReloadHandle, ReloadHub, ReloadMsg, start_ws_server};
use crate::serve::DevServer;
use crate::task::{ReloadKind, Task, TaskRegistry, TaskReport};
use crate::utils::path::display_relative;
use crate::{debug, log, logger};

pub struct Scheduler {
    config: Arc<GustConfig>,
    registry: Arc<TaskRegistry>,
    lifecycle: Arc<Lifecycle>,
    reload: Option<ReloadHandle>,
    /// Taken by the `serve` step, which owns the hub from then on
    hub: Mutex<Option<ReloadHub>>,
    /// Tasks whose last run failed; the overlay clears once this empties
    failing: Mutex<FxHashSet<String>>,
}

impl Scheduler {
    pub fn new(
        config: Arc<GustConfig>,
        registry: Arc<TaskRegistry>,
        lifecycle: Arc<Lifecycle>,
    ) -> Self {
        Self {
            config,
            registry,
            lifecycle,
            reload: None,
            hub: Mutex::new(None),
            failing: Mutex::new(FxHashSet::default()),
        }
    }

    /// Notify browsers after every task run. The hub starts with `serve`.
    pub fn with_live_reload(mut self) -> Self {
        let (hub, handle) = ReloadHub::new();
        self.hub = Mutex::new(Some(hub));
        self.reload = Some(handle);
        self
    }

    /// Send notifications to an externally owned channel.
    #[cfg(test)]
    pub fn with_reload_handle(mut self, handle: ReloadHandle) -> Self {
        self.reload = Some(handle);
        self
    }

    pub fn config(&self) -> &GustConfig {
        &self.config
    }

    pub fn lifecycle(&self) -> &Arc<Lifecycle> {
        &self.lifecycle
    }

    pub fn reload_handle(&self) -> Option<&ReloadHandle> {
        self.reload.as_ref()
    }

    /// Whether a successful run of `name` that wrote files reloads the page.
    pub fn reloads_page(&self, name: &str) -> bool {
        self.registry
            .get(name)
            .is_some_and(|task| task.reload_kind() == ReloadKind::Full)
    }

    /// Run a whole graph.
    pub async fn run_graph(self: &Arc<Self>, graph: &TaskGraph) -> Result<(), ScheduleError> {
        graph.validate(&self.registry)?;
        debug!("task"; "{}", graph);
        self.run(&graph.root).await
    }

    /// Run one node of a graph.
    pub fn run(self: &Arc<Self>, node: &Node) -> BoxFuture<'static, Result<(), ScheduleError>> {
        let this = Arc::clone(self);
        let node = node.clone();

        async move {
            match node {
                Node::Step(step) => this.run_step(step).await,
                Node::Sequence(nodes) => {
                    for node in &nodes {
                        if this.lifecycle.is_shutdown() {
                            return Ok(());
                        }
                        this.run(node).await?;
                    }
                    Ok(())
                }
                Node::Parallel(nodes) => {
                    let results = join_all(nodes.iter().map(|node| this.run(node))).await;
                    results.into_iter().collect::<Result<Vec<()>, _>>().map(drop)
                }
            }
        }
        .boxed()
    }

    async fn run_step(self: Arc<Self>, step: Step) -> Result<(), ScheduleError> {
        let result = match step {
            Step::Task(name) => self.run_task(&name).await.map(drop),
            Step::Watch => crate::watch::run(Arc::clone(&self))
                .await
                .map_err(|e| service("watch", e)),
            Step::Serve => self.serve().await,
        };

        if let Err(e) = &result
            && e.is_fatal()
        {
            self.lifecycle.shutdown();
        }
        result
    }

    /// Run a task as part of a graph, logging its start and end.
    pub async fn run_task(&self, name: &str) -> Result<TaskReport, ScheduleError> {
        log!("task"; "starting '{}'...", name);
        match self.execute(name).await {
            Ok((report, elapsed)) => {
                log!(
                    "task";
                    "finished '{}' after {} ({} of {} written)",
                    name,
                    format_elapsed(elapsed),
                    report.written.len(),
                    report.inputs
                );
                Ok(report)
            }
            Err(e) => {
                log!("error"; "{}", error_chain(&e));
                Err(e)
            }
        }
    }

    /// Re-run a task after a source change, reporting through the status line.
    pub async fn rebuild(&self, name: &str) -> Result<TaskReport, ScheduleError> {
        match self.execute(name).await {
            Ok((report, elapsed)) => {
                logger::status_success(&format!(
                    "rebuilt '{}' in {} ({} written)",
                    name,
                    format_elapsed(elapsed),
                    report.written.len()
                ));
                Ok(report)
            }
            Err(e) => {
                logger::status_error(&e.to_string(), &source_chain(&e));
                Err(e)
            }
        }
    }

    async fn execute(&self, name: &str) -> Result<(TaskReport, Duration), ScheduleError> {
        let task = self
            .registry
            .get(name)
            .ok_or_else(|| ScheduleError::UnknownTask(name.to_string()))?;

        let start = Instant::now();
        let runner = Arc::clone(&task);
        let result = tokio::task::spawn_blocking(move || runner.run())
            .await
            .map_err(|_| ScheduleError::Panicked(name.to_string()))?;

        match result {
            Ok(report) => {
                self.notify_success(&task, &report);
                Ok((report, start.elapsed()))
            }
            Err(source) => {
                let err = ScheduleError::Task {
                    task: name.to_string(),
                    source,
                };
                self.notify_failure(name, &err);
                if err.is_fatal() {
                    self.lifecycle.shutdown();
                }
                Err(err)
            }
        }
    }

    fn notify_success(&self, task: &Task, report: &TaskReport) {
        let recovered = {
            let mut failing = self.failing.lock();
            failing.remove(task.name()) && failing.is_empty()
        };
        let Some(reload) = &self.reload else { return };

        if recovered {
            reload.send(ReloadMsg::ClearError);
        }
        if report.written.is_empty() {
            return;
        }
        match task.reload_kind() {
            ReloadKind::Full => reload.send(ReloadMsg::Reload {
                reason: Some(task.name().to_string()),
            }),
            ReloadKind::Css => {
                let dist = &self.config.paths.dist;
                let paths = report
                    .written
                    .iter()
                    .map(|path| format!("/{}", display_relative(path, dist)))
                    .collect();
                reload.send(ReloadMsg::Css { paths });
            }
            ReloadKind::None => {}
        }
    }

    fn notify_failure(&self, name: &str, err: &ScheduleError) {
        self.failing.lock().insert(name.to_string());
        if let Some(reload) = &self.reload {
            reload.send(ReloadMsg::Error {
                task: name.to_string(),
                message: source_chain(err),
            });
        }
    }

    /// Serve the preview directory (and the reload hub) until shutdown.
    async fn serve(&self) -> Result<(), ScheduleError> {
        let serve = &self.config.serve;
        let mut server = DevServer::bind(
            serve.interface,
            serve.port,
            &self.config.paths.dist,
            &self.lifecycle,
        )
        .map_err(|e| service("serve", e))?;

        let hub = self.hub.lock().take();
        if let (Some(hub), Some(handle)) = (hub, &self.reload) {
            let ws_port = start_ws_server(
                serve.interface,
                serve.ws_port,
                handle.clone(),
                Arc::clone(&self.lifecycle),
            )
            .map_err(|e| service("serve", e))?;
            tokio::spawn(hub.run());
            debug!("reload"; "ws://{}:{}", serve.interface, ws_port);
            server = server.with_live_reload(ws_port);
        }

        log!("serve"; "http://{}", server.addr());
        let lifecycle = Arc::clone(&self.lifecycle);
        let result = tokio::task::spawn_blocking(move || server.run(lifecycle)).await;

        if let Some(handle) = &self.reload {
            handle.send(ReloadMsg::Shutdown);
        }
        match result {
            Ok(result) => result.map_err(|e| service("serve", e)),
            Err(_) => Err(ScheduleError::Panicked("serve".to_string())),
        }
    }
}

fn service(step: &'static str, source: anyhow::Error) -> ScheduleError {
    ScheduleError::Service {
        step,
        source: source.into(),
    }
}

/// `error: cause: cause` on one line.
pub fn error_chain(err: &dyn Error) -> String {
    let mut out = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        out.push_str(": ");
        out.push_str(&cause.to_string());
        source = cause.source();
    }
    out
}

/// Causes of `err` without its own message, one per line.
fn source_chain(err: &dyn Error) -> String {
    let mut lines = Vec::new();
    let mut source = err.source();
    while let Some(cause) = source {
        lines.push(cause.to_string());
        source = cause.source();
    }
    lines.join("\n")
}

fn format_elapsed(elapsed: Duration) -> String {
    let ms = elapsed.as_millis();
    if ms < 1000 {
        format!("{ms} ms")
    } else {
        format!("{:.2} s", elapsed.as_secs_f64())
    }
}
