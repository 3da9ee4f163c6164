//! The watch loop.
//!
//! ```text
//! notify callback ─(std mpsc)─▶ bridge thread ─(tokio mpsc)─▶ Debouncer
//!                                                                │ batch
//!                                              WatchRegistrar ◀──┘
//!                                                    │ reactions
//!                                   Scheduler::rebuild / ReloadMsg::Reload
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use futures::future::join_all;
use notify::{RecursiveMode, Watcher};
use rustc_hash::FxHashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

use super::debouncer::{ChangeKind, Debouncer};
use super::registrar::{Reaction, WatchRegistrar};
use crate::reload::ReloadMsg;
use crate::scheduler::{ScheduleError, Scheduler};
use crate::utils::path::display_relative;
use crate::{debug, log, logger};

/// How often missing source roots are looked for again.
const ROOT_RETRY: Duration = Duration::from_secs(1);

/// Watch the sources and react to changes until shutdown.
///
/// Returns an error if a rebuild hit a fatal error (which also shut the
/// lifecycle down).
pub async fn run(scheduler: Arc<Scheduler>) -> Result<()> {
    let config = scheduler.config();
    let registrar = Arc::new(WatchRegistrar::from_config(config)?);
    let lifecycle = Arc::clone(scheduler.lifecycle());

    let (notify_tx, notify_rx) = std::sync::mpsc::channel();
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = notify_tx.send(res);
    })
    .context("failed to create file watcher")?;

    let mut roots = SourceRoots::new(registrar.roots());
    roots.attach(&mut watcher).context("failed to watch sources")?;
    log!("watch"; "watching {}", display_relative(&config.paths.src, config.get_root()));
    for root in &roots.pending {
        debug!("watch"; "{} does not exist yet", root.display());
    }

    let (event_tx, mut event_rx) = mpsc::channel::<notify::Event>(64);
    std::thread::spawn(move || {
        while let Ok(result) = notify_rx.recv() {
            match result {
                Ok(event) => {
                    if event_tx.blocking_send(event).is_err() {
                        break;
                    }
                }
                Err(e) => crate::log!("watch"; "notify error: {}", e),
            }
        }
    });

    let (fatal_tx, mut fatal_rx) = mpsc::unbounded_channel::<ScheduleError>();
    let mut debouncer = Debouncer::new(Duration::from_millis(config.watch.debounce_ms));
    let mut in_flight: Vec<JoinHandle<()>> = Vec::new();
    let mut retry = tokio::time::interval(ROOT_RETRY);
    retry.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = lifecycle.wait() => break,
            Some(event) = event_rx.recv() => debouncer.add_event(&event),
            _ = retry.tick() => roots.refresh(&mut watcher),
            () = tokio::time::sleep(debouncer.sleep_duration()) => {
                if let Some(changes) = debouncer.take_if_ready() {
                    in_flight.retain(|batch| !batch.is_finished());
                    in_flight.extend(dispatch(&scheduler, &registrar, changes, &fatal_tx));
                }
            }
        }
    }

    // A fatal rebuild shuts down before its batch reports the error.
    for batch in in_flight {
        let _ = batch.await;
    }
    debug!("watch"; "stopped");
    match fatal_rx.try_recv() {
        Ok(err) => Err(err.into()),
        Err(_) => Ok(()),
    }
}

/// Watch roots derived from the bindings, e.g. `src/` or a custom asset dir.
///
/// A root that does not exist yet is attached once it appears. A root that
/// is deleted goes back to pending, so `rm -rf src && git checkout src`
/// keeps being watched.
pub(super) struct SourceRoots {
    pub(super) pending: Vec<PathBuf>,
    pub(super) attached: Vec<PathBuf>,
}

impl SourceRoots {
    pub(super) fn new(roots: Vec<PathBuf>) -> Self {
        Self {
            pending: roots,
            attached: Vec::new(),
        }
    }

    /// Attach every pending root that exists.
    pub(super) fn attach(&mut self, watcher: &mut impl Watcher) -> notify::Result<()> {
        let mut result = Ok(());
        for root in std::mem::take(&mut self.pending) {
            if result.is_err() || !root.is_dir() {
                self.pending.push(root);
                continue;
            }
            match watcher.watch(&root, RecursiveMode::Recursive) {
                Ok(()) => {
                    debug!("watch"; "attached {}", root.display());
                    self.attached.push(root);
                }
                Err(e) => {
                    result = Err(e);
                    self.pending.push(root);
                }
            }
        }
        result
    }

    /// Move deleted roots back to pending and retry the pending ones.
    pub(super) fn refresh(&mut self, watcher: &mut impl Watcher) {
        let (gone, kept): (Vec<_>, Vec<_>) = std::mem::take(&mut self.attached)
            .into_iter()
            .partition(|root| !root.is_dir());
        self.attached = kept;
        for root in gone {
            // notify may already have dropped the watch with the inode.
            let _ = watcher.unwatch(&root);
            debug!("watch"; "lost {}", root.display());
            self.pending.push(root);
        }
        if self.pending.is_empty() {
            return;
        }
        if let Err(e) = self.attach(watcher) {
            debug!("watch"; "retrying later: {}", e);
        }
    }
}

/// Spawn the reactions of one batch.
///
/// Task runs of a batch are concurrent. The reload-only reaction is sent
/// after them, and skipped if one of them already reloaded the page.
/// Returns `None` when no binding matched.
pub(super) fn dispatch(
    scheduler: &Arc<Scheduler>,
    registrar: &WatchRegistrar,
    changes: FxHashMap<PathBuf, ChangeKind>,
    fatal_tx: &mpsc::UnboundedSender<ScheduleError>,
) -> Option<JoinHandle<()>> {
    let mut paths: Vec<PathBuf> = changes.into_keys().collect();
    paths.sort();

    let reactions = registrar.reactions(&paths);
    if reactions.is_empty() {
        debug!("watch"; "no binding for {} change(s)", paths.len());
        return None;
    }

    let scheduler = Arc::clone(scheduler);
    let fatal_tx = fatal_tx.clone();
    Some(tokio::spawn(async move {
        let runs = reactions.iter().filter_map(|reaction| match reaction {
            Reaction::Run(name) => Some(name.as_str()),
            Reaction::Reload => None,
        });
        let results = join_all(runs.map(|name| {
            let scheduler = &scheduler;
            async move { (name, scheduler.rebuild(name).await) }
        }))
        .await;

        let mut page_reloaded = false;
        for (name, result) in results {
            match result {
                Ok(report) => {
                    page_reloaded |= !report.written.is_empty() && scheduler.reloads_page(name);
                }
                Err(e) if e.is_fatal() => {
                    let _ = fatal_tx.send(e);
                }
                Err(_) => {}
            }
        }

        if reactions.contains(&Reaction::Reload)
            && !page_reloaded
            && let Some(reload) = scheduler.reload_handle()
        {
            let src = &scheduler.config().paths.src;
            let changed = paths
                .iter()
                .map(|p| display_relative(p, src))
                .collect::<Vec<_>>()
                .join(", ");
            logger::status_success(&format!("reloaded: {changed}"));
            reload.send(ReloadMsg::Reload {
                reason: Some(changed),
            });
        }
    }))
}
