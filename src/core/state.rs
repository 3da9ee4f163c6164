//! Shutdown coordination for long-running commands.
//!
//! A single [`Lifecycle`] is created in `main` and shared by the scheduler,
//! the watcher and the dev server. It replaces process-global flags: every
//! component that needs to stop receives the handle explicitly.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

use tiny_http::Server;
use tokio::sync::Notify;

/// Shared shutdown state.
pub struct Lifecycle {
    /// Shutdown has been requested (Ctrl+C or a fatal error)
    shutdown: AtomicBool,
    /// Wakes async loops waiting in [`Lifecycle::wait`]
    notify: Notify,
    /// HTTP server reference for graceful shutdown
    server: OnceLock<Arc<Server>>,
}

impl Lifecycle {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            shutdown: AtomicBool::new(false),
            notify: Notify::new(),
            server: OnceLock::new(),
        })
    }

    /// Install the Ctrl+C handler. Call once at program start.
    ///
    /// - Before a server is registered: exit immediately, nothing to clean up
    /// - After [`Lifecycle::register_server`]: graceful shutdown (unblock the
    ///   server, wake the watcher)
    pub fn install_ctrlc_handler(self: &Arc<Self>) -> anyhow::Result<()> {
        let this = Arc::clone(self);
        ctrlc::set_handler(move || {
            if this.server.get().is_none() {
                std::process::exit(130);
            }
            crate::log!("serve"; "shutting down...");
            this.shutdown();
        })
        .map_err(|e| anyhow::anyhow!("failed to set Ctrl+C handler: {}", e))
    }

    /// Request shutdown: wakes every waiter and unblocks the HTTP server.
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
        if let Some(server) = self.server.get() {
            server.unblock();
        }
    }

    /// Check if shutdown has been requested
    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Resolve once shutdown has been requested.
    pub async fn wait(&self) {
        loop {
            // Registered before the flag check so a concurrent shutdown is not missed.
            let notified = self.notify.notified();
            if self.is_shutdown() {
                return;
            }
            notified.await;
        }
    }

    /// Register the HTTP server so shutdown can unblock its request loop.
    ///
    /// A shutdown requested before registration unblocks the server at once.
    pub fn register_server(&self, server: Arc<Server>) {
        let _ = self.server.set(server);
        if self.is_shutdown()
            && let Some(server) = self.server.get()
        {
            server.unblock();
        }
    }
}
