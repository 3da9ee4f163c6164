//! Development server with live reload support.
//!
//! Serves the preview directory over HTTP. When live reload is enabled,
//! HTML responses reference the embedded client, which connects to the
//! WebSocket port the reload server actually bound.

mod path;
mod response;

use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use tiny_http::{Request, Server};

use crate::core::Lifecycle;
use crate::embed::serve::RELOAD_JS_PATH;
use crate::log;

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Request handler threads.
const WORKERS: usize = 4;

/// HTTP server bound to its port, request loop not yet running.
pub struct DevServer {
    server: Arc<Server>,
    addr: SocketAddr,
    root: PathBuf,
    ws_port: Option<u16>,
}

impl DevServer {
    /// Bind `interface:port`, trying the following ports when taken.
    ///
    /// The server is registered with `lifecycle` so shutdown unblocks it.
    pub fn bind(
        interface: IpAddr,
        port: u16,
        root: impl Into<PathBuf>,
        lifecycle: &Lifecycle,
    ) -> Result<Self> {
        let (server, addr) = bind_with_retry(interface, port)?;
        let server = Arc::new(server);
        lifecycle.register_server(Arc::clone(&server));

        Ok(Self {
            server,
            addr,
            root: root.into(),
            ws_port: None,
        })
    }

    /// Inject the reload client into HTML, pointing at `ws_port`.
    pub fn with_live_reload(mut self, ws_port: u16) -> Self {
        self.ws_port = Some(ws_port);
        self
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Run the request loop until the lifecycle unblocks the server.
    pub fn run(self, lifecycle: Arc<Lifecycle>) -> Result<()> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(WORKERS)
            .thread_name(|i| format!("gust-http-{i}"))
            .build()
            .context("failed to create request pool")?;
        let context = Arc::new(RequestContext {
            root: self.root,
            ws_port: self.ws_port,
            lifecycle,
        });

        for request in self.server.incoming_requests() {
            let context = Arc::clone(&context);
            pool.spawn(move || {
                if let Err(e) = context.handle(request) {
                    crate::debug!("serve"; "request error: {:#}", e);
                }
            });
        }
        Ok(())
    }
}

struct RequestContext {
    root: PathBuf,
    ws_port: Option<u16>,
    lifecycle: Arc<Lifecycle>,
}

impl RequestContext {
    fn handle(&self, request: Request) -> Result<()> {
        if self.lifecycle.is_shutdown() {
            return response::respond_unavailable(request);
        }

        if let Some(ws_port) = self.ws_port
            && request.url().split('?').next() == Some(RELOAD_JS_PATH)
        {
            return response::respond_reload_js(request, ws_port);
        }

        let live_reload = self.ws_port.is_some();
        match path::resolve_path(request.url(), &self.root) {
            Some(file) => response::respond_file(request, &file, live_reload),
            None => response::respond_not_found(request, &self.root, live_reload),
        }
    }
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match Server::http(SocketAddr::new(interface, port)) {
            Ok(server) => {
                let addr = server
                    .server_addr()
                    .to_ip()
                    .unwrap_or_else(|| SocketAddr::new(interface, port));
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, addr.port());
                }
                return Ok((server, addr));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind after {} attempts (ports {}-{}): {}",
        MAX_PORT_RETRIES,
        base_port,
        base_port.saturating_add(MAX_PORT_RETRIES - 1),
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
