//! WebSocket Server for Live Reload
//!
//! Accepts TCP connections and performs the WebSocket handshake on a
//! short-lived thread per connection, under a timeout. Only finished
//! clients reach the [`ReloadHub`], which owns them from then on.
//!
//! [`ReloadHub`]: super::ReloadHub

use std::io::ErrorKind;
use std::net::{IpAddr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use tungstenite::WebSocket;

use super::ReloadHandle;
use crate::core::Lifecycle;

/// Maximum port retry attempts
pub const MAX_PORT_RETRIES: u16 = 10;

const ACCEPT_POLL: Duration = Duration::from_millis(100);

/// Upper bound for a client to complete the upgrade request.
const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Bind the WebSocket listener and start the acceptor thread.
///
/// Returns the port actually bound, which differs from `base_port` when it
/// was taken. The acceptor stops once `lifecycle` shuts down.
pub fn start_ws_server(
    interface: IpAddr,
    base_port: u16,
    handle: ReloadHandle,
    lifecycle: Arc<Lifecycle>,
) -> Result<u16> {
    let (listener, port) = bind_with_retry(interface, base_port)?;
    listener
        .set_nonblocking(true)
        .context("failed to configure WebSocket listener")?;

    std::thread::spawn(move || {
        while !lifecycle.is_shutdown() {
            match listener.accept() {
                Ok((stream, addr)) => {
                    crate::debug!("reload"; "connection from {}", addr);
                    let handle = handle.clone();
                    std::thread::spawn(move || match handshake(stream, HANDSHAKE_TIMEOUT) {
                        Ok(ws) => {
                            handle.add_client(ws);
                        }
                        Err(e) => crate::debug!("reload"; "{:#}", e),
                    });
                }
                Err(ref e) if e.kind() == ErrorKind::WouldBlock => {
                    std::thread::sleep(ACCEPT_POLL);
                }
                Err(e) => {
                    crate::log!("reload"; "accept error: {}", e);
                    std::thread::sleep(ACCEPT_POLL);
                }
            }
        }
    });

    Ok(port)
}

/// Upgrade a raw connection in blocking mode, giving up after `timeout`.
pub(super) fn handshake(stream: TcpStream, timeout: Duration) -> Result<WebSocket<TcpStream>> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    tungstenite::accept(stream).map_err(|e| anyhow!("handshake failed: {e}"))
}

/// Try binding to port, retry with incremented port if in use
fn bind_with_retry(interface: IpAddr, base_port: u16) -> Result<(TcpListener, u16)> {
    let mut last_error = None;

    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        match TcpListener::bind(SocketAddr::new(interface, port)) {
            Ok(listener) => {
                let actual = listener.local_addr()?.port();
                if offset > 0 {
                    crate::log!("reload"; "port {} in use, using {}", base_port, actual);
                }
                return Ok((listener, actual));
            }
            Err(e) => last_error = Some(e),
        }
    }

    Err(anyhow::anyhow!(
        "failed to bind WebSocket server after {} attempts: {}",
        MAX_PORT_RETRIES,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    ))
}
