//! Live reload over WebSocket.
//!
//! # Architecture
//!
//! ```text
//! Scheduler (task finished) ─┐
//!                            ├─[ReloadMsg]─▶ ReloadHub ──▶ Browser clients
//! Watcher (reload binding) ──┘                   ▲
//!                                                │ AddClient
//!                                   acceptor (server.rs)
//! ```
//!
//! # Modules
//!
//! - `message` - JSON protocol sent to clients
//! - `hub` - client registry, broadcast, pending error replay
//! - `server` - WebSocket listener

mod hub;
pub mod message;
mod server;

pub use hub::{ReloadHandle, ReloadHub, ReloadMsg};
pub use server::start_ws_server;
