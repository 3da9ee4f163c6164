//! Reload hub: owns the WebSocket clients and broadcasts to them.
//!
//! ```text
//! Scheduler / Watcher --[ReloadMsg]--> ReloadHub --[broadcast]--> Clients
//!                                          ^
//! handshake threads --[AddClient]----------+
//! ```

use std::net::TcpStream;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tungstenite::WebSocket;
use tungstenite::protocol::Message;

use super::message::HotReloadMessage;

const CHANNEL_CAPACITY: usize = 64;
const READER_POLL: Duration = Duration::from_millis(100);

/// Messages accepted by the hub.
#[derive(Debug)]
pub enum ReloadMsg {
    Reload { reason: Option<String> },
    Css { paths: Vec<String> },
    Error { task: String, message: String },
    ClearError,
    /// Client whose handshake the acceptor completed
    AddClient(WebSocket<TcpStream>),
    Shutdown,
}

/// Sending side of the hub. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ReloadHandle {
    tx: mpsc::Sender<ReloadMsg>,
}

impl ReloadHandle {
    /// Queue a notification. Dropped with a debug line if the hub is gone or
    /// saturated; a missed reload never fails a build.
    pub fn send(&self, msg: ReloadMsg) {
        if let Err(e) = self.tx.try_send(msg) {
            crate::debug!("reload"; "notification dropped: {}", e);
        }
    }

    /// Blocking send for the handshake threads.
    pub fn add_client(&self, ws: WebSocket<TcpStream>) -> bool {
        self.tx.blocking_send(ReloadMsg::AddClient(ws)).is_ok()
    }

    /// A handle whose messages are observed directly instead of broadcast.
    #[cfg(test)]
    pub fn channel() -> (Self, mpsc::Receiver<ReloadMsg>) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        (Self { tx }, rx)
    }
}

type Clients = Arc<Mutex<Vec<WebSocket<TcpStream>>>>;

/// Client registry and broadcaster.
pub struct ReloadHub {
    rx: mpsc::Receiver<ReloadMsg>,
    clients: Clients,
    /// Last error, replayed to clients that connect while it is unresolved
    pending_error: Option<(String, String)>,
}

impl ReloadHub {
    pub fn new() -> (Self, ReloadHandle) {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
        let hub = Self {
            rx,
            clients: Arc::new(Mutex::new(Vec::new())),
            pending_error: None,
        };
        (hub, ReloadHandle { tx })
    }

    /// Run until `Shutdown` or every handle is dropped.
    pub async fn run(mut self) {
        let stop = Arc::new(AtomicBool::new(false));
        {
            let clients = Arc::clone(&self.clients);
            let stop = Arc::clone(&stop);
            std::thread::spawn(move || client_reader_loop(clients, stop));
        }

        while let Some(msg) = self.rx.recv().await {
            match msg {
                ReloadMsg::Reload { reason } => {
                    crate::debug!("reload"; "reload ({})", reason.as_deref().unwrap_or("-"));
                    self.broadcast(&HotReloadMessage::reload(reason));
                }
                ReloadMsg::Css { paths } => {
                    crate::debug!("reload"; "css refresh: {}", paths.join(", "));
                    self.broadcast(&HotReloadMessage::css(paths));
                }
                ReloadMsg::Error { task, message } => {
                    self.broadcast(&HotReloadMessage::error(&task, &message));
                    self.pending_error = Some((task, message));
                }
                ReloadMsg::ClearError => {
                    self.pending_error = None;
                    self.broadcast(&HotReloadMessage::ClearError);
                }
                ReloadMsg::AddClient(ws) => self.add_client(ws),
                ReloadMsg::Shutdown => break,
            }
        }

        stop.store(true, Ordering::SeqCst);
        for mut client in self.clients.lock().drain(..) {
            let _ = client.close(None);
        }
        crate::debug!("reload"; "hub stopped");
    }

    fn add_client(&self, mut ws: WebSocket<TcpStream>) {
        // Greet in blocking mode, poll reads afterwards.
        if let Err(e) = send(&mut ws, &HotReloadMessage::connected()) {
            crate::debug!("reload"; "failed to greet client: {}", e);
            return;
        }
        if let Some((task, message)) = &self.pending_error
            && let Err(e) = send(&mut ws, &HotReloadMessage::error(task, message))
        {
            crate::debug!("reload"; "failed to send pending error: {}", e);
            return;
        }
        let _ = ws.get_ref().set_nonblocking(true);

        let mut clients = self.clients.lock();
        clients.push(ws);
        crate::debug!("reload"; "client connected (total: {})", clients.len());
    }

    /// Send to every client, dropping those that fail.
    fn broadcast(&self, msg: &HotReloadMessage) {
        let text = msg.to_json();
        let mut clients = self.clients.lock();
        if clients.is_empty() {
            crate::debug!("reload"; "no clients connected");
            return;
        }

        clients.retain_mut(|ws| match ws.send(Message::Text(text.clone().into())) {
            Ok(()) => true,
            Err(e) => {
                crate::debug!("reload"; "client disconnected: {}", e);
                false
            }
        });
    }

    #[cfg(test)]
    fn client_count(&self) -> usize {
        self.clients.lock().len()
    }
}

fn send(ws: &mut WebSocket<TcpStream>, msg: &HotReloadMessage) -> tungstenite::Result<()> {
    ws.send(Message::Text(msg.to_json().into()))
}

/// Polls clients so closed connections are noticed between broadcasts.
fn client_reader_loop(clients: Clients, stop: Arc<AtomicBool>) {
    while !stop.load(Ordering::SeqCst) {
        std::thread::sleep(READER_POLL);

        clients.lock().retain_mut(|ws| match ws.read() {
            Ok(Message::Close(_)) => false,
            Ok(_) => true,
            Err(tungstenite::Error::Io(ref e)) if e.kind() == std::io::ErrorKind::WouldBlock => {
                true
            }
            Err(_) => false,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use tungstenite::stream::MaybeTlsStream;

    type Client = WebSocket<MaybeTlsStream<TcpStream>>;

    fn read_json(client: &mut Client) -> serde_json::Value {
        match client.read().unwrap() {
            Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    /// Connect a client: the server side upgrades while the client
    /// handshakes on a separate thread.
    fn connect(hub: &ReloadHub) -> Client {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("ws://{}", listener.local_addr().unwrap());
        let client = std::thread::spawn(move || tungstenite::connect(url).unwrap().0);
        let (stream, _) = listener.accept().unwrap();
        hub.add_client(tungstenite::accept(stream).unwrap());
        client.join().unwrap()
    }

    #[test]
    fn test_new_client_gets_greeting_and_pending_error() {
        let (mut hub, _handle) = ReloadHub::new();
        hub.pending_error = Some(("styles".into(), "boom".into()));

        let mut client = connect(&hub);
        assert_eq!(hub.client_count(), 1);

        assert_eq!(read_json(&mut client)["type"], "connected");
        let error = read_json(&mut client);
        assert_eq!(error["type"], "error");
        assert_eq!(error["task"], "styles");
        assert_eq!(error["message"], "boom");
    }

    #[test]
    fn test_broadcast_css() {
        let (hub, _handle) = ReloadHub::new();
        let mut client = connect(&hub);
        assert_eq!(read_json(&mut client)["type"], "connected");

        hub.broadcast(&HotReloadMessage::css(vec!["/css/index.css".into()]));
        let msg = read_json(&mut client);
        assert_eq!(msg["type"], "css");
        assert_eq!(msg["paths"][0], "/css/index.css");
    }

    #[test]
    fn test_broadcast_drops_closed_client() {
        let (hub, _handle) = ReloadHub::new();
        drop(connect(&hub));

        // The first write after the peer closes may still succeed.
        for _ in 0..10 {
            hub.broadcast(&HotReloadMessage::reload(None));
            if hub.client_count() == 0 {
                break;
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        assert_eq!(hub.client_count(), 0);
    }

    #[tokio::test]
    async fn test_run_stops_on_shutdown() {
        let (hub, handle) = ReloadHub::new();
        let task = tokio::spawn(hub.run());
        handle.send(ReloadMsg::Error {
            task: "html".into(),
            message: "x".into(),
        });
        handle.send(ReloadMsg::Shutdown);
        tokio::time::timeout(Duration::from_secs(2), task)
            .await
            .unwrap()
            .unwrap();
    }
}
