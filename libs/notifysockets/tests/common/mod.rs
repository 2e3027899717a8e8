//! Common test utilities for NotifySockets integration tests
//!
//! Two fakes live here: `MockConnector` drives the manager without any
//! socket (the test plays the server through `TransportPeer`s), and
//! `MockWsServer` is a real WebSocket server on localhost for wire tests.

#![allow(dead_code)]

use async_trait::async_trait;
use notifysockets::{Connector, NotifySocketError, Result, Transport, TransportPeer};
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{broadcast, mpsc, Notify};
use tokio::time::Instant;

/// Let spawned tasks run until they park
pub async fn settle() {
    for _ in 0..20 {
        tokio::task::yield_now().await;
    }
}

/// Poll `condition` until it holds or `timeout` passes
pub async fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + timeout;
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}

/// Outcome of one `open` call on the mock connector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Accept,
    Refuse,
}

/// Connector whose transports are handed to the test
///
/// Each `open` is recorded (with the time it happened) and answered by the
/// next scripted outcome; once the script is empty every open is accepted,
/// unless `refuse_all` is set.
#[derive(Clone)]
pub struct MockConnector {
    peers: mpsc::UnboundedSender<TransportPeer>,
    opens: Arc<Mutex<Vec<(String, Instant)>>>,
    script: Arc<Mutex<VecDeque<OpenOutcome>>>,
    refuse_all: Arc<std::sync::atomic::AtomicBool>,
}

impl MockConnector {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportPeer>) {
        let (peers, peer_rx) = mpsc::unbounded_channel();
        (
            Self {
                peers,
                opens: Arc::new(Mutex::new(Vec::new())),
                script: Arc::new(Mutex::new(VecDeque::new())),
                refuse_all: Arc::new(std::sync::atomic::AtomicBool::new(false)),
            },
            peer_rx,
        )
    }

    pub fn script(&self, outcomes: impl IntoIterator<Item = OpenOutcome>) {
        self.script.lock().extend(outcomes);
    }

    pub fn refuse_all(&self, refuse: bool) {
        self.refuse_all.store(refuse, Ordering::Release);
    }

    pub fn open_count(&self) -> usize {
        self.opens.lock().len()
    }

    pub fn open_times(&self) -> Vec<Instant> {
        self.opens.lock().iter().map(|(_, at)| *at).collect()
    }

    pub fn endpoints(&self) -> Vec<String> {
        self.opens.lock().iter().map(|(e, _)| e.clone()).collect()
    }
}

#[async_trait]
impl Connector for MockConnector {
    async fn open(&self, endpoint: &str) -> Result<Transport> {
        self.opens.lock().push((endpoint.to_string(), Instant::now()));

        let scripted = self.script.lock().pop_front();
        let refuse = match scripted {
            Some(outcome) => outcome == OpenOutcome::Refuse,
            None => self.refuse_all.load(Ordering::Acquire),
        };
        if refuse {
            return Err(NotifySocketError::WebSocket("connection refused".into()));
        }

        let (transport, peer) = Transport::pair();
        self.peers
            .send(peer)
            .map_err(|_| NotifySocketError::Other("test harness dropped".into()))?;
        Ok(transport)
    }
}

/// Instructions broadcast to every live server-side connection
#[derive(Debug, Clone)]
enum ServerCommand {
    Push(String),
    DropAll,
}

/// A small WebSocket server for wire-level tests
///
/// Pushes text frames to every connected client on request, records the
/// text frames clients send, and can cut all connections abruptly.
pub struct MockWsServer {
    pub addr: SocketAddr,
    shutdown: Arc<Notify>,
    commands: broadcast::Sender<ServerCommand>,
    received: Arc<Mutex<Vec<String>>>,
    accepted: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
}

impl MockWsServer {
    /// Create and start a new mock WebSocket server
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let shutdown = Arc::new(Notify::new());
        let (commands, _) = broadcast::channel(64);
        let received = Arc::new(Mutex::new(Vec::new()));
        let accepted = Arc::new(AtomicUsize::new(0));
        let live = Arc::new(AtomicUsize::new(0));

        let server = Self {
            addr,
            shutdown: Arc::clone(&shutdown),
            commands: commands.clone(),
            received: Arc::clone(&received),
            accepted: Arc::clone(&accepted),
            live: Arc::clone(&live),
        };

        tokio::spawn(async move {
            loop {
                tokio::select! {
                    result = listener.accept() => {
                        match result {
                            Ok((stream, _)) => {
                                let commands = commands.subscribe();
                                let shutdown = Arc::clone(&shutdown);
                                let received = Arc::clone(&received);
                                let accepted = Arc::clone(&accepted);
                                let live = Arc::clone(&live);
                                tokio::spawn(async move {
                                    Self::handle_connection(stream, commands, shutdown, received, accepted, live).await;
                                });
                            }
                            Err(e) => {
                                eprintln!("Accept error: {}", e);
                                break;
                            }
                        }
                    }
                    _ = shutdown.notified() => {
                        break;
                    }
                }
            }
        });

        server
    }

    async fn handle_connection(
        stream: tokio::net::TcpStream,
        mut commands: broadcast::Receiver<ServerCommand>,
        shutdown: Arc<Notify>,
        received: Arc<Mutex<Vec<String>>>,
        accepted: Arc<AtomicUsize>,
        live: Arc<AtomicUsize>,
    ) {
        use futures::{SinkExt, StreamExt};
        use tokio_tungstenite::accept_async;
        use tokio_tungstenite::tungstenite::Message;

        let ws_stream = match accept_async(stream).await {
            Ok(ws) => ws,
            Err(e) => {
                eprintln!("WebSocket handshake failed: {}", e);
                return;
            }
        };

        accepted.fetch_add(1, Ordering::AcqRel);
        live.fetch_add(1, Ordering::AcqRel);
        let (mut write, mut read) = ws_stream.split();

        loop {
            tokio::select! {
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            received.lock().push(text);
                        }
                        Some(Ok(Message::Close(_))) | Some(Err(_)) | None => break,
                        Some(Ok(_)) => {}
                    }
                }
                cmd = commands.recv() => {
                    match cmd {
                        Ok(ServerCommand::Push(text)) => {
                            if write.send(Message::Text(text)).await.is_err() {
                                break;
                            }
                        }
                        Ok(ServerCommand::DropAll) | Err(_) => break,
                    }
                }
                _ = shutdown.notified() => {
                    break;
                }
            }
        }

        live.fetch_sub(1, Ordering::AcqRel);
    }

    /// Get the WebSocket URL for this server
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Send a text frame to every connected client
    pub fn push(&self, text: impl Into<String>) {
        let _ = self.commands.send(ServerCommand::Push(text.into()));
    }

    /// Cut every connection without a close handshake
    pub fn drop_connections(&self) {
        let _ = self.commands.send(ServerCommand::DropAll);
    }

    /// Text frames received from clients so far
    pub fn received(&self) -> Vec<String> {
        self.received.lock().clone()
    }

    /// Number of completed WebSocket handshakes
    pub fn accepted(&self) -> usize {
        self.accepted.load(Ordering::Acquire)
    }

    /// Number of connections currently open
    pub fn live(&self) -> usize {
        self.live.load(Ordering::Acquire)
    }

    /// Shutdown the server
    pub fn shutdown(&self) {
        self.shutdown.notify_waiters();
    }
}

impl Drop for MockWsServer {
    fn drop(&mut self) {
        self.shutdown();
    }
}
