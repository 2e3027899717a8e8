//! Transport seam
//!
//! The manager never touches a socket directly. A [`Connector`] opens a
//! [`Transport`]: a pair of channels whose far end ([`TransportPeer`]) is
//! driven by whatever owns the real connection. The WebSocket connector pumps
//! a `tokio-tungstenite` stream; tests drive the peer by hand.
//!
//! ```text
//! ConnectionManager ── TransportCommand ──▶ peer.commands ──▶ socket
//!                   ◀── TransportEvent ──── peer.events   ◀── socket
//! ```

use crate::parser::Frame;
use crate::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Lifecycle and data events reported by a live transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A data frame arrived
    Frame(Frame),
    /// Transport-level error; a close is expected to follow
    Error(String),
    /// The remote side (or the network) closed the connection
    Closed,
}

/// Instructions from the manager to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportCommand {
    /// Write one text frame
    Send(String),
    /// Close the connection; no `Closed` event is expected afterwards
    Close,
}

/// Manager-side half of an open connection
#[derive(Debug)]
pub struct Transport {
    pub(crate) commands: mpsc::UnboundedSender<TransportCommand>,
    pub(crate) events: mpsc::UnboundedReceiver<TransportEvent>,
}

/// Connection-side half, owned by the task that talks to the real socket
#[derive(Debug)]
pub struct TransportPeer {
    pub commands: mpsc::UnboundedReceiver<TransportCommand>,
    pub events: mpsc::UnboundedSender<TransportEvent>,
}

impl Transport {
    /// Create a linked transport/peer pair
    pub fn pair() -> (Transport, TransportPeer) {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let (event_tx, event_rx) = mpsc::unbounded_channel();

        (
            Transport {
                commands: command_tx,
                events: event_rx,
            },
            TransportPeer {
                commands: command_rx,
                events: event_tx,
            },
        )
    }
}

impl TransportPeer {
    /// Push an inbound text frame towards the manager
    pub fn push_text(&self, text: impl Into<String>) -> bool {
        self.events
            .send(TransportEvent::Frame(Frame::Text(text.into())))
            .is_ok()
    }

    /// Report a transport error
    pub fn push_error(&self, reason: impl Into<String>) -> bool {
        self.events.send(TransportEvent::Error(reason.into())).is_ok()
    }

    /// Report that the connection went away
    pub fn close(&self) -> bool {
        self.events.send(TransportEvent::Closed).is_ok()
    }
}

/// Opens transports to an endpoint
///
/// `open` resolves once the connection is established (the "opened"
/// lifecycle event) or fails (treated like an unexpected close).
#[async_trait]
pub trait Connector: Send + Sync + 'static {
    async fn open(&self, endpoint: &str) -> Result<Transport>;
}
