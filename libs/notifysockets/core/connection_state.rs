use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Lifecycle state of a connection manager
///
/// ```text
/// Disconnected --connect()--> Connecting --opened--> Open
/// Open --closed--> Disconnected --(retry armed)--> Connecting
/// any --disconnect()--> Closing --> Disconnected
/// ```
///
/// While a reconnection delay is running the state reads `Connecting`:
/// `Disconnected` always means no retry is armed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Closing,
}

impl ConnectionState {
    #[inline]
    pub fn is_open(self) -> bool {
        matches!(self, ConnectionState::Open)
    }

    #[inline]
    pub fn is_disconnected(self) -> bool {
        matches!(self, ConnectionState::Disconnected)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Closing => "closing",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metrics {
    pub frames_sent: u64,
    pub frames_received: u64,
    pub messages_delivered: u64,
    pub parse_failures: u64,
    pub handler_failures: u64,
    pub reconnect_attempts: u64,
    /// Events discarded because nobody drained the event queue
    pub dropped_events: u64,
    pub connection_state: ConnectionState,
}

/// Lock-free counters shared by the manager and its session tasks
#[derive(Debug, Default)]
pub struct AtomicMetrics {
    frames_sent: AtomicU64,
    frames_received: AtomicU64,
    messages_delivered: AtomicU64,
    parse_failures: AtomicU64,
    handler_failures: AtomicU64,
    reconnect_attempts: AtomicU64,
    dropped_events: AtomicU64,
}

impl AtomicMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn increment_sent(&self) {
        self.frames_sent.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_delivered(&self) {
        self.messages_delivered.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_parse_failures(&self) {
        self.parse_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_handler_failures(&self) {
        self.handler_failures.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_reconnects(&self) {
        self.reconnect_attempts.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn increment_dropped_events(&self) {
        self.dropped_events.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self, connection_state: ConnectionState) -> Metrics {
        Metrics {
            frames_sent: self.frames_sent.load(Ordering::Relaxed),
            frames_received: self.frames_received.load(Ordering::Relaxed),
            messages_delivered: self.messages_delivered.load(Ordering::Relaxed),
            parse_failures: self.parse_failures.load(Ordering::Relaxed),
            handler_failures: self.handler_failures.load(Ordering::Relaxed),
            reconnect_attempts: self.reconnect_attempts.load(Ordering::Relaxed),
            dropped_events: self.dropped_events.load(Ordering::Relaxed),
            connection_state,
        }
    }
}
