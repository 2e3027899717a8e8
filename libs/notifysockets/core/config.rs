use crate::error::{NotifySocketError, Result};
use std::time::Duration;

/// Endpoint used when `connect` is called without one
pub const DEFAULT_ENDPOINT: &str = "ws://localhost:8000/ws/notifications";
pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);
pub const DEFAULT_MAX_RECONNECT_ATTEMPTS: usize = 5;
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
/// Lifecycle events kept for consumers before the oldest are discarded
pub const DEFAULT_EVENT_QUEUE_CAPACITY: usize = 1024;

/// Construction-time settings of a connection manager
///
/// Nothing here changes after the manager is built; a `connect` call may
/// still override the endpoint for that connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Default WebSocket endpoint (ws:// or wss://)
    pub endpoint: String,

    /// Fixed wait between reconnection attempts
    pub reconnect_delay: Duration,

    /// Reconnection attempts allowed between two successful opens
    pub max_reconnect_attempts: usize,

    /// Opening a transport that takes longer than this counts as a failed open
    pub connect_timeout: Duration,

    /// Undrained events held before the oldest are dropped
    pub event_queue_capacity: usize,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            reconnect_delay: DEFAULT_RECONNECT_DELAY,
            max_reconnect_attempts: DEFAULT_MAX_RECONNECT_ATTEMPTS,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            event_queue_capacity: DEFAULT_EVENT_QUEUE_CAPACITY,
        }
    }
}

impl ClientConfig {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            ..Self::default()
        }
    }

    pub fn with_reconnect_delay(mut self, delay: Duration) -> Self {
        self.reconnect_delay = delay;
        self
    }

    pub fn with_max_reconnect_attempts(mut self, attempts: usize) -> Self {
        self.max_reconnect_attempts = attempts;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_event_queue_capacity(mut self, capacity: usize) -> Self {
        self.event_queue_capacity = capacity;
        self
    }

    /// Reject settings the manager cannot run with
    pub fn validate(&self) -> Result<()> {
        validate_endpoint(&self.endpoint)?;

        if self.connect_timeout.is_zero() {
            return Err(NotifySocketError::Configuration(
                "connect_timeout must be greater than 0".to_string(),
            ));
        }

        if self.event_queue_capacity == 0 {
            return Err(NotifySocketError::Configuration(
                "event_queue_capacity must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Endpoints must be WebSocket URLs
pub fn validate_endpoint(endpoint: &str) -> Result<()> {
    let scheme_ok = endpoint.starts_with("ws://") || endpoint.starts_with("wss://");
    let has_host = endpoint
        .split_once("://")
        .map_or(false, |(_, rest)| !rest.is_empty());

    if !scheme_ok || !has_host {
        return Err(NotifySocketError::Configuration(format!(
            "endpoint must be a ws:// or wss:// URL, got '{}'",
            endpoint
        )));
    }

    Ok(())
}
