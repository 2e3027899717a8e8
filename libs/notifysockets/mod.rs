//! # NotifySockets
//!
//! Client side of a real-time notification channel: one persistent WebSocket
//! connection to a server-pushed event stream, kept alive across drops, with
//! every incoming message fanned out to local subscribers.
//!
//! ## Features
//!
//! - **Explicit state machine**: `Disconnected`, `Connecting`, `Open`, `Closing`
//! - **Bounded reconnection**: fixed delay and attempt cap by default, pluggable strategies
//! - **Ordered fan-out**: subscribers see every parsed message in arrival order
//! - **Fault isolation**: bad frames and failing handlers become diagnostics, never crashes
//! - **Pluggable transport**: the manager runs against any `Connector`, not only WebSockets

pub mod traits;
pub mod core;
pub mod manager;

// Re-export all traits
pub use traits::*;

// Re-export core functionality
pub use self::core::{
    builder, config, connection_state, events, registry, ws,
    builder::ConnectionManagerBuilder,
    config::ClientConfig,
    connection_state::{AtomicMetrics, ConnectionState, Metrics},
    events::{ClientEvent, Diagnostic},
    registry::{SubscriberId, Subscription},
    ws::WsConnector,
};

// Re-export manager
pub use manager::ConnectionManager;

/// Type alias for Result with NotifySocketError
pub type Result<T> = std::result::Result<T, traits::NotifySocketError>;
