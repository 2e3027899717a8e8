//! # NotifySockets Core
//!
//! Building blocks of the connection manager: configuration, connection
//! state and metrics, lifecycle events, the subscriber registry, the
//! WebSocket connector and the builder.
//!
//! ## Example
//!
//! ```rust,ignore
//! use notifysockets::{ConnectionManager, ClientEvent};
//! use std::time::Duration;
//!
//! #[tokio::main]
//! async fn main() -> notifysockets::Result<()> {
//!     let manager = ConnectionManager::builder()
//!         .endpoint("wss://api.example.com/ws/notifications")
//!         .reconnect_delay(Duration::from_secs(3))
//!         .max_reconnect_attempts(5)
//!         .build()?;
//!
//!     let subscription = manager.subscribe_fn(|notification| {
//!         println!("notification: {}", notification);
//!         Ok(())
//!     });
//!
//!     manager.connect(None)?;
//!     manager.send(&serde_json::json!({"type": "ack"}));
//!
//!     while let Ok(event) = manager.recv_event() {
//!         if let ClientEvent::ReconnectExhausted { .. } = event {
//!             break;
//!         }
//!     }
//!
//!     subscription.unsubscribe();
//!     manager.disconnect();
//!     Ok(())
//! }
//! ```

pub mod builder;
pub mod config;
pub mod connection_state;
pub mod events;
pub mod registry;
pub mod ws;

// Re-export main types
pub use builder::ConnectionManagerBuilder;
pub use config::ClientConfig;
pub use connection_state::{AtomicMetrics, ConnectionState, Metrics};
pub use events::{ClientEvent, Diagnostic};
pub use registry::{SubscriberId, Subscription};
pub use ws::WsConnector;

/// Create a builder for a manager delivering messages of type `M`
///
/// `M` is decoded from JSON frames unless a custom parser is set.
///
/// # Example
/// ```ignore
/// #[derive(Deserialize)]
/// struct Notification { id: u64, title: String }
///
/// let manager = notifysockets::builder::<Notification>()
///     .endpoint("wss://api.example.com/ws/notifications")
///     .build()?;
/// ```
pub fn builder<M>() -> ConnectionManagerBuilder<M, WsConnector, crate::traits::JsonParser<M>> {
    ConnectionManagerBuilder::new()
}
