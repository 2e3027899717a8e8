//! # NotifySockets Traits
//!
//! The seams of the notification channel:
//!
//! - **FrameParser**: turn raw frames into subscriber messages
//! - **MessageHandler**: receive parsed messages
//! - **ReconnectionStrategy**: decide when a dropped connection is retried
//! - **Connector**: open the underlying transport
//!
//! ## Example
//!
//! ```rust,ignore
//! use notifysockets::*;
//!
//! struct UpperCaseParser;
//!
//! impl FrameParser<String> for UpperCaseParser {
//!     fn parse(&self, frame: &Frame) -> Result<String> {
//!         Ok(frame.to_text()?.to_uppercase())
//!     }
//! }
//! ```

pub mod error;
pub mod handler;
pub mod parser;
pub mod reconnect;
pub mod transport;

pub use error::{NotifySocketError, Result};
pub use handler::MessageHandler;
pub use parser::{Frame, FrameParser, JsonParser};
pub use reconnect::{ExponentialBackoff, FixedDelay, NeverReconnect, ReconnectionStrategy};
pub use transport::{Connector, Transport, TransportCommand, TransportEvent, TransportPeer};
