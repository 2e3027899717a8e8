use std::fmt;
use std::time::Duration;

use super::registry::SubscriberId;

/// Something went wrong that the manager recovered from on its own
///
/// Diagnostics are observability only: none of them changes what the manager
/// does next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Diagnostic {
    /// Opening the transport failed or timed out; handled like a close
    TransportOpenFailure { endpoint: String, reason: String },
    /// The transport reported an error
    TransportError { reason: String },
    /// An inbound frame could not be parsed; delivery skipped
    FrameParseFailure { frame: String, reason: String },
    /// A subscriber returned an error or panicked
    HandlerFailure { subscriber: SubscriberId, reason: String },
    /// An outbound payload could not be serialized; nothing was written
    SerializeFailure { reason: String },
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Diagnostic::TransportOpenFailure { endpoint, reason } => {
                write!(f, "failed to open {}: {}", endpoint, reason)
            }
            Diagnostic::TransportError { reason } => write!(f, "transport error: {}", reason),
            Diagnostic::FrameParseFailure { frame, reason } => {
                write!(f, "dropped unparseable frame ({}): {}", reason, frame)
            }
            Diagnostic::HandlerFailure { subscriber, reason } => {
                write!(f, "subscriber {} failed: {}", subscriber, reason)
            }
            Diagnostic::SerializeFailure { reason } => {
                write!(f, "outbound payload not serializable: {}", reason)
            }
        }
    }
}

/// Lifecycle notifications published by the manager
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClientEvent {
    /// Transport opened
    Connected { endpoint: String },
    /// Connection lost; `unexpected` is false for an explicit `disconnect()`
    Disconnected { unexpected: bool },
    /// Reconnection attempt `attempt` (1-based) armed to fire after `delay`
    Reconnecting { attempt: usize, delay: Duration },
    /// Retry budget spent; the manager stays disconnected until `connect()`
    ReconnectExhausted { attempts: usize },
    /// Recovered failure, see [`Diagnostic`]
    Diagnostic(Diagnostic),
}

impl ClientEvent {
    pub fn as_diagnostic(&self) -> Option<&Diagnostic> {
        match self {
            ClientEvent::Diagnostic(d) => Some(d),
            _ => None,
        }
    }
}

/// Frames longer than this are cut in diagnostics
const FRAME_PREVIEW_LEN: usize = 256;

pub(crate) fn frame_preview(text: &str) -> String {
    if text.len() <= FRAME_PREVIEW_LEN {
        return text.to_string();
    }

    let mut end = FRAME_PREVIEW_LEN;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
