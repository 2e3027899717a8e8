use thiserror::Error;

/// Main error type for notifysockets
#[derive(Error, Debug)]
pub enum NotifySocketError {
    /// WebSocket transport error
    #[error("WebSocket error: {0}")]
    WebSocket(String),

    /// Opening the transport took longer than the configured timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Inbound frame could not be parsed into a message
    #[error("Parse error: {0}")]
    Parse(String),

    /// A subscriber failed while handling a message
    #[error("Handler error: {0}")]
    Handler(String),

    /// Outbound payload could not be serialized
    #[error("Serialize error: {0}")]
    Serialize(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic error
    #[error("Error: {0}")]
    Other(String),
}

impl From<serde_json::Error> for NotifySocketError {
    fn from(e: serde_json::Error) -> Self {
        NotifySocketError::Parse(e.to_string())
    }
}

impl From<tokio_tungstenite::tungstenite::Error> for NotifySocketError {
    fn from(e: tokio_tungstenite::tungstenite::Error) -> Self {
        NotifySocketError::WebSocket(e.to_string())
    }
}

/// Result type for notifysockets operations
pub type Result<T> = std::result::Result<T, NotifySocketError>;
