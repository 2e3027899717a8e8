//! Subscriber handlers
//!
//! A handler is invoked once per successfully parsed inbound frame, on the
//! connection's session task, in registration order with every other
//! subscriber. Handlers must not block: they run inline with frame delivery,
//! so a slow handler delays every message behind it.
//!
//! Returning `Err` (or panicking) is reported as a diagnostic and never stops
//! the remaining subscribers from seeing the same message.

use crate::Result;

/// Handles a parsed message
///
/// # Example
///
/// ```ignore
/// struct AlertCounter {
///     alerts: Arc<AtomicU64>,
/// }
///
/// impl MessageHandler<serde_json::Value> for AlertCounter {
///     fn handle(&self, message: &serde_json::Value) -> Result<()> {
///         if message["type"] == "alert" {
///             self.alerts.fetch_add(1, Ordering::Relaxed);
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait MessageHandler<M>: Send + Sync + 'static {
    fn handle(&self, message: &M) -> Result<()>;
}

impl<M, F> MessageHandler<M> for F
where
    F: Fn(&M) -> Result<()> + Send + Sync + 'static,
{
    fn handle(&self, message: &M) -> Result<()> {
        self(message)
    }
}
