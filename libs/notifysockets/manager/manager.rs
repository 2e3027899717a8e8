use crate::builder::ConnectionManagerBuilder;
use crate::config::{validate_endpoint, ClientConfig};
use crate::connection_state::{AtomicMetrics, ConnectionState, Metrics};
use crate::events::{frame_preview, ClientEvent, Diagnostic};
use crate::registry::{SubscriberRegistry, Subscription};
use crate::traits::*;
use crate::ws::WsConnector;
use crossbeam_channel::{bounded, Receiver, RecvError, Sender, TrySendError};
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Mutable connection bookkeeping, guarded by one lock
///
/// `epoch` identifies the current connection attempt. Every session task and
/// retry timer carries the epoch it was started for and turns into a no-op
/// once the epoch moved on (a `disconnect()` or a newer attempt).
struct Core {
    state: ConnectionState,
    endpoint: Option<String>,
    attempts: usize,
    epoch: u64,
    commands: Option<mpsc::UnboundedSender<TransportCommand>>,
    retry_timer: Option<JoinHandle<()>>,
}

struct Inner<M, C, P> {
    config: ClientConfig,
    connector: C,
    parser: P,
    reconnect_strategy: Box<dyn ReconnectionStrategy>,
    runtime: Handle,
    core: Mutex<Core>,
    subscribers: Arc<SubscriberRegistry<M>>,
    state_tx: watch::Sender<ConnectionState>,
    event_tx: Sender<ClientEvent>,
    event_rx: Receiver<ClientEvent>,
    metrics: AtomicMetrics,
}

/// Keeps one notification connection alive and fans its messages out
///
/// The manager owns at most one transport at a time. Inbound frames are
/// parsed and handed to every subscriber in registration order; a connection
/// that drops unexpectedly is retried according to the reconnection policy
/// (by default a fixed delay, a bounded number of times). Handles are cheap
/// to clone and all clones drive the same connection.
///
/// The connection keeps running in the background until [`disconnect`]
/// is called; dropping the handles does not close it.
///
/// # Type Parameters
/// - `M`: message type delivered to subscribers
/// - `C`: [`Connector`] opening the transport
/// - `P`: [`FrameParser`] turning frames into `M`
///
/// [`disconnect`]: ConnectionManager::disconnect
pub struct ConnectionManager<M = Value, C = WsConnector, P = JsonParser<M>> {
    inner: Arc<Inner<M, C, P>>,
}

impl<M, C, P> Clone for ConnectionManager<M, C, P> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl ConnectionManager {
    /// Builder for a manager delivering untyped JSON values
    pub fn builder() -> ConnectionManagerBuilder<Value, WsConnector, JsonParser<Value>> {
        ConnectionManagerBuilder::new()
    }
}

impl<M, C, P> ConnectionManager<M, C, P>
where
    M: Send + Sync + 'static,
    C: Connector,
    P: FrameParser<M>,
{
    pub(crate) fn from_parts(
        config: ClientConfig,
        connector: C,
        parser: P,
        reconnect_strategy: Box<dyn ReconnectionStrategy>,
        runtime: Handle,
    ) -> Self {
        let (state_tx, _) = watch::channel(ConnectionState::Disconnected);
        let (event_tx, event_rx) = bounded(config.event_queue_capacity);

        Self {
            inner: Arc::new(Inner {
                config,
                connector,
                parser,
                reconnect_strategy,
                runtime,
                core: Mutex::new(Core {
                    state: ConnectionState::Disconnected,
                    endpoint: None,
                    attempts: 0,
                    epoch: 0,
                    commands: None,
                    retry_timer: None,
                }),
                subscribers: Arc::new(SubscriberRegistry::new()),
                state_tx,
                event_tx,
                event_rx,
                metrics: AtomicMetrics::new(),
            }),
        }
    }

    /// Open the connection
    ///
    /// Uses `endpoint`, or the configured default when `None`. Does nothing
    /// if the connection is already open or an attempt (including a pending
    /// retry) is in progress. Starts a fresh reconnection budget.
    ///
    /// Returns an error only for a malformed endpoint; failures to reach the
    /// server are handled by the reconnection policy.
    pub fn connect(&self, endpoint: Option<&str>) -> Result<()> {
        let endpoint = match endpoint {
            Some(endpoint) => {
                validate_endpoint(endpoint)?;
                endpoint.to_string()
            }
            None => self.inner.config.endpoint.clone(),
        };

        let mut core = self.inner.core.lock();
        match core.state {
            ConnectionState::Open => {
                debug!("connect() ignored, connection already open");
                return Ok(());
            }
            ConnectionState::Connecting => {
                debug!("connect() ignored, connection attempt in progress");
                return Ok(());
            }
            ConnectionState::Disconnected | ConnectionState::Closing => {}
        }

        core.attempts = 0;
        self.inner.start_attempt(&mut core, endpoint);
        Ok(())
    }

    /// Close the connection and stop reconnecting
    ///
    /// Cancels a pending retry, closes the transport if one is live and
    /// removes every subscriber. Safe to call in any state.
    pub fn disconnect(&self) {
        let inner = &self.inner;
        let mut core = inner.core.lock();
        let previous = core.state;

        inner.set_state(&mut core, ConnectionState::Closing);
        core.epoch += 1;
        core.attempts = 0;

        if let Some(timer) = core.retry_timer.take() {
            timer.abort();
            debug!("Cancelled pending reconnection");
        }

        if let Some(commands) = core.commands.take() {
            let _ = commands.send(TransportCommand::Close);
        }

        let removed = inner.subscribers.clear();
        inner.set_state(&mut core, ConnectionState::Disconnected);

        if previous != ConnectionState::Disconnected {
            info!(removed_subscribers = removed, "Disconnected on request");
            inner.emit(ClientEvent::Disconnected { unexpected: false });
        }
    }

    /// Register a handler for every message parsed from now on
    pub fn subscribe<H>(&self, handler: H) -> Subscription<M>
    where
        H: MessageHandler<M>,
    {
        self.inner.subscribers.subscribe(Box::new(handler))
    }

    /// Register a closure as handler
    pub fn subscribe_fn<F>(&self, handler: F) -> Subscription<M>
    where
        F: Fn(&M) -> Result<()> + Send + Sync + 'static,
    {
        self.subscribe(handler)
    }

    /// Serialize `payload` as JSON and write it as one text frame
    ///
    /// Only while the connection is open; otherwise the payload is dropped.
    /// Returns whether the frame was queued on the open transport ahead of
    /// any close. Never fails: a payload that cannot be serialized is
    /// reported as a diagnostic.
    pub fn send<T>(&self, payload: &T) -> bool
    where
        T: Serialize + ?Sized,
    {
        if !self.is_open() {
            debug!("Dropping outbound payload, connection not open");
            return false;
        }

        let text = match serde_json::to_string(payload) {
            Ok(text) => text,
            Err(e) => {
                self.inner.report(Diagnostic::SerializeFailure {
                    reason: e.to_string(),
                });
                return false;
            }
        };

        // Enqueue under the lock: `disconnect()` sends `Close` under it too
        let core = self.inner.core.lock();
        let commands = match (&core.state, &core.commands) {
            (ConnectionState::Open, Some(commands)) => commands,
            _ => {
                debug!(state = %core.state, "Dropping outbound payload, connection closed meanwhile");
                return false;
            }
        };

        if commands.send(TransportCommand::Send(text)).is_err() {
            debug!("Transport gone before payload could be written");
            return false;
        }

        self.inner.metrics.increment_sent();
        true
    }

    /// Current connection state
    #[inline]
    pub fn state(&self) -> ConnectionState {
        self.inner.core.lock().state
    }

    #[inline]
    pub fn is_open(&self) -> bool {
        self.state().is_open()
    }

    /// Receiver notified on every state transition
    pub fn state_receiver(&self) -> watch::Receiver<ConnectionState> {
        self.inner.state_tx.subscribe()
    }

    /// Reconnection attempts scheduled since the last successful open
    pub fn reconnect_attempts(&self) -> usize {
        self.inner.core.lock().attempts
    }

    /// Endpoint of the current (or last) connection attempt
    pub fn endpoint(&self) -> Option<String> {
        self.inner.core.lock().endpoint.clone()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn subscriber_count(&self) -> usize {
        self.inner.subscribers.len()
    }

    pub fn metrics(&self) -> Metrics {
        self.inner.metrics.snapshot(self.state())
    }

    /// Lifecycle and diagnostic events
    ///
    /// All clones of the receiver share one queue: each event is seen by
    /// exactly one of them. The queue holds at most `event_queue_capacity`
    /// events; when nobody drains it the oldest are discarded and counted in
    /// [`Metrics::dropped_events`].
    pub fn events(&self) -> Receiver<ClientEvent> {
        self.inner.event_rx.clone()
    }

    /// Try to receive an event (non-blocking)
    pub fn try_recv_event(&self) -> Option<ClientEvent> {
        self.inner.event_rx.try_recv().ok()
    }

    /// Receive an event (blocking; do not call from an async task)
    pub fn recv_event(&self) -> std::result::Result<ClientEvent, RecvError> {
        self.inner.event_rx.recv()
    }
}

impl<M, C, P> Inner<M, C, P>
where
    M: Send + Sync + 'static,
    C: Connector,
    P: FrameParser<M>,
{
    fn set_state(&self, core: &mut Core, next: ConnectionState) {
        if core.state != next {
            debug!(from = %core.state, to = %next, "Connection state change");
        }
        core.state = next;
        self.state_tx.send_replace(next);
    }

    /// Queue an event, discarding the oldest one when the queue is full
    fn emit(&self, mut event: ClientEvent) {
        loop {
            match self.event_tx.try_send(event) {
                Ok(()) => return,
                Err(TrySendError::Full(rejected)) => {
                    if self.event_rx.try_recv().is_ok() {
                        self.metrics.increment_dropped_events();
                    }
                    event = rejected;
                }
                Err(TrySendError::Disconnected(_)) => return,
            }
        }
    }

    fn report(&self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::TransportError { .. } => error!("{}", diagnostic),
            Diagnostic::FrameParseFailure { .. } => warn!("Parse error: {}", diagnostic),
            _ => warn!("{}", diagnostic),
        }
        self.emit(ClientEvent::Diagnostic(diagnostic));
    }

    fn is_current(&self, epoch: u64) -> bool {
        self.core.lock().epoch == epoch
    }

    /// Move to `Connecting` and spawn the session for a new epoch
    fn start_attempt(self: &Arc<Self>, core: &mut Core, endpoint: String) {
        core.epoch += 1;
        let epoch = core.epoch;
        core.endpoint = Some(endpoint.clone());
        self.set_state(core, ConnectionState::Connecting);

        info!(endpoint = %endpoint, retry = core.attempts, "Connecting");

        let inner = Arc::clone(self);
        self.runtime.spawn(async move {
            inner.run_session(epoch, endpoint).await;
        });
    }

    /// One connection from open to close
    async fn run_session(self: Arc<Self>, epoch: u64, endpoint: String) {
        let timeout = self.config.connect_timeout;
        let transport = match tokio::time::timeout(timeout, self.connector.open(&endpoint)).await {
            Ok(Ok(transport)) => transport,
            Ok(Err(e)) => {
                self.open_failed(epoch, endpoint, e.to_string());
                return;
            }
            Err(_) => {
                let reason = NotifySocketError::Timeout(format!("no connection after {:?}", timeout));
                self.open_failed(epoch, endpoint, reason.to_string());
                return;
            }
        };

        let Transport {
            commands,
            mut events,
        } = transport;

        if let Err(commands) = self.on_opened(epoch, &endpoint, commands) {
            debug!("Connection superseded while opening, closing it");
            let _ = commands.send(TransportCommand::Close);
            return;
        }

        while let Some(event) = events.recv().await {
            if !self.is_current(epoch) {
                break;
            }

            match event {
                TransportEvent::Frame(frame) => self.on_frame(frame),
                TransportEvent::Error(reason) => {
                    self.report(Diagnostic::TransportError { reason })
                }
                TransportEvent::Closed => break,
            }
        }

        self.on_closed(epoch);
    }

    fn open_failed(self: &Arc<Self>, epoch: u64, endpoint: String, reason: String) {
        if self.is_current(epoch) {
            self.report(Diagnostic::TransportOpenFailure { endpoint, reason });
        }
        self.on_closed(epoch);
    }

    /// Hands the command sender back when the epoch is stale
    fn on_opened(
        &self,
        epoch: u64,
        endpoint: &str,
        commands: mpsc::UnboundedSender<TransportCommand>,
    ) -> std::result::Result<(), mpsc::UnboundedSender<TransportCommand>> {
        let mut core = self.core.lock();
        if core.epoch != epoch {
            return Err(commands);
        }

        core.commands = Some(commands);
        core.attempts = 0;
        core.retry_timer = None;
        self.set_state(&mut core, ConnectionState::Open);

        info!("Connection open: {}", endpoint);
        self.emit(ClientEvent::Connected {
            endpoint: endpoint.to_string(),
        });
        Ok(())
    }

    fn on_frame(&self, frame: Frame) {
        self.metrics.increment_received();

        let message = match self.parser.parse(&frame) {
            Ok(message) => message,
            Err(e) => {
                self.metrics.increment_parse_failures();
                let preview = match &frame {
                    Frame::Text(text) => frame_preview(text),
                    Frame::Binary(data) => format!("<{} binary bytes>", data.len()),
                };
                self.report(Diagnostic::FrameParseFailure {
                    frame: preview,
                    reason: e.to_string(),
                });
                return;
            }
        };

        self.metrics.increment_delivered();
        self.subscribers.dispatch(&message, |subscriber, reason| {
            self.metrics.increment_handler_failures();
            self.report(Diagnostic::HandlerFailure { subscriber, reason });
        });
    }

    /// Unexpected close (or failed open): arm a retry or give up
    fn on_closed(self: &Arc<Self>, epoch: u64) {
        let mut core = self.core.lock();
        if core.epoch != epoch {
            debug!("Ignoring close of superseded connection");
            return;
        }

        core.commands = None;
        self.set_state(&mut core, ConnectionState::Disconnected);
        self.emit(ClientEvent::Disconnected { unexpected: true });

        let Some(delay) = self.reconnect_strategy.next_delay(core.attempts) else {
            warn!(
                "Reconnection budget exhausted after {} attempts, staying disconnected",
                core.attempts
            );
            self.emit(ClientEvent::ReconnectExhausted {
                attempts: core.attempts,
            });
            return;
        };

        core.attempts += 1;
        let attempt = core.attempts;
        self.metrics.increment_reconnects();
        self.set_state(&mut core, ConnectionState::Connecting);

        info!("Reconnecting in {:?} (attempt {})", delay, attempt);
        self.emit(ClientEvent::Reconnecting { attempt, delay });

        let inner = Arc::clone(self);
        core.retry_timer = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            inner.fire_retry(epoch);
        }));
    }

    fn fire_retry(self: &Arc<Self>, epoch: u64) {
        let mut core = self.core.lock();
        if core.epoch != epoch || core.state != ConnectionState::Connecting {
            debug!("Stale reconnection timer, ignoring");
            return;
        }

        core.retry_timer = None;
        let endpoint = core
            .endpoint
            .clone()
            .unwrap_or_else(|| self.config.endpoint.clone());
        self.start_attempt(&mut core, endpoint);
    }
}
