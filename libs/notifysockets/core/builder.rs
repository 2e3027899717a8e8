use crate::config::ClientConfig;
use crate::manager::ConnectionManager;
use crate::traits::*;
use crate::ws::WsConnector;
use std::marker::PhantomData;
use std::time::Duration;

/// Builder for [`ConnectionManager`]
///
/// Defaults: the endpoint and timings of [`ClientConfig::default`], the
/// WebSocket connector, JSON frame parsing and a [`FixedDelay`] reconnection
/// policy derived from the configured delay and attempt cap.
///
/// `connector` and `parser` swap the transport and the decoding step; they
/// change the builder's type so the finished manager is fully static.
pub struct ConnectionManagerBuilder<M, C, P> {
    config: ClientConfig,
    connector: C,
    parser: P,
    reconnect_strategy: Option<Box<dyn ReconnectionStrategy>>,
    _message: PhantomData<fn() -> M>,
}

impl<M> ConnectionManagerBuilder<M, WsConnector, JsonParser<M>> {
    pub fn new() -> Self {
        Self {
            config: ClientConfig::default(),
            connector: WsConnector::new(),
            parser: JsonParser::new(),
            reconnect_strategy: None,
            _message: PhantomData,
        }
    }
}

impl<M> Default for ConnectionManagerBuilder<M, WsConnector, JsonParser<M>> {
    fn default() -> Self {
        Self::new()
    }
}

impl<M, C, P> ConnectionManagerBuilder<M, C, P> {
    /// Replace the whole configuration
    pub fn config(mut self, config: ClientConfig) -> Self {
        self.config = config;
        self
    }

    /// Endpoint used by `connect(None)` and by reconnection
    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.config.endpoint = endpoint.into();
        self
    }

    pub fn reconnect_delay(mut self, delay: Duration) -> Self {
        self.config.reconnect_delay = delay;
        self
    }

    pub fn max_reconnect_attempts(mut self, attempts: usize) -> Self {
        self.config.max_reconnect_attempts = attempts;
        self
    }

    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout = timeout;
        self
    }

    /// How many undrained events to keep before discarding the oldest
    pub fn event_queue_capacity(mut self, capacity: usize) -> Self {
        self.config.event_queue_capacity = capacity;
        self
    }

    /// Use a custom reconnection policy
    ///
    /// Overrides `reconnect_delay` and `max_reconnect_attempts`.
    pub fn reconnect_strategy(mut self, strategy: impl ReconnectionStrategy + 'static) -> Self {
        self.reconnect_strategy = Some(Box::new(strategy));
        self
    }

    pub fn connector<NewC: Connector>(self, connector: NewC) -> ConnectionManagerBuilder<M, NewC, P> {
        ConnectionManagerBuilder {
            config: self.config,
            connector,
            parser: self.parser,
            reconnect_strategy: self.reconnect_strategy,
            _message: PhantomData,
        }
    }

    pub fn parser<NewP: FrameParser<M>>(self, parser: NewP) -> ConnectionManagerBuilder<M, C, NewP> {
        ConnectionManagerBuilder {
            config: self.config,
            connector: self.connector,
            parser,
            reconnect_strategy: self.reconnect_strategy,
            _message: PhantomData,
        }
    }
}

impl<M, C, P> ConnectionManagerBuilder<M, C, P>
where
    M: Send + Sync + 'static,
    C: Connector,
    P: FrameParser<M>,
{
    /// Validate the configuration and create a disconnected manager
    ///
    /// Must be called from within a Tokio runtime; the manager spawns its
    /// connection and timer tasks onto that runtime.
    pub fn build(self) -> Result<ConnectionManager<M, C, P>> {
        self.config.validate()?;

        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            NotifySocketError::Configuration(format!("no Tokio runtime available: {}", e))
        })?;

        let reconnect_strategy = self.reconnect_strategy.unwrap_or_else(|| {
            Box::new(FixedDelay::new(
                self.config.reconnect_delay,
                Some(self.config.max_reconnect_attempts),
            ))
        });

        Ok(ConnectionManager::from_parts(
            self.config,
            self.connector,
            self.parser,
            reconnect_strategy,
            runtime,
        ))
    }
}
