//! Notification listener
//!
//! Connects to the notification server, logs every notification and
//! connection event, and disconnects cleanly on Ctrl+C.
//!
//! Usage: `notifications-listen [endpoint]` (config from `CONFIG_PATH`,
//! default `config/notifications.yaml`).

use anyhow::{Context, Result};
use notification_channel::bin_common::{load_config_from_env, parse_args, BinaryRunner, ConfigType, RunConfig};
use notification_channel::notifysockets::{ClientEvent, ConnectionManager, Diagnostic};
use notification_channel::{init_tracing_with_level, NotificationsConfig, ShutdownManager};
use serde_json::Value;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

struct Listener {
    run_config: RunConfig,
    endpoint: Option<String>,
    manager: ConnectionManager,
    shutdown: ShutdownManager,
}

impl Listener {
    fn new(settings: &NotificationsConfig, endpoint: Option<String>) -> Result<Self> {
        let manager = ConnectionManager::builder()
            .config(settings.client_config())
            .build()
            .context("failed to build connection manager")?;

        Ok(Self {
            run_config: RunConfig::new("Notification Listener").with_heartbeat(300),
            endpoint,
            manager,
            shutdown: ShutdownManager::new(),
        })
    }

    fn log_event(&self, event: ClientEvent) {
        match event {
            ClientEvent::Connected { endpoint } => info!("Connected to {}", endpoint),
            ClientEvent::Disconnected { unexpected: true } => warn!("Connection lost"),
            ClientEvent::Disconnected { unexpected: false } => info!("Disconnected"),
            ClientEvent::Reconnecting { attempt, delay } => {
                info!("Reconnect attempt {} in {:?}", attempt, delay)
            }
            ClientEvent::ReconnectExhausted { attempts } => {
                error!(
                    "Gave up after {} reconnection attempts, press Ctrl+C to exit",
                    attempts
                )
            }
            ClientEvent::Diagnostic(Diagnostic::FrameParseFailure { frame, .. }) => {
                warn!("Skipped unparseable frame: {}", frame)
            }
            // Already logged by the manager
            ClientEvent::Diagnostic(_) => {}
        }
    }
}

impl BinaryRunner for Listener {
    async fn run(&mut self) -> Result<()> {
        self.shutdown.spawn_signal_handler();

        let _subscription = self.manager.subscribe_fn(|notification: &Value| {
            info!("Notification: {}", notification);
            Ok(())
        });

        self.manager.connect(self.endpoint.as_deref())?;

        let heartbeat = Duration::from_secs(self.run_config.heartbeat_interval_secs);
        let mut last_beat = Instant::now();

        while self.shutdown.is_running() {
            while let Some(event) = self.manager.try_recv_event() {
                self.log_event(event);
            }

            if last_beat.elapsed() >= heartbeat {
                let metrics = self.manager.metrics();
                info!(
                    "Heartbeat: {} ({} notifications so far)",
                    metrics.connection_state, metrics.messages_delivered
                );
                last_beat = Instant::now();
            }

            self.shutdown.interruptible_sleep(POLL_INTERVAL).await;
        }

        self.manager.disconnect();
        Ok(())
    }

    fn config(&self) -> &RunConfig {
        &self.run_config
    }

    fn stats(&self) -> Option<String> {
        let metrics = self.manager.metrics();
        Some(format!(
            "Received {} frames, delivered {}, {} parse failures, {} reconnects",
            metrics.frames_received,
            metrics.messages_delivered,
            metrics.parse_failures,
            metrics.reconnect_attempts
        ))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load config first (before logging is initialized)
    let config_path = load_config_from_env(ConfigType::Notifications);
    let settings = NotificationsConfig::load(&config_path)
        .with_context(|| format!("failed to load {}", config_path.display()))?;

    init_tracing_with_level(&settings.log_level);
    settings.log();

    let endpoint = parse_args().into_iter().next();
    let mut listener = Listener::new(&settings, endpoint)?;
    listener.execute().await
}
