//! Notification Channel - Main Library
//!
//! Application layer around the `notifysockets` connection manager: YAML
//! configuration, logging setup and the helpers shared by the binaries.
//!
//! ## Architecture
//!
//! - **notifysockets**: connection manager library (re-exported from workspace)
//! - **config**: `NotificationsConfig` loaded from YAML and `.env`
//! - **logging**: tracing subscriber initialization
//! - **shutdown**: Ctrl+C driven shutdown flag
//! - **bin_common**: Common utilities for binary executables (CLI, runners)
//!
//! ## Usage in Binaries
//!
//! ```rust,ignore
//! use notification_channel::bin_common::{load_config_from_env, ConfigType};
//! use notification_channel::config::NotificationsConfig;
//! ```

// Re-export workspace libraries for convenience
pub use notifysockets;

pub mod config;
pub mod logging;
pub mod shutdown;

// Binary common utilities
pub mod bin_common {
    //! Common utilities for binary executables

    pub mod cli;
    pub mod runner;

    pub use cli::{load_config_from_env, parse_args, ConfigType};
    pub use runner::{BinaryRunner, RunConfig};
}

pub use config::{ConfigError, NotificationsConfig};
pub use logging::init_tracing_with_level;
pub use shutdown::ShutdownManager;
