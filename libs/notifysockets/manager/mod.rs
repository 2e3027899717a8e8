//! # NotifySockets Manager
//!
//! The connection manager: lifecycle state machine, reconnection policy and
//! message fan-out for a single notification connection.

pub mod manager;

pub use manager::ConnectionManager;
