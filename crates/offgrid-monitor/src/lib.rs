//! Health monitor for offgrid.
//!
//! Polls a liveness endpoint on a fixed interval and tells the foreground
//! when the link goes online or offline. Only changes are reported, and at
//! most one report is ever waiting for an acknowledgment.

pub mod gate;
pub mod monitor;
pub mod probe;
pub mod task;

pub use gate::AckGate;
pub use monitor::HealthMonitor;
pub use probe::HttpProbe;
pub use task::{BridgeEndpoint, DEFAULT_PROBE_INTERVAL, MonitorConfig, MonitorHandle, MonitorTask};
