//! Session management configuration.

use serde::{Deserialize, Serialize};

/// Session management configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Absolute session lifetime in hours.
    #[serde(default = "default_lifetime")]
    pub lifetime_hours: u64,
    /// Interval for the expired-session sweep in minutes.
    #[serde(default = "default_sweep_interval")]
    pub sweep_interval_minutes: u64,
    /// Whether a device-fingerprint mismatch on refresh revokes the
    /// credential instead of merely rejecting the request.
    #[serde(default)]
    pub strict_fingerprint: bool,
    /// Rolling window for the rotation anomaly detector, in minutes.
    #[serde(default = "default_anomaly_window")]
    pub anomaly_window_minutes: u64,
    /// Distinct source addresses tolerated per session inside the window.
    #[serde(default = "default_anomaly_max_addresses")]
    pub anomaly_max_addresses: i64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_hours: default_lifetime(),
            sweep_interval_minutes: default_sweep_interval(),
            strict_fingerprint: false,
            anomaly_window_minutes: default_anomaly_window(),
            anomaly_max_addresses: default_anomaly_max_addresses(),
        }
    }
}

fn default_lifetime() -> u64 {
    24
}

fn default_sweep_interval() -> u64 {
    15
}

fn default_anomaly_window() -> u64 {
    60
}

fn default_anomaly_max_addresses() -> i64 {
    3
}
