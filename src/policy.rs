//! Emergency policies deciding whether a reading raises the overlay.
//!
//! Two deployments disagree on the rule: one checks the heart rate against
//! fixed bounds, the other trusts the alerts the server attached. Both are
//! implementations of [`EmergencyPolicy`], selected at configuration time.

use std::str::FromStr;

use crate::models::Reading;

// ---

pub const DEFAULT_HEART_RATE_HIGH: f64 = 150.0;
pub const DEFAULT_HEART_RATE_LOW: f64 = 40.0;

/// Decides whether a reading is an emergency.
pub trait EmergencyPolicy: Send + Sync {
    // ---
    fn is_emergency(&self, reading: &Reading) -> bool;

    /// Short name for logs.
    fn name(&self) -> &'static str {
        "custom"
    }
}

impl<F> EmergencyPolicy for F
where
    F: Fn(&Reading) -> bool + Send + Sync,
{
    fn is_emergency(&self, reading: &Reading) -> bool {
        self(reading)
    }
}

/// Emergency iff the heart rate is strictly above `high` or strictly below `low`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdPolicy {
    pub high_bpm: f64,
    pub low_bpm: f64,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self {
            high_bpm: DEFAULT_HEART_RATE_HIGH,
            low_bpm: DEFAULT_HEART_RATE_LOW,
        }
    }
}

impl EmergencyPolicy for ThresholdPolicy {
    fn is_emergency(&self, reading: &Reading) -> bool {
        reading.heart_rate > self.high_bpm || reading.heart_rate < self.low_bpm
    }

    fn name(&self) -> &'static str {
        "threshold"
    }
}

/// Emergency iff the server attached at least one `danger` alert.
#[derive(Debug, Clone, Copy, Default)]
pub struct ServerAlertPolicy;

impl EmergencyPolicy for ServerAlertPolicy {
    fn is_emergency(&self, reading: &Reading) -> bool {
        reading.has_danger_alert()
    }

    fn name(&self) -> &'static str {
        "server_alerts"
    }
}

/// Policy selector as it appears in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PolicyKind {
    #[default]
    Threshold,
    ServerAlerts,
}

impl FromStr for PolicyKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "threshold" => Ok(PolicyKind::Threshold),
            "server_alerts" | "server_alert" | "alerts" => Ok(PolicyKind::ServerAlerts),
            other => Err(format!(
                "unknown emergency policy '{other}' (expected threshold|server_alerts)"
            )),
        }
    }
}

impl PolicyKind {
    // ---
    pub fn build(self, thresholds: ThresholdPolicy) -> Box<dyn EmergencyPolicy> {
        match self {
            PolicyKind::Threshold => Box::new(thresholds),
            PolicyKind::ServerAlerts => Box::new(ServerAlertPolicy),
        }
    }
}
