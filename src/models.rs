//! Data models for the vitals dashboard.

use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

// ---

/// One timestamped vitals sample, as served by the history and stream endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    // ---
    #[serde(deserialize_with = "deserialize_timestamp")]
    pub timestamp: DateTime<Utc>,
    pub heart_rate: f64,
    pub blood_pressure_sys: f64,
    pub blood_pressure_dia: f64,
    pub oxygen_level: f64,
    pub temperature: f64,
    pub sugar_level: f64,
    /// Server-classified conditions. Absent when the server does not classify.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts: Option<Vec<Alert>>,
}

/// A server-classified condition attached to a reading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Alert {
    // ---
    #[serde(rename = "type")]
    pub kind: AlertKind,
    pub msg: String,
}

/// Alert severity. Anything the server sends other than `danger` is a warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum AlertKind {
    Danger,
    Warning,
}

impl From<String> for AlertKind {
    fn from(value: String) -> Self {
        // ---
        if value.eq_ignore_ascii_case("danger") {
            AlertKind::Danger
        } else {
            AlertKind::Warning
        }
    }
}

/// Which clock chart labels are expressed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LabelClock {
    #[default]
    Local,
    Utc,
}

impl std::str::FromStr for LabelClock {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // ---
        match s.trim().to_ascii_lowercase().as_str() {
            "local" => Ok(LabelClock::Local),
            "utc" => Ok(LabelClock::Utc),
            other => Err(format!("unknown label timezone '{other}' (expected local|utc)")),
        }
    }
}

impl Reading {
    // ---
    /// Chart label for this reading: `HH:MM`, zero-padded, no seconds.
    pub fn label(&self, clock: LabelClock) -> String {
        // ---
        match clock {
            LabelClock::Local => self.timestamp.with_timezone(&Local).format("%H:%M").to_string(),
            LabelClock::Utc => self.timestamp.format("%H:%M").to_string(),
        }
    }

    /// Blood pressure as shown on the dashboard, e.g. `120/80`.
    pub fn blood_pressure(&self) -> String {
        format!(
            "{}/{}",
            display_number(self.blood_pressure_sys),
            display_number(self.blood_pressure_dia)
        )
    }

    /// True when the server attached at least one `danger` alert.
    pub fn has_danger_alert(&self) -> bool {
        // ---
        self.alerts
            .as_deref()
            .is_some_and(|alerts| alerts.iter().any(|a| a.kind == AlertKind::Danger))
    }
}

/// Format a vital for display: integral values without a fraction (`72`),
/// everything else in shortest form (`36.6`).
pub fn display_number(value: f64) -> String {
    // f64's Display already prints 72.0 as "72"
    value.to_string()
}

/// Accept RFC 3339 as well as the naive `YYYY-MM-DD HH:MM:SS` form SQLite
/// emits for `CURRENT_TIMESTAMP` (which is UTC).
fn deserialize_timestamp<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    // ---
    let raw = String::deserialize(deserializer)?;
    parse_timestamp(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp '{raw}'")))
}

pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    // ---
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc())
}
