//! History loader: seeds the chart and latest values from past readings.

use std::time::Duration;

use reqwest::Client;
use tracing::{debug, error, info};

use crate::dashboard::Dashboard;
use crate::error::{DashboardError, DashboardResult};
use crate::models::Reading;
use crate::Config;

// ---

/// Query parameter carrying the subject identifier on both endpoints.
pub const SUBJECT_QUERY_PARAM: &str = "user_id";

pub struct HistoryLoader {
    client: Client,
    url: String,
    subject_id: String,
}

impl HistoryLoader {
    // ---
    /// Build a loader, or `None` when the endpoint or subject is not configured.
    pub fn from_config(config: &Config) -> DashboardResult<Option<Self>> {
        // ---
        let (Some(url), Some(subject_id)) = (&config.history_api_url, &config.subject_id) else {
            return Ok(None);
        };
        let client = Client::builder()
            .timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        Ok(Some(Self::new(client, url, subject_id)))
    }

    pub fn new(client: Client, url: &str, subject_id: &str) -> Self {
        Self {
            client,
            url: url.to_string(),
            subject_id: subject_id.to_string(),
        }
    }

    /// Load history into the dashboard, logging any failure.
    ///
    /// On failure the dashboard is left untouched.
    pub async fn run(&self, dashboard: &mut Dashboard) {
        // ---
        match self.load(dashboard).await {
            Ok(count) => info!("History loaded: {} readings", count),
            Err(e) => error!("History load failed, chart left empty: {}", e),
        }
    }

    /// Fetch the history and apply it. Returns the number of readings applied.
    pub async fn load(&self, dashboard: &mut Dashboard) -> DashboardResult<usize> {
        // ---
        let readings = self.fetch().await?;
        Ok(apply_history(&readings, dashboard))
    }

    /// Fetch and decode the history batch, oldest first.
    pub async fn fetch(&self) -> DashboardResult<Vec<Reading>> {
        // ---
        debug!("Fetching history from {} for subject {}", self.url, self.subject_id);

        let response = self
            .client
            .get(&self.url)
            .query(&[(SUBJECT_QUERY_PARAM, &self.subject_id)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                url: self.url.clone(),
                status,
            });
        }

        // Decode from bytes so a malformed body is a Decode error, not Transport
        let body = response.bytes().await?;
        let readings: Vec<Reading> = serde_json::from_slice(&body)?;
        debug!("History response decoded: {} readings", readings.len());
        Ok(readings)
    }
}

/// Seed the chart with every reading (untrimmed), show the newest reading on
/// the latest-value display, then redraw once.
pub fn apply_history(readings: &[Reading], dashboard: &mut Dashboard) -> usize {
    // ---
    for reading in readings {
        dashboard.seed_chart(reading);
    }
    if let Some(latest) = readings.last() {
        dashboard.show_reading(latest);
    }
    // the frame must already carry the latest values
    dashboard.request_redraw();
    readings.len()
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::dashboard::{Layout, Slot};
    use crate::models::LabelClock;

    fn history_json(count: usize) -> String {
        // ---
        let rows: Vec<String> = (0..count)
            .map(|i| {
                format!(
                    r#"{{"id": {i}, "user_id": 2, "timestamp": "2025-03-26 10:{:02}:00",
                        "heart_rate": {}, "blood_pressure_sys": 120, "blood_pressure_dia": 80,
                        "oxygen_level": 98, "temperature": 36.7, "sugar_level": {}}}"#,
                    i,
                    70 + i,
                    100 + i
                )
            })
            .collect();
        format!("[{}]", rows.join(","))
    }

    fn dashboard() -> Dashboard {
        // ---
        let layout = Layout {
            label_clock: LabelClock::Utc,
            ..Layout::default()
        };
        Dashboard::new(&layout).0
    }

    #[test]
    fn test_history_seeds_without_trim() {
        // ---
        let readings: Vec<Reading> = serde_json::from_str(&history_json(30)).unwrap();
        let mut dash = dashboard();

        assert_eq!(apply_history(&readings, &mut dash), 30);

        let chart = dash.chart().unwrap();
        assert_eq!(chart.len(), 30);
        assert_eq!(chart.oldest().unwrap().label, "10:00");
        assert_eq!(chart.newest().unwrap().label, "10:29");
        assert_eq!(dash.redraw_count(), 1);
        assert_eq!(dash.slot_text(Slot::HeartRate), Some("99"));
        assert_eq!(dash.slot_text(Slot::Sugar), Some("129"));
    }

    #[test]
    fn test_history_frame_carries_latest_values() {
        // ---
        let readings: Vec<Reading> = serde_json::from_str(&history_json(3)).unwrap();
        let layout = Layout {
            label_clock: LabelClock::Utc,
            ..Layout::default()
        };
        let (mut dash, mut frames) = Dashboard::new(&layout);

        apply_history(&readings, &mut dash);

        assert!(frames.has_changed().unwrap());
        let frame = frames.borrow_and_update().clone();
        assert_eq!(frame.slots[0], (Slot::HeartRate, "72".to_string()));
        assert_eq!(frame.slots[1], (Slot::BloodPressure, "120/80".to_string()));
        assert_eq!(frame.slots[4], (Slot::Sugar, "102".to_string()));
        let chart = frame.chart.unwrap();
        assert_eq!(chart.len(), 3);
        assert_eq!(chart[2].label, "10:02");
    }

    #[test]
    fn test_empty_history() {
        // ---
        let mut dash = dashboard();

        assert_eq!(apply_history(&[], &mut dash), 0);
        assert!(dash.chart().unwrap().is_empty());
        assert_eq!(dash.slot_text(Slot::HeartRate), Some(""));
        assert_eq!(dash.redraw_count(), 1);
    }

    #[test]
    fn test_from_config_requires_url_and_subject() {
        // ---
        let mut cfg = crate::config::load_from(|_| None).unwrap();
        assert!(HistoryLoader::from_config(&cfg).unwrap().is_none());

        cfg.history_api_url = Some("http://localhost:5000/api/history".to_string());
        assert!(HistoryLoader::from_config(&cfg).unwrap().is_none());

        cfg.subject_id = Some("2".to_string());
        assert!(HistoryLoader::from_config(&cfg).unwrap().is_some());
    }
}
