//! Live update sink: applies each pushed reading to the dashboard.
//!
//! One connection is opened per run. A transport error or the end of the
//! body is terminal: the connection is dropped, the dashboard is marked
//! disconnected and no reconnect is attempted. A malformed message is logged
//! and skipped without affecting the subscription.

use std::fmt::Display;
use std::time::Duration;

use futures_util::{Stream, StreamExt};
use reqwest::{header, Client};
use tracing::{debug, error, info, warn};

use crate::dashboard::{ConnectionStatus, Dashboard};
use crate::error::{DashboardError, DashboardResult};
use crate::history::SUBJECT_QUERY_PARAM;
use crate::models::Reading;
use crate::policy::EmergencyPolicy;
use crate::Config;

mod sse;

pub use sse::{SseDecoder, SseEvent, SseOverflow, MAX_EVENT_BYTES, MAX_LINE_BYTES};

// ---

/// What happened to a single stream message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageOutcome {
    Applied { emergency: bool },
    Dropped,
}

/// How many messages a stream run handled before it ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamStats {
    pub applied: u64,
    pub dropped: u64,
}

pub struct LiveSink {
    client: Client,
    url: String,
    subject_id: String,
    policy: Box<dyn EmergencyPolicy>,
}

impl LiveSink {
    // ---
    /// Build a sink, or `None` when the endpoint or subject is not configured.
    pub fn from_config(config: &Config) -> DashboardResult<Option<Self>> {
        // ---
        let (Some(url), Some(subject_id)) = (&config.stream_api_url, &config.subject_id) else {
            return Ok(None);
        };
        // no overall timeout: the body is open for the life of the session
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(config.http_timeout_secs))
            .build()?;
        let policy = config.emergency_policy.build(config.thresholds());
        Ok(Some(Self::new(client, url, subject_id, policy)))
    }

    pub fn new(client: Client, url: &str, subject_id: &str, policy: Box<dyn EmergencyPolicy>) -> Self {
        Self {
            client,
            url: url.to_string(),
            subject_id: subject_id.to_string(),
            policy,
        }
    }

    /// Subscribe and process messages until the stream fails or ends.
    ///
    /// Always returns the terminal error; the dashboard is left showing the
    /// last applied state with the connection marked disconnected.
    pub async fn run(&self, dashboard: &mut Dashboard) -> DashboardError {
        // ---
        dashboard.set_connection(ConnectionStatus::Connecting);
        dashboard.request_redraw();

        let err = match self.connect().await {
            Ok(response) => {
                info!(
                    "Stream connected to {} (policy: {})",
                    self.url,
                    self.policy.name()
                );
                dashboard.set_connection(ConnectionStatus::Live);
                dashboard.request_redraw();

                let (stats, err) = self.consume(response.bytes_stream(), dashboard).await;
                info!(
                    "Stream closed after {} applied / {} dropped messages",
                    stats.applied, stats.dropped
                );
                err
            }
            Err(e) => e,
        };

        error!("SSE connection failed: {}", err);
        dashboard.set_connection(ConnectionStatus::Disconnected);
        dashboard.request_redraw();
        err
    }

    async fn connect(&self) -> DashboardResult<reqwest::Response> {
        // ---
        let response = self
            .client
            .get(&self.url)
            .query(&[(SUBJECT_QUERY_PARAM, &self.subject_id)])
            .header(header::ACCEPT, "text/event-stream")
            .header(header::CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DashboardError::Status {
                url: self.url.clone(),
                status,
            });
        }
        Ok(response)
    }

    /// Decode an event-stream body and handle every `message` event in order.
    ///
    /// Returns once the body errors, ends or overflows the decoder, with the
    /// reason.
    pub async fn consume<S, B, E>(&self, body: S, dashboard: &mut Dashboard) -> (StreamStats, DashboardError)
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        self.consume_with(SseDecoder::new(), body, dashboard).await
    }

    async fn consume_with<S, B, E>(
        &self,
        mut decoder: SseDecoder,
        body: S,
        dashboard: &mut Dashboard,
    ) -> (StreamStats, DashboardError)
    where
        S: Stream<Item = Result<B, E>>,
        B: AsRef<[u8]>,
        E: Display,
    {
        // ---
        let mut body = std::pin::pin!(body);
        let mut stats = StreamStats::default();

        while let Some(chunk) = body.next().await {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => return (stats, DashboardError::StreamTerminated(e.to_string())),
            };
            let events = match decoder.push(chunk.as_ref()) {
                Ok(events) => events,
                Err(e) => return (stats, DashboardError::StreamTerminated(e.to_string())),
            };
            for event in events {
                if !event.is_message() {
                    debug!("Ignoring '{}' event", event.event);
                    continue;
                }
                match self.handle_message(&event.data, dashboard) {
                    MessageOutcome::Applied { .. } => stats.applied += 1,
                    MessageOutcome::Dropped => stats.dropped += 1,
                }
            }
        }
        (
            stats,
            DashboardError::StreamTerminated("server closed the event stream".to_string()),
        )
    }

    /// Apply one message payload to the dashboard.
    pub fn handle_message(&self, data: &str, dashboard: &mut Dashboard) -> MessageOutcome {
        // ---
        let reading: Reading = match serde_json::from_str(data) {
            Ok(reading) => reading,
            Err(e) => {
                warn!("Dropping malformed stream message: {} - Raw: {}", e, data);
                return MessageOutcome::Dropped;
            }
        };
        Self::apply(&*self.policy, &reading, dashboard)
    }

    /// Display update, chart append, alerts panel, overlay, in that order.
    pub fn apply(policy: &dyn EmergencyPolicy, reading: &Reading, dashboard: &mut Dashboard) -> MessageOutcome {
        // ---
        dashboard.show_reading(reading);
        dashboard.push_chart(reading);

        if let Some(alerts) = reading.alerts.as_deref() {
            dashboard.show_alerts(alerts);
        }

        let emergency = policy.is_emergency(reading);
        if emergency {
            warn!(
                "Emergency: heart_rate={} alerts={}",
                reading.heart_rate,
                reading.alerts.as_ref().map_or(0, Vec::len)
            );
        }
        dashboard.set_emergency(emergency);
        // one frame carries the chart, panel and overlay changes
        dashboard.request_redraw();

        MessageOutcome::Applied { emergency }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::dashboard::{Layout, PanelContent, PanelEntry, Slot};
    use crate::models::{AlertKind, LabelClock};
    use crate::policy::{PolicyKind, ServerAlertPolicy, ThresholdPolicy};
    use futures_util::stream;

    fn sink(policy: Box<dyn EmergencyPolicy>) -> LiveSink {
        LiveSink::new(Client::new(), "http://localhost:5000/api/stream", "2", policy)
    }

    fn dashboard(alerts_panel: bool) -> Dashboard {
        // ---
        let layout = Layout {
            alerts_panel,
            label_clock: LabelClock::Utc,
            ..Layout::default()
        };
        Dashboard::new(&layout).0
    }

    fn message(minute: u32, heart_rate: u32, alerts: &str) -> String {
        // ---
        let alerts = if alerts.is_empty() {
            String::new()
        } else {
            format!(r#", "alerts": {alerts}"#)
        };
        format!(
            r#"{{"timestamp": "2025-03-26T12:{minute:02}:00Z", "heart_rate": {heart_rate},
                "blood_pressure_sys": 121, "blood_pressure_dia": 79, "oxygen_level": 97,
                "temperature": 36.9, "sugar_level": 104{alerts}}}"#
        )
    }

    #[test]
    fn test_threshold_overlay() {
        // ---
        let sink = sink(Box::new(ThresholdPolicy::default()));
        let mut dash = dashboard(false);

        for (hr, visible) in [(151, true), (150, false), (39, true), (40, false)] {
            let outcome = sink.handle_message(&message(0, hr, ""), &mut dash);
            assert_eq!(outcome, MessageOutcome::Applied { emergency: visible });
            assert_eq!(dash.overlay_visible(), Some(visible), "heart_rate={hr}");
        }
    }

    #[test]
    fn test_server_alert_policy_and_panel() {
        // ---
        let sink = sink(Box::new(ServerAlertPolicy));
        let mut dash = dashboard(true);

        sink.handle_message(&message(0, 72, "[]"), &mut dash);
        assert_eq!(dash.overlay_visible(), Some(false));
        assert_eq!(dash.alerts_panel().unwrap().content(), &PanelContent::NoActiveAlerts);

        sink.handle_message(&message(1, 72, r#"[{"type": "warning", "msg": "x"}]"#), &mut dash);
        assert_eq!(dash.overlay_visible(), Some(false));
        assert_eq!(
            dash.alerts_panel().unwrap().entries(),
            &[PanelEntry {
                kind: AlertKind::Warning,
                text: "x".to_string()
            }]
        );

        sink.handle_message(&message(2, 72, r#"[{"type": "danger", "msg": "y"}]"#), &mut dash);
        assert_eq!(dash.overlay_visible(), Some(true));
        assert_eq!(
            dash.alerts_panel().unwrap().entries(),
            &[PanelEntry {
                kind: AlertKind::Danger,
                text: "y".to_string()
            }]
        );
    }

    #[test]
    fn test_missing_alerts_keeps_panel() {
        // ---
        let sink = sink(Box::new(ServerAlertPolicy));
        let mut dash = dashboard(true);

        sink.handle_message(&message(0, 72, r#"[{"type": "danger", "msg": "y"}]"#), &mut dash);
        sink.handle_message(&message(1, 72, ""), &mut dash);

        assert_eq!(dash.alerts_panel().unwrap().entries().len(), 1);
        assert_eq!(dash.overlay_visible(), Some(false));
    }

    #[test]
    fn test_malformed_message_changes_nothing() {
        // ---
        let sink = sink(Box::new(ThresholdPolicy::default()));
        let mut dash = dashboard(false);
        sink.handle_message(&message(0, 80, ""), &mut dash);
        let before = dash.frame();
        let redraws = dash.redraw_count();

        assert_eq!(sink.handle_message("not json", &mut dash), MessageOutcome::Dropped);
        assert_eq!(
            sink.handle_message(r#"{"heart_rate": 200}"#, &mut dash),
            MessageOutcome::Dropped
        );
        assert_eq!(dash.frame(), before);
        assert_eq!(dash.redraw_count(), redraws);
    }

    #[test]
    fn test_window_bound_and_fifo() {
        // ---
        let sink = sink(Box::new(ThresholdPolicy::default()));
        let mut dash = dashboard(false);

        for n in 0..45 {
            sink.handle_message(&message(n, 70, ""), &mut dash);
            assert!(dash.chart().unwrap().len() <= 20);
        }
        // messages 0..=44 → the window holds 25..=44
        assert_eq!(dash.chart().unwrap().oldest().unwrap().label, "12:25");
        assert_eq!(dash.chart().unwrap().newest().unwrap().label, "12:44");
    }

    #[test]
    fn test_display_idempotent_through_sink() {
        // ---
        let sink = sink(Box::new(ThresholdPolicy::default()));
        let mut dash = dashboard(false);
        let msg = message(3, 88, "");

        sink.handle_message(&msg, &mut dash);
        let first: Vec<_> = Slot::ALL.iter().map(|&s| dash.slot_text(s).map(str::to_string)).collect();
        sink.handle_message(&msg, &mut dash);
        let second: Vec<_> = Slot::ALL.iter().map(|&s| dash.slot_text(s).map(str::to_string)).collect();

        assert_eq!(first, second);
        assert_eq!(dash.slot_text(Slot::BloodPressure), Some("121/79"));
    }

    #[test]
    fn test_consume_survives_malformed_messages() {
        // ---
        let sink = sink(PolicyKind::Threshold.build(ThresholdPolicy::default()));
        let mut dash = dashboard(false);

        let first = format!("data: {}\n\n", message(0, 70, "").replace('\n', " "));
        let last = format!("data: {}\n\n", message(1, 160, "").replace('\n', " "));
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(first.into_bytes()),
            Ok(b"data: {broken\n\n".to_vec()),
            Ok(b"event: ping\ndata: 1\n\n".to_vec()),
            Ok(last.into_bytes()),
        ];

        let (stats, err) = tokio_test::block_on(sink.consume(stream::iter(chunks), &mut dash));

        assert_eq!(stats, StreamStats { applied: 2, dropped: 1 });
        assert!(matches!(err, DashboardError::StreamTerminated(_)));
        assert_eq!(dash.chart().unwrap().len(), 2);
        assert_eq!(dash.slot_text(Slot::HeartRate), Some("160"));
        assert_eq!(dash.overlay_visible(), Some(true));
    }

    #[test]
    fn test_consume_stops_on_transport_error() {
        // ---
        let sink = sink(Box::new(ThresholdPolicy::default()));
        let mut dash = dashboard(false);

        let ok = format!("data: {}\n\n", message(0, 70, "").replace('\n', " "));
        let after = format!("data: {}\n\n", message(1, 71, "").replace('\n', " "));
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(ok.into_bytes()),
            Err(std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset")),
            Ok(after.into_bytes()),
        ];

        let (stats, err) = tokio_test::block_on(sink.consume(stream::iter(chunks), &mut dash));

        assert_eq!(stats.applied, 1);
        assert_eq!(err.to_string(), "stream terminated: reset");
        assert_eq!(dash.slot_text(Slot::HeartRate), Some("70"));
    }

    #[test]
    fn test_consume_stops_on_overlong_line() {
        // ---
        let sink = sink(Box::new(ThresholdPolicy::default()));
        let mut dash = dashboard(false);

        let ok = format!("data: {}\n\n", message(0, 70, "").replace('\n', " "));
        let chunks: Vec<Result<Vec<u8>, std::io::Error>> = vec![
            Ok(ok.into_bytes()),
            Ok(vec![b'x'; 600]),
            Ok(b"\n\n".to_vec()),
        ];
        let decoder = SseDecoder::with_limits(512, 1024);

        let (stats, err) = tokio_test::block_on(sink.consume_with(decoder, stream::iter(chunks), &mut dash));

        assert_eq!(stats.applied, 1);
        assert_eq!(err.to_string(), "stream terminated: line longer than 512 bytes");
        assert_eq!(dash.slot_text(Slot::HeartRate), Some("70"));
    }
}
