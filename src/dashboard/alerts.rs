//! Side panel listing the server alerts of the latest reading.

use crate::models::{Alert, AlertKind};

// ---

pub const NO_ACTIVE_ALERTS: &str = "No active alerts.";

/// One rendered alert, styled by its kind.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelEntry {
    pub kind: AlertKind,
    pub text: String,
}

/// What the panel currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum PanelContent {
    /// Nothing rendered yet.
    #[default]
    Blank,
    /// The last reading carried an empty alert list.
    NoActiveAlerts,
    Alerts(Vec<PanelEntry>),
}

#[derive(Debug, Clone, Default)]
pub struct AlertsPanel {
    content: PanelContent,
}

impl AlertsPanel {
    // ---
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the whole panel with `alerts`.
    pub fn replace(&mut self, alerts: &[Alert]) {
        // ---
        self.content = if alerts.is_empty() {
            PanelContent::NoActiveAlerts
        } else {
            PanelContent::Alerts(
                alerts
                    .iter()
                    .map(|a| PanelEntry {
                        kind: a.kind,
                        text: a.msg.clone(),
                    })
                    .collect(),
            )
        };
    }

    pub fn content(&self) -> &PanelContent {
        &self.content
    }

    pub fn entries(&self) -> &[PanelEntry] {
        match &self.content {
            PanelContent::Alerts(entries) => entries,
            _ => &[],
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn alert(kind: AlertKind, msg: &str) -> Alert {
        Alert {
            kind,
            msg: msg.to_string(),
        }
    }

    #[test]
    fn test_starts_blank() {
        assert_eq!(AlertsPanel::new().content(), &PanelContent::Blank);
    }

    #[test]
    fn test_empty_list_shows_placeholder() {
        // ---
        let mut panel = AlertsPanel::new();
        panel.replace(&[]);
        assert_eq!(panel.content(), &PanelContent::NoActiveAlerts);
        assert!(panel.entries().is_empty());
    }

    #[test]
    fn test_replace_is_not_incremental() {
        // ---
        let mut panel = AlertsPanel::new();
        panel.replace(&[alert(AlertKind::Danger, "a"), alert(AlertKind::Warning, "b")]);
        assert_eq!(panel.entries().len(), 2);

        panel.replace(&[alert(AlertKind::Warning, "c")]);
        assert_eq!(
            panel.entries(),
            &[PanelEntry {
                kind: AlertKind::Warning,
                text: "c".to_string()
            }]
        );
    }
}
