//! The rendered surface the history loader and live sink write into.
//!
//! A [`Dashboard`] owns the display slots, the rolling chart, the alerts
//! panel and the emergency overlay. Components that are not part of the
//! [`Layout`] are simply absent and writes to them are skipped.
//!
//! Every [`Dashboard::request_redraw`] publishes a [`Frame`] snapshot on a
//! `tokio::sync::watch` channel. The renderer only ever sees the latest
//! frame, so redraw requests coalesce when drawing falls behind.

use tokio::sync::watch;

use crate::models::{Alert, LabelClock, Reading};

mod alerts;
mod chart;
mod slots;

pub use alerts::{AlertsPanel, PanelContent, PanelEntry, NO_ACTIVE_ALERTS};
pub use chart::{ChartPoint, ChartWindow, DEFAULT_CHART_WINDOW};
pub use slots::{DisplaySlots, Slot};

// ---

/// Which parts of the dashboard exist.
#[derive(Debug, Clone)]
pub struct Layout {
    pub slots: Vec<Slot>,
    pub chart: bool,
    pub chart_window: usize,
    pub alerts_panel: bool,
    pub overlay: bool,
    pub label_clock: LabelClock,
}

impl Default for Layout {
    fn default() -> Self {
        Self {
            slots: Slot::ALL.to_vec(),
            chart: true,
            chart_window: DEFAULT_CHART_WINDOW,
            alerts_panel: false,
            overlay: true,
            label_clock: LabelClock::Local,
        }
    }
}

/// State of the live stream, shown so a dropped connection is visible.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionStatus {
    #[default]
    Idle,
    Connecting,
    Live,
    Disconnected,
}

/// Snapshot of everything on screen.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Frame {
    pub slots: Vec<(Slot, String)>,
    pub chart: Option<Vec<ChartPoint>>,
    pub alerts: Option<PanelContent>,
    pub emergency: Option<bool>,
    pub connection: ConnectionStatus,
}

#[derive(Debug)]
pub struct Dashboard {
    slots: DisplaySlots,
    chart: Option<ChartWindow>,
    alerts_panel: Option<AlertsPanel>,
    /// `Some(visible)` when the overlay is attached.
    overlay: Option<bool>,
    connection: ConnectionStatus,
    label_clock: LabelClock,
    redraws: u64,
    frames: watch::Sender<Frame>,
}

impl Dashboard {
    // ---
    /// Build the dashboard and the receiving end of its frame channel.
    pub fn new(layout: &Layout) -> (Self, watch::Receiver<Frame>) {
        // ---
        let (frames, rx) = watch::channel(Frame::default());
        let dashboard = Self {
            slots: DisplaySlots::new(&layout.slots),
            chart: layout.chart.then(|| ChartWindow::new(layout.chart_window)),
            alerts_panel: layout.alerts_panel.then(AlertsPanel::new),
            overlay: layout.overlay.then_some(false),
            connection: ConnectionStatus::Idle,
            label_clock: layout.label_clock,
            redraws: 0,
            frames,
        };
        (dashboard, rx)
    }

    /// Display updater: write the reading's vitals into the attached slots.
    pub fn show_reading(&mut self, reading: &Reading) {
        self.slots.apply(reading);
    }

    /// Append a history point without trimming. Returns false without a chart.
    pub fn seed_chart(&mut self, reading: &Reading) -> bool {
        // ---
        let point = self.chart_point(reading);
        match self.chart.as_mut() {
            Some(chart) => {
                chart.seed(point);
                true
            }
            None => false,
        }
    }

    /// Append a live point, trimming the window. Returns false without a chart.
    pub fn push_chart(&mut self, reading: &Reading) -> bool {
        // ---
        let point = self.chart_point(reading);
        match self.chart.as_mut() {
            Some(chart) => {
                let evicted = chart.push(point);
                if evicted > 0 {
                    tracing::trace!(evicted, len = chart.len(), "chart window trimmed");
                }
                true
            }
            None => false,
        }
    }

    /// Replace the alerts panel content. Skipped when the panel is absent.
    pub fn show_alerts(&mut self, alerts: &[Alert]) {
        if let Some(panel) = self.alerts_panel.as_mut() {
            panel.replace(alerts);
        }
    }

    /// Show or hide the emergency overlay. Skipped when the overlay is absent.
    pub fn set_emergency(&mut self, visible: bool) {
        if let Some(overlay) = self.overlay.as_mut() {
            *overlay = visible;
        }
    }

    pub fn set_connection(&mut self, status: ConnectionStatus) {
        self.connection = status;
    }

    /// Publish the current state to the renderer.
    pub fn request_redraw(&mut self) {
        // ---
        self.redraws += 1;
        // send_replace never fails, even with the renderer gone
        self.frames.send_replace(self.frame());
    }

    pub fn frame(&self) -> Frame {
        // ---
        Frame {
            slots: self.slots.attached(),
            chart: self.chart.as_ref().map(ChartWindow::to_vec),
            alerts: self.alerts_panel.as_ref().map(|p| p.content().clone()),
            emergency: self.overlay,
            connection: self.connection,
        }
    }

    pub fn slot_text(&self, slot: Slot) -> Option<&str> {
        self.slots.text(slot)
    }

    pub fn chart(&self) -> Option<&ChartWindow> {
        self.chart.as_ref()
    }

    pub fn alerts_panel(&self) -> Option<&AlertsPanel> {
        self.alerts_panel.as_ref()
    }

    pub fn overlay_visible(&self) -> Option<bool> {
        self.overlay
    }

    pub fn connection(&self) -> ConnectionStatus {
        self.connection
    }

    pub fn redraw_count(&self) -> u64 {
        self.redraws
    }

    fn chart_point(&self, reading: &Reading) -> ChartPoint {
        ChartPoint {
            label: reading.label(self.label_clock),
            heart_rate: reading.heart_rate,
            sugar_level: reading.sugar_level,
        }
    }
}
