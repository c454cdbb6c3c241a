//! Live patient-vitals dashboard client.
//!
//! Loads a subject's recent readings, subscribes to the server-sent stream of
//! new readings, and keeps a terminal dashboard current: latest values, a
//! rolling chart, the server's alert list, and an emergency overlay.
//!
//! Module boundaries follow the Explicit Module Boundary Pattern (EMBP):
//! `dashboard` and `stream` are gateways re-exporting what their siblings
//! provide, and [`run`] is the only place the components are wired together.

use anyhow::Result;
use tracing::info;

pub mod config;
pub mod dashboard;
pub mod error;
pub mod history;
pub mod models;
pub mod policy;
pub mod render;
pub mod simulate;
pub mod stream;

pub use config::{Config, SimulatorConfig};
pub use dashboard::Dashboard;
pub use error::DashboardError;
pub use history::HistoryLoader;
pub use models::{Alert, AlertKind, Reading};
pub use policy::EmergencyPolicy;
pub use stream::LiveSink;

// ---

/// Run the dashboard until the stream ends or the process is interrupted.
///
/// History (when configured) is loaded first, then the live stream (when
/// configured) takes over. Either may be disabled independently.
pub async fn run(config: Config) -> Result<()> {
    // ---
    let (mut dashboard, frames) = Dashboard::new(&config.layout());
    let renderer = render::spawn(frames);

    match HistoryLoader::from_config(&config)? {
        Some(loader) => loader.run(&mut dashboard).await,
        None => info!("History loader disabled (HISTORY_API_URL or SUBJECT_ID unset)"),
    }

    match LiveSink::from_config(&config)? {
        Some(sink) => {
            tokio::select! {
                _ = sink.run(&mut dashboard) => {}
                _ = tokio::signal::ctrl_c() => info!("Interrupted, closing stream"),
            }
        }
        None => info!("Live stream disabled (STREAM_API_URL or SUBJECT_ID unset)"),
    }

    // dropping the dashboard closes the frame channel and ends the renderer
    drop(dashboard);
    renderer.await?;
    Ok(())
}
