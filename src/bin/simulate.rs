//! `vitals-simulate`: feeds random vitals to the server so a dashboard has
//! something to show.
//!
//! # Environment Variables
//! - `UPDATE_API_URL` (**required**) – e.g. `http://localhost:5000/api/update`
//! - `API_KEY` (**required**) – shared key expected by the server
//! - `SUBJECT_ID` (**required**) – patient the readings belong to
//! - `SIMULATE_INTERVAL_SECS` / `SIMULATE_COUNT` (optional)
use anyhow::Result;
use dotenvy::dotenv;
use tracing_subscriber::filter::EnvFilter;

use vitals_dashboard::{config, simulate};

#[tokio::main]
async fn main() -> Result<()> {
    // ---
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .compact()
        .init();

    let cfg = config::load_simulator_from_env()?;
    cfg.log_config();

    tokio::select! {
        result = simulate::run_simulator(&cfg) => result,
        _ = tokio::signal::ctrl_c() => {
            tracing::info!("Interrupted, stopping simulation");
            Ok(())
        }
    }
}
