//! Vitals simulator: posts random readings to the server's update endpoint.
//!
//! Useful to drive a dashboard end to end without a real device.

use std::time::Duration;

use rand::Rng;
use reqwest::Client;
use serde::Serialize;
use tracing::{error, info};

use crate::config::SimulatorConfig;

// ---

/// Body of a vitals update request.
#[derive(Debug, Clone, Serialize)]
pub struct VitalsUpdate {
    pub api_key: String,
    pub user_id: String,
    pub heart_rate: u32,
    pub blood_pressure_sys: u32,
    pub blood_pressure_dia: u32,
    pub oxygen_level: u32,
    pub temperature: f64,
    pub sugar_level: f64,
}

impl VitalsUpdate {
    // ---
    /// A plausible resting-adult reading.
    pub fn random<R: Rng>(rng: &mut R, api_key: &str, user_id: &str) -> Self {
        // ---
        Self {
            api_key: api_key.to_string(),
            user_id: user_id.to_string(),
            heart_rate: rng.gen_range(60..=100),
            blood_pressure_sys: rng.gen_range(110..=140),
            blood_pressure_dia: rng.gen_range(70..=90),
            oxygen_level: rng.gen_range(95..=100),
            temperature: round_one_decimal(rng.gen_range(36.5..=37.5)),
            sugar_level: round_one_decimal(rng.gen_range(80.0..=120.0)),
        }
    }
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Post readings every `interval_secs` until `count` is reached (or forever).
///
/// Failed posts are logged and the loop carries on.
pub async fn run_simulator(config: &SimulatorConfig) -> anyhow::Result<()> {
    // ---
    let client = Client::builder().timeout(Duration::from_secs(10)).build()?;
    let mut ticker = tokio::time::interval(Duration::from_secs(config.interval_secs.max(1)));
    let mut sent = 0u64;

    info!("Starting simulation for subject {}", config.subject_id);
    loop {
        ticker.tick().await;

        let update = VitalsUpdate::random(&mut rand::thread_rng(), &config.api_key, &config.subject_id);
        match post_update(&client, config, &update).await {
            Ok(()) => info!(
                "Data sent: HR:{} Sys:{}",
                update.heart_rate, update.blood_pressure_sys
            ),
            Err(e) => error!("Update failed: {}", e),
        }

        sent += 1;
        if config.count > 0 && sent >= config.count {
            info!("Simulation finished after {} readings", sent);
            return Ok(());
        }
    }
}

async fn post_update(client: &Client, config: &SimulatorConfig, update: &VitalsUpdate) -> anyhow::Result<()> {
    // ---
    let response = client
        .post(&config.update_api_url)
        .header("X-API-Key", &config.api_key)
        .json(update)
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("{} - {}", status, body);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_random_update_ranges() {
        // ---
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let u = VitalsUpdate::random(&mut rng, "key", "2");

            assert!((60..=100).contains(&u.heart_rate));
            assert!((110..=140).contains(&u.blood_pressure_sys));
            assert!((70..=90).contains(&u.blood_pressure_dia));
            assert!((95..=100).contains(&u.oxygen_level));
            assert!((36.5..=37.5).contains(&u.temperature));
            assert!((80.0..=120.0).contains(&u.sugar_level));
            assert_eq!(u.temperature, round_one_decimal(u.temperature));
        }
    }

    #[test]
    fn test_update_body_shape() {
        // ---
        let mut rng = StdRng::seed_from_u64(1);
        let body = serde_json::to_value(VitalsUpdate::random(&mut rng, "secret", "2")).unwrap();

        assert_eq!(body["api_key"], "secret");
        assert_eq!(body["user_id"], "2");
        for field in ["heart_rate", "blood_pressure_sys", "blood_pressure_dia", "oxygen_level", "temperature", "sugar_level"] {
            assert!(body[field].is_number(), "{field} should be numeric");
        }
    }
}
