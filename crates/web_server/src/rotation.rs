use std::sync::Arc;
use std::time::Duration;

use chrono::{Days, Local};
use tokio::task::JoinHandle;
use tracing::{error, info};

use booking_engine::ReservationEngine;

/// Drives the engine's daily window rotation.
/// Owns a background task that fires once per local day boundary.
pub struct RotationScheduler {
    handle: Option<JoinHandle<()>>,
}

impl RotationScheduler {
    /// Spawns the rotation task for the given engine.
    pub fn start(engine: Arc<ReservationEngine>) -> Self {
        info!("Starting daily window rotation scheduler");

        let handle = tokio::spawn(async move {
            loop {
                tokio::time::sleep(until_next_midnight()).await;
                roll_until_done(&engine).await;
            }
        });

        Self {
            handle: Some(handle),
        }
    }

    /// Stops the rotation task.
    pub async fn stop(&mut self) {
        info!("Stopping daily window rotation scheduler");

        if let Some(handle) = self.handle.take() {
            handle.abort();
            let _ = handle.await;
        }
    }
}

impl Drop for RotationScheduler {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }
}

/// Rolls the window, retrying while the day locks are contended. A missed
/// rotation would leave the whole window shifted against the calendar, so
/// this keeps trying rather than skipping the day.
async fn roll_until_done(engine: &ReservationEngine) {
    loop {
        match engine.roll_window().await {
            Ok(()) => {
                info!("Availability window rolled forward");
                return;
            }
            Err(e) => {
                error!("Failed to roll availability window, will retry: {}", e);
                tokio::time::sleep(Duration::from_secs(60)).await;
            }
        }
    }
}

/// Time remaining until the next local midnight.
fn until_next_midnight() -> Duration {
    let now = Local::now().naive_local();
    let next_midnight = (now.date() + Days::new(1))
        .and_hms_opt(0, 0, 0)
        .expect("midnight is a valid time");

    (next_midnight - now)
        .to_std()
        .unwrap_or(Duration::from_secs(0))
}
