//! Background release of lapsed seat holds.

use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::task::JoinHandle;

use crate::error::{AppError, AppResult};
use crate::ledger;
use crate::reservation::ReservationCoordinator;

/// Cancel every pending booking whose hold expired before `now`.
///
/// Each booking goes through the regular cancel path, so a booking paid
/// between the scan and its cancellation is left alone. Returns the number
/// of bookings cancelled.
pub async fn sweep_expired_holds(
    coordinator: &ReservationCoordinator,
    now: DateTime<Utc>,
) -> AppResult<usize> {
    let expired = ledger::expired_holds(coordinator.db(), now).await?;
    let mut cancelled = 0;

    for booking_id in expired {
        match coordinator.cancel(booking_id).await {
            Ok(receipt) => {
                cancelled += 1;
                tracing::info!(
                    booking_id = %booking_id,
                    seats_released = receipt.seats_released,
                    "Expired hold released"
                );
            }
            // Settled or cancelled since the scan
            Err(AppError::ValidationFailed(_)) => {}
            Err(e) => {
                tracing::warn!(booking_id = %booking_id, error = %e, "Failed to release expired hold");
            }
        }
    }

    Ok(cancelled)
}

pub fn spawn_hold_sweeper(coordinator: ReservationCoordinator, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;
            match sweep_expired_holds(&coordinator, Utc::now()).await {
                Ok(0) => {}
                Ok(n) => tracing::info!(cancelled = n, "Hold sweep complete"),
                Err(e) => tracing::error!(error = %e, "Hold sweep failed"),
            }
        }
    })
}
