//! Recurring debt jobs.
//!
//! Two fixed schedules: the increase runs every three hours on the hour,
//! the decrease daily at 06:30 UTC. Runs are best-effort; a failed run is
//! logged and the next one proceeds independently.

use crate::services::debt::DebtService;
use chrono::{DateTime, Duration as ChronoDuration, Timelike, Utc};
use std::sync::Arc;
use tracing::{error, info};

/// Next wall-clock instant strictly after `now` whose hour is a multiple of
/// three, at minute zero.
pub fn next_increase_run(now: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = now
        .date_naive()
        .and_hms_opt(0, 0, 0)
        .expect("midnight is always a valid time")
        .and_utc();
    let next_block = (now.hour() / 3 + 1) * 3;
    midnight + ChronoDuration::hours(i64::from(next_block))
}

/// Next 06:30 UTC strictly after `now`.
pub fn next_decrease_run(now: DateTime<Utc>) -> DateTime<Utc> {
    let today = now
        .date_naive()
        .and_hms_opt(6, 30, 0)
        .expect("06:30 is always a valid time")
        .and_utc();
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Spawns both recurring jobs.
pub fn start(debt: Arc<DebtService>) {
    {
        let debt = debt.clone();
        tokio::spawn(async move {
            info!("scheduled debt increase job armed (every 3 hours on the hour)");
            loop {
                wait_until(next_increase_run(Utc::now())).await;
                match debt.increase_all().await {
                    Ok(count) => info!(suppliers = count, "scheduled debt increase completed"),
                    Err(e) => error!("scheduled debt increase failed: {}", e),
                }
            }
        });
    }

    tokio::spawn(async move {
        info!("scheduled debt decrease job armed (daily at 06:30 UTC)");
        loop {
            wait_until(next_decrease_run(Utc::now())).await;
            match debt.decrease_all().await {
                Ok(count) => info!(suppliers = count, "scheduled debt decrease completed"),
                Err(e) => error!("scheduled debt decrease failed: {}", e),
            }
        }
    });
}

async fn wait_until(instant: DateTime<Utc>) {
    let now = Utc::now();
    if let Ok(delay) = (instant - now).to_std() {
        tokio::time::sleep(delay).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, mo: u32, d: u32, h: u32, mi: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, s).unwrap()
    }

    #[test]
    fn increase_runs_on_the_next_three_hour_boundary() {
        assert_eq!(
            next_increase_run(utc(2026, 5, 1, 0, 0, 0)),
            utc(2026, 5, 1, 3, 0, 0)
        );
        assert_eq!(
            next_increase_run(utc(2026, 5, 1, 2, 59, 59)),
            utc(2026, 5, 1, 3, 0, 0)
        );
        assert_eq!(
            next_increase_run(utc(2026, 5, 1, 3, 0, 0)),
            utc(2026, 5, 1, 6, 0, 0)
        );
    }

    #[test]
    fn increase_rolls_over_midnight() {
        assert_eq!(
            next_increase_run(utc(2026, 5, 1, 22, 15, 0)),
            utc(2026, 5, 2, 0, 0, 0)
        );
        assert_eq!(
            next_increase_run(utc(2026, 5, 1, 21, 0, 0)),
            utc(2026, 5, 2, 0, 0, 0)
        );
    }

    #[test]
    fn decrease_runs_at_half_past_six() {
        assert_eq!(
            next_decrease_run(utc(2026, 5, 1, 5, 0, 0)),
            utc(2026, 5, 1, 6, 30, 0)
        );
        assert_eq!(
            next_decrease_run(utc(2026, 5, 1, 6, 30, 0)),
            utc(2026, 5, 2, 6, 30, 0)
        );
        assert_eq!(
            next_decrease_run(utc(2026, 5, 1, 23, 59, 59)),
            utc(2026, 5, 2, 6, 30, 0)
        );
    }
}
