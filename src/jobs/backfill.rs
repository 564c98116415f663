use std::time::Duration;

use actix_web::rt::time::sleep;
use chrono::{NaiveDateTime, NaiveTime};

use crate::engine::LeaveEngine;

/// First moment at `at` local time strictly after `now`.
pub fn next_run(now: NaiveDateTime, at: NaiveTime) -> NaiveDateTime {
    let today = now.date().and_time(at);
    if now < today {
        today
    } else {
        today + chrono::Duration::days(1)
    }
}

/// Runs the attendance backfill once a day at `at`, forever.
pub async fn run_daily(engine: LeaveEngine, at: NaiveTime) {
    loop {
        let now = engine.clock().now();
        let next = next_run(now, at);
        let wait = (next - now).to_std().unwrap_or(Duration::ZERO);
        tracing::info!(%next, "Next attendance backfill scheduled");
        sleep(wait).await;

        let day = engine.clock().today();
        if let Err(e) = engine.backfill_day(day).await {
            tracing::error!(error = %e, %day, "Attendance backfill failed");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M").unwrap()
    }

    #[test]
    fn runs_later_today_or_tomorrow() {
        let half_six = NaiveTime::from_hms_opt(18, 30, 0).unwrap();
        assert_eq!(next_run(at("2025-06-10 09:00"), half_six), at("2025-06-10 18:30"));
        assert_eq!(next_run(at("2025-06-10 18:30"), half_six), at("2025-06-11 18:30"));
        assert_eq!(next_run(at("2025-06-30 23:59"), half_six), at("2025-07-01 18:30"));
    }
}
