use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::NaiveTime;
use dotenvy::dotenv;

use crate::engine::Policy;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub api_prefix: String,

    // Rate limiting
    pub rate_protected_per_min: u32,

    /// Minutes east of UTC; every cutoff is read in this local time.
    pub local_utc_offset_minutes: i32,
    pub accrual_baseline_year: i32,
    pub cancel_cutoff: NaiveTime,
    pub edit_window_cutoff: NaiveTime,

    pub backfill_at: NaiveTime,
    pub backfill_enabled: bool,
}

fn required(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("{key} must be set"))
}

fn parsed<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| anyhow::anyhow!("{key}={raw} is invalid: {e}")),
        Err(_) => Ok(default),
    }
}

fn time_of_day(key: &str, default: &str) -> Result<NaiveTime> {
    let raw = env::var(key).unwrap_or_else(|_| default.to_string());
    NaiveTime::parse_from_str(raw.trim(), "%H:%M")
        .with_context(|| format!("{key}={raw} is not a HH:MM time"))
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        Ok(Self {
            server_addr: required("SERVER_ADDR")?,
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            api_prefix: env::var("API_PREFIX").unwrap_or_else(|_| "/api".to_string()),

            rate_protected_per_min: parsed("RATE_PROTECTED_PER_MIN", 1000)?,

            local_utc_offset_minutes: parsed("LOCAL_UTC_OFFSET_MINUTES", 0)?,
            accrual_baseline_year: parsed("ACCRUAL_BASELINE_YEAR", 2024)?,
            cancel_cutoff: time_of_day("CANCEL_CUTOFF", "10:00")?,
            edit_window_cutoff: time_of_day("EDIT_WINDOW_CUTOFF", "18:00")?,

            backfill_at: time_of_day("BACKFILL_AT", "18:30")?,
            backfill_enabled: parsed("BACKFILL_ENABLED", true)?,
        })
    }

    pub fn policy(&self) -> Policy {
        Policy {
            cancel_cutoff: self.cancel_cutoff,
            edit_window_cutoff: self.edit_window_cutoff,
            accrual_baseline_year: self.accrual_baseline_year,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // env vars are process-wide; each test uses its own keys
    #[test]
    fn defaults_apply_when_unset() {
        assert_eq!(parsed::<u32>("LEDGER_TEST_UNSET_NUMBER", 1000).unwrap(), 1000);
        assert_eq!(
            time_of_day("LEDGER_TEST_UNSET_TIME", "18:30").unwrap(),
            NaiveTime::from_hms_opt(18, 30, 0).unwrap()
        );
    }

    #[test]
    fn invalid_values_are_reported_with_the_key() {
        unsafe { env::set_var("LEDGER_TEST_BAD_FLAG", "maybe") };
        let err = parsed::<bool>("LEDGER_TEST_BAD_FLAG", true).unwrap_err();
        assert!(err.to_string().contains("LEDGER_TEST_BAD_FLAG"));

        unsafe { env::set_var("LEDGER_TEST_BAD_TIME", "25:99") };
        let err = time_of_day("LEDGER_TEST_BAD_TIME", "10:00").unwrap_err();
        assert!(err.to_string().contains("LEDGER_TEST_BAD_TIME"));
    }

    #[test]
    fn policy_carries_cutoffs() {
        let config = Config {
            database_url: String::new(),
            jwt_secret: String::new(),
            server_addr: String::new(),
            api_prefix: "/api".into(),
            rate_protected_per_min: 10,
            local_utc_offset_minutes: 330,
            accrual_baseline_year: 2025,
            cancel_cutoff: NaiveTime::from_hms_opt(9, 30, 0).unwrap(),
            edit_window_cutoff: NaiveTime::from_hms_opt(17, 0, 0).unwrap(),
            backfill_at: NaiveTime::from_hms_opt(18, 30, 0).unwrap(),
            backfill_enabled: false,
        };
        let policy = config.policy();
        assert_eq!(policy.accrual_baseline_year, 2025);
        assert_eq!(policy.cancel_cutoff, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }
}
