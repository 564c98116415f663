use std::collections::BTreeSet;

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::error::AppError;
use crate::model::date_range::DateRange;
use crate::store::CalendarOracle;

/// Holidays and weekends for one operation, captured once up front.
#[derive(Debug, Clone)]
pub struct CalendarSnapshot {
    range: DateRange,
    holidays: BTreeSet<NaiveDate>,
    weekends: BTreeSet<NaiveDate>,
}

impl CalendarSnapshot {
    pub async fn capture(oracle: &dyn CalendarOracle, range: DateRange) -> Result<Self, AppError> {
        let holidays = oracle.holidays_between(range).await?;
        let weekends = range.days().filter(|day| oracle.is_weekend(*day)).collect();
        Ok(CalendarSnapshot {
            range,
            holidays,
            weekends,
        })
    }

    pub fn range(&self) -> DateRange {
        self.range
    }

    pub fn is_holiday(&self, day: NaiveDate) -> bool {
        if !self.range.contains(day) {
            tracing::debug!(%day, range = %self.range, "Holiday lookup outside snapshot");
        }
        self.holidays.contains(&day)
    }

    pub fn is_weekend(&self, day: NaiveDate) -> bool {
        if self.range.contains(day) {
            self.weekends.contains(&day)
        } else {
            matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
        }
    }

    pub fn is_working_day(&self, day: NaiveDate) -> bool {
        !self.is_weekend(day) && !self.is_holiday(day)
    }

    pub fn working_days(&self, range: DateRange) -> usize {
        range.days().filter(|day| self.is_working_day(*day)).count()
    }

    /// Working days in `range`, halved for half-day requests.
    pub fn request_duration(&self, range: DateRange, is_half_day: bool) -> Decimal {
        let days = Decimal::from(self.working_days(range) as u64);
        if is_half_day { days * dec!(0.5) } else { days }
    }
}
