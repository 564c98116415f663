use std::collections::BTreeSet;

use chrono::{Duration, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::engine::calendar::CalendarSnapshot;
use crate::model::date_range::{DateRange, MAX_RANGE_DAYS};

/// A maximal run of selected dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRun {
    pub range: DateRange,
    /// Selected dates inside the run.
    pub days: usize,
}

impl DateRun {
    pub fn duration(&self, is_half_day: bool) -> Decimal {
        let days = Decimal::from(self.days as u64);
        if is_half_day { days * dec!(0.5) } else { days }
    }
}

/// Adjacent dates, or dates separated only by weekend days, belong to one run.
fn contiguous(prev: NaiveDate, next: NaiveDate, calendar: &CalendarSnapshot) -> bool {
    let gap = (next - prev).num_days();
    if gap <= 1 {
        return true;
    }
    if gap > MAX_RANGE_DAYS {
        return false;
    }
    (1..gap).all(|offset| calendar.is_weekend(prev + Duration::days(offset)))
}

pub fn segment_dates(dates: &BTreeSet<NaiveDate>, calendar: &CalendarSnapshot) -> Vec<DateRun> {
    let mut runs: Vec<DateRun> = Vec::new();
    for &day in dates {
        match runs.last_mut() {
            Some(run) if contiguous(run.range.to, day, calendar) => {
                run.range.to = day;
                run.days += 1;
            }
            _ => runs.push(DateRun {
                range: DateRange::single(day),
                days: 1,
            }),
        }
    }
    runs
}
