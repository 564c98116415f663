use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AppError;

/// Upper bound for every day-by-day walk.
pub const MAX_RANGE_DAYS: i64 = 366;

/// Inclusive calendar date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub struct DateRange {
    #[schema(example = "2025-06-10", format = "date", value_type = String)]
    pub from: NaiveDate,
    #[schema(example = "2025-06-12", format = "date", value_type = String)]
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Result<Self, AppError> {
        if from > to {
            return Err(AppError::validation(format!(
                "from_date {from} cannot be after to_date {to}"
            )));
        }
        let range = DateRange { from, to };
        if range.len_days() > MAX_RANGE_DAYS {
            return Err(AppError::validation(format!(
                "date range {from}..{to} exceeds {MAX_RANGE_DAYS} days"
            )));
        }
        Ok(range)
    }

    pub fn single(day: NaiveDate) -> Self {
        DateRange { from: day, to: day }
    }

    /// Inclusive number of calendar days.
    pub fn len_days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn contains(&self, day: NaiveDate) -> bool {
        self.from <= day && day <= self.to
    }

    pub fn overlaps(&self, other: &DateRange) -> bool {
        self.from <= other.to && other.from <= self.to
    }

    pub fn intersection(&self, other: &DateRange) -> Option<DateRange> {
        if !self.overlaps(other) {
            return None;
        }
        Some(DateRange {
            from: self.from.max(other.from),
            to: self.to.min(other.to),
        })
    }

    /// Every day in the range, capped at [`MAX_RANGE_DAYS`].
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let from = self.from;
        let count = self.len_days().clamp(0, MAX_RANGE_DAYS);
        (0..count).map(move |offset| from + Duration::days(offset))
    }
}

impl std::fmt::Display for DateRange {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.from == self.to {
            write!(f, "{}", self.from)
        } else {
            write!(f, "{} to {}", self.from, self.to)
        }
    }
}
