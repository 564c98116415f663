use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::date_range::DateRange;

/// Explicit lock over an employee's timesheet, independent of the month rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TimesheetBlocker {
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2025-06-01", format = "date", value_type = String)]
    pub blocked_from: NaiveDate,
    #[schema(example = "2025-06-30", format = "date", value_type = String)]
    pub blocked_to: NaiveDate,
    pub blocked_by: u64,
    pub reason: Option<String>,
    #[schema(value_type = String, format = "date-time")]
    pub created_at: NaiveDateTime,
}

impl TimesheetBlocker {
    pub fn covers(&self, day: NaiveDate) -> bool {
        DateRange {
            from: self.blocked_from,
            to: self.blocked_to,
        }
        .contains(day)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, ToSchema)]
pub struct NewBlocker {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2025-06-01", format = "date", value_type = String)]
    pub blocked_from: NaiveDate,
    #[schema(example = "2025-06-30", format = "date", value_type = String)]
    pub blocked_to: NaiveDate,
    #[schema(example = "Payroll closed")]
    pub reason: Option<String>,
}
