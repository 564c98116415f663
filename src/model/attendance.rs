use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};
use utoipa::ToSchema;

use crate::model::leave_request::{HalfActivity, LeaveId};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, IntoStaticStr, EnumIter,
)]
pub enum AttendanceStatus {
    #[serde(rename = "Full Day")]
    #[strum(to_string = "Full Day")]
    FullDay,
    #[serde(rename = "Half Day")]
    #[strum(to_string = "Half Day")]
    HalfDay,
    Leave,
    Pending,
    #[serde(rename = "Not Updated")]
    #[strum(to_string = "Not Updated")]
    NotUpdated,
    Weekend,
    Holiday,
    Absent,
}

/// Where the hours were worked; `None` on a record means the office.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema, EnumString,
    Display, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum WorkLocation {
    #[serde(rename = "WFH", alias = "Work From Home")]
    #[strum(to_string = "WFH", serialize = "Work From Home")]
    Wfh,
    #[serde(rename = "Client Visit")]
    #[strum(to_string = "Client Visit")]
    ClientVisit,
}

impl WorkLocation {
    /// Activity a worked half at this location is tagged with.
    pub fn activity(location: Option<WorkLocation>) -> HalfActivity {
        match location {
            Some(WorkLocation::Wfh) => HalfActivity::Wfh,
            Some(WorkLocation::ClientVisit) => HalfActivity::ClientVisit,
            None => HalfActivity::Office,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct AttendanceRecord {
    pub id: u64,
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "2025-06-10", format = "date", value_type = String)]
    pub working_date: NaiveDate,
    #[schema(value_type = Option<String>, example = "9")]
    pub total_hours: Option<Decimal>,
    pub work_location: Option<WorkLocation>,
    pub status: Option<AttendanceStatus>,
    pub first_half: Option<HalfActivity>,
    pub second_half: Option<HalfActivity>,
    /// Set while an approved request owns this day.
    pub source_request_id: Option<LeaveId>,
    #[schema(value_type = String, format = "date-time")]
    pub updated_at: NaiveDateTime,
}

impl AttendanceRecord {
    pub fn is_locked(&self) -> bool {
        self.source_request_id.is_some()
    }
}

/// Values for one (employee, day) upsert.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceWrite {
    pub employee_id: u64,
    pub working_date: NaiveDate,
    pub total_hours: Option<Decimal>,
    pub work_location: Option<WorkLocation>,
    pub status: Option<AttendanceStatus>,
    pub first_half: Option<HalfActivity>,
    pub second_half: Option<HalfActivity>,
    pub source_request_id: Option<LeaveId>,
}

impl AttendanceWrite {
    pub fn into_record(self, id: u64, updated_at: NaiveDateTime) -> AttendanceRecord {
        AttendanceRecord {
            id,
            employee_id: self.employee_id,
            working_date: self.working_date,
            total_hours: self.total_hours,
            work_location: self.work_location,
            status: self.status,
            first_half: self.first_half,
            second_half: self.second_half,
            source_request_id: self.source_request_id,
            updated_at,
        }
    }
}

/// Which columns a ledger reset touches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResetScope {
    /// Only drop the request lock.
    Lock,
    /// Null status, hours and location; keep halves and lock handling separate.
    Worked,
    /// Null every mutable column including halves and the lock.
    Everything,
}
