//! Persistence and collaborator seams used by the engine.
//!
//! The engine only talks to these traits; `mysql` backs them with sqlx in
//! production and `memory` backs them in tests.

use std::collections::BTreeSet;

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate, Weekday};

use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceWrite, ResetScope};
use crate::model::date_range::DateRange;
use crate::model::employee::EmploymentFacts;
use crate::model::leave_request::{LeaveId, LeaveRequest, LeaveStatus, NewLeaveRequest};
use crate::model::timesheet_blocker::{NewBlocker, TimesheetBlocker};

#[cfg(test)]
pub mod memory;
pub mod mysql;

#[async_trait]
pub trait LeaveStore: Send + Sync {
    async fn insert(&self, new: NewLeaveRequest) -> Result<LeaveRequest, AppError>;

    async fn get(&self, id: LeaveId) -> Result<Option<LeaveRequest>, AppError>;

    /// Persists every mutable column of `request`.
    async fn update(&self, request: &LeaveRequest) -> Result<(), AppError>;

    /// Requests of `employee_id` intersecting `range` whose status is in `statuses`.
    async fn find_overlapping(
        &self,
        employee_id: u64,
        range: DateRange,
        statuses: &[LeaveStatus],
    ) -> Result<Vec<LeaveRequest>, AppError>;

    /// Segments whose parent is `parent`, ordered by start date.
    async fn children(&self, parent: LeaveId) -> Result<Vec<LeaveRequest>, AppError>;

    async fn list_for_employee(
        &self,
        employee_id: u64,
        year: Option<i32>,
    ) -> Result<Vec<LeaveRequest>, AppError>;
}

#[async_trait]
pub trait AttendanceStore: Send + Sync {
    async fn get(
        &self,
        employee_id: u64,
        day: NaiveDate,
    ) -> Result<Option<AttendanceRecord>, AppError>;

    async fn between(
        &self,
        employee_id: u64,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, AppError>;

    /// Insert or overwrite the single row for (employee, day).
    async fn upsert(&self, write: AttendanceWrite) -> Result<AttendanceRecord, AppError>;

    /// Insert only; a second row for the same (employee, day) is a `Conflict`.
    async fn insert_new(&self, write: AttendanceWrite) -> Result<AttendanceRecord, AppError>;

    /// Resets rows locked by any of `sources`, optionally only inside `within`.
    async fn reset_by_source(
        &self,
        sources: &[LeaveId],
        within: Option<DateRange>,
        scope: ResetScope,
    ) -> Result<u64, AppError>;

    /// Resets every row of `employee_id` inside `range`.
    async fn reset_range(
        &self,
        employee_id: u64,
        range: DateRange,
        scope: ResetScope,
    ) -> Result<u64, AppError>;
}

#[async_trait]
pub trait BlockerStore: Send + Sync {
    async fn covering(
        &self,
        employee_id: u64,
        day: NaiveDate,
    ) -> Result<Option<TimesheetBlocker>, AppError>;

    async fn insert(&self, new: NewBlocker, blocked_by: u64) -> Result<TimesheetBlocker, AppError>;

    async fn list(&self, employee_id: Option<u64>) -> Result<Vec<TimesheetBlocker>, AppError>;

    /// Returns false when no blocker had that id.
    async fn delete(&self, id: u64) -> Result<bool, AppError>;
}

#[async_trait]
pub trait EmployeeDirectory: Send + Sync {
    async fn employment_facts(&self, employee_id: u64)
    -> Result<Option<EmploymentFacts>, AppError>;

    async fn manager_of(&self, employee_id: u64) -> Result<Option<u64>, AppError>;

    async fn active_employee_ids(&self) -> Result<Vec<u64>, AppError>;
}

#[async_trait]
pub trait CalendarOracle: Send + Sync {
    async fn holidays_between(&self, range: DateRange) -> Result<BTreeSet<NaiveDate>, AppError>;

    fn is_weekend(&self, day: NaiveDate) -> bool {
        matches!(day.weekday(), Weekday::Sat | Weekday::Sun)
    }
}

#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Duplicates document metadata of `source` onto `target`; returns copies made.
    async fn copy(&self, source: LeaveId, target: LeaveId) -> Result<usize, AppError>;
}

/// Something worth telling a person about. Delivery is best-effort.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeaveEvent {
    pub request_id: LeaveId,
    pub employee_id: u64,
    pub status: LeaveStatus,
    /// Manager for employee-initiated events, the employee for decisions.
    pub recipient: Option<u64>,
}

pub trait Notifier: Send + Sync {
    fn notify(&self, event: LeaveEvent);
}
