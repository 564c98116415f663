//! Leave & attendance reconciliation core.
//!
//! `LeaveEngine` owns no state of its own: every operation reads through the
//! store traits, captures a calendar snapshot once, runs its gates and only
//! then mutates.

use std::sync::Arc;

use chrono::NaiveTime;

use crate::engine::calendar::CalendarSnapshot;
use crate::engine::clock::Clock;
use crate::error::AppError;
use crate::model::date_range::DateRange;
use crate::model::role::Actor;
use crate::store::{
    AttendanceStore, BlockerStore, CalendarOracle, DocumentStore, EmployeeDirectory, LeaveEvent,
    LeaveStore, Notifier,
};

pub mod accrual;
pub mod attendance_service;
pub mod balance_service;
pub mod calendar;
pub mod clock;
pub mod conflict;
pub mod deriver;
pub mod leave_service;
pub mod lifecycle;
pub mod reconcile;
pub mod segmenter;


/// Organisation-wide cutoffs, all in local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Policy {
    /// Cancellation requests must land before this time on the first day.
    pub cancel_cutoff: NaiveTime,
    /// Last moment on the 1st at which the previous month is still editable.
    pub edit_window_cutoff: NaiveTime,
    pub accrual_baseline_year: i32,
}

impl Default for Policy {
    fn default() -> Self {
        Policy {
            cancel_cutoff: NaiveTime::from_hms_opt(10, 0, 0).unwrap_or(NaiveTime::MIN),
            edit_window_cutoff: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or(NaiveTime::MIN),
            accrual_baseline_year: 2024,
        }
    }
}

#[derive(Clone)]
pub struct EngineDeps {
    pub leaves: Arc<dyn LeaveStore>,
    pub attendance: Arc<dyn AttendanceStore>,
    pub blockers: Arc<dyn BlockerStore>,
    pub directory: Arc<dyn EmployeeDirectory>,
    pub calendar: Arc<dyn CalendarOracle>,
    pub documents: Arc<dyn DocumentStore>,
    pub notifier: Arc<dyn Notifier>,
    pub clock: Arc<dyn Clock>,
}

#[derive(Clone)]
pub struct LeaveEngine {
    deps: EngineDeps,
    policy: Policy,
}

impl LeaveEngine {
    pub fn new(deps: EngineDeps, policy: Policy) -> Self {
        LeaveEngine { deps, policy }
    }

    pub fn policy(&self) -> &Policy {
        &self.policy
    }

    pub fn clock(&self) -> &dyn Clock {
        self.deps.clock.as_ref()
    }

    /// Fire-and-forget; the notifier logs its own failures.
    fn notify(&self, event: LeaveEvent) {
        self.deps.notifier.notify(event);
    }

    async fn snapshot(&self, range: DateRange) -> Result<CalendarSnapshot, AppError> {
        CalendarSnapshot::capture(self.deps.calendar.as_ref(), range).await
    }

    /// Manager of `employee_id`, or `None` when the lookup fails.
    async fn manager_of(&self, employee_id: u64) -> Option<u64> {
        match self.deps.directory.manager_of(employee_id).await {
            Ok(manager) => manager,
            Err(e) => {
                tracing::warn!(error = %e, employee_id, "Manager lookup failed");
                None
            }
        }
    }
}

/// Employee an operation applies to: the caller's own record unless a
/// reviewer names someone else.
pub(crate) fn acting_employee(actor: &Actor, requested: Option<u64>) -> Result<u64, AppError> {
    match (requested, actor.employee_id) {
        (Some(employee_id), _) if actor.owns(employee_id) || actor.is_reviewer() => Ok(employee_id),
        (Some(_), _) => Err(AppError::forbidden("Cannot act for another employee")),
        (None, Some(own)) => Ok(own),
        (None, None) => Err(AppError::validation("employee_id is required")),
    }
}
