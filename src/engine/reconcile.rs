use chrono::NaiveDate;
use serde::Serialize;
use utoipa::ToSchema;

use crate::engine::calendar::CalendarSnapshot;
use crate::engine::deriver::{halves_total_hours, location_from_halves, status_from_hours};
use crate::model::attendance::AttendanceWrite;
use crate::model::date_range::DateRange;
use crate::model::leave_request::LeaveRequest;
use crate::store::AttendanceStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct DayFailure {
    #[schema(example = "2025-06-10", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub reason: String,
}

/// Per-day outcome of writing an approved request into the ledger.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct ReconcileReport {
    #[schema(value_type = Vec<String>)]
    pub written: Vec<NaiveDate>,
    /// Weekend days and carved-out days, never written.
    #[schema(value_type = Vec<String>)]
    pub skipped: Vec<NaiveDate>,
    pub failed: Vec<DayFailure>,
}

impl ReconcileReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

/// The ledger row an approved request implies for `day`.
pub fn planned_write(request: &LeaveRequest, day: NaiveDate) -> AttendanceWrite {
    let hours = halves_total_hours(Some(request.first_half), Some(request.second_half));
    AttendanceWrite {
        employee_id: request.employee_id,
        working_date: day,
        total_hours: Some(hours),
        work_location: location_from_halves(request.first_half, request.second_half),
        status: Some(status_from_hours(hours)),
        first_half: Some(request.first_half),
        second_half: Some(request.second_half),
        source_request_id: Some(request.id),
    }
}

/// Upserts one row per non-weekend day. A failing day is logged and reported;
/// the remaining days are still written. Days inside `carved_out` belong to
/// approved segments and are left alone.
pub async fn reconcile_request(
    ledger: &dyn AttendanceStore,
    request: &LeaveRequest,
    calendar: &CalendarSnapshot,
    carved_out: &[DateRange],
) -> ReconcileReport {
    let mut report = ReconcileReport::default();
    for day in request.range().days() {
        if calendar.is_weekend(day) || carved_out.iter().any(|range| range.contains(day)) {
            report.skipped.push(day);
            continue;
        }
        match ledger.upsert(planned_write(request, day)).await {
            Ok(_) => report.written.push(day),
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    leave_id = %request.id,
                    %day,
                    "Attendance reconciliation failed for day"
                );
                report.failed.push(DayFailure {
                    date: day,
                    reason: e.to_string(),
                });
            }
        }
    }
    tracing::info!(
        leave_id = %request.id,
        written = report.written.len(),
        failed = report.failed.len(),
        "Attendance reconciled"
    );
    report
}
