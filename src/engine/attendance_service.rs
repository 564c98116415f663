use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::engine::deriver::{derive_halves, determine_status, is_editable_month, should_apply};
use crate::engine::{LeaveEngine, acting_employee};
use crate::error::AppError;
use crate::model::attendance::{AttendanceRecord, AttendanceWrite, WorkLocation};
use crate::model::date_range::DateRange;
use crate::model::leave_request::HalfActivity;
use crate::model::role::Actor;
use crate::model::timesheet_blocker::{NewBlocker, TimesheetBlocker};

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RecordAttendance {
    /// Defaults to the caller's own employee id.
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = "2025-06-10", format = "date", value_type = String)]
    pub working_date: NaiveDate,
    #[schema(value_type = Option<String>, example = "9")]
    pub total_hours: Option<Decimal>,
    pub work_location: Option<WorkLocation>,
    pub first_half: Option<HalfActivity>,
    pub second_half: Option<HalfActivity>,
    /// Null every worked field of the day.
    #[serde(default)]
    pub clear: bool,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AttendanceOutcome {
    /// The stored row after the call.
    pub record: Option<AttendanceRecord>,
    /// False when a higher-priority row already held the day.
    pub applied: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct BackfillSummary {
    #[schema(value_type = String, format = "date")]
    pub day: NaiveDate,
    pub inserted: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl LeaveEngine {
    /// Writes one ledger day. Gates run in order: ownership, month lock,
    /// timesheet blocker, request lock, then priority.
    pub async fn record_attendance(
        &self,
        actor: &Actor,
        input: RecordAttendance,
    ) -> Result<AttendanceOutcome, AppError> {
        let employee_id = acting_employee(actor, input.employee_id)?;
        let day = input.working_date;
        let privileged = actor.is_reviewer();
        let now = self.deps.clock.now();

        if !privileged && !is_editable_month(day, now, self.policy.edit_window_cutoff) {
            return Err(AppError::forbidden(format!(
                "Attendance for {} is locked",
                day.format("%B %Y")
            )));
        }
        if !privileged {
            if let Some(blocker) = self.deps.blockers.covering(employee_id, day).await? {
                return Err(AppError::forbidden(format!(
                    "Timesheet is blocked from {} to {}{}",
                    blocker.blocked_from,
                    blocker.blocked_to,
                    blocker
                        .reason
                        .as_deref()
                        .map(|reason| format!(": {reason}"))
                        .unwrap_or_default()
                )));
            }
        }
        let existing = self.deps.attendance.get(employee_id, day).await?;
        if let Some(record) = existing.as_ref().filter(|record| record.is_locked()) {
            if !privileged {
                return Err(AppError::forbidden(format!(
                    "{day} is owned by leave request {}",
                    record.source_request_id.map(|id| id.0).unwrap_or_default()
                )));
            }
        }

        let is_clear = input.clear
            || (input.total_hours.is_none()
                && input.work_location.is_none()
                && input.first_half.is_none()
                && input.second_half.is_none());
        let source_request_id = existing.as_ref().and_then(|record| record.source_request_id);
        let write = if is_clear {
            AttendanceWrite {
                employee_id,
                working_date: day,
                total_hours: None,
                work_location: None,
                status: None,
                first_half: None,
                second_half: None,
                source_request_id,
            }
        } else {
            let calendar = self.snapshot(DateRange::single(day)).await?;
            let status = determine_status(
                input.total_hours,
                day,
                input.work_location,
                &calendar,
                now.date(),
            );
            let (derived_first, derived_second) =
                derive_halves(input.total_hours, input.work_location);
            AttendanceWrite {
                employee_id,
                working_date: day,
                total_hours: input.total_hours,
                work_location: input.work_location,
                status: Some(status),
                first_half: input.first_half.or(derived_first),
                second_half: input.second_half.or(derived_second),
                source_request_id,
            }
        };

        if !should_apply(
            existing.as_ref(),
            write.status,
            write.work_location,
            privileged,
            is_clear,
        ) {
            tracing::debug!(
                employee_id,
                %day,
                "Lower-priority attendance write ignored"
            );
            return Ok(AttendanceOutcome {
                record: existing,
                applied: false,
            });
        }

        let record = self.deps.attendance.upsert(write).await?;
        tracing::info!(employee_id, %day, status = ?record.status, actor = actor.user_id, "Attendance recorded");
        Ok(AttendanceOutcome {
            record: Some(record),
            applied: true,
        })
    }

    pub async fn list_attendance(
        &self,
        actor: &Actor,
        employee_id: Option<u64>,
        range: DateRange,
    ) -> Result<Vec<AttendanceRecord>, AppError> {
        let employee_id = acting_employee(actor, employee_id)?;
        self.deps.attendance.between(employee_id, range).await
    }

    pub async fn create_blocker(
        &self,
        actor: &Actor,
        new: NewBlocker,
    ) -> Result<TimesheetBlocker, AppError> {
        require_reviewer(actor)?;
        if new.blocked_from > new.blocked_to {
            return Err(AppError::validation("blocked_from cannot be after blocked_to"));
        }
        let blocker = self.deps.blockers.insert(new, actor.user_id).await?;
        tracing::info!(
            blocker_id = blocker.id,
            employee_id = blocker.employee_id,
            actor = actor.user_id,
            "Timesheet blocker created"
        );
        Ok(blocker)
    }

    pub async fn list_blockers(
        &self,
        actor: &Actor,
        employee_id: Option<u64>,
    ) -> Result<Vec<TimesheetBlocker>, AppError> {
        require_reviewer(actor)?;
        self.deps.blockers.list(employee_id).await
    }

    pub async fn delete_blocker(&self, actor: &Actor, id: u64) -> Result<(), AppError> {
        require_reviewer(actor)?;
        if !self.deps.blockers.delete(id).await? {
            return Err(AppError::not_found(format!("Timesheet blocker {id} not found")));
        }
        tracing::info!(blocker_id = id, actor = actor.user_id, "Timesheet blocker removed");
        Ok(())
    }

    /// Gives every active employee without a row for `day` a derived status.
    /// Existing rows are left untouched; a concurrent insert loses quietly.
    pub async fn backfill_day(&self, day: NaiveDate) -> Result<BackfillSummary, AppError> {
        let calendar = self.snapshot(DateRange::single(day)).await?;
        let today = self.deps.clock.today();
        let status = determine_status(None, day, None, &calendar, today);
        let mut summary = BackfillSummary {
            day,
            inserted: 0,
            skipped: 0,
            failed: 0,
        };

        for employee_id in self.deps.directory.active_employee_ids().await? {
            let existing = match self.deps.attendance.get(employee_id, day).await {
                Ok(existing) => existing,
                Err(e) => {
                    tracing::warn!(error = %e, employee_id, %day, "Backfill lookup failed");
                    summary.failed += 1;
                    continue;
                }
            };
            if existing.is_some() || !should_apply(existing.as_ref(), Some(status), None, false, false) {
                summary.skipped += 1;
                continue;
            }
            let write = AttendanceWrite {
                employee_id,
                working_date: day,
                total_hours: None,
                work_location: None,
                status: Some(status),
                first_half: None,
                second_half: None,
                source_request_id: None,
            };
            match self.deps.attendance.insert_new(write).await {
                Ok(_) => summary.inserted += 1,
                Err(AppError::Conflict(_)) => summary.skipped += 1,
                Err(e) => {
                    tracing::warn!(error = %e, employee_id, %day, "Backfill insert failed");
                    summary.failed += 1;
                }
            }
        }
        tracing::info!(
            %day,
            %status,
            inserted = summary.inserted,
            skipped = summary.skipped,
            failed = summary.failed,
            "Attendance backfill finished"
        );
        Ok(summary)
    }
}

fn require_reviewer(actor: &Actor) -> Result<(), AppError> {
    if actor.is_reviewer() {
        Ok(())
    } else {
        Err(AppError::forbidden("Admin/Manager only"))
    }
}
