use crate::api::attendance::AttendanceQuery;
use crate::api::balance::{BalanceQuery, MonthlyBalanceQuery};
use crate::api::blocker::BlockerQuery;
use crate::api::leave_request::{CancelDates, LeaveQuery, ModifyDates};
use crate::engine::accrual::{LeaveBalance, MonthlyBalance};
use crate::engine::attendance_service::{AttendanceOutcome, RecordAttendance};
use crate::engine::leave_service::{ModificationChanges, SubmitLeave, TransitionOutcome};
use crate::engine::lifecycle::LeaveAction;
use crate::engine::reconcile::{DayFailure, ReconcileReport};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, WorkLocation};
use crate::model::employee::EmploymentType;
use crate::model::leave_request::{
    HalfActivity, HalfSlot, LeaveId, LeaveRequest, LeaveStatus, LeaveTree, ProposedChange,
};
use crate::model::timesheet_blocker::{NewBlocker, TimesheetBlocker};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Leave Ledger API",
        version = "1.0.0",
        description = r#"
## Leave & Attendance Ledger

Keeps leave requests and the daily attendance ledger consistent with each other.

### Key Features
- **Leave lifecycle**
  - Submit, approve, reject, cancel and modify requests, in whole or for selected days
- **Attendance ledger**
  - One row per employee per day, written by approvals, employees and the daily backfill
  - Month lock on the 1st, timesheet blockers and leave locks guard every write
- **Balances**
  - Monthly accrual with intern/full-timer rules, carry-over and loss-of-pay

### Security
Every endpoint expects a **JWT Bearer** access token. Reviews, blockers and
attendance clean-up are limited to **Admin**, **HR** and **Manager** roles.
"#,
    ),
    paths(
        crate::api::leave_request::submit_leave,
        crate::api::leave_request::list_leaves,
        crate::api::leave_request::get_leave,
        crate::api::leave_request::transition_leave,
        crate::api::leave_request::delete_leave,
        crate::api::leave_request::cancel_dates,
        crate::api::leave_request::modify_dates,
        crate::api::leave_request::clear_attendance,
        crate::api::leave_request::reconcile_leave,
        crate::api::leave_request::mark_read,

        crate::api::attendance::record_attendance,
        crate::api::attendance::list_attendance,

        crate::api::blocker::create_blocker,
        crate::api::blocker::list_blockers,
        crate::api::blocker::delete_blocker,

        crate::api::balance::get_balance,
        crate::api::balance::get_monthly_balance
    ),
    components(
        schemas(
            LeaveQuery,
            CancelDates,
            ModifyDates,
            SubmitLeave,
            ModificationChanges,
            TransitionOutcome,
            LeaveAction,
            LeaveId,
            LeaveRequest,
            LeaveTree,
            LeaveStatus,
            ProposedChange,
            HalfActivity,
            HalfSlot,
            ReconcileReport,
            DayFailure,
            AttendanceQuery,
            RecordAttendance,
            AttendanceOutcome,
            AttendanceRecord,
            AttendanceStatus,
            WorkLocation,
            BlockerQuery,
            NewBlocker,
            TimesheetBlocker,
            BalanceQuery,
            MonthlyBalanceQuery,
            LeaveBalance,
            MonthlyBalance,
            EmploymentType
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Leave", description = "Leave request lifecycle APIs"),
        (name = "Attendance", description = "Attendance ledger APIs"),
        (name = "Timesheet Blockers", description = "Timesheet blocking APIs"),
        (name = "Balance", description = "Leave balance APIs"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
