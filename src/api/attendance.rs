use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::engine::LeaveEngine;
use crate::engine::attendance_service::RecordAttendance;
use crate::model::date_range::DateRange;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct AttendanceQuery {
    /// Defaults to the caller's own employee id
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = "2025-06-01", format = "date", value_type = String)]
    #[param(value_type = String, format = Date)]
    pub from: NaiveDate,
    #[schema(example = "2025-06-30", format = "date", value_type = String)]
    #[param(value_type = String, format = Date)]
    pub to: NaiveDate,
}

/// Record (or clear) one day of attendance
#[utoipa::path(
    put,
    path = "/api/v1/attendance",
    request_body = RecordAttendance,
    responses(
        (status = 200, description = "Stored row; `applied` is false when a higher-priority row kept the day", body = crate::engine::attendance_service::AttendanceOutcome),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Month locked, timesheet blocked or day owned by a leave request", body = Object, example = json!({
            "message": "Timesheet is blocked from 2025-06-01 to 2025-06-30: Payroll closed"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn record_attendance(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    body: web::Json<RecordAttendance>,
) -> actix_web::Result<impl Responder> {
    let outcome = engine
        .record_attendance(&auth.actor(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Ledger rows of one employee for a date range
#[utoipa::path(
    get,
    path = "/api/v1/attendance",
    params(AttendanceQuery),
    responses(
        (status = 200, description = "Rows ordered by date", body = [crate::model::attendance::AttendanceRecord]),
        (status = 400, description = "Invalid range"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Cannot act for another employee"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
pub async fn list_attendance(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<AttendanceQuery>,
) -> actix_web::Result<impl Responder> {
    let range = DateRange::new(query.from, query.to)?;
    let rows = engine
        .list_attendance(&auth.actor(), query.employee_id, range)
        .await?;
    Ok(HttpResponse::Ok().json(rows))
}
