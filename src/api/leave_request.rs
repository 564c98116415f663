use std::str::FromStr;

use actix_web::{HttpResponse, Responder, web};
use chrono::NaiveDate;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::engine::LeaveEngine;
use crate::engine::leave_service::{ModificationChanges, SubmitLeave};
use crate::engine::lifecycle::LeaveAction;
use crate::error::AppError;
use crate::model::leave_request::LeaveId;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LeaveQuery {
    /// Employee whose requests to list; defaults to the caller
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    /// Only requests touching this calendar year
    #[schema(example = 2025)]
    pub year: Option<i32>,
}

#[derive(Deserialize, ToSchema)]
pub struct CancelDates {
    /// Working days of the request to cancel
    #[schema(example = json!(["2025-06-11", "2025-06-12"]), value_type = Vec<String>)]
    pub dates: Vec<NaiveDate>,
}

#[derive(Deserialize, ToSchema)]
pub struct ModifyDates {
    #[schema(example = json!(["2025-06-11"]), value_type = Vec<String>)]
    pub dates: Vec<NaiveDate>,
    #[serde(flatten)]
    pub changes: ModificationChanges,
}

fn parse_action(raw: &str) -> Result<LeaveAction, AppError> {
    LeaveAction::from_str(raw).map_err(|_| AppError::validation(format!("Unknown action '{raw}'")))
}

/// Submit a leave / WFH / client visit request
#[utoipa::path(
    post,
    path = "/api/v1/leave",
    request_body = SubmitLeave,
    responses(
        (status = 201, description = "Request submitted", body = crate::model::leave_request::LeaveRequest),
        (status = 400, description = "Invalid dates, halves or zero working days"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Cannot act for another employee"),
        (status = 409, description = "Overlaps an active request", body = Object, example = json!({
            "message": "Conflict: 'First Half' is already taken by Leave request 12 on 2025-06-10"
        })),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn submit_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    body: web::Json<SubmitLeave>,
) -> actix_web::Result<impl Responder> {
    let request = engine.submit(&auth.actor(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(request))
}

/// List requests of one employee
#[utoipa::path(
    get,
    path = "/api/v1/leave",
    params(LeaveQuery),
    responses(
        (status = 200, description = "Requests, newest first", body = [crate::model::leave_request::LeaveRequest]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Cannot act for another employee"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn list_leaves(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<LeaveQuery>,
) -> actix_web::Result<impl Responder> {
    let requests = engine
        .list(&auth.actor(), query.employee_id, query.year)
        .await?;
    Ok(HttpResponse::Ok().json(requests))
}

/// Fetch a request together with its cancellation/modification segments
#[utoipa::path(
    get,
    path = "/api/v1/leave/{id}",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Request and segments", body = crate::model::leave_request::LeaveTree),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not your request"),
        (status = 404, description = "Leave request not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn get_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let tree = engine.get_tree(LeaveId(path.into_inner()), &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(tree))
}

/// Move a request through its lifecycle
///
/// `action` is one of `approve`, `reject`, `cancel`, `request-cancellation`,
/// `approve-cancellation`, `reject-cancellation`, `approve-modification`,
/// `reject-modification`, `undo-cancellation`, `undo-modification`.
/// Modifications are proposed through `modify-dates`.
#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/{action}",
    params(
        ("id" = u64, Path, description = "Leave request id"),
        ("action" = String, Path, description = "Lifecycle action", example = "approve")
    ),
    responses(
        (status = 200, description = "New state, plus the attendance report when days were written", body = crate::engine::leave_service::TransitionOutcome),
        (status = 400, description = "Unknown action"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Illegal transition, wrong actor or deadline passed", body = Object, example = json!({
            "message": "Deadline passed: this had to be done before 2025-06-10 10:00"
        })),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Overlapping request"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn transition_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<(u64, String)>,
) -> actix_web::Result<impl Responder> {
    let (id, action) = path.into_inner();
    let action = parse_action(&action)?;
    let outcome = engine.transition(LeaveId(id), action, &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(outcome))
}

/// Withdraw a pending request
#[utoipa::path(
    delete,
    path = "/api/v1/leave/{id}",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Request cancelled", body = crate::model::leave_request::LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Only pending requests can be deleted"),
        (status = 404, description = "Leave request not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn delete_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = engine.delete(LeaveId(path.into_inner()), &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(request))
}

/// Ask to cancel some days of an approved request
#[utoipa::path(
    post,
    path = "/api/v1/leave/{id}/cancel-dates",
    params(
        ("id" = u64, Path, description = "Parent leave request id")
    ),
    request_body = CancelDates,
    responses(
        (status = 200, description = "Cancellation segments created (or the parent itself when every day was picked)", body = [crate::model::leave_request::LeaveRequest]),
        (status = 400, description = "Dates outside the request or not working days"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not allowed in the current state or past the cutoff"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "A cancellation for these days is already pending"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn cancel_dates(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
    body: web::Json<CancelDates>,
) -> actix_web::Result<impl Responder> {
    let segments = engine
        .cancel_dates(LeaveId(path.into_inner()), &body.dates, &auth.actor())
        .await?;
    Ok(HttpResponse::Ok().json(segments))
}

/// Propose a new shape for some or all days of a request
#[utoipa::path(
    post,
    path = "/api/v1/leave/{id}/modify-dates",
    params(
        ("id" = u64, Path, description = "Parent leave request id")
    ),
    request_body = ModifyDates,
    responses(
        (status = 200, description = "Modification segments created (or the parent itself when every day was picked)", body = [crate::model::leave_request::LeaveRequest]),
        (status = 400, description = "Invalid dates or halves"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not allowed in the current state"),
        (status = 404, description = "Leave request not found"),
        (status = 409, description = "Overlaps another request"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn modify_dates(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
    body: web::Json<ModifyDates>,
) -> actix_web::Result<impl Responder> {
    let ModifyDates { dates, changes } = body.into_inner();
    let segments = engine
        .modify_dates(LeaveId(path.into_inner()), &dates, changes, &auth.actor())
        .await?;
    Ok(HttpResponse::Ok().json(segments))
}

/// Null every ledger field locked by a cancelled request
#[utoipa::path(
    post,
    path = "/api/v1/leave/{id}/clear-attendance",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Rows cleared", body = Object, example = json!({
            "message": "Attendance cleared",
            "cleared": 3
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin/Manager only"),
        (status = 404, description = "Leave request not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn clear_attendance(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let cleared = engine
        .clear_attendance(LeaveId(path.into_inner()), &auth.actor())
        .await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Attendance cleared",
        "cleared": cleared
    })))
}

/// Re-run attendance reconciliation for an approved request
#[utoipa::path(
    post,
    path = "/api/v1/leave/{id}/reconcile",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Per-day outcome", body = crate::engine::reconcile::ReconcileReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin/Manager only, or the request holds no days"),
        (status = 404, description = "Leave request not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn reconcile_leave(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let report = engine.reconcile(LeaveId(path.into_inner()), &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(report))
}

/// Mark a request as seen by the caller
#[utoipa::path(
    put,
    path = "/api/v1/leave/{id}/read",
    params(
        ("id" = u64, Path, description = "Leave request id")
    ),
    responses(
        (status = 200, description = "Read flags updated", body = crate::model::leave_request::LeaveRequest),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not allowed to read this request"),
        (status = 404, description = "Leave request not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Leave"
)]
pub async fn mark_read(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let request = engine.mark_read(LeaveId(path.into_inner()), &auth.actor()).await?;
    Ok(HttpResponse::Ok().json(request))
}
