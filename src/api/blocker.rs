use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::engine::LeaveEngine;
use crate::model::timesheet_blocker::NewBlocker;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BlockerQuery {
    #[schema(example = 1000)]
    /// Only blockers of this employee
    pub employee_id: Option<u64>,
}

/// Block an employee's timesheet for a date range
#[utoipa::path(
    post,
    path = "/api/v1/timesheet-blockers",
    request_body = NewBlocker,
    responses(
        (status = 201, description = "Blocker created", body = crate::model::timesheet_blocker::TimesheetBlocker),
        (status = 400, description = "blocked_from after blocked_to"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin/Manager only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheet Blockers"
)]
pub async fn create_blocker(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    body: web::Json<NewBlocker>,
) -> actix_web::Result<impl Responder> {
    let blocker = engine.create_blocker(&auth.actor(), body.into_inner()).await?;
    Ok(HttpResponse::Created().json(blocker))
}

#[utoipa::path(
    get,
    path = "/api/v1/timesheet-blockers",
    params(BlockerQuery),
    responses(
        (status = 200, description = "Blockers, latest first", body = [crate::model::timesheet_blocker::TimesheetBlocker]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin/Manager only"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheet Blockers"
)]
pub async fn list_blockers(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    query: web::Query<BlockerQuery>,
) -> actix_web::Result<impl Responder> {
    let blockers = engine.list_blockers(&auth.actor(), query.employee_id).await?;
    Ok(HttpResponse::Ok().json(blockers))
}

#[utoipa::path(
    delete,
    path = "/api/v1/timesheet-blockers/{id}",
    params(
        ("id" = u64, Path, description = "Blocker id")
    ),
    responses(
        (status = 200, description = "Blocker removed", body = Object, example = json!({
            "message": "Timesheet blocker removed"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Admin/Manager only"),
        (status = 404, description = "Timesheet blocker not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Timesheet Blockers"
)]
pub async fn delete_blocker(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    engine.delete_blocker(&auth.actor(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Timesheet blocker removed"
    })))
}
