use actix_web::{HttpResponse, Responder, web};
use chrono::Datelike;
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::engine::LeaveEngine;

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct BalanceQuery {
    /// Defaults to the current year
    #[schema(example = 2025)]
    pub year: Option<i32>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct MonthlyBalanceQuery {
    #[schema(example = 6)]
    pub month: u32,
    #[schema(example = 2025)]
    pub year: i32,
}

/// Year-to-date leave balance
#[utoipa::path(
    get,
    path = "/api/v1/balance/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        BalanceQuery
    ),
    responses(
        (status = 200, description = "Entitlement, usage, pending and loss-of-pay", body = crate::engine::accrual::LeaveBalance),
        (status = 400, description = "Year in the future"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Cannot act for another employee"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn get_balance(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
    query: web::Query<BalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let year = query.year.unwrap_or_else(|| engine.clock().today().year());
    let balance = engine
        .get_balance(&auth.actor(), path.into_inner(), year)
        .await?;
    Ok(HttpResponse::Ok().json(balance))
}

/// Balance as of the end of one month
#[utoipa::path(
    get,
    path = "/api/v1/balance/{employee_id}/monthly",
    params(
        ("employee_id" = u64, Path, description = "Employee id"),
        MonthlyBalanceQuery
    ),
    responses(
        (status = 200, description = "Carry-over, accrual, usage and balance of the month", body = crate::engine::accrual::MonthlyBalance),
        (status = 400, description = "Invalid month or a future year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Cannot act for another employee"),
        (status = 404, description = "Employee not found"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Balance"
)]
pub async fn get_monthly_balance(
    auth: AuthUser,
    engine: web::Data<LeaveEngine>,
    path: web::Path<u64>,
    query: web::Query<MonthlyBalanceQuery>,
) -> actix_web::Result<impl Responder> {
    let balance = engine
        .get_monthly_balance(&auth.actor(), path.into_inner(), query.month, query.year)
        .await?;
    Ok(HttpResponse::Ok().json(balance))
}
