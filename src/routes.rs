use crate::{
    api::{attendance, balance, blocker, leave_request},
    auth::middleware::auth_middleware,
    config::Config,
};
use actix_governor::{
    Governor, GovernorConfigBuilder, PeerIpKeyExtractor, governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};

/// Per-IP limiter allowing `requests_per_min`, bursting up to the same amount.
fn build_limiter(requests_per_min: u32) -> Option<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
    let requests_per_min = requests_per_min.max(1);
    let per_ms = (60_000 / u64::from(requests_per_min)).max(1);
    let cfg = GovernorConfigBuilder::default()
        .milliseconds_per_request(per_ms)
        .burst_size(requests_per_min)
        .key_extractor(PeerIpKeyExtractor)
        .finish()?;
    Some(Governor::new(&cfg))
}

/// Mounts every ledger endpoint under `{api_prefix}/v1`.
pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let scope = web::scope(&format!("{}/v1", config.api_prefix))
        .wrap(from_fn(auth_middleware))
        .service(
            web::scope("/leave")
                // /leave
                .service(
                    web::resource("")
                        .route(web::get().to(leave_request::list_leaves))
                        .route(web::post().to(leave_request::submit_leave)),
                )
                // /leave/{id}
                .service(
                    web::resource("/{id}")
                        .route(web::get().to(leave_request::get_leave))
                        .route(web::delete().to(leave_request::delete_leave)),
                )
                .service(
                    web::resource("/{id}/cancel-dates")
                        .route(web::post().to(leave_request::cancel_dates)),
                )
                .service(
                    web::resource("/{id}/modify-dates")
                        .route(web::post().to(leave_request::modify_dates)),
                )
                .service(
                    web::resource("/{id}/clear-attendance")
                        .route(web::post().to(leave_request::clear_attendance)),
                )
                .service(
                    web::resource("/{id}/reconcile")
                        .route(web::post().to(leave_request::reconcile_leave)),
                )
                // must precede /{id}/{action}
                .service(web::resource("/{id}/read").route(web::put().to(leave_request::mark_read)))
                .service(
                    web::resource("/{id}/{action}")
                        .route(web::put().to(leave_request::transition_leave)),
                ),
        )
        .service(
            web::scope("/attendance").service(
                web::resource("")
                    .route(web::put().to(attendance::record_attendance))
                    .route(web::get().to(attendance::list_attendance)),
            ),
        )
        .service(
            web::scope("/timesheet-blockers")
                .service(
                    web::resource("")
                        .route(web::post().to(blocker::create_blocker))
                        .route(web::get().to(blocker::list_blockers)),
                )
                .service(web::resource("/{id}").route(web::delete().to(blocker::delete_blocker))),
        )
        .service(
            web::scope("/balance")
                .service(web::resource("/{employee_id}").route(web::get().to(balance::get_balance)))
                .service(
                    web::resource("/{employee_id}/monthly")
                        .route(web::get().to(balance::get_monthly_balance)),
                ),
        );

    match build_limiter(config.rate_protected_per_min) {
        Some(limiter) => cfg.service(scope.wrap(limiter)),
        None => {
            tracing::warn!(
                rate = config.rate_protected_per_min,
                "Rate limiter configuration rejected, serving without it"
            );
            cfg.service(scope)
        }
    };
}

#[cfg(test)]
mod tests {
    use actix_web::{App, http::StatusCode, test, web::Data};
    use chrono::NaiveTime;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use serde_json::{Value, json};

    use super::*;
    use crate::auth::jwt::TokenType;
    use crate::auth::jwt::tests::{SECRET, token};
    use crate::engine::LeaveEngine;
    use crate::model::employee::{EmploymentFacts, EmploymentType};
    use crate::store::memory::Harness;

    fn config() -> Config {
        let at = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        Config {
            database_url: String::new(),
            jwt_secret: SECRET.into(),
            server_addr: String::new(),
            api_prefix: "/api".into(),
            rate_protected_per_min: 1000,
            local_utc_offset_minutes: 0,
            accrual_baseline_year: 2024,
            cancel_cutoff: at(10),
            edit_window_cutoff: at(18),
            backfill_at: at(18),
            backfill_enabled: false,
        }
    }

    fn bearer(user_id: u64, role: u8, employee_id: Option<u64>) -> (&'static str, String) {
        (
            "Authorization",
            format!("Bearer {}", token(user_id, role, employee_id, TokenType::Access)),
        )
    }

    // the governor keys on the peer address, which test requests must carry
    fn peer() -> std::net::SocketAddr {
        "127.0.0.1:9000".parse().unwrap()
    }

    macro_rules! app {
        ($engine:expr) => {{
            let config = config();
            test::init_service(
                App::new()
                    .app_data(Data::new(config.clone()))
                    .app_data(Data::new($engine))
                    .configure(|cfg| configure(cfg, &config)),
            )
            .await
        }};
    }

    fn decimal(value: &Value) -> Decimal {
        value.as_str().unwrap().parse().unwrap()
    }

    fn engine(harness: &Harness) -> LeaveEngine {
        harness.engine.clone()
    }

    #[actix_web::test]
    async fn submit_approve_and_read_back_over_http() {
        let harness = Harness::new("2025-06-02 09:00");
        let app = app!(engine(&harness));

        let req = test::TestRequest::post()
            .uri("/api/v1/leave")
            .peer_addr(peer())
            .insert_header(bearer(10, 3, Some(7)))
            .set_json(json!({
                "request_type": "Leave",
                "from_date": "2025-06-10",
                "to_date": "2025-06-11",
                "title": "Trip"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created: Value = test::read_body_json(resp).await;
        let id = created["id"].as_u64().unwrap();
        assert_eq!(created["status"], "Pending");
        assert_eq!(decimal(&created["duration"]), dec!(2));

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/leave/{id}/approve"))
            .peer_addr(peer())
            .insert_header(bearer(20, 6, Some(2)))
            .to_request();
        let outcome: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(outcome["request"]["status"], "Approved");
        assert_eq!(outcome["reconciliation"]["written"].as_array().unwrap().len(), 2);

        let req = test::TestRequest::get()
            .uri("/api/v1/attendance?from=2025-06-10&to=2025-06-11")
            .peer_addr(peer())
            .insert_header(bearer(10, 3, Some(7)))
            .to_request();
        let rows: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(rows.as_array().unwrap().len(), 2);
        assert_eq!(rows[0]["status"], "Leave");

        let req = test::TestRequest::put()
            .uri(&format!("/api/v1/leave/{id}/read"))
            .peer_addr(peer())
            .insert_header(bearer(10, 3, Some(7)))
            .to_request();
        let read: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(read["is_read_employee"], true);
    }

    #[actix_web::test]
    async fn errors_map_to_status_codes() {
        let harness = Harness::new("2025-06-02 09:00");
        let app = app!(engine(&harness));

        let req = test::TestRequest::put()
            .uri("/api/v1/leave/1/launch")
            .peer_addr(peer())
            .insert_header(bearer(20, 6, Some(2)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);

        let req = test::TestRequest::get()
            .uri("/api/v1/leave/999")
            .peer_addr(peer())
            .insert_header(bearer(20, 6, Some(2)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NOT_FOUND);

        let req = test::TestRequest::post()
            .uri("/api/v1/timesheet-blockers")
            .peer_addr(peer())
            .insert_header(bearer(10, 3, Some(7)))
            .set_json(json!({
                "employee_id": 7,
                "blocked_from": "2025-06-01",
                "blocked_to": "2025-06-30"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::FORBIDDEN);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Admin/Manager only");

        let req = test::TestRequest::get()
            .uri("/api/v1/leave")
            .peer_addr(peer())
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
    }

    #[actix_web::test]
    async fn balance_endpoint_reports_entitlement() {
        let harness = Harness::new("2025-03-15 12:00");
        harness.store.add_employee(
            EmploymentFacts {
                employee_id: 7,
                employment_type: Some(EmploymentType::FullTimer),
                designation: None,
                joining_date: chrono::NaiveDate::from_ymd_opt(2024, 6, 3).unwrap(),
                conversion_date: None,
            },
            Some(2),
        );
        let app = app!(engine(&harness));

        let req = test::TestRequest::get()
            .uri("/api/v1/balance/7?year=2025")
            .peer_addr(peer())
            .insert_header(bearer(10, 3, Some(7)))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["year"], 2025);
        // three full-timer months of 1.5
        assert_eq!(decimal(&body["entitlement"]), dec!(4.5));

        let req = test::TestRequest::get()
            .uri("/api/v1/balance/8/monthly?month=2&year=2025")
            .peer_addr(peer())
            .insert_header(bearer(10, 3, Some(7)))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);
    }

    #[::core::prelude::v1::test]
    fn limiter_tolerates_zero_rate() {
        assert!(build_limiter(0).is_some());
        assert!(build_limiter(1000).is_some());
    }
}
