use actix_web::{HttpResponse, web};
use serde::Deserialize;
use tracing::info;
use utoipa::IntoParams;

use crate::attendance::AttendanceEngine;
use crate::attendance::aggregation::default_period;
use crate::attendance::report::{DailyReport, EmployeeMonthlyReport, MonthlyReport};
use crate::attendance::submission::SubmissionResponse;
use crate::attendance::validation::ValidationResponse;
use crate::auth::auth::AuthUser;
use crate::error::{AppError, AppResult};
use crate::model::attendance_token::{IssuedToken, TokenRequest};

#[derive(Debug, Deserialize, IntoParams)]
pub struct EmployeeReportQuery {
    /// User to report on
    pub user_id: u64,
    /// 1-12, defaults to the current month
    pub month: Option<u32>,
    /// 2000-2100, defaults to the current year
    pub year: Option<i32>,
}

fn require_token(req: &TokenRequest) -> AppResult<&str> {
    let token = req.token.trim();
    if req.user_id == 0 || token.is_empty() {
        return Err(AppError::BadRequest("user_id and token are required".into()));
    }
    Ok(token)
}

/// Issue a fresh attendance token for the caller
#[utoipa::path(
    get,
    path = "/api/attendance/token",
    responses(
        (status = 200, description = "Token issued", body = IssuedToken),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
        (status = 503, description = "Database unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn generate_token(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
) -> AppResult<HttpResponse> {
    let issued = engine.issue_token(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(issued))
}

/// Check a token without consuming it
#[utoipa::path(
    post,
    path = "/api/attendance/token/check",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Validation outcome", body = ValidationResponse, example = json!({
            "valid": true, "used": false, "expires_at": "2026-01-05T08:05:00", "message": "Token is valid"
        })),
        (status = 400, description = "Missing user_id or token"),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn check_token(
    _auth: AuthUser,
    body: web::Json<TokenRequest>,
    engine: web::Data<AttendanceEngine>,
) -> AppResult<HttpResponse> {
    let token = require_token(&body)?;
    let status = engine.validate_token(body.user_id, token).await?;

    Ok(HttpResponse::Ok().json(ValidationResponse::from(status)))
}

/// Submit attendance with a previously issued token
#[utoipa::path(
    post,
    path = "/api/attendance/submit",
    request_body = TokenRequest,
    responses(
        (status = 200, description = "Accepted, or rejected as used, expired or already recorded today", body = SubmissionResponse),
        (status = 400, description = "Missing user_id or token"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Token not found"),
        (status = 503, description = "Database unavailable")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn submit_attendance(
    _auth: AuthUser,
    body: web::Json<TokenRequest>,
    engine: web::Data<AttendanceEngine>,
) -> AppResult<HttpResponse> {
    let token = require_token(&body)?;
    let outcome = engine.submit_attendance(body.user_id, token).await?;

    Ok(HttpResponse::Ok().json(SubmissionResponse::new(outcome, body.user_id)))
}

/// Today's attendance with lateness and absentees
#[utoipa::path(
    get,
    path = "/api/attendance/today",
    responses(
        (status = 200, description = "Daily report", body = DailyReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "No work hours policy configured")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn today(auth: AuthUser, engine: web::Data<AttendanceEngine>) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    Ok(HttpResponse::Ok().json(engine.daily_report().await?))
}

/// Current month's attendance with lateness and absentees
#[utoipa::path(
    get,
    path = "/api/attendance/monthly",
    responses(
        (status = 200, description = "Monthly report", body = MonthlyReport),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "No work hours policy configured")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn monthly(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    Ok(HttpResponse::Ok().json(engine.monthly_report().await?))
}

/// One employee's month: working days, presence and cumulative lateness
#[utoipa::path(
    get,
    path = "/api/attendance/employee",
    params(EmployeeReportQuery),
    responses(
        (status = 200, description = "Employee monthly report", body = EmployeeMonthlyReport),
        (status = 400, description = "Invalid month or year"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "Attendance"
)]
pub async fn employee_monthly(
    auth: AuthUser,
    query: web::Query<EmployeeReportQuery>,
    engine: web::Data<AttendanceEngine>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let (current_month, current_year) = default_period(engine.today());
    let month = query.month.unwrap_or(current_month);
    let year = query.year.unwrap_or(current_year);

    info!(requested_by = auth.user_id, user_id = query.user_id, month, year, "Employee report requested");
    let report = engine
        .employee_monthly_report(query.user_id, month, year)
        .await?;

    Ok(HttpResponse::Ok().json(report))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use actix_web::{App, http::StatusCode, middleware::from_fn, test, web};
    use chrono::{Duration, NaiveDateTime};
    use serde_json::{Value, json};

    use crate::attendance::AttendanceEngine;
    use crate::attendance::clock::OsEntropy;
    use crate::attendance::clock::testing::ManualClock;
    use crate::attendance::memory::{MemoryStore, MemoryUser};
    use crate::auth::jwt::{Subject, generate_access_token, generate_refresh_token};
    use crate::auth::middleware::auth_middleware;
    use crate::config::Config;
    use crate::model::attendance_token::AttendanceToken;
    use crate::model::role::Role;
    use crate::routes::api_routes;

    const SECRET: &str = "test-secret";

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "SERVER_ADDR" => Some("127.0.0.1:0".into()),
            "DATABASE_URL" => Some("mysql://localhost/test".into()),
            "JWT_SECRET" => Some(SECRET.into()),
            _ => None,
        })
        .unwrap()
    }

    fn at(s: &str) -> NaiveDateTime {
        NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").unwrap()
    }

    fn bearer(user_id: u64, role: Role) -> (&'static str, String) {
        let subject = Subject {
            user_id,
            email: format!("user{user_id}@company.com"),
            name: format!("User {user_id}"),
            role,
        };
        let token = generate_access_token(&subject, SECRET, 60).unwrap();
        ("Authorization", format!("Bearer {token}"))
    }

    fn store() -> Arc<MemoryStore> {
        let store = Arc::new(MemoryStore::with_users(vec![
            MemoryUser::new(1, "Admin System", "Administrator"),
            MemoryUser::new(2, "Ahmad Fauzi", "IT"),
            MemoryUser::new(3, "Siti Nurhaliza", "Product"),
        ]));
        store.push_work_hours("08:00:00", "17:00:00", "08:15:00", at("2025-12-01 00:00:00"));
        store
    }

    macro_rules! app {
        ($store:expr, $now:expr) => {{
            let engine = AttendanceEngine::new(
                $store.clone(),
                Arc::new(ManualClock::at(at($now))),
                Arc::new(OsEntropy),
            );
            test::init_service(
                App::new()
                    .app_data(web::Data::new(config()))
                    .app_data(web::Data::new(engine))
                    .service(web::scope("/api").wrap(from_fn(auth_middleware)).configure(api_routes)),
            )
            .await
        }};
    }

    #[actix_web::test]
    async fn token_flow_over_http() {
        let store = store();
        let app = app!(store, "2026-01-05 08:00:00");

        let req = test::TestRequest::get()
            .uri("/api/attendance/token")
            .insert_header(bearer(2, Role::Employee))
            .to_request();
        let issued: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(issued["user_id"], 2);
        assert_eq!(issued["expires_at"], "2026-01-05T08:05:00");
        let token = issued["token"].as_str().unwrap().to_string();

        let body = json!({ "user_id": 2, "token": token });
        let req = test::TestRequest::post()
            .uri("/api/attendance/token/check")
            .insert_header(bearer(2, Role::Employee))
            .set_json(&body)
            .to_request();
        let checked: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(checked["valid"], true);
        assert_eq!(checked["used"], false);

        for expected in [
            json!({"success": true, "message": "Attendance submitted successfully", "user_id": 2}),
            json!({"success": false, "message": "Token already used", "user_id": 2}),
        ] {
            let req = test::TestRequest::post()
                .uri("/api/attendance/submit")
                .insert_header(bearer(2, Role::Employee))
                .set_json(&body)
                .to_request();
            let submitted: Value = test::call_and_read_body_json(&app, req).await;
            assert_eq!(submitted, expected);
        }

        let req = test::TestRequest::post()
            .uri("/api/attendance/token/check")
            .insert_header(bearer(2, Role::Employee))
            .set_json(&body)
            .to_request();
        let checked: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            checked,
            json!({"valid": false, "used": true, "expires_at": null, "message": "Token already used"})
        );
    }

    #[actix_web::test]
    async fn unknown_token_on_submit_is_404() {
        let store = store();
        let app = app!(store, "2026-01-05 08:00:00");

        let req = test::TestRequest::post()
            .uri("/api/attendance/submit")
            .insert_header(bearer(2, Role::Employee))
            .set_json(json!({ "user_id": 2, "token": "0000000000000000" }))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body, json!({"error": "Attendance token not found"}));
    }

    #[actix_web::test]
    async fn blank_token_is_a_bad_request() {
        let store = store();
        let app = app!(store, "2026-01-05 08:00:00");

        let req = test::TestRequest::post()
            .uri("/api/attendance/token/check")
            .insert_header(bearer(2, Role::Employee))
            .set_json(json!({ "user_id": 2, "token": "  " }))
            .to_request();

        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn requests_without_access_token_are_rejected() {
        let store = store();
        let app = app!(store, "2026-01-05 08:00:00");

        let req = test::TestRequest::get().uri("/api/attendance/token").to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);

        let subject = Subject {
            user_id: 2,
            email: "user2@company.com".into(),
            name: "User 2".into(),
            role: Role::Employee,
        };
        let (refresh, _) = generate_refresh_token(&subject, SECRET, 60).unwrap();
        let req = test::TestRequest::get()
            .uri("/api/attendance/token")
            .insert_header(("Authorization", format!("Bearer {refresh}")))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::UNAUTHORIZED);
        assert!(store.tokens().is_empty());
    }

    #[actix_web::test]
    async fn reports_are_limited_to_hr_and_admin() {
        let store = store();
        let app = app!(store, "2026-01-05 10:00:00");

        let req = test::TestRequest::get()
            .uri("/api/attendance/today")
            .insert_header(bearer(2, Role::Employee))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::FORBIDDEN);

        let req = test::TestRequest::get()
            .uri("/api/attendance/today")
            .insert_header(bearer(1, Role::Admin))
            .to_request();
        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::OK);
    }

    #[actix_web::test]
    async fn daily_report_over_http() {
        let store = store();
        store.push_token(AttendanceToken {
            user_id: 2,
            token: "00000000000000aa".into(),
            expires_at: at("2026-01-05 08:25:00"),
            used: true,
            created_at: at("2026-01-05 08:20:00"),
        });
        let app = app!(store, "2026-01-05 10:00:00");

        let req = test::TestRequest::get()
            .uri("/api/attendance/today")
            .insert_header(bearer(1, Role::Hr))
            .to_request();
        let report: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(report["date"], "2026-01-05");
        assert_eq!(report["total_attend"], 1);
        assert_eq!(report["total_late"], 1);
        assert_eq!(report["total_absent"], 2);
        assert_eq!(report["attendances"][0]["status"], "late");
        assert_eq!(report["attendances"][0]["check_in"], "2026-01-05T08:20:00");
    }

    #[actix_web::test]
    async fn employee_report_defaults_to_current_month() {
        let store = store();
        store.push_token(AttendanceToken {
            user_id: 3,
            token: "00000000000000bb".into(),
            expires_at: at("2026-02-03 08:05:00") + Duration::minutes(5),
            used: true,
            created_at: at("2026-02-03 08:05:00"),
        });
        let app = app!(store, "2026-02-10 09:00:00");

        let req = test::TestRequest::get()
            .uri("/api/attendance/employee?user_id=3")
            .insert_header(bearer(1, Role::Hr))
            .to_request();
        let report: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(report["month"], 2);
        assert_eq!(report["year"], 2026);
        assert_eq!(report["total_working_days"], 20);
        assert_eq!(report["total_present"], 1);
        assert_eq!(report["total_late_hours"], "00:00");
    }

    #[actix_web::test]
    async fn employee_report_rejects_bad_month() {
        let store = store();
        let app = app!(store, "2026-02-10 09:00:00");

        let req = test::TestRequest::get()
            .uri("/api/attendance/employee?user_id=3&month=13&year=2026")
            .insert_header(bearer(1, Role::Hr))
            .to_request();

        assert_eq!(test::call_service(&app, req).await.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn auth_check_reports_attendance_flag() {
        let store = store();
        let app = app!(store, "2026-01-05 08:00:00");

        let req = test::TestRequest::get()
            .uri("/api/attendance/token")
            .insert_header(bearer(2, Role::Employee))
            .to_request();
        let issued: Value = test::call_and_read_body_json(&app, req).await;
        let req = test::TestRequest::post()
            .uri("/api/attendance/submit")
            .insert_header(bearer(2, Role::Employee))
            .set_json(json!({ "user_id": 2, "token": issued["token"] }))
            .to_request();
        test::call_service(&app, req).await;

        let req = test::TestRequest::get()
            .uri("/api/auth/check")
            .insert_header(bearer(2, Role::Employee))
            .to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["authenticated"], true);
        assert_eq!(body["user"]["role"], "Employee");
        assert_eq!(body["is_attended"], true);
    }
}
