use actix_web::{HttpResponse, web};

use crate::attendance::AttendanceEngine;
use crate::auth::auth::AuthUser;
use crate::error::AppResult;
use crate::model::work_hours::{NewWorkHours, WorkHours};

/// Effective work-hours policy
#[utoipa::path(
    get,
    path = "/api/work-hours",
    responses(
        (status = 200, description = "Current policy", body = WorkHours),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "No policy configured")
    ),
    security(("bearer_auth" = [])),
    tag = "Work Hours"
)]
pub async fn current(_auth: AuthUser, engine: web::Data<AttendanceEngine>) -> AppResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(engine.current_work_hours().await?))
}

/// Supersede the policy with a new row
#[utoipa::path(
    post,
    path = "/api/work-hours",
    request_body = NewWorkHours,
    responses(
        (status = 201, description = "New policy in effect", body = WorkHours),
        (status = 400, description = "Inconsistent times"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "Work Hours"
)]
pub async fn supersede(
    auth: AuthUser,
    body: web::Json<NewWorkHours>,
    engine: web::Data<AttendanceEngine>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    let row = engine.supersede_work_hours(&body).await?;
    Ok(HttpResponse::Created().json(row))
}
