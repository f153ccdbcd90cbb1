use crate::api::user::{UserCreated, UserEdited};
use crate::attendance::report::{
    AbsentUser, AttendanceRecord, DailyReport, EmployeeAttendanceDay, EmployeeMonthlyReport,
    MonthlyReport, Punctuality,
};
use crate::attendance::submission::SubmissionResponse;
use crate::attendance::validation::ValidationResponse;
use crate::auth::handlers::{AuthCheckResponse, LoginResponse, SessionUser};
use crate::model::attendance_token::{IssuedToken, TokenRequest};
use crate::model::department::Department;
use crate::model::user::{CreateUser, UpdateUser, User, UserStatus};
use crate::model::work_hours::{NewWorkHours, WorkHours};
use crate::models::{LoginReqDto, TokenPair};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HR Attendance API",
        version = "1.0.0",
        description = r#"
## Token-based attendance

Employees request a short-lived attendance token, optionally check it, and submit it
once to record a check-in. HR and administrators read daily, monthly and per-employee
reports with lateness measured against the current work-hours policy.

### Security
Endpoints under `/api` require a **JWT Bearer** access token from `/auth/login`.
Reports, user management and policy changes are limited to **HR** and **Admin**.
"#,
    ),
    paths(
        crate::auth::handlers::login,
        crate::auth::handlers::refresh_token,
        crate::auth::handlers::logout,
        crate::auth::handlers::check,

        crate::api::attendance::generate_token,
        crate::api::attendance::check_token,
        crate::api::attendance::submit_attendance,
        crate::api::attendance::today,
        crate::api::attendance::monthly,
        crate::api::attendance::employee_monthly,

        crate::api::work_hours::current,
        crate::api::work_hours::supersede,

        crate::api::department::list_departments,

        crate::api::user::list_users,
        crate::api::user::search_users,
        crate::api::user::get_user,
        crate::api::user::create_user,
        crate::api::user::edit_user
    ),
    components(
        schemas(
            LoginReqDto,
            TokenPair,
            LoginResponse,
            SessionUser,
            AuthCheckResponse,
            IssuedToken,
            TokenRequest,
            ValidationResponse,
            SubmissionResponse,
            Punctuality,
            AttendanceRecord,
            AbsentUser,
            DailyReport,
            MonthlyReport,
            EmployeeAttendanceDay,
            EmployeeMonthlyReport,
            WorkHours,
            NewWorkHours,
            Department,
            User,
            UserStatus,
            CreateUser,
            UpdateUser,
            UserCreated,
            UserEdited
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login, token rotation and session check"),
        (name = "Attendance", description = "Attendance tokens and reports"),
        (name = "Work Hours", description = "Work-hours policy"),
        (name = "Department", description = "Departments"),
        (name = "User", description = "User management"),
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
