use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;
use utoipa::ToSchema;

/// A used token joined with the identity of its owner.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AttendanceRow {
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub department_name: String,
    pub position: Option<String>,
    pub check_in: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case")]
pub enum Punctuality {
    OnTime,
    Late,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct AttendanceRecord {
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub department_name: String,
    pub position: Option<String>,
    #[schema(format = "date-time", value_type = String)]
    pub check_in: NaiveDateTime,
    pub status: Punctuality,
}

/// Active user without a used token in the report window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
pub struct AbsentUser {
    pub user_id: u64,
    pub name: String,
    pub email: String,
    pub department_name: String,
    pub position: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct DailyReport {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    pub total_attend: usize,
    pub total_late: usize,
    pub total_absent: usize,
    pub attendances: Vec<AttendanceRecord>,
    pub absent_users: Vec<AbsentUser>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MonthlyReport {
    #[schema(example = 1)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: i32,
    pub total_attend: usize,
    pub total_late: usize,
    pub total_absent: usize,
    pub attendances: Vec<AttendanceRecord>,
    pub absent_users: Vec<AbsentUser>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmployeeAttendanceDay {
    #[schema(example = "2026-01-05", format = "date", value_type = String)]
    pub date: NaiveDate,
    #[schema(example = "08:20:00", value_type = String)]
    pub check_in: NaiveTime,
    pub status: Punctuality,
    #[schema(example = 5)]
    pub late_minutes: i64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeMonthlyReport {
    #[schema(example = 2)]
    pub user_id: u64,
    #[schema(example = 1)]
    pub month: u32,
    #[schema(example = 2026)]
    pub year: i32,
    #[schema(example = 22)]
    pub total_working_days: u32,
    #[schema(example = 17)]
    pub total_present: u32,
    #[schema(example = 5)]
    pub total_absent: u32,
    #[schema(example = 9)]
    pub total_late: usize,
    /// Cumulative lateness as `HH:MM`.
    #[schema(example = "02:08")]
    pub total_late_hours: String,
    pub attendances: Vec<EmployeeAttendanceDay>,
}
