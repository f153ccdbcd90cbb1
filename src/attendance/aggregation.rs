use std::collections::HashSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use tracing::{info, warn};

use super::AttendanceEngine;
use super::calendar::{self, LateDuration};
use super::report::{
    AbsentUser, AttendanceRecord, AttendanceRow, DailyReport, EmployeeAttendanceDay,
    EmployeeMonthlyReport, MonthlyReport, Punctuality,
};
use crate::error::{AppError, AppResult};
use crate::model::work_hours::{NewWorkHours, WorkHours};

pub const MIN_REPORT_YEAR: i32 = 2000;
pub const MAX_REPORT_YEAR: i32 = 2100;

fn classify_rows(rows: Vec<AttendanceRow>, tolerance: NaiveTime) -> Vec<AttendanceRecord> {
    rows.into_iter()
        .map(|row| AttendanceRecord {
            status: calendar::classify(row.check_in.time(), tolerance),
            user_id: row.user_id,
            name: row.name,
            email: row.email,
            department_name: row.department_name,
            position: row.position,
            check_in: row.check_in,
        })
        .collect()
}

fn count_late(records: &[AttendanceRecord]) -> usize {
    records
        .iter()
        .filter(|r| r.status == Punctuality::Late)
        .count()
}

/// Earliest check-in per user; `rows` must be ordered by check-in.
fn first_check_in_per_user(rows: Vec<AttendanceRow>) -> Vec<AttendanceRow> {
    let mut seen = HashSet::new();
    rows.into_iter().filter(|row| seen.insert(row.user_id)).collect()
}

/// Earliest check-in per calendar date; `rows` must be ordered by check-in.
fn first_check_in_per_day(rows: &[AttendanceRow]) -> Vec<NaiveDateTime> {
    let mut days: Vec<NaiveDateTime> = Vec::new();
    for row in rows {
        if days.last().map(|d| d.date()) != Some(row.check_in.date()) {
            days.push(row.check_in);
        }
    }
    days
}

impl AttendanceEngine {
    pub async fn current_work_hours(&self) -> AppResult<WorkHours> {
        self.store
            .latest_work_hours()
            .await?
            .ok_or(AppError::NotFound("Work hours policy"))
    }

    /// Supersedes the effective policy by appending a new row.
    pub async fn supersede_work_hours(&self, policy: &NewWorkHours) -> AppResult<WorkHours> {
        policy.validate()?;
        let row = self.store.insert_work_hours(policy, self.now()).await?;

        info!(id = row.id, tolerance = %row.tolerance_time, "Work hours policy superseded");
        Ok(row)
    }

    async fn tolerance(&self) -> AppResult<NaiveTime> {
        Ok(self.current_work_hours().await?.tolerance_time)
    }

    /// Absentees are supplementary: a failed lookup degrades to an empty list.
    async fn absentees(&self, from: NaiveDateTime, to: NaiveDateTime) -> Vec<AbsentUser> {
        match self.store.absent_users_between(from, to).await {
            Ok(users) => users,
            Err(e) => {
                warn!(error = %e, %from, %to, "Absentee lookup failed, reporting without absentees");
                Vec::new()
            }
        }
    }

    pub async fn daily_report(&self) -> AppResult<DailyReport> {
        let date = self.today();
        let (from, to) = calendar::day_window(date);

        let tolerance = self.tolerance().await?;
        let rows = first_check_in_per_user(self.store.attendance_between(from, to).await?);
        let attendances = classify_rows(rows, tolerance);
        let absent_users = self.absentees(from, to).await;

        Ok(DailyReport {
            date,
            total_attend: attendances.len(),
            total_late: count_late(&attendances),
            total_absent: absent_users.len(),
            attendances,
            absent_users,
        })
    }

    pub async fn monthly_report(&self) -> AppResult<MonthlyReport> {
        let today = self.today();
        let (month, year) = (today.month(), today.year());
        let (from, to) = calendar::month_window(year, month)?;

        let tolerance = self.tolerance().await?;
        let attendances = classify_rows(self.store.attendance_between(from, to).await?, tolerance);
        let absent_users = self.absentees(from, to).await;

        Ok(MonthlyReport {
            month,
            year,
            total_attend: attendances.len(),
            total_late: count_late(&attendances),
            total_absent: absent_users.len(),
            attendances,
            absent_users,
        })
    }

    pub async fn employee_monthly_report(
        &self,
        user_id: u64,
        month: u32,
        year: i32,
    ) -> AppResult<EmployeeMonthlyReport> {
        if !(1..=12).contains(&month) {
            return Err(AppError::BadRequest("Invalid month".into()));
        }
        if !(MIN_REPORT_YEAR..=MAX_REPORT_YEAR).contains(&year) {
            return Err(AppError::BadRequest("Invalid year".into()));
        }
        if !self.store.user_exists(user_id).await? {
            return Err(AppError::NotFound("User"));
        }

        let (from, to) = calendar::month_window(year, month)?;
        let tolerance = self.tolerance().await?;
        let rows = self
            .store
            .user_attendance_between(user_id, from, to)
            .await?;

        let days = first_check_in_per_day(&rows);
        let late_total = days.iter().fold(Duration::zero(), |acc, check_in| {
            acc + calendar::late_by(check_in.time(), tolerance)
        });

        let attendances: Vec<EmployeeAttendanceDay> = days
            .into_iter()
            .map(|check_in| EmployeeAttendanceDay {
                date: check_in.date(),
                check_in: check_in.time(),
                status: calendar::classify(check_in.time(), tolerance),
                late_minutes: calendar::late_minutes(check_in.time(), tolerance),
            })
            .collect();

        let total_working_days = calendar::working_days_in_month(year, month)?;
        let total_present = attendances
            .iter()
            .filter(|d| calendar::is_working_day(d.date))
            .count() as u32;
        Ok(EmployeeMonthlyReport {
            user_id,
            month,
            year,
            total_working_days,
            total_present,
            total_absent: total_working_days.saturating_sub(total_present),
            total_late: attendances
                .iter()
                .filter(|d| d.status == Punctuality::Late)
                .count(),
            total_late_hours: LateDuration::from(late_total).to_string(),
            attendances,
        })
    }
}

/// `(month, year)` an employee report falls back to.
pub fn default_period(today: NaiveDate) -> (u32, i32) {
    (today.month(), today.year())
}
