use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::report::{AbsentUser, AttendanceRow};
use crate::error::AppResult;
use crate::model::attendance_token::AttendanceToken;
use crate::model::work_hours::{NewWorkHours, WorkHours};

/// Durable record store behind the attendance engine.
///
/// The store is the only synchronisation point between concurrent requests:
/// every write is transactional and `mark_used` must be a conditional update.
/// Window bounds are half-open `[from, to)`.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Persists a freshly issued token. A duplicate `token` fails as a persistence error.
    async fn insert_token(&self, token: &AttendanceToken) -> AppResult<()>;

    async fn find_token(&self, user_id: u64, token: &str) -> AppResult<Option<AttendanceToken>>;

    /// Flips `used` from false to true. Returns `false` when no unused row matched,
    /// which is how a lost race with a concurrent submission shows up.
    async fn mark_used(&self, user_id: u64, token: &str) -> AppResult<bool>;

    async fn latest_work_hours(&self) -> AppResult<Option<WorkHours>>;

    /// Appends a policy row; existing rows are never modified.
    async fn insert_work_hours(
        &self,
        policy: &NewWorkHours,
        now: NaiveDateTime,
    ) -> AppResult<WorkHours>;

    /// Used tokens created in the window, ordered by check-in ascending.
    async fn attendance_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<AttendanceRow>>;

    async fn user_attendance_between(
        &self,
        user_id: u64,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<AttendanceRow>>;

    /// Active users with no used token in the window, ordered by name.
    async fn absent_users_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<AbsentUser>>;

    async fn user_exists(&self, user_id: u64) -> AppResult<bool>;
}
