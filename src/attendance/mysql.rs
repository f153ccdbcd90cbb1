use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::NaiveDateTime;
use sqlx::MySqlPool;
use tracing::{debug, error, warn};

use super::report::{AbsentUser, AttendanceRow};
use super::store::AttendanceStore;
use crate::error::{AppError, AppResult};
use crate::model::attendance_token::AttendanceToken;
use crate::model::work_hours::{NewWorkHours, WorkHours};

const ATTENDANCE_SELECT: &str = r#"
    SELECT u.id AS user_id, u.name, u.email, d.name AS department_name, u.position,
           t.created_at AS check_in
    FROM attendance_tokens t
    INNER JOIN users u ON u.id = t.user_id
    INNER JOIN departments d ON d.id = u.department_id
    WHERE t.is_used = TRUE
"#;

pub struct MySqlAttendanceStore {
    pool: MySqlPool,
    timeout: Duration,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    /// Runs one database round trip under the configured deadline.
    /// A future dropped on timeout releases its transaction, which rolls it back.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>> + Send,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(e)) => {
                error!(error = %e, op, "Database operation failed");
                Err(AppError::Persistence(e))
            }
            Err(_) => {
                warn!(op, timeout_ms = self.timeout.as_millis() as u64, "Database operation timed out");
                Err(AppError::Unavailable(op))
            }
        }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn insert_token(&self, token: &AttendanceToken) -> AppResult<()> {
        self.bounded("insert_token", async {
            let mut tx = self.pool.begin().await?;

            sqlx::query(
                r#"
                INSERT INTO attendance_tokens (user_id, token, expires_at, is_used, created_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(token.user_id)
            .bind(&token.token)
            .bind(token.expires_at)
            .bind(token.used)
            .bind(token.created_at)
            .execute(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(())
        })
        .await
    }

    async fn find_token(&self, user_id: u64, token: &str) -> AppResult<Option<AttendanceToken>> {
        self.bounded(
            "find_token",
            sqlx::query_as::<_, AttendanceToken>(
                r#"
                SELECT user_id, token, expires_at, is_used, created_at
                FROM attendance_tokens
                WHERE user_id = ? AND token = ?
                "#,
            )
            .bind(user_id)
            .bind(token)
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn mark_used(&self, user_id: u64, token: &str) -> AppResult<bool> {
        self.bounded("mark_used", async {
            let mut tx = self.pool.begin().await?;

            let result = sqlx::query(
                r#"
                UPDATE attendance_tokens
                SET is_used = TRUE
                WHERE user_id = ? AND token = ? AND is_used = FALSE
                "#,
            )
            .bind(user_id)
            .bind(token)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                debug!(user_id, "Conditional update matched no unused token");
                tx.rollback().await?;
                return Ok(false);
            }

            tx.commit().await?;
            Ok::<_, sqlx::Error>(true)
        })
        .await
    }

    async fn latest_work_hours(&self) -> AppResult<Option<WorkHours>> {
        self.bounded(
            "latest_work_hours",
            sqlx::query_as::<_, WorkHours>(
                r#"
                SELECT id, work_start_time, work_end_time, tolerance_time, created_at, updated_at
                FROM work_hours
                ORDER BY id DESC
                LIMIT 1
                "#,
            )
            .fetch_optional(&self.pool),
        )
        .await
    }

    async fn insert_work_hours(
        &self,
        policy: &NewWorkHours,
        now: NaiveDateTime,
    ) -> AppResult<WorkHours> {
        self.bounded("insert_work_hours", async {
            let mut tx = self.pool.begin().await?;

            let id = sqlx::query(
                r#"
                INSERT INTO work_hours
                    (work_start_time, work_end_time, tolerance_time, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?)
                "#,
            )
            .bind(policy.work_start_time)
            .bind(policy.work_end_time)
            .bind(policy.tolerance_time)
            .bind(now)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .last_insert_id();

            let row = sqlx::query_as::<_, WorkHours>(
                r#"
                SELECT id, work_start_time, work_end_time, tolerance_time, created_at, updated_at
                FROM work_hours
                WHERE id = ?
                "#,
            )
            .bind(id)
            .fetch_one(&mut *tx)
            .await?;

            tx.commit().await?;
            Ok::<_, sqlx::Error>(row)
        })
        .await
    }

    async fn attendance_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<AttendanceRow>> {
        let sql = format!(
            "{ATTENDANCE_SELECT} AND t.created_at >= ? AND t.created_at < ? ORDER BY t.created_at ASC, t.id ASC"
        );

        self.bounded(
            "attendance_between",
            sqlx::query_as::<_, AttendanceRow>(&sql)
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn user_attendance_between(
        &self,
        user_id: u64,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<AttendanceRow>> {
        let sql = format!(
            "{ATTENDANCE_SELECT} AND t.user_id = ? AND t.created_at >= ? AND t.created_at < ? ORDER BY t.created_at ASC, t.id ASC"
        );

        self.bounded(
            "user_attendance_between",
            sqlx::query_as::<_, AttendanceRow>(&sql)
                .bind(user_id)
                .bind(from)
                .bind(to)
                .fetch_all(&self.pool),
        )
        .await
    }

    async fn absent_users_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<AbsentUser>> {
        self.bounded(
            "absent_users_between",
            sqlx::query_as::<_, AbsentUser>(
                r#"
                SELECT u.id AS user_id, u.name, u.email, d.name AS department_name, u.position
                FROM users u
                INNER JOIN departments d ON d.id = u.department_id
                WHERE u.status = 'active'
                  AND NOT EXISTS (
                      SELECT 1 FROM attendance_tokens t
                      WHERE t.user_id = u.id
                        AND t.is_used = TRUE
                        AND t.created_at >= ? AND t.created_at < ?
                  )
                ORDER BY u.name ASC
                "#,
            )
            .bind(from)
            .bind(to)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn user_exists(&self, user_id: u64) -> AppResult<bool> {
        let count = self
            .bounded(
                "user_exists",
                sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM users WHERE id = ?")
                    .bind(user_id)
                    .fetch_one(&self.pool),
            )
            .await?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(timeout: Duration) -> MySqlAttendanceStore {
        let pool = MySqlPool::connect_lazy("mysql://localhost/attendance").unwrap();
        MySqlAttendanceStore::new(pool, timeout)
    }

    #[tokio::test]
    async fn deadline_surfaces_as_unavailable() {
        let store = store(Duration::from_millis(20));

        let result = store
            .bounded("stalled_query", std::future::pending::<Result<(), sqlx::Error>>())
            .await;

        assert!(matches!(result, Err(AppError::Unavailable("stalled_query"))));
    }

    #[tokio::test]
    async fn driver_error_is_a_persistence_failure() {
        let store = store(Duration::from_millis(20));

        let result = store
            .bounded("closed_pool", async { Err::<(), _>(sqlx::Error::PoolClosed) })
            .await;

        assert!(matches!(result, Err(AppError::Persistence(_))));
    }
}
