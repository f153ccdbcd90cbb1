//! In-process `AttendanceStore` used by the test suites.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use chrono::NaiveDateTime;

use super::report::{AbsentUser, AttendanceRow};
use super::store::AttendanceStore;
use crate::error::{AppError, AppResult};
use crate::model::attendance_token::AttendanceToken;
use crate::model::work_hours::{NewWorkHours, WorkHours};

#[derive(Debug, Clone)]
pub struct MemoryUser {
    pub id: u64,
    pub name: String,
    pub email: String,
    pub department_name: String,
    pub position: Option<String>,
    pub active: bool,
}

impl MemoryUser {
    pub fn new(id: u64, name: &str, department: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
            email: format!("{}@company.com", name.to_lowercase().replace(' ', ".")),
            department_name: department.to_string(),
            position: None,
            active: true,
        }
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }
}

#[derive(Default)]
struct State {
    users: Vec<MemoryUser>,
    tokens: Vec<AttendanceToken>,
    work_hours: Vec<WorkHours>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
    /// Makes every write fail as if the database connection dropped.
    pub fail_writes: AtomicBool,
    pub fail_absentees: AtomicBool,
    pub fail_work_hours: AtomicBool,
    /// Lets another writer flip the token between the engine's read and its update.
    pub lose_next_race: AtomicBool,
}

fn connection_lost() -> AppError {
    AppError::Persistence(sqlx::Error::PoolClosed)
}

impl MemoryStore {
    pub fn with_users(users: Vec<MemoryUser>) -> Self {
        let store = Self::default();
        store.state.lock().unwrap().users = users;
        store
    }

    pub fn push_work_hours(&self, start: &str, end: &str, tolerance: &str, at: NaiveDateTime) {
        let mut state = self.state.lock().unwrap();
        let id = state.work_hours.len() as u64 + 1;
        let t = |s: &str| chrono::NaiveTime::parse_from_str(s, "%H:%M:%S").unwrap();
        state.work_hours.push(WorkHours {
            id,
            work_start_time: t(start),
            work_end_time: t(end),
            tolerance_time: t(tolerance),
            created_at: at,
            updated_at: at,
        });
    }

    /// Seeds a token row directly, bypassing issuance.
    pub fn push_token(&self, token: AttendanceToken) {
        self.state.lock().unwrap().tokens.push(token);
    }

    pub fn tokens(&self) -> Vec<AttendanceToken> {
        self.state.lock().unwrap().tokens.clone()
    }

    fn rows_where<P>(&self, keep: P) -> Vec<AttendanceRow>
    where
        P: Fn(&AttendanceToken) -> bool,
    {
        let state = self.state.lock().unwrap();
        let mut rows: Vec<AttendanceRow> = state
            .tokens
            .iter()
            .filter(|t| t.used && keep(t))
            .filter_map(|t| {
                let user = state.users.iter().find(|u| u.id == t.user_id)?;
                Some(AttendanceRow {
                    user_id: user.id,
                    name: user.name.clone(),
                    email: user.email.clone(),
                    department_name: user.department_name.clone(),
                    position: user.position.clone(),
                    check_in: t.created_at,
                })
            })
            .collect();
        rows.sort_by_key(|r| r.check_in);
        rows
    }
}

#[async_trait]
impl AttendanceStore for MemoryStore {
    async fn insert_token(&self, token: &AttendanceToken) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(connection_lost());
        }
        let mut state = self.state.lock().unwrap();
        if state.tokens.iter().any(|t| t.token == token.token) {
            return Err(AppError::Persistence(sqlx::Error::Protocol(
                "duplicate token".into(),
            )));
        }
        state.tokens.push(token.clone());
        Ok(())
    }

    async fn find_token(&self, user_id: u64, token: &str) -> AppResult<Option<AttendanceToken>> {
        // give concurrent submissions a chance to interleave between read and update
        tokio::task::yield_now().await;
        let state = self.state.lock().unwrap();
        Ok(state
            .tokens
            .iter()
            .find(|t| t.user_id == user_id && t.token == token)
            .cloned())
    }

    async fn mark_used(&self, user_id: u64, token: &str) -> AppResult<bool> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(connection_lost());
        }
        let mut state = self.state.lock().unwrap();
        let Some(row) = state
            .tokens
            .iter_mut()
            .find(|t| t.user_id == user_id && t.token == token)
        else {
            return Ok(false);
        };

        if self.lose_next_race.swap(false, Ordering::SeqCst) {
            row.used = true;
        }

        if row.used {
            return Ok(false);
        }
        row.used = true;
        Ok(true)
    }

    async fn latest_work_hours(&self) -> AppResult<Option<WorkHours>> {
        if self.fail_work_hours.load(Ordering::SeqCst) {
            return Err(connection_lost());
        }
        let state = self.state.lock().unwrap();
        Ok(state.work_hours.iter().max_by_key(|w| w.id).cloned())
    }

    async fn insert_work_hours(
        &self,
        policy: &NewWorkHours,
        now: NaiveDateTime,
    ) -> AppResult<WorkHours> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(connection_lost());
        }
        let mut state = self.state.lock().unwrap();
        let row = WorkHours {
            id: state.work_hours.len() as u64 + 1,
            work_start_time: policy.work_start_time,
            work_end_time: policy.work_end_time,
            tolerance_time: policy.tolerance_time,
            created_at: now,
            updated_at: now,
        };
        state.work_hours.push(row.clone());
        Ok(row)
    }

    async fn attendance_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<AttendanceRow>> {
        Ok(self.rows_where(|t| t.created_at >= from && t.created_at < to))
    }

    async fn user_attendance_between(
        &self,
        user_id: u64,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<AttendanceRow>> {
        Ok(self.rows_where(|t| t.user_id == user_id && t.created_at >= from && t.created_at < to))
    }

    async fn absent_users_between(
        &self,
        from: NaiveDateTime,
        to: NaiveDateTime,
    ) -> AppResult<Vec<AbsentUser>> {
        if self.fail_absentees.load(Ordering::SeqCst) {
            return Err(connection_lost());
        }
        let state = self.state.lock().unwrap();
        let mut absent: Vec<AbsentUser> = state
            .users
            .iter()
            .filter(|u| u.active)
            .filter(|u| {
                !state.tokens.iter().any(|t| {
                    t.user_id == u.id && t.used && t.created_at >= from && t.created_at < to
                })
            })
            .map(|u| AbsentUser {
                user_id: u.id,
                name: u.name.clone(),
                email: u.email.clone(),
                department_name: u.department_name.clone(),
                position: u.position.clone(),
            })
            .collect();
        absent.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(absent)
    }

    async fn user_exists(&self, user_id: u64) -> AppResult<bool> {
        Ok(self.state.lock().unwrap().users.iter().any(|u| u.id == user_id))
    }
}
