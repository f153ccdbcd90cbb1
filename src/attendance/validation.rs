use chrono::NaiveDateTime;
use serde::Serialize;
use tracing::debug;
use utoipa::ToSchema;

use super::AttendanceEngine;
use super::calendar;
use crate::error::AppResult;
use crate::model::attendance_token::AttendanceToken;

/// Usability of a token, checked in order: existence, usage, expiry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStatus {
    NotFound,
    AlreadyUsed,
    Expired { expires_at: NaiveDateTime },
    Valid { expires_at: NaiveDateTime },
}

impl TokenStatus {
    pub fn evaluate(row: Option<&AttendanceToken>, now: NaiveDateTime) -> Self {
        match row {
            None => TokenStatus::NotFound,
            Some(t) if t.used => TokenStatus::AlreadyUsed,
            Some(t) if t.is_expired_at(now) => TokenStatus::Expired {
                expires_at: t.expires_at,
            },
            Some(t) => TokenStatus::Valid {
                expires_at: t.expires_at,
            },
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            TokenStatus::NotFound => "Token not found",
            TokenStatus::AlreadyUsed => "Token already used",
            TokenStatus::Expired { .. } => "Token expired",
            TokenStatus::Valid { .. } => "Token is valid",
        }
    }
}

/// Wire shape of a validation answer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct ValidationResponse {
    pub valid: bool,
    #[schema(nullable = true)]
    pub used: Option<bool>,
    #[schema(format = "date-time", value_type = Option<String>)]
    pub expires_at: Option<NaiveDateTime>,
    #[schema(example = "Token is valid")]
    pub message: String,
}

impl From<TokenStatus> for ValidationResponse {
    fn from(status: TokenStatus) -> Self {
        let (valid, used, expires_at) = match status {
            TokenStatus::NotFound => (false, None, None),
            TokenStatus::AlreadyUsed => (false, Some(true), None),
            TokenStatus::Expired { expires_at } => (false, Some(false), Some(expires_at)),
            TokenStatus::Valid { expires_at } => (true, Some(false), Some(expires_at)),
        };

        Self {
            valid,
            used,
            expires_at,
            message: status.message().to_string(),
        }
    }
}

impl AttendanceEngine {
    /// Read-only; never changes token state.
    pub async fn validate_token(&self, user_id: u64, token: &str) -> AppResult<TokenStatus> {
        let row = self.store.find_token(user_id, token).await?;
        let status = TokenStatus::evaluate(row.as_ref(), self.now());

        debug!(user_id, status = status.message(), "Attendance token checked");
        Ok(status)
    }

    /// Whether the user has a used token dated today.
    pub async fn has_attended_today(&self, user_id: u64) -> AppResult<bool> {
        let (from, to) = calendar::day_window(self.today());
        let rows = self.store.user_attendance_between(user_id, from, to).await?;
        Ok(!rows.is_empty())
    }
}
