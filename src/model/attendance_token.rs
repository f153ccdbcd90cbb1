use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One issuance event. `created_at` doubles as the check-in time once the token is used.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct AttendanceToken {
    pub user_id: u64,
    pub token: String,
    pub expires_at: NaiveDateTime,
    #[sqlx(rename = "is_used")]
    pub used: bool,
    pub created_at: NaiveDateTime,
}

impl AttendanceToken {
    /// Strict comparison: a token is still usable at exactly `expires_at`.
    pub fn is_expired_at(&self, now: NaiveDateTime) -> bool {
        now > self.expires_at
    }
}

/// Public projection returned to the caller at issuance.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct IssuedToken {
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = "9f86d081884c7d65")]
    pub token: String,
    #[schema(example = "2026-01-05T08:05:00", format = "date-time", value_type = String)]
    pub expires_at: NaiveDateTime,
}

impl From<&AttendanceToken> for IssuedToken {
    fn from(t: &AttendanceToken) -> Self {
        Self {
            user_id: t.user_id,
            token: t.token.clone(),
            expires_at: t.expires_at,
        }
    }
}

/// Body of the check and submit endpoints.
#[derive(Debug, Deserialize, ToSchema)]
pub struct TokenRequest {
    #[schema(example = 7)]
    pub user_id: u64,
    #[schema(example = "9f86d081884c7d65")]
    pub token: String,
}
