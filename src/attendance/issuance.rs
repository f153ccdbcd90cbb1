use chrono::Duration;
use tracing::{error, info};

use super::AttendanceEngine;
use crate::error::AppResult;
use crate::model::attendance_token::{AttendanceToken, IssuedToken};

/// 8 random bytes, rendered as 16 hex characters.
pub const TOKEN_BYTES: usize = 8;
pub const TOKEN_TTL_MINUTES: i64 = 5;

impl AttendanceEngine {
    pub async fn issue_token(&self, user_id: u64) -> AppResult<IssuedToken> {
        let mut bytes = [0u8; TOKEN_BYTES];
        self.entropy.fill(&mut bytes).inspect_err(|e| {
            error!(error = %e, user_id, "Failed to draw attendance token entropy");
        })?;

        let now = self.now();
        let token = AttendanceToken {
            user_id,
            token: hex::encode(bytes),
            expires_at: now + Duration::minutes(TOKEN_TTL_MINUTES),
            used: false,
            created_at: now,
        };

        self.store.insert_token(&token).await?;

        info!(user_id, expires_at = %token.expires_at, "Attendance token issued");
        Ok(IssuedToken::from(&token))
    }
}
