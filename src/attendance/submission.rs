use serde::Serialize;
use tracing::{info, warn};
use utoipa::ToSchema;

use super::AttendanceEngine;
use super::validation::TokenStatus;
use crate::error::{AppError, AppResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionOutcome {
    Accepted,
    AlreadyUsed,
    Expired,
    /// The user already has a check-in dated today.
    AlreadyRecorded,
}

impl SubmissionOutcome {
    pub fn message(&self) -> &'static str {
        match self {
            SubmissionOutcome::Accepted => "Attendance submitted successfully",
            SubmissionOutcome::AlreadyUsed => "Token already used",
            SubmissionOutcome::Expired => "Token expired",
            SubmissionOutcome::AlreadyRecorded => "Attendance already recorded today",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct SubmissionResponse {
    pub success: bool,
    #[schema(example = "Attendance submitted successfully")]
    pub message: String,
    #[schema(example = 7)]
    pub user_id: u64,
}

impl SubmissionResponse {
    pub fn new(outcome: SubmissionOutcome, user_id: u64) -> Self {
        Self {
            success: outcome == SubmissionOutcome::Accepted,
            message: outcome.message().to_string(),
            user_id,
        }
    }
}

impl AttendanceEngine {
    /// Consumes a token. Usage and expiry are re-checked at submission time and
    /// the conditional update in the store decides between concurrent submissions.
    /// One check-in per user per day: a valid token is left unused when today's
    /// attendance is already on record.
    pub async fn submit_attendance(&self, user_id: u64, token: &str) -> AppResult<SubmissionOutcome> {
        let row = self.store.find_token(user_id, token).await?;

        let outcome = match TokenStatus::evaluate(row.as_ref(), self.now()) {
            TokenStatus::NotFound => {
                warn!(user_id, "Submission for unknown attendance token");
                return Err(AppError::NotFound("Attendance token"));
            }
            TokenStatus::AlreadyUsed => SubmissionOutcome::AlreadyUsed,
            TokenStatus::Expired { .. } => SubmissionOutcome::Expired,
            TokenStatus::Valid { .. } => {
                if self.has_attended_today(user_id).await? {
                    SubmissionOutcome::AlreadyRecorded
                } else if self.store.mark_used(user_id, token).await? {
                    SubmissionOutcome::Accepted
                } else {
                    warn!(user_id, "Attendance token consumed by a concurrent submission");
                    SubmissionOutcome::AlreadyUsed
                }
            }
        };

        match outcome {
            SubmissionOutcome::Accepted => info!(user_id, "Attendance submitted"),
            rejected => info!(user_id, reason = rejected.message(), "Attendance submission rejected"),
        }
        Ok(outcome)
    }
}
