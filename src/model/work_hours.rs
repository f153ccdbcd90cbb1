use chrono::{NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::{AppError, AppResult};

/// Work-hours policy. The row with the highest id is the effective one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow, ToSchema)]
pub struct WorkHours {
    #[schema(example = 1)]
    pub id: u64,
    #[schema(example = "08:00:00", value_type = String)]
    pub work_start_time: NaiveTime,
    #[schema(example = "17:00:00", value_type = String)]
    pub work_end_time: NaiveTime,
    #[schema(example = "08:15:00", value_type = String)]
    pub tolerance_time: NaiveTime,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
    #[schema(format = "date-time", value_type = String)]
    pub updated_at: NaiveDateTime,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NewWorkHours {
    #[schema(example = "08:00:00", value_type = String)]
    pub work_start_time: NaiveTime,
    #[schema(example = "17:00:00", value_type = String)]
    pub work_end_time: NaiveTime,
    #[schema(example = "08:15:00", value_type = String)]
    pub tolerance_time: NaiveTime,
}

impl NewWorkHours {
    pub fn validate(&self) -> AppResult<()> {
        if self.work_start_time >= self.work_end_time {
            return Err(AppError::BadRequest(
                "work_start_time must be before work_end_time".into(),
            ));
        }
        if self.tolerance_time < self.work_start_time || self.tolerance_time > self.work_end_time {
            return Err(AppError::BadRequest(
                "tolerance_time must fall within working hours".into(),
            ));
        }
        Ok(())
    }
}
