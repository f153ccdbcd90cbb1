use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum UserStatus {
    Active,
    Inactive,
}

/// User joined with its department name.
#[derive(Debug, Clone, Serialize, sqlx::FromRow, ToSchema)]
pub struct User {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = "Ahmad Fauzi")]
    pub name: String,
    #[schema(example = "ahmad.fauzi@company.com")]
    pub email: String,
    #[schema(example = "+62 812-3456-7890", nullable = true)]
    pub phone: Option<String>,
    #[schema(example = "Software Engineer", nullable = true)]
    pub position: Option<String>,
    #[schema(example = 1)]
    pub department_id: u64,
    #[schema(example = "IT")]
    pub department_name: String,
    #[schema(example = "active")]
    pub status: String,
    #[schema(format = "date-time", value_type = String)]
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateUser {
    #[schema(example = "Andi Pratama")]
    pub name: String,
    #[schema(example = "andi.pratama@company.com", format = "email")]
    pub email: String,
    #[schema(example = "+62 817-8901-2345")]
    pub phone: String,
    #[schema(example = "Backend Developer")]
    pub position: String,
    #[schema(example = 1)]
    pub department_id: u64,
    pub status: UserStatus,
    #[schema(example = "password123")]
    pub password: String,
}

impl CreateUser {
    pub fn missing_field(&self) -> Option<&'static str> {
        if self.department_id == 0 {
            return Some("department_id");
        }
        [
            ("name", &self.name),
            ("email", &self.email),
            ("password", &self.password),
        ]
        .into_iter()
        .find(|(_, v)| v.trim().is_empty())
        .map(|(k, _)| k)
    }
}

/// Sparse edit: only present, non-empty fields are considered.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateUser {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub position: Option<String>,
    pub department_id: Option<u64>,
    pub status: Option<UserStatus>,
}
