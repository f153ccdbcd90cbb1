use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Department {
    #[schema(example = 4)]
    pub id: u64,
    #[schema(example = "HR")]
    pub name: String,
}
