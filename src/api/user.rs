use actix_web::{HttpResponse, web};
use serde::{Deserialize, Serialize};
use sqlx::MySqlPool;
use tracing::{info, warn};
use utoipa::{IntoParams, ToSchema};

use crate::auth::auth::AuthUser;
use crate::auth::password::hash_password;
use crate::error::{AppError, AppResult, is_unique_violation};
use crate::model::user::{CreateUser, UpdateUser, User};
use crate::utils::db_utils::{SqlUpdate, SqlValue};

const USER_SELECT: &str = r#"
    SELECT u.id, u.name, u.email, u.phone, u.position,
           u.department_id, d.name AS department_name,
           u.status, u.created_at
    FROM users u
    INNER JOIN departments d ON d.id = u.department_id
"#;

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Matched against name, email, phone and position
    pub q: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserCreated {
    #[schema(example = "User created")]
    pub message: String,
    #[schema(example = 12)]
    pub user_id: u64,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct UserEdited {
    #[schema(example = "User updated")]
    pub message: String,
    #[schema(example = 12)]
    pub user_id: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub changed_fields: Vec<String>,
}

/// Trimmed new value when present, non-empty and different from the stored one.
fn changed<'a>(new: &'a Option<String>, old: Option<&str>) -> Option<&'a str> {
    new.as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty() && Some(*v) != old)
}

pub fn user_changes(current: &User, req: &UpdateUser) -> SqlUpdate {
    let mut update = SqlUpdate::new("users");

    if let Some(v) = changed(&req.name, Some(&current.name)) {
        update.set("name", SqlValue::Text(v.to_string()));
    }
    if let Some(v) = changed(&req.email, Some(&current.email)) {
        update.set("email", SqlValue::Text(v.to_string()));
    }
    if let Some(v) = changed(&req.phone, current.phone.as_deref()) {
        update.set("phone", SqlValue::Text(v.to_string()));
    }
    if let Some(v) = changed(&req.position, current.position.as_deref()) {
        update.set("position", SqlValue::Text(v.to_string()));
    }
    if let Some(id) = req
        .department_id
        .filter(|id| *id != 0 && *id != current.department_id)
    {
        update.set("department_id", SqlValue::U64(id));
    }
    if let Some(status) = req.status.filter(|s| s.to_string() != current.status) {
        update.set("status", SqlValue::Text(status.to_string()));
    }

    update
}

async fn fetch_user(pool: &MySqlPool, user_id: u64) -> AppResult<User> {
    sqlx::query_as::<_, User>(&format!("{USER_SELECT} WHERE u.id = ?"))
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::NotFound("User"))
}

async fn taken(pool: &MySqlPool, column: &'static str, value: &str) -> AppResult<bool> {
    let sql = format!("SELECT EXISTS(SELECT 1 FROM users WHERE {column} = ? LIMIT 1)");
    Ok(sqlx::query_scalar::<_, bool>(&sql)
        .bind(value)
        .fetch_one(pool)
        .await?)
}

async fn require_department(pool: &MySqlPool, department_id: u64) -> AppResult<()> {
    let exists =
        sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM departments WHERE id = ?)")
            .bind(department_id)
            .fetch_one(pool)
            .await?;

    if exists {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Unknown department {department_id}")))
    }
}

/// All users, newest first
#[utoipa::path(
    get,
    path = "/api/users",
    responses(
        (status = 200, description = "Users with department names", body = [User]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn list_users(auth: AuthUser, pool: web::Data<MySqlPool>) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let users = sqlx::query_as::<_, User>(&format!("{USER_SELECT} ORDER BY u.created_at DESC, u.id DESC"))
        .fetch_all(pool.get_ref())
        .await?;

    Ok(HttpResponse::Ok().json(users))
}

/// Substring search over name, email, phone and position
#[utoipa::path(
    get,
    path = "/api/users/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Matching users, newest first", body = [User]),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn search_users(
    auth: AuthUser,
    query: web::Query<SearchQuery>,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    let pattern = format!("%{}%", query.q.as_deref().unwrap_or("").trim());
    let users = sqlx::query_as::<_, User>(&format!(
        "{USER_SELECT}
         WHERE u.name LIKE ? OR u.email LIKE ? OR u.phone LIKE ? OR u.position LIKE ?
         ORDER BY u.created_at DESC, u.id DESC"
    ))
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .bind(&pattern)
    .fetch_all(pool.get_ref())
    .await?;

    Ok(HttpResponse::Ok().json(users))
}

#[utoipa::path(
    get,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    responses(
        (status = 200, description = "User", body = User),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "User not found")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn get_user(
    auth: AuthUser,
    path: web::Path<u64>,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    let user = fetch_user(pool.get_ref(), path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(user))
}

#[utoipa::path(
    post,
    path = "/api/users",
    request_body = CreateUser,
    responses(
        (status = 201, description = "User created", body = UserCreated),
        (status = 400, description = "Missing field or unknown department"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 409, description = "Email or phone already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn create_user(
    auth: AuthUser,
    body: web::Json<CreateUser>,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;

    if let Some(field) = body.missing_field() {
        return Err(AppError::BadRequest(format!("{field} is required")));
    }
    let email = body.email.trim();
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email format".into()));
    }
    let phone = body.phone.trim();

    require_department(pool.get_ref(), body.department_id).await?;
    if taken(pool.get_ref(), "email", email).await? {
        return Err(AppError::Conflict("Email already registered".into()));
    }
    if !phone.is_empty() && taken(pool.get_ref(), "phone", phone).await? {
        return Err(AppError::Conflict("Phone already registered".into()));
    }

    let password_hash = hash_password(&body.password)?;

    let result = sqlx::query(
        r#"
        INSERT INTO users (name, email, phone, position, department_id, status, password_hash, created_at)
        VALUES (?, ?, NULLIF(?, ''), NULLIF(?, ''), ?, ?, ?, NOW())
        "#,
    )
    .bind(body.name.trim())
    .bind(email)
    .bind(phone)
    .bind(body.position.trim())
    .bind(body.department_id)
    .bind(body.status.to_string())
    .bind(&password_hash)
    .execute(pool.get_ref())
    .await
    .map_err(|e| {
        // lost a race against a concurrent insert of the same email or phone
        if is_unique_violation(&e) {
            AppError::Conflict("Email or phone already registered".into())
        } else {
            AppError::from(e)
        }
    })?;

    let user_id = result.last_insert_id();
    info!(created_by = auth.user_id, user_id, "User created");

    Ok(HttpResponse::Created().json(UserCreated {
        message: "User created".into(),
        user_id,
    }))
}

/// Sparse edit: only non-empty fields that differ from the stored row are written
#[utoipa::path(
    put,
    path = "/api/users/{id}",
    params(("id" = u64, Path, description = "User id")),
    request_body = UpdateUser,
    responses(
        (status = 200, description = "Updated, or no changes", body = UserEdited),
        (status = 400, description = "Unknown department"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "HR/Admin only"),
        (status = 404, description = "User not found"),
        (status = 409, description = "Email or phone already registered")
    ),
    security(("bearer_auth" = [])),
    tag = "User"
)]
pub async fn edit_user(
    auth: AuthUser,
    path: web::Path<u64>,
    body: web::Json<UpdateUser>,
    pool: web::Data<MySqlPool>,
) -> AppResult<HttpResponse> {
    auth.require_hr_or_admin()?;
    let user_id = path.into_inner();

    let current = fetch_user(pool.get_ref(), user_id).await?;
    let update = user_changes(&current, &body);

    if update.is_empty() {
        return Ok(HttpResponse::Ok().json(UserEdited {
            message: "No changes".into(),
            user_id,
            changed_fields: Vec::new(),
        }));
    }

    if let (true, Some(department_id)) = (update.columns().contains(&"department_id"), body.department_id) {
        require_department(pool.get_ref(), department_id).await?;
    }

    let mut tx = pool.begin().await?;
    let affected = update
        .execute(&mut *tx, "id", user_id)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::Conflict("Email or phone already registered".into())
            } else {
                AppError::from(e)
            }
        })?;

    if affected == 0 {
        tx.rollback().await?;
        warn!(user_id, "User vanished during edit");
        return Err(AppError::NotFound("User"));
    }
    tx.commit().await?;

    let changed_fields: Vec<String> = update.columns().into_iter().map(String::from).collect();
    info!(edited_by = auth.user_id, user_id, fields = ?changed_fields, "User updated");

    Ok(HttpResponse::Ok().json(UserEdited {
        message: "User updated".into(),
        user_id,
        changed_fields,
    }))
}
