use actix_web::{HttpRequest, HttpResponse, get, web};
use serde::Serialize;
use sqlx::MySqlPool;
use tracing::{debug, info, instrument, warn};
use utoipa::ToSchema;

use crate::{
    attendance::AttendanceEngine,
    auth::{
        auth::AuthUser,
        jwt::{Subject, generate_access_token, generate_refresh_token, verify_token},
        password::verify_password,
    },
    config::Config,
    error::{AppError, AppResult},
    model::{role::Role, user::UserStatus},
    models::{Claims, LoginReqDto, TokenPair, TokenType, UserSql},
};

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionUser {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = "Ahmad Fauzi")]
    pub name: String,
    #[schema(example = "ahmad.fauzi@company.com")]
    pub email: String,
    #[schema(example = "Employee")]
    pub role: String,
}

impl From<&Subject> for SessionUser {
    fn from(s: &Subject) -> Self {
        Self {
            id: s.user_id,
            name: s.name.clone(),
            email: s.email.clone(),
            role: s.role.as_str().to_string(),
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: SessionUser,
}

#[derive(Serialize, ToSchema)]
pub struct AuthCheckResponse {
    pub authenticated: bool,
    pub user: SessionUser,
    /// Whether the caller already submitted attendance today.
    pub is_attended: bool,
}

fn validate_login(req: &LoginReqDto) -> AppResult<&str> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest("Email and password are required".into()));
    }
    if !email.contains('@') {
        return Err(AppError::BadRequest("Invalid email format".into()));
    }
    Ok(email)
}

fn bearer(req: &HttpRequest) -> Option<&str> {
    req.headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
}

async fn store_refresh_token<'e, E>(executor: E, claims: &Claims) -> Result<(), sqlx::Error>
where
    E: sqlx::Executor<'e, Database = sqlx::MySql>,
{
    sqlx::query(
        r#"
        INSERT INTO refresh_tokens (user_id, jti, expires_at)
        VALUES (?, ?, FROM_UNIXTIME(?))
        "#,
    )
    .bind(claims.user_id)
    .bind(&claims.jti)
    .bind(claims.exp as i64)
    .execute(executor)
    .await
    .map(|_| ())
}

#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 400, description = "Missing or malformed credentials"),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account is inactive"),
        (status = 500, description = "Internal server error")
    ),
    tag = "Auth"
)]
#[instrument(name = "auth_login", skip_all, fields(email = %user.email))]
pub async fn login(
    user: web::Json<LoginReqDto>,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let email = validate_login(&user)?;

    debug!("Fetching user from database");
    let db_user = sqlx::query_as::<_, UserSql>(
        r#"
        SELECT u.id, u.name, u.email, u.password_hash, u.status, d.name AS department_name
        FROM users u
        JOIN departments d ON d.id = u.department_id
        WHERE u.email = ?
        "#,
    )
    .bind(email)
    .fetch_optional(pool.get_ref())
    .await?;

    let Some(db_user) = db_user else {
        info!("Invalid credentials: user not found");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    };

    if !verify_password(&user.password, &db_user.password_hash) {
        info!(user_id = db_user.id, "Invalid credentials: password mismatch");
        return Err(AppError::Unauthorized("Invalid credentials".into()));
    }

    if db_user.status != UserStatus::Active.to_string() {
        warn!(user_id = db_user.id, "Login attempt on inactive account");
        return Err(AppError::Forbidden("Account is inactive".into()));
    }

    let subject = Subject {
        user_id: db_user.id,
        email: db_user.email,
        name: db_user.name,
        role: Role::from_department(&db_user.department_name),
    };

    let access_token = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)?;
    let (refresh_token, refresh_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)?;

    debug!(jti = %refresh_claims.jti, "Storing refresh token");
    store_refresh_token(pool.get_ref(), &refresh_claims).await?;

    info!(user_id = subject.user_id, role = subject.role.as_str(), "Login successful");

    Ok(HttpResponse::Ok().json(LoginResponse {
        access_token,
        refresh_token,
        user: SessionUser::from(&subject),
    }))
}

#[utoipa::path(
    post,
    path = "/auth/refresh",
    responses(
        (status = 200, description = "Rotated token pair", body = TokenPair),
        (status = 401, description = "Missing, invalid or revoked refresh token")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn refresh_token(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> AppResult<HttpResponse> {
    let token = bearer(&req).ok_or_else(|| AppError::Unauthorized("Missing refresh token".into()))?;

    let claims = verify_token(token, &config.jwt_secret)
        .map_err(|_| AppError::Unauthorized("Invalid refresh token".into()))?;
    if claims.token_type != TokenType::Refresh {
        return Err(AppError::Unauthorized("Refresh token required".into()));
    }

    let mut tx = pool.begin().await?;

    // revoke-and-check in one statement: a replayed token flips nothing
    let revoked = sqlx::query(
        r#"
        UPDATE refresh_tokens
        SET revoked = TRUE
        WHERE jti = ? AND revoked = FALSE AND expires_at > NOW()
        "#,
    )
    .bind(&claims.jti)
    .execute(&mut *tx)
    .await?;

    if revoked.rows_affected() == 0 {
        tx.rollback().await?;
        warn!(user_id = claims.user_id, "Refresh with revoked or unknown token");
        return Err(AppError::Unauthorized("Refresh token revoked".into()));
    }

    let subject = Subject::from(&claims);
    let (new_refresh_token, new_claims) =
        generate_refresh_token(&subject, &config.jwt_secret, config.refresh_token_ttl)?;
    store_refresh_token(&mut *tx, &new_claims).await?;
    tx.commit().await?;

    let access_token = generate_access_token(&subject, &config.jwt_secret, config.access_token_ttl)?;

    Ok(HttpResponse::Ok().json(TokenPair {
        access_token,
        refresh_token: new_refresh_token,
    }))
}

#[utoipa::path(
    post,
    path = "/auth/logout",
    responses((status = 204, description = "Refresh token revoked (idempotent)")),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
pub async fn logout(
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    config: web::Data<Config>,
) -> HttpResponse {
    let Some(claims) = bearer(&req).and_then(|t| verify_token(t, &config.jwt_secret).ok()) else {
        return HttpResponse::NoContent().finish();
    };

    // only refresh tokens can log out
    if claims.token_type != TokenType::Refresh {
        return HttpResponse::NoContent().finish();
    }

    if let Err(e) = sqlx::query("UPDATE refresh_tokens SET revoked = TRUE WHERE jti = ?")
        .bind(&claims.jti)
        .execute(pool.get_ref())
        .await
    {
        warn!(error = %e, user_id = claims.user_id, "Failed to revoke refresh token on logout");
    }

    HttpResponse::NoContent().finish()
}

#[utoipa::path(
    get,
    path = "/api/auth/check",
    responses(
        (status = 200, description = "Caller identity and today's attendance flag", body = AuthCheckResponse),
        (status = 401, description = "Unauthorized")
    ),
    security(("bearer_auth" = [])),
    tag = "Auth"
)]
#[get("/auth/check")]
pub async fn check(
    auth: AuthUser,
    engine: web::Data<AttendanceEngine>,
) -> AppResult<HttpResponse> {
    let is_attended = engine.has_attended_today(auth.user_id).await?;

    Ok(HttpResponse::Ok().json(AuthCheckResponse {
        authenticated: true,
        user: SessionUser {
            id: auth.user_id,
            name: auth.name,
            email: auth.email,
            role: auth.role.as_str().to_string(),
        },
        is_attended,
    }))
}
