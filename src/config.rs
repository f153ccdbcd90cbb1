use std::{env, fmt::Display, str::FromStr, time::Duration};

use anyhow::{Context, Result, anyhow};
use dotenvy::dotenv;

#[derive(Clone, Debug)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: String,
    pub access_token_ttl: usize,
    pub refresh_token_ttl: usize,

    // Rate limiting
    pub rate_login_per_min: u32,
    pub rate_refresh_per_min: u32,
    pub rate_protected_per_min: u32,

    pub api_prefix: String,

    // Database
    pub db_max_connections: u32,
    pub db_timeout_ms: u64,

    // Logging
    pub log_dir: String,
    pub log_level: tracing::Level,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the config from any key lookup, so parsing can be exercised without the process env.
    pub fn from_lookup<F>(get: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        Ok(Self {
            server_addr: required(&get, "SERVER_ADDR")?,
            database_url: required(&get, "DATABASE_URL")?,
            jwt_secret: required(&get, "JWT_SECRET")?,
            access_token_ttl: parse_or(&get, "ACCESS_TOKEN_TTL", 900)?, // 15 min
            refresh_token_ttl: parse_or(&get, "REFRESH_TOKEN_TTL", 604_800)?, // 7 days

            rate_login_per_min: parse_or(&get, "RATE_LOGIN_PER_MIN", 60)?,
            rate_refresh_per_min: parse_or(&get, "RATE_REFRESH_PER_MIN", 30)?,
            rate_protected_per_min: parse_or(&get, "RATE_PROTECTED_PER_MIN", 1000)?,

            api_prefix: get("API_PREFIX").unwrap_or_else(|| "/api".to_string()),

            db_max_connections: parse_or(&get, "DB_MAX_CONNECTIONS", 10)?,
            db_timeout_ms: parse_or(&get, "DB_TIMEOUT_MS", 5000)?,

            log_dir: get("LOG_DIR").unwrap_or_else(|| "logs".to_string()),
            log_level: parse_or(&get, "LOG_LEVEL", tracing::Level::DEBUG)?,
        })
    }

    pub fn db_timeout(&self) -> Duration {
        Duration::from_millis(self.db_timeout_ms)
    }
}

fn required<F>(get: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    get(key)
        .filter(|v| !v.trim().is_empty())
        .ok_or_else(|| anyhow!("{key} must be set"))
}

fn parse_or<F, T>(get: &F, key: &str, default: T) -> Result<T>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    match get(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| anyhow!("{e}"))
            .with_context(|| format!("invalid value for {key}: {raw:?}")),
    }
}
