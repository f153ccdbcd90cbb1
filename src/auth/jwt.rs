use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::model::role::Role;
use crate::models::{Claims, TokenType};

/// Identity carried inside both token kinds.
#[derive(Debug, Clone)]
pub struct Subject {
    pub user_id: u64,
    pub email: String,
    pub name: String,
    pub role: Role,
}

impl From<&Claims> for Subject {
    fn from(c: &Claims) -> Self {
        Self {
            user_id: c.user_id,
            email: c.sub.clone(),
            name: c.name.clone(),
            role: Role::from_id(c.role).unwrap_or(Role::Employee),
        }
    }
}

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

fn generate(subject: &Subject, token_type: TokenType, secret: &str, ttl: usize) -> AppResult<(String, Claims)> {
    let claims = Claims {
        user_id: subject.user_id,
        sub: subject.email.clone(),
        name: subject.name.clone(),
        role: subject.role.id(),
        exp: now() + ttl,
        jti: Uuid::new_v4().to_string(),
        token_type,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("jwt encode: {e}")))?;

    Ok((token, claims))
}

pub fn generate_access_token(subject: &Subject, secret: &str, ttl: usize) -> AppResult<String> {
    generate(subject, TokenType::Access, secret, ttl).map(|(token, _)| token)
}

pub fn generate_refresh_token(
    subject: &Subject,
    secret: &str,
    ttl: usize,
) -> AppResult<(String, Claims)> {
    generate(subject, TokenType::Refresh, secret, ttl)
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, String> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
    .map_err(|e| e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn subject() -> Subject {
        Subject {
            user_id: 2,
            email: "ahmad.fauzi@company.com".into(),
            name: "Ahmad Fauzi".into(),
            role: Role::Employee,
        }
    }

    #[test]
    fn access_token_round_trips_identity() {
        let token = generate_access_token(&subject(), "secret", 60).unwrap();

        let claims = verify_token(&token, "secret").unwrap();

        assert_eq!(claims.user_id, 2);
        assert_eq!(claims.sub, "ahmad.fauzi@company.com");
        assert_eq!(claims.token_type, TokenType::Access);
        assert_eq!(Role::from_id(claims.role), Some(Role::Employee));
    }

    #[test]
    fn refresh_tokens_get_distinct_ids() {
        let (_, a) = generate_refresh_token(&subject(), "secret", 60).unwrap();
        let (_, b) = generate_refresh_token(&subject(), "secret", 60).unwrap();

        assert_eq!(a.token_type, TokenType::Refresh);
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token = generate_access_token(&subject(), "secret", 60).unwrap();

        assert!(verify_token(&token, "other").is_err());
    }
}
