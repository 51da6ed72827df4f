use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config;
use crate::database::models::OrgRole;

/// JWT claims for an authenticated organization member.
///
/// `org_id` and `superuser` feed the tenant context the data layer applies
/// before touching tenant tables. Superuser tokens are only minted by
/// operator tooling, never by the API itself.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub user_id: i64,
    pub org_id: i64,
    pub role: OrgRole,
    pub superuser: bool,
    pub jti: Uuid,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn new(user_id: i64, org_id: i64, role: OrgRole, superuser: bool) -> Self {
        let now = Utc::now();
        let expiry_hours = config::config().security.jwt_expiry_hours;
        let exp = (now + Duration::hours(expiry_hours as i64)).timestamp();

        Self {
            user_id,
            org_id,
            role,
            superuser,
            jti: Uuid::new_v4(),
            exp,
            iat: now.timestamp(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT token: {0}")]
    InvalidToken(String),
    #[error("JWT secret not configured")]
    InvalidSecret,
}

pub fn generate_jwt(claims: &Claims) -> Result<String, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());
    encode(&Header::default(), claims, &encoding_key)
        .map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

pub fn validate_jwt(token: &str) -> Result<Claims, JwtError> {
    let secret = &config::config().security.jwt_secret;
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|e| JwtError::InvalidToken(e.to_string()))?;
    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_claims() {
        let claims = Claims::new(7, 3, OrgRole::Admin, false);
        let token = generate_jwt(&claims).expect("token");
        let decoded = validate_jwt(&token).expect("claims");
        assert_eq!(decoded.user_id, 7);
        assert_eq!(decoded.org_id, 3);
        assert_eq!(decoded.role, OrgRole::Admin);
        assert!(!decoded.superuser);
    }

    #[test]
    fn rejects_tampered_token() {
        let claims = Claims::new(1, 1, OrgRole::Viewer, false);
        let mut token = generate_jwt(&claims).expect("token");
        token.push('x');
        assert!(validate_jwt(&token).is_err());
    }
}
