//! Credentials: argon2 password hashes and HS256 bearer tokens.

use crate::constants::MIN_TOKEN_SECRET_LENGTH;
use crate::error::ServiceError;
use crate::orm::users;
use crate::permission::Role;
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

fn get_argon2() -> Argon2<'static> {
    Argon2::default()
}

/// Returns an argon2id PHC string for `password`.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    get_argon2()
        .hash_password(password.as_bytes(), &SaltString::generate(&mut OsRng))
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Internal(format!("Failed to hash password: {}", e)))
}

/// False for a wrong password and for a malformed stored hash.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match PasswordHash::new(password_hash) {
        Ok(parsed) => get_argon2()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            log::error!("Stored password hash could not be parsed: {}", e);
            false
        }
    }
}

/// Bearer token claims.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// User id
    pub sub: String,
    pub email: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

impl Claims {
    pub fn user_id(&self) -> Option<i32> {
        self.sub.parse().ok()
    }
}

/// Signing and verification keys for bearer tokens.
#[derive(Clone)]
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl std::fmt::Debug for TokenKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenKeys").field("ttl", &self.ttl).finish()
    }
}

impl TokenKeys {
    pub fn new(secret: &str, ttl_hours: i64) -> Result<Self, ServiceError> {
        if secret.len() < MIN_TOKEN_SECRET_LENGTH {
            return Err(ServiceError::Internal(format!(
                "Token secret must be at least {} bytes, got {}",
                MIN_TOKEN_SECRET_LENGTH,
                secret.len()
            )));
        }

        Ok(Self {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
            ttl: Duration::hours(ttl_hours.max(1)),
        })
    }

    pub fn issue(&self, user: &users::Model) -> Result<String, ServiceError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            role: user.role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| ServiceError::Internal(format!("Failed to sign token: {}", e)))
    }

    pub fn verify(&self, token: &str) -> Result<Claims, ServiceError> {
        decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))
            .map(|data| data.claims)
            .map_err(|e| {
                log::debug!("Rejected bearer token: {}", e);
                ServiceError::Unauthorized("Invalid or expired token".to_owned())
            })
    }
}
