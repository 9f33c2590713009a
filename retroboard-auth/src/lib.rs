//! Room tokens and password handling.
//!
//! Joining a room yields an HS256-signed token whose only claim of interest
//! is the room id; the session layer trusts a request only after the token's
//! claim matches the room in the path. Tokens travel in an `HttpOnly` cookie
//! with a seven-day expiry. Passwords are stored as bcrypt hashes.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Name of the cookie carrying the room token.
pub const TOKEN_COOKIE: &str = "token";

/// How long an issued token (and its cookie) stays valid.
pub const TOKEN_TTL_DAYS: i64 = 7;

/// Result type for auth operations.
pub type AuthResult<T> = Result<T, AuthError>;

/// Errors that can occur in auth operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// The token is missing, malformed, expired or has a bad signature.
    #[error("invalid token: {0}")]
    InvalidToken(#[from] jsonwebtoken::errors::Error),

    /// The token is valid but for a different room.
    #[error("claims id '{claimed}' does not match room id '{requested}'")]
    RoomMismatch { claimed: String, requested: String },

    /// Hashing failed.
    #[error("password hash error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    /// The presented password does not match the stored hash.
    #[error("incorrect password")]
    IncorrectPassword,
}

/// The claims carried by a room token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    #[serde(rename = "roomId")]
    pub room_id: String,
    pub exp: i64,
}

/// Signs and verifies room tokens with a shared secret.
pub struct TokenManager {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl TokenManager {
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation: Validation::new(Algorithm::HS256),
        }
    }

    /// Issues a token for a room, expiring after [`TOKEN_TTL_DAYS`].
    /// Returns the signed token and its expiry.
    pub fn issue(&self, room_id: &str) -> AuthResult<(String, DateTime<Utc>)> {
        let expires_at = Utc::now() + Duration::days(TOKEN_TTL_DAYS);
        let claims = Claims {
            room_id: room_id.to_string(),
            exp: expires_at.timestamp(),
        };

        let token = jsonwebtoken::encode(&Header::default(), &claims, &self.encoding)?;
        Ok((token, expires_at))
    }

    /// Verifies a token and checks its claim against the requested room.
    pub fn verify(&self, token: &str, room_id: &str) -> AuthResult<Claims> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;

        if data.claims.room_id != room_id {
            return Err(AuthError::RoomMismatch {
                claimed: data.claims.room_id,
                requested: room_id.to_string(),
            });
        }

        Ok(data.claims)
    }
}

/// Renders the `Set-Cookie` header value for a freshly issued token.
///
/// Attributes follow the registration contract: `HttpOnly`, `Secure`,
/// `SameSite=Strict`, `Path=/`, expiring with the token.
#[must_use]
pub fn token_cookie(token: &str, expires_at: DateTime<Utc>) -> String {
    format!(
        "{TOKEN_COOKIE}={token}; Path=/; Expires={}; HttpOnly; Secure; SameSite=Strict",
        expires_at.format("%a, %d %b %Y %H:%M:%S GMT")
    )
}

/// Bcrypt-backed password hashing.
#[derive(Debug, Clone, Copy, Default)]
pub struct PasswordManager;

impl PasswordManager {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Hashes a password at the default cost.
    pub fn hash_password(&self, password: &str) -> AuthResult<String> {
        Ok(bcrypt::hash(password, bcrypt::DEFAULT_COST)?)
    }

    /// Compares a password against a stored hash.
    pub fn compare_hash_and_password(&self, hash: &str, password: &str) -> AuthResult<()> {
        if !bcrypt::verify(password, hash)? {
            return Err(AuthError::IncorrectPassword);
        }

        Ok(())
    }
}
