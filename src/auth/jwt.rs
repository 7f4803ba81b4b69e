//! JWT token management
//!
//! Issues and validates the short-lived identity tokens handed out after
//! a successful authentication. Tokens carry the principal's login and
//! role and expire 10 minutes after issuance; there is no refresh path,
//! expired callers must authenticate again.

use crate::auth::Role;
use crate::error::AppError;
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

/// Access token expiration
pub const TOKEN_LIFETIME_MINUTES: i64 = 10;

/// JWT claims
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user login)
    pub sub: String,
    /// Role of the principal
    pub role: Role,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

/// Issue a signed access token for a verified principal
pub fn issue_token(login: &str, role: Role, secret: &str) -> Result<String, AppError> {
    let now = Utc::now();

    let claims = Claims {
        sub: login.to_string(),
        role,
        exp: (now + Duration::minutes(TOKEN_LIFETIME_MINUTES)).timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("Failed to create access token: {}", e)))
}

/// Decode and validate an access token
pub fn decode_token(token: &str, secret: &str) -> Result<Claims, AppError> {
    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => {
            AppError::Token("Token expired".to_string())
        }
        jsonwebtoken::errors::ErrorKind::InvalidToken => {
            AppError::Token("Invalid token".to_string())
        }
        _ => AppError::Token(format!("Token validation failed: {}", e)),
    })?;

    Ok(token_data.claims)
}
