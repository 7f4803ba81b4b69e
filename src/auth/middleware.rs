//! Authentication middleware
//!
//! Extracts and validates JWT tokens from requests, turning the claims
//! into a [`Principal`] available to downstream handlers.

use crate::auth::{decode_token, Principal};
use crate::error::AppError;
use crate::state::SharedState;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Extract the calling principal from the request
pub async fn auth_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".to_string()))?;

    let claims = decode_token(token, &state.jwt_secret)?;
    let principal = Principal::new(claims.sub, claims.role);

    // Insert the principal into request extensions for handlers to use
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}
