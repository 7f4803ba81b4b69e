//! Authentication route handlers
//!
//! The login endpoint is the only public route: it verifies credentials
//! through the directory and hands out a short-lived access token.

use crate::auth::{issue_token, Role};
use crate::error::AppError;
use crate::state::SharedState;
use axum::{extract::State, Json};
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub login: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub access_token: String,
}

/// POST /api/auth/login
///
/// Authenticate with login and password, receive a 10-minute JWT.
/// Unknown logins and wrong passwords are indistinguishable here.
pub async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user = state
        .directory
        .authenticate(&req.login, &req.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid login or password".to_string()))?;

    let role = if user.admin { Role::Admin } else { Role::User };
    let access_token = issue_token(&user.login, role, &state.jwt_secret)?;

    Ok(Json(LoginResponse { access_token }))
}
