//! User route handlers
//!
//! Thin wrappers over the directory operations: payloads are validated
//! here, the verified principal comes from the auth middleware, and all
//! policy decisions happen inside the directory.

use crate::auth::Principal;
use crate::error::{user_not_found, AppError};
use crate::state::SharedState;
use crate::user::{
    CreateUserRequest, LoginUpdateRequest, PasswordUpdateRequest, ProfileUpdateRequest,
    UserResponse,
};
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Serialize)]
pub struct UserEnvelope {
    pub success: bool,
    pub user: UserResponse,
}

impl From<crate::user::User> for UserEnvelope {
    fn from(user: crate::user::User) -> Self {
        Self {
            success: true,
            user: user.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UsersEnvelope {
    pub success: bool,
    pub users: Vec<UserResponse>,
}

#[derive(Debug, Serialize)]
pub struct DeletedEnvelope {
    pub success: bool,
    pub message: String,
}

fn validate<T: Validate>(payload: &T) -> Result<(), AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))
}

/// POST /api/users
///
/// Create a new user (admin only).
pub async fn create_user(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Json(req): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<UserEnvelope>), AppError> {
    validate(&req)?;
    let user = state.directory.create_user(req, &principal).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PATCH /api/users/{login}
///
/// Partial profile update: name, gender and/or birthday.
pub async fn update_profile(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(login): Path<String>,
    Json(req): Json<ProfileUpdateRequest>,
) -> Result<Json<UserEnvelope>, AppError> {
    validate(&req)?;
    let user = state
        .directory
        .update_profile(&login, req, &principal)
        .await?;
    Ok(Json(user.into()))
}

/// PUT /api/users/{login}/password
pub async fn update_password(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(login): Path<String>,
    Json(req): Json<PasswordUpdateRequest>,
) -> Result<Json<UserEnvelope>, AppError> {
    validate(&req)?;
    let user = state
        .directory
        .update_password(&login, &req.new_password, &principal)
        .await?;
    Ok(Json(user.into()))
}

/// PUT /api/users/{login}/login
pub async fn update_login(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(login): Path<String>,
    Json(req): Json<LoginUpdateRequest>,
) -> Result<Json<UserEnvelope>, AppError> {
    validate(&req)?;
    let user = state
        .directory
        .update_login(&login, &req.new_login, &principal)
        .await?;
    Ok(Json(user.into()))
}

/// GET /api/users
///
/// Active users ordered by creation time (admin only).
pub async fn list_active(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
) -> Result<Json<UsersEnvelope>, AppError> {
    let users = state.directory.list_active(&principal).await?;
    Ok(Json(UsersEnvelope {
        success: true,
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

/// GET /api/users/{login}
///
/// Full record regardless of state (admin only).
pub async fn get_by_login(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(login): Path<String>,
) -> Result<Json<UserEnvelope>, AppError> {
    let user = state
        .directory
        .get_by_login(&login, &principal)
        .await?
        .ok_or_else(|| user_not_found(&login))?;
    Ok(Json(user.into()))
}

#[derive(Debug, Deserialize)]
pub struct FullProfileRequest {
    pub login: String,
    pub password: String,
}

/// POST /api/users/me
///
/// Self-service record read gated by a password re-check rather than a
/// role. Wrong credentials look the same as an unknown login.
pub async fn get_full_profile(
    State(state): State<SharedState>,
    Json(req): Json<FullProfileRequest>,
) -> Result<Json<UserEnvelope>, AppError> {
    let user = state
        .directory
        .get_full_profile(&req.login, &req.password)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Invalid login or password".to_string()))?;
    Ok(Json(user.into()))
}

/// GET /api/users/older-than/{age}
///
/// Users of any state older than the given age in years (admin only).
pub async fn list_older_than(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(age): Path<u32>,
) -> Result<Json<UsersEnvelope>, AppError> {
    let users = state.directory.list_older_than(age, &principal).await?;
    Ok(Json(UsersEnvelope {
        success: true,
        users: users.into_iter().map(UserResponse::from).collect(),
    }))
}

#[derive(Debug, Deserialize)]
pub struct DeleteParams {
    /// Defaults to a soft delete; pass soft=false for permanent removal
    pub soft: Option<bool>,
}

/// DELETE /api/users/{login}?soft=bool
pub async fn delete_user(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(login): Path<String>,
    Query(params): Query<DeleteParams>,
) -> Result<Json<DeletedEnvelope>, AppError> {
    let soft = params.soft.unwrap_or(true);
    state.directory.delete(&login, soft, &principal).await?;
    Ok(Json(DeletedEnvelope {
        success: true,
        message: if soft {
            format!("User '{}' revoked", login)
        } else {
            format!("User '{}' permanently deleted", login)
        },
    }))
}

/// POST /api/users/{login}/restore
pub async fn restore_user(
    State(state): State<SharedState>,
    Extension(principal): Extension<Principal>,
    Path(login): Path<String>,
) -> Result<Json<UserEnvelope>, AppError> {
    let user = state.directory.restore(&login, &principal).await?;
    Ok(Json(user.into()))
}
