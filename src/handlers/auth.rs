//! Authentication HTTP handlers.
//!
//! This module implements the auth-related API endpoints:
//! - POST /api/v1/auth/register - Create a user account
//! - POST /api/v1/auth/login - Exchange credentials for a session token
//! - POST /api/v1/auth/logout - Revoke the current session
//! - GET /api/v1/auth/me - Profile of the authenticated user

use crate::{
    config::Config,
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::analytics::ACTIVITY_LOGIN,
    models::user::{LoginRequest, LoginResponse, RegisterRequest, UserResponse},
    services::{analytics_service, auth_service},
};
use axum::{
    Extension, Json,
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

/// Register a new user account.
///
/// # Endpoint
///
/// `POST /api/v1/auth/register`
///
/// # Request Body
///
/// ```json
/// {
///   "full_name": "Akshaya Patra Foundation",
///   "email": "ngo@example.org",
///   "password": "hunter2hunter2",
///   "confirm_password": "hunter2hunter2",
///   "role": "receiver_ngo",
///   "phone_number": "+91-9876543213"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: Returns the created user profile
/// - **Error (400)**: Unknown role or password mismatch
/// - **Error (409)**: Email already registered
pub async fn register(
    State(pool): State<DbPool>,
    Json(request): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AppError> {
    let user = auth_service::register(&pool, request).await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}

/// Log in and mint a session token.
///
/// # Endpoint
///
/// `POST /api/v1/auth/login`
///
/// # Response
///
/// - **Success (200 OK)**: `{"token": "...", "user": {...}}`. The token is
///   shown exactly once; only its hash is stored server side.
/// - **Error (401)**: Unknown email or wrong password
pub async fn login(
    State(pool): State<DbPool>,
    Extension(config): Extension<Config>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let (token, user) = auth_service::login(
        &pool,
        &request.email,
        &request.password,
        config.session_ttl_hours,
    )
    .await?;

    analytics_service::record_activity(&pool, user.id, ACTIVITY_LOGIN, "Logged in").await;

    Ok(Json(LoginResponse {
        token,
        user: user.into(),
    }))
}

/// Revoke the current session.
///
/// Reads the bearer token from the Authorization header (the same one the
/// auth middleware already validated) and deletes its session row.
pub async fn logout(
    State(pool): State<DbPool>,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let token = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .ok_or(AppError::InvalidSession)?;

    auth_service::logout(&pool, token).await?;

    Ok(StatusCode::NO_CONTENT)
}

/// Profile of the authenticated user.
pub async fn me(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<UserResponse>, AppError> {
    let user = auth_service::get_user(&pool, auth.user_id).await?;

    Ok(Json(user.into()))
}
