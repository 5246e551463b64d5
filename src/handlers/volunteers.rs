//! Volunteer profile HTTP handlers.
//!
//! This module implements the volunteer-facing API endpoints:
//! - POST /api/v1/volunteers/profile - Register as an active volunteer
//! - GET /api/v1/volunteers/profile - Own profile with computed success rate
//! - PUT /api/v1/volunteers/location - Location ping
//! - PUT /api/v1/volunteers/status - Availability change
//! - GET /api/v1/volunteers/earnings - Per-delivery earnings ledger

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::volunteer::{
        CreateProfileRequest, EarningResponse, ProfileResponse, UpdateAvailabilityRequest,
        UpdateLocationRequest, VolunteerEarning, VolunteerProfile, is_valid_availability,
        is_valid_vehicle_type,
    },
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

const DEFAULT_CAPACITY: i32 = 5;
const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Create the caller's volunteer profile.
///
/// # Endpoint
///
/// `POST /api/v1/volunteers/profile`
///
/// # Request Body
///
/// ```json
/// {
///   "vehicle_type": "scooter",
///   "max_delivery_capacity": 3,
///   "service_radius_km": 8.0
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The new profile, starting offline and
///   unverified
/// - **Error (400)**: Unknown vehicle type
/// - **Error (409)**: The caller already has a profile
pub async fn create_profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateProfileRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !auth.is_volunteer() {
        return Err(AppError::Forbidden);
    }

    if !is_valid_vehicle_type(&request.vehicle_type) {
        return Err(AppError::InvalidRequest(format!(
            "Invalid vehicle type '{}'. Valid types: bike, scooter, car, van",
            request.vehicle_type
        )));
    }

    let exists = sqlx::query_scalar::<_, bool>(
        "SELECT EXISTS(SELECT 1 FROM volunteer_profiles WHERE user_id = $1)",
    )
    .bind(auth.user_id)
    .fetch_one(&pool)
    .await?;

    if exists {
        return Err(AppError::ProfileExists);
    }

    let profile = sqlx::query_as::<_, VolunteerProfile>(
        r#"
        INSERT INTO volunteer_profiles (
            user_id, vehicle_type, max_delivery_capacity, service_radius_km
        )
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(auth.user_id)
    .bind(&request.vehicle_type)
    .bind(request.max_delivery_capacity.unwrap_or(DEFAULT_CAPACITY))
    .bind(request.service_radius_km.unwrap_or(DEFAULT_RADIUS_KM))
    .fetch_one(&pool)
    .await?;

    Ok((StatusCode::CREATED, Json(ProfileResponse::from(profile))))
}

/// Get the caller's volunteer profile.
pub async fn get_profile(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = sqlx::query_as::<_, VolunteerProfile>(
        "SELECT * FROM volunteer_profiles WHERE user_id = $1",
    )
    .bind(auth.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::ProfileNotFound)?;

    Ok(Json(profile.into()))
}

/// Record a location ping.
///
/// Updates the volunteer's last known coordinates; assignment uses these to
/// find the nearest candidate.
pub async fn update_location(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<UpdateLocationRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = sqlx::query_as::<_, VolunteerProfile>(
        r#"
        UPDATE volunteer_profiles
        SET current_latitude = $1,
            current_longitude = $2,
            last_location_update = NOW(),
            updated_at = NOW()
        WHERE user_id = $3
        RETURNING *
        "#,
    )
    .bind(request.latitude)
    .bind(request.longitude)
    .bind(auth.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::ProfileNotFound)?;

    Ok(Json(profile.into()))
}

/// Change availability status.
///
/// `is_available` mirrors the status so the assignment query can filter on
/// a single boolean column.
pub async fn update_availability(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<UpdateAvailabilityRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    if !is_valid_availability(&request.status) {
        return Err(AppError::InvalidRequest(format!(
            "Invalid status '{}'. Valid statuses: available, busy, offline",
            request.status
        )));
    }

    let profile = sqlx::query_as::<_, VolunteerProfile>(
        r#"
        UPDATE volunteer_profiles
        SET status = $1,
            is_available = $2,
            updated_at = NOW()
        WHERE user_id = $3
        RETURNING *
        "#,
    )
    .bind(&request.status)
    .bind(request.status == "available")
    .bind(auth.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::ProfileNotFound)?;

    Ok(Json(profile.into()))
}

/// List the caller's earnings, newest first.
pub async fn list_earnings(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<EarningResponse>>, AppError> {
    let earnings = sqlx::query_as::<_, VolunteerEarning>(
        r#"
        SELECT ve.* FROM volunteer_earnings ve
        JOIN volunteer_profiles vp ON vp.id = ve.volunteer_profile_id
        WHERE vp.user_id = $1
        ORDER BY ve.created_at DESC
        "#,
    )
    .bind(auth.user_id)
    .fetch_all(&pool)
    .await?;

    let responses: Vec<EarningResponse> = earnings.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}
