//! Delivery lifecycle HTTP handlers.
//!
//! Thin wrappers over the delivery service: handlers check roles, the
//! service owns the state machine and its transactions.
//!
//! - POST /api/v1/deliveries - Create from an approved request (receiver)
//! - GET /api/v1/deliveries, GET /api/v1/deliveries/{id}
//! - GET /api/v1/deliveries/{id}/fee - Fee breakdown
//! - POST /api/v1/deliveries/{id}/pay - Wallet payment (receiver)
//! - POST /api/v1/deliveries/{id}/assign - Nearest volunteer (receiver/admin)
//! - POST /api/v1/deliveries/{id}/pickup - Volunteer pickup
//! - POST /api/v1/deliveries/{id}/complete - OTP handoff (volunteer)
//! - POST /api/v1/deliveries/{id}/cancel - Cancel with refund
//! - POST /api/v1/deliveries/{id}/rating - Rate a completed delivery

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::analytics::ACTIVITY_DELIVERY_COMPLETED,
    models::delivery::{
        CancelDeliveryRequest, CompleteDeliveryRequest, CreateDeliveryRequest, DeliveryResponse,
        FeeResponse, RateDeliveryRequest, RatingResponse,
    },
    services::{analytics_service, delivery_service},
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use uuid::Uuid;

/// Response body for delivery creation: the delivery plus its price.
#[derive(Debug, Serialize)]
pub struct CreatedDeliveryResponse {
    pub delivery: DeliveryResponse,
    pub fee: FeeResponse,
}

/// Create a delivery from an approved donation request.
///
/// # Response
///
/// - **Success (201 Created)**: The delivery (status `fee_calculated`) and
///   its fee breakdown, so the client can show the price before paying
/// - **Error (403)**: Caller is not a receiver
/// - **Error (404)**: No approved request with this id belongs to the caller
pub async fn create_delivery(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateDeliveryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !auth.is_receiver() {
        return Err(AppError::Forbidden);
    }

    let (delivery, fee) = delivery_service::create_delivery(&pool, auth.user_id, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedDeliveryResponse {
            delivery: delivery.into(),
            fee: fee.into(),
        }),
    ))
}

/// List the deliveries visible to the caller, newest first.
pub async fn list_deliveries(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<DeliveryResponse>>, AppError> {
    let deliveries = delivery_service::list_deliveries(&pool, &auth).await?;

    let responses: Vec<DeliveryResponse> = deliveries.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}

/// Get a single delivery.
///
/// The handoff OTP is included only for the owning receiver, who reads it to
/// the volunteer at the door.
pub async fn get_delivery(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(delivery_id): Path<Uuid>,
) -> Result<Json<DeliveryResponse>, AppError> {
    let delivery = delivery_service::get_delivery(&pool, &auth, delivery_id).await?;

    let otp = (delivery.receiver_id == auth.user_id)
        .then(|| delivery.delivery_otp.clone())
        .flatten();

    Ok(Json(DeliveryResponse::from(delivery).with_otp(otp)))
}

/// Fee breakdown for a delivery.
pub async fn get_fee(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(delivery_id): Path<Uuid>,
) -> Result<Json<FeeResponse>, AppError> {
    let fee = delivery_service::get_fee(&pool, &auth, delivery_id).await?;

    Ok(Json(fee.into()))
}

/// Pay the delivery fee from the receiver's wallet.
///
/// On plans with auto-assign the nearest volunteer is attached in the same
/// call when one is available.
pub async fn pay_delivery(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(delivery_id): Path<Uuid>,
) -> Result<Json<DeliveryResponse>, AppError> {
    if !auth.is_receiver() {
        return Err(AppError::Forbidden);
    }

    let delivery = delivery_service::pay_delivery(&pool, &auth, delivery_id).await?;

    Ok(Json(delivery.into()))
}

/// Assign the nearest available volunteer.
pub async fn assign_delivery(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(delivery_id): Path<Uuid>,
) -> Result<Json<DeliveryResponse>, AppError> {
    if !auth.is_receiver() && !auth.is_admin() {
        return Err(AppError::Forbidden);
    }

    let delivery = delivery_service::assign_delivery(&pool, &auth, delivery_id).await?;

    Ok(Json(delivery.into()))
}

/// Record pickup; the delivery moves straight to `in_transit`.
pub async fn pickup_delivery(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(delivery_id): Path<Uuid>,
) -> Result<Json<DeliveryResponse>, AppError> {
    if !auth.is_volunteer() {
        return Err(AppError::Forbidden);
    }

    let delivery = delivery_service::pickup_delivery(&pool, auth.user_id, delivery_id).await?;

    Ok(Json(delivery.into()))
}

/// Complete a delivery with the receiver's OTP.
///
/// # Response
///
/// - **Success (200 OK)**: The completed delivery; the volunteer's earning
///   is credited in the same transaction
/// - **Error (422)**: Wrong OTP, nothing changes
pub async fn complete_delivery(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(delivery_id): Path<Uuid>,
    Json(body): Json<CompleteDeliveryRequest>,
) -> Result<Json<DeliveryResponse>, AppError> {
    if !auth.is_volunteer() {
        return Err(AppError::Forbidden);
    }

    let delivery =
        delivery_service::complete_delivery(&pool, auth.user_id, delivery_id, &body.otp).await?;

    analytics_service::record_activity(
        &pool,
        auth.user_id,
        ACTIVITY_DELIVERY_COMPLETED,
        "Completed a delivery",
    )
    .await;

    Ok(Json(delivery.into()))
}

/// Cancel a delivery, refunding the fee when already paid.
pub async fn cancel_delivery(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(delivery_id): Path<Uuid>,
    Json(body): Json<CancelDeliveryRequest>,
) -> Result<Json<DeliveryResponse>, AppError> {
    if !auth.is_receiver() && !auth.is_admin() {
        return Err(AppError::Forbidden);
    }

    let delivery =
        delivery_service::cancel_delivery(&pool, &auth, delivery_id, &body.reason).await?;

    Ok(Json(delivery.into()))
}

/// Rate a completed delivery.
pub async fn rate_delivery(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(delivery_id): Path<Uuid>,
    Json(body): Json<RateDeliveryRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !auth.is_receiver() {
        return Err(AppError::Forbidden);
    }

    let rating = delivery_service::rate_delivery(&pool, auth.user_id, delivery_id, body).await?;

    Ok((StatusCode::CREATED, Json(RatingResponse::from(rating))))
}
