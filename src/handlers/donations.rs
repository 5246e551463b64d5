//! Donation listing and request HTTP handlers.
//!
//! This module implements the donation marketplace endpoints:
//! - POST /api/v1/donations - Create a listing (donor)
//! - GET /api/v1/donations - Browse with filters (receiver)
//! - GET /api/v1/donations/mine - List own listings (donor)
//! - GET/PUT/DELETE /api/v1/donations/{id} - Owner-scoped CRUD
//! - POST /api/v1/donations/{id}/requests - Claim a donation (receiver)
//! - POST /api/v1/requests/{id}/status - Approve or reject (donor)
//! - GET /api/v1/notifications, POST /api/v1/notifications/read

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::analytics::{ACTIVITY_DONATION_CREATED, ACTIVITY_REQUEST_SENT},
    models::donation::{
        BrowseDonationsQuery, CreateDonationRequest, CreateRequestBody, Donation, DonationRequest,
        DonationResponse, DonationWithDonor, MarkReadResponse, NotificationItem,
        NotificationsResponse, RequestResponse, UpdateDonationRequest, UpdateRequestStatusBody,
        expiry_window, is_valid_category,
    },
    services::{analytics_service, geo, subscription_service},
};
use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use uuid::Uuid;

/// Browse radius applied when the plan does not allow a custom one.
const DEFAULT_RADIUS_KM: f64 = 10.0;

/// Create a new donation listing.
///
/// # Endpoint
///
/// `POST /api/v1/donations`
///
/// # Authorization
///
/// Donor roles only. The plan's monthly donation quota is enforced here.
///
/// # Response
///
/// - **Success (201 Created)**: Returns the created listing
/// - **Error (400)**: Unknown category
/// - **Error (403)**: Caller is not a donor
/// - **Error (422)**: Monthly quota exhausted
pub async fn create_donation(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<CreateDonationRequest>,
) -> Result<impl IntoResponse, AppError> {
    if !auth.is_donor() {
        return Err(AppError::Forbidden);
    }

    if !is_valid_category(&request.category) {
        return Err(AppError::InvalidRequest(format!(
            "Unknown category: {}",
            request.category
        )));
    }

    subscription_service::ensure_donation_quota(&pool, auth.user_id).await?;

    let donation = sqlx::query_as::<_, Donation>(
        r#"
        INSERT INTO donations (
            donor_id, food_title, description, quantity, pickup_location,
            expiry_date, category, pickup_time_start, pickup_time_end
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(auth.user_id)
    .bind(&request.food_title)
    .bind(&request.description)
    .bind(&request.quantity)
    .bind(&request.pickup_location)
    .bind(request.expiry_date)
    .bind(&request.category)
    .bind(request.pickup_time_start)
    .bind(request.pickup_time_end)
    .fetch_one(&pool)
    .await?;

    analytics_service::record_activity(
        &pool,
        auth.user_id,
        ACTIVITY_DONATION_CREATED,
        &format!("Listed \"{}\"", donation.food_title),
    )
    .await;

    Ok((StatusCode::CREATED, Json(DonationResponse::from(donation))))
}

/// Browse donations with optional filters.
///
/// # Endpoint
///
/// `GET /api/v1/donations?search=&category=&expiry=&lat=&lon=&radius_km=`
///
/// # Authorization
///
/// Receiver roles (and admins). Donors use `/donations/mine`.
///
/// # Filters
///
/// All filters are optional and combine with AND:
/// - `search`: case-insensitive substring on title, description, or location
/// - `category`: exact match
/// - `expiry`: `today`, `week`, or `month`; unknown keywords are ignored
/// - `lat` + `lon`: keep donations whose donor is within `radius_km`
///   (clamped to 10 km unless the plan has custom geo radius), nearest first
pub async fn browse_donations(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<BrowseDonationsQuery>,
) -> Result<Json<Vec<DonationResponse>>, AppError> {
    if !auth.is_receiver() && !auth.is_admin() {
        return Err(AppError::Forbidden);
    }

    let window = query
        .expiry
        .as_deref()
        .and_then(|keyword| expiry_window(keyword, Utc::now().date_naive()));
    let (expiry_from, expiry_to) = match window {
        Some((from, to)) => (Some(from), Some(to)),
        None => (None, None),
    };

    let rows = sqlx::query_as::<_, DonationWithDonor>(
        r#"
        SELECT d.*, u.full_name AS donor_name,
               u.latitude AS donor_latitude, u.longitude AS donor_longitude
        FROM donations d
        JOIN users u ON u.id = d.donor_id
        WHERE ($1::text IS NULL
               OR d.food_title ILIKE '%' || $1 || '%'
               OR d.description ILIKE '%' || $1 || '%'
               OR d.pickup_location ILIKE '%' || $1 || '%')
          AND ($2::text IS NULL OR d.category = $2)
          AND ($3::date IS NULL OR d.expiry_date BETWEEN $3 AND $4)
        ORDER BY d.created_at DESC
        "#,
    )
    .bind(&query.search)
    .bind(&query.category)
    .bind(expiry_from)
    .bind(expiry_to)
    .fetch_all(&pool)
    .await?;

    // The nearby filter runs in Rust: donor coordinates come back with the
    // rows and the haversine result doubles as the sort key.
    let responses = if let (Some(lat), Some(lon)) = (query.lat, query.lon) {
        let plan = subscription_service::effective_plan(&pool, auth.user_id).await?;
        let radius_km = match query.radius_km {
            Some(requested) if plan.has_geo_radius_custom => requested,
            _ => DEFAULT_RADIUS_KM,
        };

        let mut nearby: Vec<(f64, DonationWithDonor)> = rows
            .into_iter()
            .filter_map(|row| {
                let (Some(d_lat), Some(d_lon)) = (row.donor_latitude, row.donor_longitude)
                else {
                    return None;
                };
                let distance = geo::haversine_km(lat, lon, d_lat, d_lon);
                (distance <= radius_km).then_some((distance, row))
            })
            .collect();
        nearby.sort_by(|a, b| a.0.total_cmp(&b.0));

        nearby
            .into_iter()
            .map(|(distance, row)| DonationResponse::from_joined(row, Some(distance)))
            .collect()
    } else {
        rows.into_iter()
            .map(|row| DonationResponse::from_joined(row, None))
            .collect()
    };

    Ok(Json(responses))
}

/// List the caller's own donations, newest first.
pub async fn list_my_donations(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<DonationResponse>>, AppError> {
    if !auth.is_donor() {
        return Err(AppError::Forbidden);
    }

    let donations = sqlx::query_as::<_, Donation>(
        "SELECT * FROM donations WHERE donor_id = $1 ORDER BY created_at DESC",
    )
    .bind(auth.user_id)
    .fetch_all(&pool)
    .await?;

    let responses: Vec<DonationResponse> = donations.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}

/// Get one of the caller's own donations.
///
/// The query filters by both id and donor, so other users' listings return
/// 404 rather than leaking their existence.
pub async fn get_donation(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(donation_id): Path<Uuid>,
) -> Result<Json<DonationResponse>, AppError> {
    let donation =
        sqlx::query_as::<_, Donation>("SELECT * FROM donations WHERE id = $1 AND donor_id = $2")
            .bind(donation_id)
            .bind(auth.user_id)
            .fetch_optional(&pool)
            .await?
            .ok_or(AppError::DonationNotFound)?;

    Ok(Json(donation.into()))
}

/// Replace one of the caller's own donations.
pub async fn update_donation(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(donation_id): Path<Uuid>,
    Json(request): Json<UpdateDonationRequest>,
) -> Result<Json<DonationResponse>, AppError> {
    if !is_valid_category(&request.category) {
        return Err(AppError::InvalidRequest(format!(
            "Unknown category: {}",
            request.category
        )));
    }

    let donation = sqlx::query_as::<_, Donation>(
        r#"
        UPDATE donations
        SET food_title = $1,
            description = $2,
            quantity = $3,
            pickup_location = $4,
            expiry_date = $5,
            category = $6,
            pickup_time_start = $7,
            pickup_time_end = $8
        WHERE id = $9 AND donor_id = $10
        RETURNING *
        "#,
    )
    .bind(&request.food_title)
    .bind(&request.description)
    .bind(&request.quantity)
    .bind(&request.pickup_location)
    .bind(request.expiry_date)
    .bind(&request.category)
    .bind(request.pickup_time_start)
    .bind(request.pickup_time_end)
    .bind(donation_id)
    .bind(auth.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::DonationNotFound)?;

    Ok(Json(donation.into()))
}

/// Delete one of the caller's own donations.
pub async fn delete_donation(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(donation_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let deleted = sqlx::query("DELETE FROM donations WHERE id = $1 AND donor_id = $2")
        .bind(donation_id)
        .bind(auth.user_id)
        .execute(&pool)
        .await?
        .rows_affected();

    if deleted == 0 {
        return Err(AppError::DonationNotFound);
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Request a donation.
///
/// # Endpoint
///
/// `POST /api/v1/donations/{id}/requests`
///
/// # Authorization
///
/// Receiver roles only. One request per (donation, receiver) pair; the
/// plan's monthly request quota is enforced here.
///
/// # Response
///
/// - **Success (201 Created)**: Returns the pending request
/// - **Error (404)**: Donation does not exist
/// - **Error (409)**: Already requested
/// - **Error (422)**: Monthly quota exhausted
pub async fn create_request(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(donation_id): Path<Uuid>,
    Json(body): Json<CreateRequestBody>,
) -> Result<impl IntoResponse, AppError> {
    if !auth.is_receiver() {
        return Err(AppError::Forbidden);
    }

    let donation_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM donations WHERE id = $1)")
            .bind(donation_id)
            .fetch_one(&pool)
            .await?;

    if !donation_exists {
        return Err(AppError::DonationNotFound);
    }

    let already_requested: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM donation_requests WHERE donation_id = $1 AND receiver_id = $2)",
    )
    .bind(donation_id)
    .bind(auth.user_id)
    .fetch_one(&pool)
    .await?;

    if already_requested {
        return Err(AppError::DuplicateRequest);
    }

    subscription_service::ensure_request_quota(&pool, auth.user_id).await?;

    let request = sqlx::query_as::<_, DonationRequest>(
        r#"
        INSERT INTO donation_requests (donation_id, receiver_id, notes)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(donation_id)
    .bind(auth.user_id)
    .bind(&body.notes)
    .fetch_one(&pool)
    .await?;

    analytics_service::record_activity(
        &pool,
        auth.user_id,
        ACTIVITY_REQUEST_SENT,
        "Requested a donation",
    )
    .await;

    Ok((StatusCode::CREATED, Json(RequestResponse::from(request))))
}

/// Approve or reject a request on one of the caller's donations.
///
/// Only "approved" and "rejected" are accepted. The update also resets
/// `is_read` so the decision shows up as a fresh notification for the
/// receiver.
pub async fn update_request_status(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Path(request_id): Path<Uuid>,
    Json(body): Json<UpdateRequestStatusBody>,
) -> Result<Json<RequestResponse>, AppError> {
    if body.status != "approved" && body.status != "rejected" {
        return Err(AppError::InvalidRequest(format!(
            "Status must be approved or rejected, got {}",
            body.status
        )));
    }

    let request = sqlx::query_as::<_, DonationRequest>(
        r#"
        UPDATE donation_requests dr
        SET status = $1, is_read = FALSE, updated_at = NOW()
        FROM donations d
        WHERE dr.id = $2 AND d.id = dr.donation_id AND d.donor_id = $3
        RETURNING dr.*
        "#,
    )
    .bind(&body.status)
    .bind(request_id)
    .bind(auth.user_id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::RequestNotFound)?;

    Ok(Json(request.into()))
}

/// Row shape for the notification feed queries.
#[derive(Debug, sqlx::FromRow)]
struct NotificationRow {
    id: Uuid,
    donation_title: String,
    receiver_name: Option<String>,
    status: String,
    timestamp: chrono::DateTime<Utc>,
}

/// Notification feed, switched on the caller's role.
///
/// Donors see pending requests against their listings; receivers see
/// decisions on their own requests (rejections always, approvals until
/// marked read). Other roles get an empty feed.
pub async fn notifications(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<NotificationsResponse>, AppError> {
    let rows = if auth.is_donor() {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT dr.id, d.food_title AS donation_title,
                   u.full_name AS receiver_name, dr.status,
                   dr.created_at AS timestamp
            FROM donation_requests dr
            JOIN donations d ON d.id = dr.donation_id
            JOIN users u ON u.id = dr.receiver_id
            WHERE d.donor_id = $1 AND dr.status = 'pending'
            ORDER BY dr.created_at DESC
            "#,
        )
        .bind(auth.user_id)
        .fetch_all(&pool)
        .await?
    } else if auth.is_receiver() {
        sqlx::query_as::<_, NotificationRow>(
            r#"
            SELECT dr.id, d.food_title AS donation_title,
                   NULL::text AS receiver_name, dr.status,
                   dr.updated_at AS timestamp
            FROM donation_requests dr
            JOIN donations d ON d.id = dr.donation_id
            WHERE dr.receiver_id = $1
              AND (dr.status = 'rejected'
                   OR (dr.status = 'approved' AND dr.is_read = FALSE))
            ORDER BY dr.updated_at DESC
            "#,
        )
        .bind(auth.user_id)
        .fetch_all(&pool)
        .await?
    } else {
        Vec::new()
    };

    let notifications: Vec<NotificationItem> = rows
        .into_iter()
        .map(|row| NotificationItem {
            id: row.id,
            donation_title: row.donation_title,
            receiver_name: row.receiver_name,
            status: row.status,
            timestamp: row.timestamp.format("%Y-%m-%d %H:%M").to_string(),
        })
        .collect();

    let count = notifications.len();

    Ok(Json(NotificationsResponse {
        notifications,
        count,
    }))
}

/// Mark the caller's approved notifications as read.
///
/// Rejections stay visible, so only approved requests are touched. Returns
/// the unread count left over afterwards.
pub async fn mark_notifications_read(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<MarkReadResponse>, AppError> {
    sqlx::query(
        r#"
        UPDATE donation_requests
        SET is_read = TRUE
        WHERE receiver_id = $1 AND status = 'approved' AND is_read = FALSE
        "#,
    )
    .bind(auth.user_id)
    .execute(&pool)
    .await?;

    let unread_count: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM donation_requests
        WHERE receiver_id = $1 AND status = 'approved' AND is_read = FALSE
        "#,
    )
    .bind(auth.user_id)
    .fetch_one(&pool)
    .await?;

    Ok(Json(MarkReadResponse { unread_count }))
}
