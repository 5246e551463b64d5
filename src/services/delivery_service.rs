//! Delivery service - Core business logic for the delivery lifecycle.
//!
//! This service handles:
//! - Creating a priced delivery from an approved donation request
//! - Wallet payment and the optional auto-assignment that follows
//! - Nearest-volunteer assignment with OTP generation
//! - Pickup, OTP-verified completion, cancellation with refund, and rating
//!
//! # Atomicity Guarantees
//!
//! Every state transition that touches more than one row (payment, completion,
//! cancellation) runs inside a single PostgreSQL transaction with `FOR UPDATE`
//! row locks, so concurrent calls serialize and partial updates cannot leak.

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::{
        delivery::{
            CreateDeliveryRequest, Delivery, DeliveryFee, DeliveryRating, RateDeliveryRequest,
            STATUS_ASSIGNED, STATUS_CANCELLED, STATUS_COMPLETED, STATUS_FEE_CALCULATED,
            STATUS_IN_TRANSIT, STATUS_PAYMENT_CONFIRMED, is_cancellable,
        },
        volunteer::{VolunteerProfile, push_rating},
        wallet::{TXN_DELIVERY_PAYMENT, TXN_REFUND},
    },
    services::{fee, geo, subscription_service, wallet_service},
};
use uuid::Uuid;

/// Generate a 6-digit handoff OTP.
pub fn generate_otp() -> String {
    format!("{:06}", rand::random_range(0..1_000_000u32))
}

/// Row shape for the approved-request join used when creating a delivery.
#[derive(Debug, sqlx::FromRow)]
struct ApprovedRequest {
    donation_id: Uuid,
    pickup_location: String,
    donor_latitude: Option<f64>,
    donor_longitude: Option<f64>,
    receiver_address: String,
    receiver_latitude: Option<f64>,
    receiver_longitude: Option<f64>,
}

/// Create a delivery from an approved donation request.
///
/// # Process
///
/// 1. Load the receiver's approved request with donor and receiver locations
/// 2. Resolve both endpoints (body overrides fall back to profile values)
/// 3. Price the route (haversine distance, default surge)
/// 4. Insert the delivery and its fee row in one transaction
///
/// The new delivery lands in status `fee_calculated`, waiting for payment.
///
/// # Errors
///
/// - `RequestNotFound`: No approved request with this id belongs to the caller
/// - `InvalidRequest`: Donor or receiver location is unknown
pub async fn create_delivery(
    pool: &DbPool,
    receiver_id: Uuid,
    req: CreateDeliveryRequest,
) -> Result<(Delivery, DeliveryFee), AppError> {
    let approved = sqlx::query_as::<_, ApprovedRequest>(
        r#"
        SELECT d.id AS donation_id,
               d.pickup_location,
               donor.latitude AS donor_latitude,
               donor.longitude AS donor_longitude,
               receiver.address AS receiver_address,
               receiver.latitude AS receiver_latitude,
               receiver.longitude AS receiver_longitude
        FROM donation_requests dr
        JOIN donations d ON d.id = dr.donation_id
        JOIN users donor ON donor.id = d.donor_id
        JOIN users receiver ON receiver.id = dr.receiver_id
        WHERE dr.id = $1 AND dr.receiver_id = $2 AND dr.status = 'approved'
        "#,
    )
    .bind(req.request_id)
    .bind(receiver_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::RequestNotFound)?;

    let (Some(pickup_lat), Some(pickup_lon)) =
        (approved.donor_latitude, approved.donor_longitude)
    else {
        return Err(AppError::InvalidRequest(
            "Donor has no known location to pick up from".to_string(),
        ));
    };

    let delivery_lat = req.delivery_latitude.or(approved.receiver_latitude);
    let delivery_lon = req.delivery_longitude.or(approved.receiver_longitude);
    let (Some(delivery_lat), Some(delivery_lon)) = (delivery_lat, delivery_lon) else {
        return Err(AppError::InvalidRequest(
            "Delivery location is required".to_string(),
        ));
    };

    let delivery_address = req
        .delivery_address
        .filter(|a| !a.trim().is_empty())
        .unwrap_or(approved.receiver_address);

    let distance_km = geo::haversine_km(pickup_lat, pickup_lon, delivery_lat, delivery_lon);
    let breakdown = fee::calculate_fee(distance_km, fee::DEFAULT_SURGE);

    // Start database transaction
    let mut tx = pool.begin().await?;

    let delivery = sqlx::query_as::<_, Delivery>(
        r#"
        INSERT INTO deliveries (
            donation_id,
            receiver_id,
            status,
            pickup_latitude,
            pickup_longitude,
            pickup_address,
            delivery_latitude,
            delivery_longitude,
            delivery_address,
            distance_km,
            notes
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        RETURNING *
        "#,
    )
    .bind(approved.donation_id)
    .bind(receiver_id)
    .bind(STATUS_FEE_CALCULATED)
    .bind(pickup_lat)
    .bind(pickup_lon)
    .bind(&approved.pickup_location)
    .bind(delivery_lat)
    .bind(delivery_lon)
    .bind(&delivery_address)
    .bind(distance_km)
    .bind(&req.notes)
    .fetch_one(&mut *tx)
    .await?;

    let fee_row = sqlx::query_as::<_, DeliveryFee>(
        r#"
        INSERT INTO delivery_fees (
            delivery_id,
            base_fee_cents,
            distance_fee_cents,
            surge_multiplier,
            subtotal_cents,
            platform_fee_cents,
            total_fee_cents,
            volunteer_earning_cents,
            platform_commission_cents
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(delivery.id)
    .bind(breakdown.base_fee_cents)
    .bind(breakdown.distance_fee_cents)
    .bind(breakdown.surge_multiplier)
    .bind(breakdown.subtotal_cents)
    .bind(breakdown.platform_fee_cents)
    .bind(breakdown.total_fee_cents)
    .bind(breakdown.volunteer_earning_cents)
    .bind(breakdown.platform_commission_cents)
    .fetch_one(&mut *tx)
    .await?;

    // Commit all changes atomically
    tx.commit().await?;

    Ok((delivery, fee_row))
}

/// Fetch a delivery visible to the caller.
///
/// Receivers see their own deliveries, volunteers the ones assigned to them,
/// admins everything. Anything else is a 404, not a 403, so existence is not
/// leaked.
pub async fn get_delivery(
    pool: &DbPool,
    auth: &AuthContext,
    delivery_id: Uuid,
) -> Result<Delivery, AppError> {
    let delivery = sqlx::query_as::<_, Delivery>("SELECT * FROM deliveries WHERE id = $1")
        .bind(delivery_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::DeliveryNotFound)?;

    let visible = auth.is_admin()
        || delivery.receiver_id == auth.user_id
        || delivery.volunteer_id == Some(auth.user_id);

    if !visible {
        return Err(AppError::DeliveryNotFound);
    }

    Ok(delivery)
}

/// List the deliveries the caller may see, newest first.
pub async fn list_deliveries(
    pool: &DbPool,
    auth: &AuthContext,
) -> Result<Vec<Delivery>, AppError> {
    let deliveries = if auth.is_admin() {
        sqlx::query_as::<_, Delivery>("SELECT * FROM deliveries ORDER BY requested_at DESC")
            .fetch_all(pool)
            .await?
    } else {
        sqlx::query_as::<_, Delivery>(
            r#"
            SELECT * FROM deliveries
            WHERE receiver_id = $1 OR volunteer_id = $1
            ORDER BY requested_at DESC
            "#,
        )
        .bind(auth.user_id)
        .fetch_all(pool)
        .await?
    };

    Ok(deliveries)
}

/// Fetch the fee breakdown for a delivery the caller may see.
pub async fn get_fee(
    pool: &DbPool,
    auth: &AuthContext,
    delivery_id: Uuid,
) -> Result<DeliveryFee, AppError> {
    let delivery = get_delivery(pool, auth, delivery_id).await?;

    let fee_row =
        sqlx::query_as::<_, DeliveryFee>("SELECT * FROM delivery_fees WHERE delivery_id = $1")
            .bind(delivery.id)
            .fetch_one(pool)
            .await?;

    Ok(fee_row)
}

/// Pay for a delivery from the receiver's wallet.
///
/// # Process
///
/// 1. Start database transaction
/// 2. Lock the delivery and check it is awaiting payment
/// 3. Debit the wallet for the total fee (row-locked balance check)
/// 4. Mark the fee paid and link the ledger entry
/// 5. Move the delivery to `payment_confirmed` and commit
/// 6. If the receiver's plan auto-assigns volunteers, try an assignment;
///    finding nobody is logged, never an error, the payment stands
///
/// # Errors
///
/// - `DeliveryNotFound`: Not the caller's delivery
/// - `InvalidDeliveryStatus`: Not in `fee_calculated`
/// - `InsufficientBalance`: Wallet cannot cover the fee
pub async fn pay_delivery(
    pool: &DbPool,
    auth: &AuthContext,
    delivery_id: Uuid,
) -> Result<Delivery, AppError> {
    // Start database transaction
    let mut tx = pool.begin().await?;

    let delivery = sqlx::query_as::<_, Delivery>(
        "SELECT * FROM deliveries WHERE id = $1 AND receiver_id = $2 FOR UPDATE",
    )
    .bind(delivery_id)
    .bind(auth.user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::DeliveryNotFound)?;

    if delivery.status != STATUS_FEE_CALCULATED {
        tx.rollback().await?;
        return Err(AppError::InvalidDeliveryStatus(format!(
            "cannot pay a delivery in status {}",
            delivery.status
        )));
    }

    let fee_row =
        sqlx::query_as::<_, DeliveryFee>("SELECT * FROM delivery_fees WHERE delivery_id = $1")
            .bind(delivery.id)
            .fetch_one(&mut *tx)
            .await?;

    sqlx::query(
        r#"
        INSERT INTO wallets (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(auth.user_id)
    .execute(&mut *tx)
    .await?;

    let payment = match wallet_service::debit_locked(
        &mut *tx,
        auth.user_id,
        fee_row.total_fee_cents,
        TXN_DELIVERY_PAYMENT,
        "wallet",
        "Delivery fee",
        Some(delivery.id),
    )
    .await
    {
        Ok(payment) => payment,
        Err(e) => {
            tx.rollback().await?;
            return Err(e);
        }
    };

    sqlx::query(
        "UPDATE delivery_fees SET is_paid = TRUE, payment_transaction_id = $1 WHERE id = $2",
    )
    .bind(payment.id)
    .bind(fee_row.id)
    .execute(&mut *tx)
    .await?;

    let delivery = sqlx::query_as::<_, Delivery>(
        "UPDATE deliveries SET status = $1 WHERE id = $2 RETURNING *",
    )
    .bind(STATUS_PAYMENT_CONFIRMED)
    .bind(delivery.id)
    .fetch_one(&mut *tx)
    .await?;

    // Commit all changes atomically
    tx.commit().await?;

    let plan = subscription_service::effective_plan(pool, auth.user_id).await?;
    if plan.has_volunteer_auto_assign {
        match assign_delivery(pool, auth, delivery.id).await {
            Ok(assigned) => return Ok(assigned),
            Err(AppError::NoVolunteerAvailable) => {
                tracing::warn!(
                    delivery_id = %delivery.id,
                    "auto-assign found no volunteer, delivery stays payment_confirmed"
                );
            }
            Err(e) => return Err(e),
        }
    }

    Ok(delivery)
}

/// Assign the nearest available volunteer to a paid delivery.
///
/// # Process
///
/// 1. Start database transaction
/// 2. Lock the delivery and check it is `payment_confirmed`
/// 3. Load available, verified volunteer profiles and pick the nearest one
///    whose service radius covers the pickup point
/// 4. Generate the handoff OTP, attach the volunteer, mark them busy
///
/// # Errors
///
/// - `DeliveryNotFound`: Not visible to the caller (receiver owner or admin)
/// - `InvalidDeliveryStatus`: Not in `payment_confirmed`
/// - `NoVolunteerAvailable`: Nobody qualifies
pub async fn assign_delivery(
    pool: &DbPool,
    auth: &AuthContext,
    delivery_id: Uuid,
) -> Result<Delivery, AppError> {
    // Start database transaction
    let mut tx = pool.begin().await?;

    let delivery = sqlx::query_as::<_, Delivery>(
        "SELECT * FROM deliveries WHERE id = $1 FOR UPDATE",
    )
    .bind(delivery_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::DeliveryNotFound)?;

    if !auth.is_admin() && delivery.receiver_id != auth.user_id {
        tx.rollback().await?;
        return Err(AppError::DeliveryNotFound);
    }

    if delivery.status != STATUS_PAYMENT_CONFIRMED {
        tx.rollback().await?;
        return Err(AppError::InvalidDeliveryStatus(format!(
            "cannot assign a delivery in status {}",
            delivery.status
        )));
    }

    // Stable order keeps the nearest-volunteer tie-break deterministic
    let candidates = sqlx::query_as::<_, VolunteerProfile>(
        r#"
        SELECT * FROM volunteer_profiles
        WHERE is_available = TRUE AND is_verified = TRUE
        ORDER BY created_at
        FOR UPDATE
        "#,
    )
    .fetch_all(&mut *tx)
    .await?;

    let Some((chosen, _distance)) = geo::nearest_volunteer(
        delivery.pickup_latitude,
        delivery.pickup_longitude,
        &candidates,
    ) else {
        tx.rollback().await?;
        return Err(AppError::NoVolunteerAvailable);
    };

    let otp = generate_otp();

    let delivery = sqlx::query_as::<_, Delivery>(
        r#"
        UPDATE deliveries
        SET volunteer_id = $1,
            delivery_otp = $2,
            status = $3,
            assigned_at = NOW()
        WHERE id = $4
        RETURNING *
        "#,
    )
    .bind(chosen.user_id)
    .bind(&otp)
    .bind(STATUS_ASSIGNED)
    .bind(delivery.id)
    .fetch_one(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE volunteer_profiles
        SET status = 'busy',
            is_available = FALSE,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(chosen.id)
    .execute(&mut *tx)
    .await?;

    // Commit all changes atomically
    tx.commit().await?;

    Ok(delivery)
}

/// Record pickup by the assigned volunteer.
///
/// The single endpoint covers both legs: the delivery moves straight to
/// `in_transit` with `picked_up_at` stamped.
pub async fn pickup_delivery(
    pool: &DbPool,
    volunteer_user_id: Uuid,
    delivery_id: Uuid,
) -> Result<Delivery, AppError> {
    let delivery = sqlx::query_as::<_, Delivery>(
        "SELECT * FROM deliveries WHERE id = $1 AND volunteer_id = $2",
    )
    .bind(delivery_id)
    .bind(volunteer_user_id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::DeliveryNotFound)?;

    if delivery.status != STATUS_ASSIGNED {
        return Err(AppError::InvalidDeliveryStatus(format!(
            "cannot pick up a delivery in status {}",
            delivery.status
        )));
    }

    let delivery = sqlx::query_as::<_, Delivery>(
        r#"
        UPDATE deliveries
        SET status = $1, picked_up_at = NOW()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(STATUS_IN_TRANSIT)
    .bind(delivery.id)
    .fetch_one(pool)
    .await?;

    Ok(delivery)
}

/// Complete a delivery with the receiver's OTP.
///
/// # Process
///
/// 1. Start database transaction
/// 2. Lock the delivery, check it is in transit and assigned to the caller
/// 3. Compare the submitted OTP (exact match); a mismatch changes nothing
/// 4. Mark delivered + completed, stamp the timestamps
/// 5. Write the volunteer's earning row and bump the profile counters,
///    freeing the volunteer for the next job
///
/// # Errors
///
/// - `DeliveryNotFound`: Not assigned to the caller
/// - `InvalidDeliveryStatus`: Not in `in_transit`
/// - `InvalidOtp`: Submitted OTP does not match
pub async fn complete_delivery(
    pool: &DbPool,
    volunteer_user_id: Uuid,
    delivery_id: Uuid,
    otp: &str,
) -> Result<Delivery, AppError> {
    // Start database transaction
    let mut tx = pool.begin().await?;

    let delivery = sqlx::query_as::<_, Delivery>(
        "SELECT * FROM deliveries WHERE id = $1 AND volunteer_id = $2 FOR UPDATE",
    )
    .bind(delivery_id)
    .bind(volunteer_user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::DeliveryNotFound)?;

    if delivery.status != STATUS_IN_TRANSIT {
        tx.rollback().await?;
        return Err(AppError::InvalidDeliveryStatus(format!(
            "cannot complete a delivery in status {}",
            delivery.status
        )));
    }

    if delivery.delivery_otp.as_deref() != Some(otp) {
        tx.rollback().await?;
        return Err(AppError::InvalidOtp);
    }

    let fee_row =
        sqlx::query_as::<_, DeliveryFee>("SELECT * FROM delivery_fees WHERE delivery_id = $1")
            .bind(delivery.id)
            .fetch_one(&mut *tx)
            .await?;

    let delivery = sqlx::query_as::<_, Delivery>(
        r#"
        UPDATE deliveries
        SET status = $1,
            otp_verified = TRUE,
            delivered_at = NOW(),
            completed_at = NOW()
        WHERE id = $2
        RETURNING *
        "#,
    )
    .bind(STATUS_COMPLETED)
    .bind(delivery.id)
    .fetch_one(&mut *tx)
    .await?;

    let profile = sqlx::query_as::<_, VolunteerProfile>(
        "SELECT * FROM volunteer_profiles WHERE user_id = $1 FOR UPDATE",
    )
    .bind(volunteer_user_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::ProfileNotFound)?;

    sqlx::query(
        r#"
        INSERT INTO volunteer_earnings (
            volunteer_profile_id,
            delivery_id,
            amount_cents,
            platform_commission_cents,
            net_earnings_cents,
            status
        )
        VALUES ($1, $2, $3, $4, $5, 'pending')
        "#,
    )
    .bind(profile.id)
    .bind(delivery.id)
    .bind(fee_row.subtotal_cents)
    .bind(fee_row.platform_commission_cents)
    .bind(fee_row.volunteer_earning_cents)
    .execute(&mut *tx)
    .await?;

    sqlx::query(
        r#"
        UPDATE volunteer_profiles
        SET total_deliveries = total_deliveries + 1,
            successful_deliveries = successful_deliveries + 1,
            total_earnings_cents = total_earnings_cents + $1,
            pending_payout_cents = pending_payout_cents + $1,
            status = 'available',
            is_available = TRUE,
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(fee_row.volunteer_earning_cents)
    .bind(profile.id)
    .execute(&mut *tx)
    .await?;

    // Commit all changes atomically
    tx.commit().await?;

    Ok(delivery)
}

/// Cancel a delivery, refunding the fee when it was already paid.
///
/// # Errors
///
/// - `DeliveryNotFound`: Not the caller's delivery (receiver owner or admin)
/// - `InvalidDeliveryStatus`: Already completed or cancelled
pub async fn cancel_delivery(
    pool: &DbPool,
    auth: &AuthContext,
    delivery_id: Uuid,
    reason: &str,
) -> Result<Delivery, AppError> {
    // Start database transaction
    let mut tx = pool.begin().await?;

    let delivery = sqlx::query_as::<_, Delivery>(
        "SELECT * FROM deliveries WHERE id = $1 FOR UPDATE",
    )
    .bind(delivery_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::DeliveryNotFound)?;

    if !auth.is_admin() && delivery.receiver_id != auth.user_id {
        tx.rollback().await?;
        return Err(AppError::DeliveryNotFound);
    }

    if !is_cancellable(&delivery.status) {
        tx.rollback().await?;
        return Err(AppError::InvalidDeliveryStatus(format!(
            "cannot cancel a delivery in status {}",
            delivery.status
        )));
    }

    let fee_row =
        sqlx::query_as::<_, DeliveryFee>("SELECT * FROM delivery_fees WHERE delivery_id = $1")
            .bind(delivery.id)
            .fetch_one(&mut *tx)
            .await?;

    if fee_row.is_paid {
        match wallet_service::credit_locked(
            &mut *tx,
            delivery.receiver_id,
            fee_row.total_fee_cents,
            TXN_REFUND,
            "wallet",
            "Delivery cancelled, fee refunded",
            Some(delivery.id),
        )
        .await
        {
            Ok(_) => {}
            Err(e) => {
                tx.rollback().await?;
                return Err(e);
            }
        }
    }

    if let Some(volunteer_user_id) = delivery.volunteer_id {
        sqlx::query(
            r#"
            UPDATE volunteer_profiles
            SET status = 'available',
                is_available = TRUE,
                cancelled_deliveries = cancelled_deliveries + 1,
                updated_at = NOW()
            WHERE user_id = $1
            "#,
        )
        .bind(volunteer_user_id)
        .execute(&mut *tx)
        .await?;
    }

    let delivery = sqlx::query_as::<_, Delivery>(
        r#"
        UPDATE deliveries
        SET status = $1, cancellation_reason = $2
        WHERE id = $3
        RETURNING *
        "#,
    )
    .bind(STATUS_CANCELLED)
    .bind(reason)
    .bind(delivery.id)
    .fetch_one(&mut *tx)
    .await?;

    // Commit all changes atomically
    tx.commit().await?;

    Ok(delivery)
}

/// Rate a completed delivery.
///
/// One rating per delivery; the volunteer's running average is updated in the
/// same transaction.
///
/// # Errors
///
/// - `InvalidRequest`: Rating outside 1..=5
/// - `DeliveryNotFound`: Not the caller's delivery
/// - `InvalidDeliveryStatus`: Delivery not completed
/// - `DuplicateRating`: Already rated
pub async fn rate_delivery(
    pool: &DbPool,
    receiver_id: Uuid,
    delivery_id: Uuid,
    req: RateDeliveryRequest,
) -> Result<DeliveryRating, AppError> {
    if !(1..=5).contains(&req.rating) {
        return Err(AppError::InvalidRequest(
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    // Start database transaction
    let mut tx = pool.begin().await?;

    let delivery = sqlx::query_as::<_, Delivery>(
        "SELECT * FROM deliveries WHERE id = $1 AND receiver_id = $2 FOR UPDATE",
    )
    .bind(delivery_id)
    .bind(receiver_id)
    .fetch_optional(&mut *tx)
    .await?
    .ok_or(AppError::DeliveryNotFound)?;

    if delivery.status != STATUS_COMPLETED {
        tx.rollback().await?;
        return Err(AppError::InvalidDeliveryStatus(
            "only completed deliveries can be rated".to_string(),
        ));
    }

    let already_rated: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM delivery_ratings WHERE delivery_id = $1)")
            .bind(delivery.id)
            .fetch_one(&mut *tx)
            .await?;

    if already_rated {
        tx.rollback().await?;
        return Err(AppError::DuplicateRating);
    }

    let rating = sqlx::query_as::<_, DeliveryRating>(
        r#"
        INSERT INTO delivery_ratings (delivery_id, rated_by, rating, review)
        VALUES ($1, $2, $3, $4)
        RETURNING *
        "#,
    )
    .bind(delivery.id)
    .bind(receiver_id)
    .bind(req.rating)
    .bind(&req.review)
    .fetch_one(&mut *tx)
    .await?;

    if let Some(volunteer_user_id) = delivery.volunteer_id {
        let profile = sqlx::query_as::<_, VolunteerProfile>(
            "SELECT * FROM volunteer_profiles WHERE user_id = $1 FOR UPDATE",
        )
        .bind(volunteer_user_id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(profile) = profile {
            let (average, count) =
                push_rating(profile.average_rating, profile.total_ratings, req.rating);

            sqlx::query(
                r#"
                UPDATE volunteer_profiles
                SET average_rating = $1,
                    total_ratings = $2,
                    updated_at = NOW()
                WHERE id = $3
                "#,
            )
            .bind(average)
            .bind(count)
            .bind(profile.id)
            .execute(&mut *tx)
            .await?;
        }
    }

    // Commit all changes atomically
    tx.commit().await?;

    Ok(rating)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_six_ascii_digits() {
        for _ in 0..100 {
            let otp = generate_otp();
            assert_eq!(otp.len(), 6);
            assert!(otp.chars().all(|c| c.is_ascii_digit()));
        }
    }
}
