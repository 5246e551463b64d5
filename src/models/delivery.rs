//! Delivery data models and API request/response types.
//!
//! This module defines:
//! - `Delivery`: Database entity for one volunteer-carried delivery
//! - `DeliveryFee`: The immutable fee breakdown priced for a delivery
//! - `DeliveryRating`: A receiver's one-time rating of a completed delivery
//! - Request bodies for the delivery lifecycle endpoints
//! - Response types, with the OTP only exposed to the paying receiver

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Delivery lifecycle statuses, in forward order.
///
/// A delivery normally walks this list left to right; `cancelled` can be
/// entered from any status before `completed`.
pub const STATUS_REQUESTED: &str = "requested";
pub const STATUS_FEE_CALCULATED: &str = "fee_calculated";
pub const STATUS_PAYMENT_CONFIRMED: &str = "payment_confirmed";
pub const STATUS_ASSIGNED: &str = "assigned";
pub const STATUS_PICKED_UP: &str = "picked_up";
pub const STATUS_IN_TRANSIT: &str = "in_transit";
pub const STATUS_DELIVERED: &str = "delivered";
pub const STATUS_COMPLETED: &str = "completed";
pub const STATUS_CANCELLED: &str = "cancelled";

/// Whether a delivery in `status` may still be cancelled.
///
/// Completed deliveries are final and cancelling twice is a no-op we reject.
pub fn is_cancellable(status: &str) -> bool {
    status != STATUS_COMPLETED && status != STATUS_CANCELLED
}

/// Represents a delivery record from the database.
///
/// # Database Table
///
/// Maps to the `deliveries` table. Each delivery:
/// - Links a donation to the receiver who paid for transport
/// - Holds both endpoints as coordinates plus free-form addresses
/// - Carries the 6-digit OTP the receiver reads to the volunteer at handoff
///
/// `volunteer_id` is NULL until assignment and set back to NULL if the
/// volunteer account is deleted (FK is ON DELETE SET NULL).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Delivery {
    pub id: Uuid,

    /// Donation being transported
    pub donation_id: Uuid,

    /// Receiver who created (and pays for) this delivery
    pub receiver_id: Uuid,

    /// Assigned volunteer, if any
    pub volunteer_id: Option<Uuid>,

    /// One of the `STATUS_*` constants
    pub status: String,

    pub pickup_latitude: f64,

    pub pickup_longitude: f64,

    pub pickup_address: String,

    pub delivery_latitude: f64,

    pub delivery_longitude: f64,

    pub delivery_address: String,

    /// Haversine distance between the two endpoints, rounded to 2 decimals
    pub distance_km: f64,

    /// 6-digit handoff code, generated at assignment
    pub delivery_otp: Option<String>,

    pub otp_verified: bool,

    pub requested_at: DateTime<Utc>,

    pub assigned_at: Option<DateTime<Utc>>,

    pub picked_up_at: Option<DateTime<Utc>>,

    pub delivered_at: Option<DateTime<Utc>>,

    pub completed_at: Option<DateTime<Utc>>,

    pub notes: Option<String>,

    pub cancellation_reason: Option<String>,
}

/// The priced fee breakdown for a delivery.
///
/// # Database Table
///
/// Maps to the `delivery_fees` table, one row per delivery. All money fields
/// are integer cents (INR paise). The row is written once when the delivery
/// is created and only `is_paid`/`payment_transaction_id` change afterwards.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeliveryFee {
    pub id: Uuid,
    pub delivery_id: Uuid,

    /// Flat base charge
    pub base_fee_cents: i64,

    /// Per-kilometer charge over the computed distance
    pub distance_fee_cents: i64,

    /// Demand multiplier applied to base + distance (1.0 = no surge)
    pub surge_multiplier: f64,

    /// (base + distance) * surge, the amount split with the volunteer
    pub subtotal_cents: i64,

    /// 10% service charge added on top, paid by the receiver
    pub platform_fee_cents: i64,

    /// What the receiver's wallet is debited
    pub total_fee_cents: i64,

    /// Volunteer's 90% share of the subtotal
    pub volunteer_earning_cents: i64,

    /// Platform's share; always `subtotal - volunteer_earning`
    pub platform_commission_cents: i64,

    pub is_paid: bool,

    /// Wallet transaction that settled this fee, once paid
    pub payment_transaction_id: Option<Uuid>,

    pub created_at: DateTime<Utc>,
}

/// A receiver's rating of a completed delivery.
///
/// # Database Table
///
/// Maps to the `delivery_ratings` table. `delivery_id` is unique: each
/// delivery can be rated exactly once.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DeliveryRating {
    pub id: Uuid,
    pub delivery_id: Uuid,
    pub rated_by: Uuid,

    /// 1 through 5 stars
    pub rating: i32,

    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Request body for creating a delivery from an approved donation request.
///
/// Delivery coordinates and address are optional; when omitted they fall back
/// to the receiver's profile location.
///
/// # JSON Example
///
/// ```json
/// {
///   "request_id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
///   "delivery_address": "Shelter back gate, Sion, Mumbai",
///   "delivery_latitude": 19.0433,
///   "delivery_longitude": 72.8656,
///   "notes": "Call on arrival"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateDeliveryRequest {
    /// The approved donation request this delivery fulfills
    pub request_id: Uuid,

    pub delivery_address: Option<String>,

    pub delivery_latitude: Option<f64>,

    pub delivery_longitude: Option<f64>,

    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for completing a delivery at handoff.
///
/// The volunteer submits the OTP the receiver reads out; a mismatch is a 422
/// and leaves the delivery untouched.
#[derive(Debug, Deserialize)]
pub struct CompleteDeliveryRequest {
    pub otp: String,
}

/// Request body for cancelling a delivery.
#[derive(Debug, Deserialize)]
pub struct CancelDeliveryRequest {
    pub reason: String,
}

/// Request body for rating a completed delivery.
///
/// `rating` must be 1 through 5; anything else is a 400.
#[derive(Debug, Deserialize)]
pub struct RateDeliveryRequest {
    pub rating: i32,

    #[serde(default)]
    pub review: Option<String>,
}

/// Response body for delivery endpoints.
///
/// The OTP is serialized only when present, and it is only attached for the
/// receiver who owns the delivery (see [`DeliveryResponse::with_otp`]).
#[derive(Debug, Serialize)]
pub struct DeliveryResponse {
    pub id: Uuid,
    pub donation_id: Uuid,
    pub receiver_id: Uuid,
    pub volunteer_id: Option<Uuid>,
    pub status: String,
    pub pickup_address: String,
    pub delivery_address: String,
    pub distance_km: f64,
    pub otp_verified: bool,
    pub requested_at: DateTime<Utc>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub picked_up_at: Option<DateTime<Utc>>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notes: Option<String>,
    pub cancellation_reason: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub delivery_otp: Option<String>,
}

impl From<Delivery> for DeliveryResponse {
    fn from(d: Delivery) -> Self {
        Self {
            id: d.id,
            donation_id: d.donation_id,
            receiver_id: d.receiver_id,
            volunteer_id: d.volunteer_id,
            status: d.status,
            pickup_address: d.pickup_address,
            delivery_address: d.delivery_address,
            distance_km: d.distance_km,
            otp_verified: d.otp_verified,
            requested_at: d.requested_at,
            assigned_at: d.assigned_at,
            picked_up_at: d.picked_up_at,
            delivered_at: d.delivered_at,
            completed_at: d.completed_at,
            notes: d.notes,
            cancellation_reason: d.cancellation_reason,
            delivery_otp: None,
        }
    }
}

impl DeliveryResponse {
    /// Attach the handoff OTP. Only call this for the owning receiver.
    pub fn with_otp(mut self, otp: Option<String>) -> Self {
        self.delivery_otp = otp;
        self
    }
}

/// Response body for the fee breakdown endpoint.
#[derive(Debug, Serialize)]
pub struct FeeResponse {
    pub delivery_id: Uuid,
    pub base_fee_cents: i64,
    pub distance_fee_cents: i64,
    pub surge_multiplier: f64,
    pub subtotal_cents: i64,
    pub platform_fee_cents: i64,
    pub total_fee_cents: i64,
    pub volunteer_earning_cents: i64,
    pub platform_commission_cents: i64,
    pub is_paid: bool,
}

impl From<DeliveryFee> for FeeResponse {
    fn from(f: DeliveryFee) -> Self {
        Self {
            delivery_id: f.delivery_id,
            base_fee_cents: f.base_fee_cents,
            distance_fee_cents: f.distance_fee_cents,
            surge_multiplier: f.surge_multiplier,
            subtotal_cents: f.subtotal_cents,
            platform_fee_cents: f.platform_fee_cents,
            total_fee_cents: f.total_fee_cents,
            volunteer_earning_cents: f.volunteer_earning_cents,
            platform_commission_cents: f.platform_commission_cents,
            is_paid: f.is_paid,
        }
    }
}

/// Response body for rating endpoints.
#[derive(Debug, Serialize)]
pub struct RatingResponse {
    pub id: Uuid,
    pub delivery_id: Uuid,
    pub rating: i32,
    pub review: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DeliveryRating> for RatingResponse {
    fn from(r: DeliveryRating) -> Self {
        Self {
            id: r.id,
            delivery_id: r.delivery_id,
            rating: r.rating,
            review: r.review,
            created_at: r.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_flight_deliveries_are_cancellable() {
        for status in [
            STATUS_REQUESTED,
            STATUS_FEE_CALCULATED,
            STATUS_PAYMENT_CONFIRMED,
            STATUS_ASSIGNED,
            STATUS_PICKED_UP,
            STATUS_IN_TRANSIT,
            STATUS_DELIVERED,
        ] {
            assert!(is_cancellable(status), "{status} should be cancellable");
        }
    }

    #[test]
    fn terminal_deliveries_are_not_cancellable() {
        assert!(!is_cancellable(STATUS_COMPLETED));
        assert!(!is_cancellable(STATUS_CANCELLED));
    }
}
