//! Volunteer profile and earnings models.
//!
//! This module defines:
//! - `VolunteerProfile`: Database entity tracking a volunteer's availability,
//!   location, delivery counters, and payout totals
//! - `VolunteerEarning`: One ledger row per completed delivery
//! - Request bodies for profile management and response types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Vehicle types a volunteer can register with.
pub const VEHICLE_TYPES: [&str; 4] = ["bike", "scooter", "car", "van"];

pub fn is_valid_vehicle_type(vehicle: &str) -> bool {
    VEHICLE_TYPES.contains(&vehicle)
}

/// Availability statuses a volunteer can be in.
pub const AVAILABILITY_STATUSES: [&str; 3] = ["available", "busy", "offline"];

pub fn is_valid_availability(status: &str) -> bool {
    AVAILABILITY_STATUSES.contains(&status)
}

/// Represents a volunteer profile record from the database.
///
/// # Database Table
///
/// Maps to the `volunteer_profiles` table, one row per volunteer user
/// (`user_id` is unique). The profile carries:
/// - Live availability (`status`, `is_available`) and last known location
/// - Delivery counters and the running rating average
/// - Earnings totals in integer cents
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VolunteerProfile {
    pub id: Uuid,

    /// The volunteer user this profile belongs to
    pub user_id: Uuid,

    /// One of [`AVAILABILITY_STATUSES`]
    pub status: String,

    /// Mirrors `status == "available"`; kept as a column for cheap filtering
    pub is_available: bool,

    pub current_latitude: Option<f64>,

    pub current_longitude: Option<f64>,

    pub last_location_update: Option<DateTime<Utc>>,

    /// One of [`VEHICLE_TYPES`]
    pub vehicle_type: String,

    pub max_delivery_capacity: i32,

    /// How far from their location this volunteer accepts pickups
    pub service_radius_km: f64,

    pub total_deliveries: i32,

    pub successful_deliveries: i32,

    pub cancelled_deliveries: i32,

    /// Running average of received ratings, 0 when unrated
    pub average_rating: f64,

    pub total_ratings: i32,

    pub total_earnings_cents: i64,

    /// Earned but not yet paid out
    pub pending_payout_cents: i64,

    /// Whether an operator has verified this volunteer's documents
    pub is_verified: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// One earning ledger entry, written when a delivery completes.
///
/// # Database Table
///
/// Maps to the `volunteer_earnings` table. Amounts are integer cents;
/// `net_earnings_cents` is what actually accrues to the volunteer.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct VolunteerEarning {
    pub id: Uuid,
    pub volunteer_profile_id: Uuid,
    pub delivery_id: Uuid,

    /// Subtotal the split was computed from
    pub amount_cents: i64,

    pub platform_commission_cents: i64,

    pub net_earnings_cents: i64,

    /// Payout status; starts as "pending"
    pub status: String,

    pub payout_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
}

/// Request body for creating a volunteer profile.
///
/// # JSON Example
///
/// ```json
/// {
///   "vehicle_type": "scooter",
///   "max_delivery_capacity": 3,
///   "service_radius_km": 8.0
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateProfileRequest {
    pub vehicle_type: String,

    /// Defaults to 5 if not provided
    pub max_delivery_capacity: Option<i32>,

    /// Defaults to 10 km if not provided
    pub service_radius_km: Option<f64>,
}

/// Request body for the location ping endpoint.
#[derive(Debug, Deserialize)]
pub struct UpdateLocationRequest {
    pub latitude: f64,
    pub longitude: f64,
}

/// Request body for changing availability.
///
/// Only "available", "busy", and "offline" are accepted; anything else is
/// a 400.
#[derive(Debug, Deserialize)]
pub struct UpdateAvailabilityRequest {
    pub status: String,
}

/// Response body for volunteer profile endpoints.
///
/// `success_rate` is computed, not stored: successful / total * 100, or 0
/// when the volunteer has no deliveries yet.
#[derive(Debug, Serialize)]
pub struct ProfileResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub status: String,
    pub is_available: bool,
    pub current_latitude: Option<f64>,
    pub current_longitude: Option<f64>,
    pub last_location_update: Option<DateTime<Utc>>,
    pub vehicle_type: String,
    pub max_delivery_capacity: i32,
    pub service_radius_km: f64,
    pub total_deliveries: i32,
    pub successful_deliveries: i32,
    pub cancelled_deliveries: i32,
    pub success_rate: f64,
    pub average_rating: f64,
    pub total_ratings: i32,
    pub total_earnings_cents: i64,
    pub pending_payout_cents: i64,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

/// Success percentage for a delivery counter pair.
pub fn success_rate(successful: i32, total: i32) -> f64 {
    if total <= 0 {
        return 0.0;
    }
    f64::from(successful) / f64::from(total) * 100.0
}

impl From<VolunteerProfile> for ProfileResponse {
    fn from(p: VolunteerProfile) -> Self {
        let rate = success_rate(p.successful_deliveries, p.total_deliveries);
        Self {
            id: p.id,
            user_id: p.user_id,
            status: p.status,
            is_available: p.is_available,
            current_latitude: p.current_latitude,
            current_longitude: p.current_longitude,
            last_location_update: p.last_location_update,
            vehicle_type: p.vehicle_type,
            max_delivery_capacity: p.max_delivery_capacity,
            service_radius_km: p.service_radius_km,
            total_deliveries: p.total_deliveries,
            successful_deliveries: p.successful_deliveries,
            cancelled_deliveries: p.cancelled_deliveries,
            success_rate: rate,
            average_rating: p.average_rating,
            total_ratings: p.total_ratings,
            total_earnings_cents: p.total_earnings_cents,
            pending_payout_cents: p.pending_payout_cents,
            is_verified: p.is_verified,
            created_at: p.created_at,
        }
    }
}

/// Response body for the earnings list endpoint.
#[derive(Debug, Serialize)]
pub struct EarningResponse {
    pub id: Uuid,
    pub delivery_id: Uuid,
    pub amount_cents: i64,
    pub platform_commission_cents: i64,
    pub net_earnings_cents: i64,
    pub status: String,
    pub payout_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<VolunteerEarning> for EarningResponse {
    fn from(e: VolunteerEarning) -> Self {
        Self {
            id: e.id,
            delivery_id: e.delivery_id,
            amount_cents: e.amount_cents,
            platform_commission_cents: e.platform_commission_cents,
            net_earnings_cents: e.net_earnings_cents,
            status: e.status,
            payout_date: e.payout_date,
            created_at: e.created_at,
        }
    }
}

/// Running average update after one new rating comes in.
///
/// Returns the new (average, count) pair. The incoming average is weighted
/// by the existing count, so callers must pass the pre-update values.
pub fn push_rating(average: f64, count: i32, rating: i32) -> (f64, i32) {
    let new_count = count + 1;
    let new_average = (average * f64::from(count) + f64::from(rating)) / f64::from(new_count);
    (new_average, new_count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vehicle_type_validation() {
        for v in VEHICLE_TYPES {
            assert!(is_valid_vehicle_type(v));
        }
        assert!(!is_valid_vehicle_type("helicopter"));
        assert!(!is_valid_vehicle_type(""));
    }

    #[test]
    fn availability_validation() {
        for s in AVAILABILITY_STATUSES {
            assert!(is_valid_availability(s));
        }
        assert!(!is_valid_availability("sleeping"));
    }

    #[test]
    fn success_rate_handles_zero_deliveries() {
        assert_eq!(success_rate(0, 0), 0.0);
        assert_eq!(success_rate(3, 4), 75.0);
        assert_eq!(success_rate(5, 5), 100.0);
    }

    #[test]
    fn first_rating_becomes_the_average() {
        let (avg, count) = push_rating(0.0, 0, 4);
        assert_eq!(avg, 4.0);
        assert_eq!(count, 1);
    }

    #[test]
    fn rating_average_accumulates() {
        let (avg, count) = push_rating(4.0, 1, 2);
        assert_eq!(avg, 3.0);
        assert_eq!(count, 2);

        let (avg, count) = push_rating(avg, count, 5);
        assert!((avg - 11.0 / 3.0).abs() < 1e-9);
        assert_eq!(count, 3);
    }
}
