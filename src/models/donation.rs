//! Donation data models and API request/response types.
//!
//! This module defines:
//! - `Donation`: Database entity for a surplus food listing
//! - `DonationRequest`: A receiver's claim on a donation
//! - Request bodies for listing CRUD and request handling
//! - Response types, including the role-switched notification payload

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Food categories a donation can be tagged with.
pub const CATEGORIES: [&str; 8] = [
    "vegetarian",
    "vegan",
    "non_veg",
    "halal",
    "kosher",
    "gluten_free",
    "dairy_free",
    "other",
];

pub fn is_valid_category(category: &str) -> bool {
    CATEGORIES.contains(&category)
}

fn default_category() -> String {
    "other".to_string()
}

/// Represents a donation record from the database.
///
/// # Database Table
///
/// Maps to the `donations` table. Each donation:
/// - Belongs to one donor (via `donor_id`)
/// - Carries a pickup window and an expiry date used by browse filters
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct Donation {
    /// Unique identifier for this donation
    pub id: Uuid,

    /// Foreign key to the donor who listed this food
    pub donor_id: Uuid,

    pub food_title: String,

    pub description: String,

    /// Free-form quantity (e.g., "40 meals", "5 kg rice")
    pub quantity: String,

    pub pickup_location: String,

    /// Last day the food is good for pickup
    pub expiry_date: NaiveDate,

    /// One of [`CATEGORIES`]
    pub category: String,

    pub pickup_time_start: Option<NaiveTime>,

    pub pickup_time_end: Option<NaiveTime>,

    pub created_at: DateTime<Utc>,
}

/// Request body for creating a new donation listing.
///
/// # JSON Example
///
/// ```json
/// {
///   "food_title": "Leftover wedding buffet",
///   "description": "Rice, dal, and 60 rotis",
///   "quantity": "60 meals",
///   "pickup_location": "Taj Hotel, Colaba, Mumbai",
///   "expiry_date": "2025-01-06",
///   "category": "vegetarian",
///   "pickup_time_start": "18:00:00",
///   "pickup_time_end": "21:00:00"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct CreateDonationRequest {
    pub food_title: String,

    pub description: String,

    pub quantity: String,

    pub pickup_location: String,

    pub expiry_date: NaiveDate,

    /// Defaults to "other" if not provided
    #[serde(default = "default_category")]
    pub category: String,

    pub pickup_time_start: Option<NaiveTime>,

    pub pickup_time_end: Option<NaiveTime>,
}

/// Request body for editing an existing donation. Full replace.
#[derive(Debug, Deserialize)]
pub struct UpdateDonationRequest {
    pub food_title: String,
    pub description: String,
    pub quantity: String,
    pub pickup_location: String,
    pub expiry_date: NaiveDate,
    #[serde(default = "default_category")]
    pub category: String,
    pub pickup_time_start: Option<NaiveTime>,
    pub pickup_time_end: Option<NaiveTime>,
}

/// Query parameters accepted by the donation browse endpoint.
///
/// All filters are optional and combine with AND semantics:
/// - `search`: substring match on title, description, or pickup location
/// - `category`: exact category match
/// - `expiry`: one of `today`, `week`, `month` (see [`expiry_window`])
/// - `lat`/`lon` (+ optional `radius_km`): keep only donations whose donor is
///   within the radius, sorted nearest first
#[derive(Debug, Deserialize)]
pub struct BrowseDonationsQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub expiry: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub radius_km: Option<f64>,
}

/// Inclusive date bounds for an expiry filter keyword.
///
/// Returns `None` for unknown keywords, which browse treats as "no filter".
///
/// - `today`: just today
/// - `week`: today through today + 7 days
/// - `month`: today through today + 30 days
pub fn expiry_window(filter: &str, today: NaiveDate) -> Option<(NaiveDate, NaiveDate)> {
    match filter {
        "today" => Some((today, today)),
        "week" => Some((today, today + Duration::days(7))),
        "month" => Some((today, today + Duration::days(30))),
        _ => None,
    }
}

/// Donation row joined with its donor, as fetched by the browse query.
///
/// Donor coordinates feed the nearby filter; they are not serialized directly.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DonationWithDonor {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub food_title: String,
    pub description: String,
    pub quantity: String,
    pub pickup_location: String,
    pub expiry_date: NaiveDate,
    pub category: String,
    pub pickup_time_start: Option<NaiveTime>,
    pub pickup_time_end: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,
    pub donor_name: String,
    pub donor_latitude: Option<f64>,
    pub donor_longitude: Option<f64>,
}

/// Response body for donation endpoints.
///
/// `donor_name` is present on browse results (where the donor is joined in)
/// and `distance_km` only when a nearby filter was applied.
#[derive(Debug, Serialize)]
pub struct DonationResponse {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub food_title: String,
    pub description: String,
    pub quantity: String,
    pub pickup_location: String,
    pub expiry_date: NaiveDate,
    pub category: String,
    pub pickup_time_start: Option<NaiveTime>,
    pub pickup_time_end: Option<NaiveTime>,
    pub created_at: DateTime<Utc>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_km: Option<f64>,
}

impl From<Donation> for DonationResponse {
    fn from(d: Donation) -> Self {
        Self {
            id: d.id,
            donor_id: d.donor_id,
            food_title: d.food_title,
            description: d.description,
            quantity: d.quantity,
            pickup_location: d.pickup_location,
            expiry_date: d.expiry_date,
            category: d.category,
            pickup_time_start: d.pickup_time_start,
            pickup_time_end: d.pickup_time_end,
            created_at: d.created_at,
            donor_name: None,
            distance_km: None,
        }
    }
}

impl DonationResponse {
    /// Build a browse result, attaching donor name and optional distance.
    pub fn from_joined(row: DonationWithDonor, distance_km: Option<f64>) -> Self {
        Self {
            id: row.id,
            donor_id: row.donor_id,
            food_title: row.food_title,
            description: row.description,
            quantity: row.quantity,
            pickup_location: row.pickup_location,
            expiry_date: row.expiry_date,
            category: row.category,
            pickup_time_start: row.pickup_time_start,
            pickup_time_end: row.pickup_time_end,
            created_at: row.created_at,
            donor_name: Some(row.donor_name),
            distance_km,
        }
    }
}

/// Represents a receiver's request for a donation.
///
/// # Database Table
///
/// Maps to the `donation_requests` table. The pair
/// (`donation_id`, `receiver_id`) is unique: a receiver can request a given
/// donation at most once.
///
/// # Status
///
/// - "pending": waiting for the donor's decision
/// - "approved": donor accepted; receiver may arrange a delivery
/// - "rejected": donor declined
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct DonationRequest {
    pub id: Uuid,
    pub donation_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
    pub is_read: bool,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request body for claiming a donation.
#[derive(Debug, Deserialize)]
pub struct CreateRequestBody {
    #[serde(default)]
    pub notes: Option<String>,
}

/// Request body for approving or rejecting a donation request.
///
/// Only "approved" and "rejected" are accepted; anything else is a 400.
#[derive(Debug, Deserialize)]
pub struct UpdateRequestStatusBody {
    pub status: String,
}

/// Response body for donation-request endpoints.
#[derive(Debug, Serialize)]
pub struct RequestResponse {
    pub id: Uuid,
    pub donation_id: Uuid,
    pub receiver_id: Uuid,
    pub status: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<DonationRequest> for RequestResponse {
    fn from(r: DonationRequest) -> Self {
        Self {
            id: r.id,
            donation_id: r.donation_id,
            receiver_id: r.receiver_id,
            status: r.status,
            notes: r.notes,
            created_at: r.created_at,
        }
    }
}

/// One entry in the notification feed.
///
/// Donors see who is asking for which listing; receivers see decisions on
/// their own requests. Timestamps are pre-formatted (`YYYY-MM-DD HH:MM`) the
/// way the dashboard consumes them.
#[derive(Debug, Serialize)]
pub struct NotificationItem {
    pub id: Uuid,
    pub donation_title: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub receiver_name: Option<String>,

    pub status: String,
    pub timestamp: String,
}

/// Response body for the notification poll endpoint.
#[derive(Debug, Serialize)]
pub struct NotificationsResponse {
    pub notifications: Vec<NotificationItem>,
    pub count: usize,
}

/// Response body after marking notifications read.
#[derive(Debug, Serialize)]
pub struct MarkReadResponse {
    pub unread_count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn expiry_window_today_is_a_single_day() {
        let today = day("2025-01-05");
        assert_eq!(expiry_window("today", today), Some((today, today)));
    }

    #[test]
    fn expiry_window_week_spans_seven_days() {
        let today = day("2025-01-05");
        assert_eq!(
            expiry_window("week", today),
            Some((today, day("2025-01-12")))
        );
    }

    #[test]
    fn expiry_window_month_spans_thirty_days() {
        let today = day("2025-01-05");
        assert_eq!(
            expiry_window("month", today),
            Some((today, day("2025-02-04")))
        );
    }

    #[test]
    fn expiry_window_unknown_keyword_is_none() {
        let today = day("2025-01-05");
        assert_eq!(expiry_window("year", today), None);
        assert_eq!(expiry_window("", today), None);
    }

    #[test]
    fn category_validation() {
        assert!(is_valid_category("vegan"));
        assert!(is_valid_category("other"));
        assert!(!is_valid_category("fusion"));
    }
}
