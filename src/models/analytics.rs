//! Platform metrics and user activity models.
//!
//! This module defines:
//! - `PlatformMetrics`: Daily aggregate snapshot, upserted on demand
//! - `UserActivity`: Append-only audit trail of notable user actions
//! - Query parameters and response types for the analytics endpoints

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Activity kinds the audit trail records.
pub const ACTIVITY_LOGIN: &str = "login";
pub const ACTIVITY_DONATION_CREATED: &str = "donation_created";
pub const ACTIVITY_REQUEST_SENT: &str = "request_sent";
pub const ACTIVITY_DELIVERY_COMPLETED: &str = "delivery_completed";
pub const ACTIVITY_SUBSCRIPTION_UPGRADED: &str = "subscription_upgraded";
pub const ACTIVITY_WALLET_RECHARGED: &str = "wallet_recharged";

/// One day's platform-wide aggregates.
///
/// # Database Table
///
/// Maps to the `platform_metrics` table (`date` is unique). Rows are computed
/// from live COUNT/SUM queries when requested and upserted, so re-requesting
/// a date refreshes it rather than duplicating it.
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct PlatformMetrics {
    pub id: Uuid,
    pub date: NaiveDate,
    pub total_users: i64,
    pub new_users: i64,
    pub active_users: i64,
    pub total_donations: i64,
    pub new_donations: i64,
    pub completed_donations: i64,
    pub total_deliveries: i64,
    pub successful_deliveries: i64,
    pub cancelled_deliveries: i64,
    pub total_volunteers: i64,
    pub active_volunteers: i64,

    /// Completed deliveries counted as meals kept out of the bin
    pub meals_saved: i64,

    pub revenue_subscriptions_cents: i64,
    pub revenue_deliveries_cents: i64,
    pub revenue_total_cents: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One audit-trail entry.
///
/// # Database Table
///
/// Maps to the `user_activities` table. Inserts are fire-and-forget: a failed
/// write is logged and never fails the request that triggered it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserActivity {
    pub id: Uuid,
    pub user_id: Uuid,

    /// One of the `ACTIVITY_*` constants
    pub activity_type: String,

    pub description: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for the platform metrics endpoint.
///
/// `date` defaults to today when omitted.
#[derive(Debug, Deserialize)]
pub struct MetricsQuery {
    pub date: Option<NaiveDate>,
}

/// Response body for the activity feed endpoint.
#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub id: Uuid,
    pub activity_type: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserActivity> for ActivityResponse {
    fn from(a: UserActivity) -> Self {
        Self {
            id: a.id,
            activity_type: a.activity_type,
            description: a.description,
            created_at: a.created_at,
        }
    }
}
