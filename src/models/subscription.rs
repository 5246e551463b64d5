//! Subscription plan, user subscription, and billing models.
//!
//! This module defines:
//! - `SubscriptionPlan`: A tier's pricing, quotas, and feature flags
//! - `UserSubscription`: A user's current plan enrollment
//! - `BillingRecord`: One row per charge in the billing history
//! - Request bodies and response types for the subscription endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Subscription tiers, cheapest first.
pub const TIER_FREE: &str = "free";
pub const TIER_PRO: &str = "pro";
pub const TIER_ENTERPRISE: &str = "enterprise";

/// Ordering rank for a tier string.
///
/// Unknown tiers rank below free so a corrupt row never unlocks anything.
pub fn tier_rank(tier: &str) -> u8 {
    match tier {
        TIER_FREE => 1,
        TIER_PRO => 2,
        TIER_ENTERPRISE => 3,
        _ => 0,
    }
}

/// Billing cycles accepted by the subscribe endpoint.
pub const CYCLE_MONTHLY: &str = "monthly";
pub const CYCLE_YEARLY: &str = "yearly";

/// Represents a subscription plan record from the database.
///
/// # Database Table
///
/// Maps to the `subscription_plans` table, one row per tier. Plans are seeded
/// by migration and edited out-of-band; the API only reads them. Prices are
/// integer cents, quota columns use -1 for "unlimited".
#[derive(Debug, Clone, sqlx::FromRow, Serialize)]
pub struct SubscriptionPlan {
    pub id: Uuid,

    /// One of "free", "pro", "enterprise"; unique
    pub tier: String,

    pub name: String,

    pub description: String,

    pub price_monthly_cents: i64,

    pub price_yearly_cents: i64,

    /// -1 means unlimited
    pub max_donations_per_month: i32,

    /// -1 means unlimited
    pub max_requests_per_month: i32,

    pub max_storage_mb: i32,

    /// Requests per hour allowed against the API
    pub api_rate_limit: i32,

    pub has_priority_matching: bool,

    pub has_advanced_analytics: bool,

    pub has_geo_radius_custom: bool,

    pub has_volunteer_auto_assign: bool,

    pub has_ai_chatbot: bool,

    pub has_api_access: bool,

    pub has_white_label: bool,

    pub has_dedicated_support: bool,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

/// Represents a user's subscription record from the database.
///
/// # Database Table
///
/// Maps to the `user_subscriptions` table (`user_id` is unique, so a user has
/// at most one subscription row; subscribing again replaces it).
///
/// A subscription grants its plan only while `status` is "active" and now is
/// within [`start_date`, `end_date`]. Anything else resolves to the free tier.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,

    /// One of "active", "expired", "cancelled", "pending"
    pub status: String,

    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub auto_renew: bool,
    pub payment_method: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSubscription {
    /// Whether this subscription grants its plan at instant `now`.
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.status == "active" && self.start_date <= now && now <= self.end_date
    }
}

/// One charge in a user's billing history.
///
/// # Database Table
///
/// Maps to the `billing_history` table. `transaction_id` and
/// `invoice_number` are generated (`TXN-`/`INV-` prefixed) and unique.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct BillingRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subscription_id: Option<Uuid>,

    /// One of "subscription", "upgrade", "renewal", "refund"
    pub transaction_type: String,

    pub amount_cents: i64,
    pub currency: String,
    pub payment_method: String,
    pub transaction_id: String,
    pub payment_status: String,
    pub invoice_number: String,
    pub created_at: DateTime<Utc>,
}

/// Request body for subscribing to a plan.
///
/// # JSON Example
///
/// ```json
/// {
///   "tier": "pro",
///   "billing_cycle": "monthly"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    pub tier: String,

    /// "monthly" or "yearly"; anything else is a 400
    pub billing_cycle: String,
}

/// Response body for the current-subscription endpoint.
///
/// When the user has no live subscription this is synthesized for the free
/// tier with `days_remaining` of zero.
#[derive(Debug, Serialize)]
pub struct CurrentSubscriptionResponse {
    pub tier: String,
    pub plan_name: String,
    pub status: String,
    pub days_remaining: i64,
    pub auto_renew: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<DateTime<Utc>>,
}

/// Response body for billing history entries.
#[derive(Debug, Serialize)]
pub struct BillingResponse {
    pub id: Uuid,
    pub transaction_type: String,
    pub amount_cents: i64,
    pub currency: String,
    pub payment_method: String,
    pub transaction_id: String,
    pub payment_status: String,
    pub invoice_number: String,
    pub created_at: DateTime<Utc>,
}

impl From<BillingRecord> for BillingResponse {
    fn from(b: BillingRecord) -> Self {
        Self {
            id: b.id,
            transaction_type: b.transaction_type,
            amount_cents: b.amount_cents,
            currency: b.currency,
            payment_method: b.payment_method,
            transaction_id: b.transaction_id,
            payment_status: b.payment_status,
            invoice_number: b.invoice_number,
            created_at: b.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn tiers_rank_in_price_order() {
        assert!(tier_rank(TIER_FREE) < tier_rank(TIER_PRO));
        assert!(tier_rank(TIER_PRO) < tier_rank(TIER_ENTERPRISE));
    }

    #[test]
    fn unknown_tiers_rank_below_free() {
        assert!(tier_rank("platinum") < tier_rank(TIER_FREE));
        assert!(tier_rank("") < tier_rank(TIER_FREE));
    }

    fn sub(status: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> UserSubscription {
        UserSubscription {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            plan_id: Uuid::new_v4(),
            status: status.to_string(),
            start_date: start,
            end_date: end,
            auto_renew: true,
            payment_method: "wallet".to_string(),
            created_at: start,
            updated_at: start,
        }
    }

    #[test]
    fn subscription_active_inside_window() {
        let now = Utc::now();
        let s = sub("active", now - Duration::days(1), now + Duration::days(29));
        assert!(s.is_active_at(now));
    }

    #[test]
    fn subscription_inactive_when_expired_or_cancelled() {
        let now = Utc::now();
        let past = sub("active", now - Duration::days(40), now - Duration::days(10));
        assert!(!past.is_active_at(now));

        let cancelled = sub("cancelled", now - Duration::days(1), now + Duration::days(29));
        assert!(!cancelled.is_active_at(now));
    }

    #[test]
    fn subscription_window_bounds_are_inclusive() {
        let now = Utc::now();
        let s = sub("active", now, now);
        assert!(s.is_active_at(now));
    }
}
