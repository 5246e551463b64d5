//! Analytics service: activity trail and on-demand platform metrics.

use crate::{
    db::DbPool,
    error::AppError,
    models::analytics::{PlatformMetrics, UserActivity},
};
use chrono::NaiveDate;
use uuid::Uuid;

/// Record a user activity, fire-and-forget.
///
/// A failed insert is logged and swallowed; the audit trail must never fail
/// the request that triggered it.
pub async fn record_activity(pool: &DbPool, user_id: Uuid, activity_type: &str, description: &str) {
    let result = sqlx::query(
        r#"
        INSERT INTO user_activities (user_id, activity_type, description)
        VALUES ($1, $2, $3)
        "#,
    )
    .bind(user_id)
    .bind(activity_type)
    .bind(description)
    .execute(pool)
    .await;

    if let Err(e) = result {
        tracing::warn!(%user_id, activity_type, "failed to record activity: {e}");
    }
}

/// A user's most recent activity entries, newest first, capped at 50.
pub async fn recent_activity(pool: &DbPool, user_id: Uuid) -> Result<Vec<UserActivity>, AppError> {
    let activities = sqlx::query_as::<_, UserActivity>(
        r#"
        SELECT * FROM user_activities
        WHERE user_id = $1
        ORDER BY created_at DESC
        LIMIT 50
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(activities)
}

/// Row shape for the aggregate snapshot query.
#[derive(Debug, sqlx::FromRow)]
struct Aggregates {
    total_users: i64,
    new_users: i64,
    active_users: i64,
    total_donations: i64,
    new_donations: i64,
    completed_donations: i64,
    total_deliveries: i64,
    successful_deliveries: i64,
    cancelled_deliveries: i64,
    total_volunteers: i64,
    active_volunteers: i64,
    revenue_subscriptions_cents: i64,
    revenue_deliveries_cents: i64,
}

/// Compute and persist the metrics snapshot for one date.
///
/// Aggregates are counted live and upserted into `platform_metrics`, so
/// requesting the same date again refreshes the stored row. "New" and
/// "revenue" figures are scoped to the requested date; totals are lifetime
/// as of now.
pub async fn platform_metrics_for(
    pool: &DbPool,
    date: NaiveDate,
) -> Result<PlatformMetrics, AppError> {
    let agg = sqlx::query_as::<_, Aggregates>(
        r#"
        SELECT
            (SELECT COUNT(*) FROM users) AS total_users,
            (SELECT COUNT(*) FROM users WHERE created_at::date = $1) AS new_users,
            (SELECT COUNT(DISTINCT user_id) FROM user_activities
             WHERE created_at::date = $1) AS active_users,
            (SELECT COUNT(*) FROM donations) AS total_donations,
            (SELECT COUNT(*) FROM donations WHERE created_at::date = $1) AS new_donations,
            (SELECT COUNT(DISTINCT donation_id) FROM deliveries
             WHERE status = 'completed') AS completed_donations,
            (SELECT COUNT(*) FROM deliveries) AS total_deliveries,
            (SELECT COUNT(*) FROM deliveries WHERE status = 'completed')
                AS successful_deliveries,
            (SELECT COUNT(*) FROM deliveries WHERE status = 'cancelled')
                AS cancelled_deliveries,
            (SELECT COUNT(*) FROM volunteer_profiles) AS total_volunteers,
            (SELECT COUNT(*) FROM volunteer_profiles WHERE is_available = TRUE)
                AS active_volunteers,
            (SELECT COALESCE(SUM(amount_cents), 0) FROM billing_history
             WHERE created_at::date = $1 AND transaction_type <> 'refund')
                AS revenue_subscriptions_cents,
            (SELECT COALESCE(SUM(platform_fee_cents + platform_commission_cents), 0)
             FROM delivery_fees WHERE is_paid = TRUE AND created_at::date = $1)
                AS revenue_deliveries_cents
        "#,
    )
    .bind(date)
    .fetch_one(pool)
    .await?;

    let revenue_total_cents = agg.revenue_subscriptions_cents + agg.revenue_deliveries_cents;

    let metrics = sqlx::query_as::<_, PlatformMetrics>(
        r#"
        INSERT INTO platform_metrics (
            date, total_users, new_users, active_users,
            total_donations, new_donations, completed_donations,
            total_deliveries, successful_deliveries, cancelled_deliveries,
            total_volunteers, active_volunteers, meals_saved,
            revenue_subscriptions_cents, revenue_deliveries_cents, revenue_total_cents
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)
        ON CONFLICT (date) DO UPDATE
        SET total_users = EXCLUDED.total_users,
            new_users = EXCLUDED.new_users,
            active_users = EXCLUDED.active_users,
            total_donations = EXCLUDED.total_donations,
            new_donations = EXCLUDED.new_donations,
            completed_donations = EXCLUDED.completed_donations,
            total_deliveries = EXCLUDED.total_deliveries,
            successful_deliveries = EXCLUDED.successful_deliveries,
            cancelled_deliveries = EXCLUDED.cancelled_deliveries,
            total_volunteers = EXCLUDED.total_volunteers,
            active_volunteers = EXCLUDED.active_volunteers,
            meals_saved = EXCLUDED.meals_saved,
            revenue_subscriptions_cents = EXCLUDED.revenue_subscriptions_cents,
            revenue_deliveries_cents = EXCLUDED.revenue_deliveries_cents,
            revenue_total_cents = EXCLUDED.revenue_total_cents,
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(date)
    .bind(agg.total_users)
    .bind(agg.new_users)
    .bind(agg.active_users)
    .bind(agg.total_donations)
    .bind(agg.new_donations)
    .bind(agg.completed_donations)
    .bind(agg.total_deliveries)
    .bind(agg.successful_deliveries)
    .bind(agg.cancelled_deliveries)
    .bind(agg.total_volunteers)
    .bind(agg.active_volunteers)
    // Each completed delivery counts as one meal batch saved
    .bind(agg.successful_deliveries)
    .bind(agg.revenue_subscriptions_cents)
    .bind(agg.revenue_deliveries_cents)
    .bind(revenue_total_cents)
    .fetch_one(pool)
    .await?;

    Ok(metrics)
}
