//! Subscription service: tier resolution, plan purchase, and quotas.
//!
//! # Tier Resolution
//!
//! Tier lookup never fails. A user with no subscription row, an expired one,
//! or a cancelled one simply resolves to the seeded free plan. Feature gates
//! and quotas always consult the resolved plan row.

use crate::{
    db::DbPool,
    error::AppError,
    models::subscription::{
        BillingRecord, CYCLE_MONTHLY, CYCLE_YEARLY, SubscriptionPlan, TIER_FREE, UserSubscription,
    },
    models::wallet::TXN_SUBSCRIPTION_PAYMENT,
    services::wallet_service,
};
use chrono::{Duration, Utc};
use uuid::Uuid;

fn generate_billing_refs() -> (String, String) {
    let token = Uuid::new_v4().simple().to_string();
    (format!("TXN-{token}"), format!("INV-{token}"))
}

/// List purchasable plans, cheapest first.
pub async fn list_active_plans(pool: &DbPool) -> Result<Vec<SubscriptionPlan>, AppError> {
    let plans = sqlx::query_as::<_, SubscriptionPlan>(
        "SELECT * FROM subscription_plans WHERE is_active = TRUE ORDER BY price_monthly_cents",
    )
    .fetch_all(pool)
    .await?;

    Ok(plans)
}

async fn plan_by_tier(pool: &DbPool, tier: &str) -> Result<SubscriptionPlan, AppError> {
    sqlx::query_as::<_, SubscriptionPlan>(
        "SELECT * FROM subscription_plans WHERE tier = $1 AND is_active = TRUE",
    )
    .bind(tier)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::PlanNotFound)
}

/// Resolve the plan a user's features and quotas are judged against.
///
/// Returns the plan of the user's live subscription, or the free plan when
/// there is no live subscription for any reason.
pub async fn effective_plan(pool: &DbPool, user_id: Uuid) -> Result<SubscriptionPlan, AppError> {
    let plan = sqlx::query_as::<_, SubscriptionPlan>(
        r#"
        SELECT p.*
        FROM user_subscriptions us
        JOIN subscription_plans p ON p.id = us.plan_id
        WHERE us.user_id = $1
          AND us.status = 'active'
          AND us.start_date <= NOW()
          AND us.end_date >= NOW()
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    match plan {
        Some(plan) => Ok(plan),
        None => plan_by_tier(pool, TIER_FREE).await,
    }
}

/// Purchase (or switch to) a plan.
///
/// # Process
///
/// 1. Validate the billing cycle and look up the plan
/// 2. Start database transaction
/// 3. Charge the wallet when the plan is paid (row-locked debit)
/// 4. Upsert the user's single subscription row
/// 5. Write the billing history entry
/// 6. Commit (or rollback on error)
///
/// # Errors
///
/// - `InvalidRequest`: Unknown billing cycle
/// - `PlanNotFound`: Tier unknown or retired
/// - `InsufficientBalance`: Wallet cannot cover the price
pub async fn subscribe(
    pool: &DbPool,
    user_id: Uuid,
    tier: &str,
    billing_cycle: &str,
) -> Result<(UserSubscription, BillingRecord), AppError> {
    let period_days = match billing_cycle {
        CYCLE_MONTHLY => 30,
        CYCLE_YEARLY => 365,
        other => {
            return Err(AppError::InvalidRequest(format!(
                "Unknown billing cycle: {other}"
            )));
        }
    };

    let plan = plan_by_tier(pool, tier).await?;
    let price_cents = if billing_cycle == CYCLE_YEARLY {
        plan.price_yearly_cents
    } else {
        plan.price_monthly_cents
    };

    // Upgrades replace an existing live subscription; first purchases start one
    let had_live_subscription: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM user_subscriptions
            WHERE user_id = $1
              AND status = 'active'
              AND start_date <= NOW()
              AND end_date >= NOW()
        )
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let now = Utc::now();
    let end_date = now + Duration::days(period_days);

    // Start database transaction
    let mut tx = pool.begin().await?;

    if price_cents > 0 {
        sqlx::query(
            r#"
            INSERT INTO wallets (user_id)
            VALUES ($1)
            ON CONFLICT (user_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        wallet_service::debit_locked(
            &mut *tx,
            user_id,
            price_cents,
            TXN_SUBSCRIPTION_PAYMENT,
            "wallet",
            &format!("{} plan, {billing_cycle}", plan.name),
            Some(plan.id),
        )
        .await?;
    }

    let subscription = sqlx::query_as::<_, UserSubscription>(
        r#"
        INSERT INTO user_subscriptions (
            user_id, plan_id, status, start_date, end_date, auto_renew, payment_method
        )
        VALUES ($1, $2, 'active', $3, $4, TRUE, 'wallet')
        ON CONFLICT (user_id) DO UPDATE
        SET plan_id = EXCLUDED.plan_id,
            status = 'active',
            start_date = EXCLUDED.start_date,
            end_date = EXCLUDED.end_date,
            auto_renew = TRUE,
            payment_method = 'wallet',
            updated_at = NOW()
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(plan.id)
    .bind(now)
    .bind(end_date)
    .fetch_one(&mut *tx)
    .await?;

    let (transaction_ref, invoice_number) = generate_billing_refs();
    let transaction_type = if had_live_subscription {
        "upgrade"
    } else {
        "subscription"
    };

    let billing = sqlx::query_as::<_, BillingRecord>(
        r#"
        INSERT INTO billing_history (
            user_id,
            subscription_id,
            transaction_type,
            amount_cents,
            currency,
            payment_method,
            transaction_id,
            payment_status,
            invoice_number
        )
        VALUES ($1, $2, $3, $4, 'INR', 'wallet', $5, 'completed', $6)
        RETURNING *
        "#,
    )
    .bind(user_id)
    .bind(subscription.id)
    .bind(transaction_type)
    .bind(price_cents)
    .bind(&transaction_ref)
    .bind(&invoice_number)
    .fetch_one(&mut *tx)
    .await?;

    // Commit all changes atomically
    tx.commit().await?;

    Ok((subscription, billing))
}

/// The user's live subscription, joined with its plan.
///
/// Returns `None` when the user should be treated as free tier.
pub async fn current_subscription(
    pool: &DbPool,
    user_id: Uuid,
) -> Result<Option<(UserSubscription, SubscriptionPlan)>, AppError> {
    let subscription = sqlx::query_as::<_, UserSubscription>(
        r#"
        SELECT * FROM user_subscriptions
        WHERE user_id = $1
          AND status = 'active'
          AND start_date <= NOW()
          AND end_date >= NOW()
        "#,
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;

    let Some(subscription) = subscription else {
        return Ok(None);
    };

    let plan =
        sqlx::query_as::<_, SubscriptionPlan>("SELECT * FROM subscription_plans WHERE id = $1")
            .bind(subscription.plan_id)
            .fetch_one(pool)
            .await?;

    Ok(Some((subscription, plan)))
}

/// A user's billing history, newest first.
pub async fn billing_history(pool: &DbPool, user_id: Uuid) -> Result<Vec<BillingRecord>, AppError> {
    let records = sqlx::query_as::<_, BillingRecord>(
        "SELECT * FROM billing_history WHERE user_id = $1 ORDER BY created_at DESC",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Enforce the plan's monthly donation quota before a new listing.
///
/// A limit of -1 means unlimited.
pub async fn ensure_donation_quota(pool: &DbPool, user_id: Uuid) -> Result<(), AppError> {
    let plan = effective_plan(pool, user_id).await?;
    if plan.max_donations_per_month < 0 {
        return Ok(());
    }

    let used: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM donations
        WHERE donor_id = $1 AND created_at >= date_trunc('month', NOW())
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if used >= i64::from(plan.max_donations_per_month) {
        return Err(AppError::PlanLimitReached(format!(
            "{} donations per month on the {} plan",
            plan.max_donations_per_month, plan.name
        )));
    }

    Ok(())
}

/// Enforce the plan's monthly request quota before a new donation request.
pub async fn ensure_request_quota(pool: &DbPool, user_id: Uuid) -> Result<(), AppError> {
    let plan = effective_plan(pool, user_id).await?;
    if plan.max_requests_per_month < 0 {
        return Ok(());
    }

    let used: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM donation_requests
        WHERE receiver_id = $1 AND created_at >= date_trunc('month', NOW())
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    if used >= i64::from(plan.max_requests_per_month) {
        return Err(AppError::PlanLimitReached(format!(
            "{} requests per month on the {} plan",
            plan.max_requests_per_month, plan.name
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn billing_refs_share_a_token_and_differ_by_prefix() {
        let (txn, inv) = generate_billing_refs();
        assert!(txn.starts_with("TXN-"));
        assert!(inv.starts_with("INV-"));
        assert_eq!(txn[4..], inv[4..]);
    }
}
