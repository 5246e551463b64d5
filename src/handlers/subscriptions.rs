//! Subscription HTTP handlers.
//!
//! This module implements the monetization endpoints:
//! - GET /api/v1/plans - Plan catalog (public)
//! - POST /api/v1/subscriptions/subscribe - Subscribe or upgrade (wallet paid)
//! - GET /api/v1/subscriptions/current - Effective plan for the caller
//! - GET /api/v1/subscriptions/billing - Billing history

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::analytics::ACTIVITY_SUBSCRIPTION_UPGRADED,
    models::subscription::{
        BillingResponse, CurrentSubscriptionResponse, SubscribeRequest, SubscriptionPlan, TIER_FREE,
    },
    services::{analytics_service, subscription_service},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::{DateTime, Utc};
use serde::Serialize;

/// Response body for a successful subscribe call.
#[derive(Debug, Serialize)]
pub struct SubscribedResponse {
    pub tier: String,
    pub status: String,
    pub days_remaining: i64,
    pub end_date: DateTime<Utc>,
    pub billing: BillingResponse,
}

/// List the active plan catalog, cheapest first.
///
/// # Endpoint
///
/// `GET /api/v1/plans`
///
/// This endpoint is public so the pricing page can render without a login.
pub async fn list_plans(
    State(pool): State<DbPool>,
) -> Result<Json<Vec<SubscriptionPlan>>, AppError> {
    let plans = subscription_service::list_active_plans(&pool).await?;

    Ok(Json(plans))
}

/// Subscribe to a plan, charging the caller's wallet.
///
/// # Endpoint
///
/// `POST /api/v1/subscriptions/subscribe`
///
/// # Request Body
///
/// ```json
/// {
///   "tier": "pro",
///   "billing_cycle": "monthly"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The new subscription state and its billing
///   record
/// - **Error (400)**: Unknown billing cycle
/// - **Error (404)**: Unknown or retired tier
/// - **Error (422)**: Wallet balance cannot cover the price
pub async fn subscribe(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<SubscribeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let (subscription, billing) = subscription_service::subscribe(
        &pool,
        auth.user_id,
        &request.tier,
        &request.billing_cycle,
    )
    .await?;

    analytics_service::record_activity(
        &pool,
        auth.user_id,
        ACTIVITY_SUBSCRIPTION_UPGRADED,
        &format!("Subscribed to the {} plan", request.tier),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(SubscribedResponse {
            tier: request.tier,
            status: subscription.status,
            days_remaining: (subscription.end_date - Utc::now()).num_days(),
            end_date: subscription.end_date,
            billing: billing.into(),
        }),
    ))
}

/// The caller's current subscription.
///
/// Users with no live subscription get a synthesized free-tier response
/// rather than a 404, so clients can always render a plan badge.
pub async fn current_subscription(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<CurrentSubscriptionResponse>, AppError> {
    let response = match subscription_service::current_subscription(&pool, auth.user_id).await? {
        Some((subscription, plan)) => CurrentSubscriptionResponse {
            tier: plan.tier,
            plan_name: plan.name,
            status: subscription.status,
            days_remaining: (subscription.end_date - Utc::now()).num_days(),
            auto_renew: subscription.auto_renew,
            end_date: Some(subscription.end_date),
        },
        None => CurrentSubscriptionResponse {
            tier: TIER_FREE.to_string(),
            plan_name: "Free".to_string(),
            status: "active".to_string(),
            days_remaining: 0,
            auto_renew: false,
            end_date: None,
        },
    };

    Ok(Json(response))
}

/// The caller's billing history, newest first.
pub async fn billing_history(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<BillingResponse>>, AppError> {
    let records = subscription_service::billing_history(&pool, auth.user_id).await?;

    let responses: Vec<BillingResponse> = records.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}
