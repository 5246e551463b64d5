//! Analytics HTTP handlers.
//!
//! This module implements the reporting endpoints:
//! - GET /api/v1/analytics/platform - Daily platform metrics snapshot
//! - GET /api/v1/analytics/activity - The caller's recent activity feed

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::analytics::{ActivityResponse, MetricsQuery, PlatformMetrics},
    services::{analytics_service, subscription_service},
};
use axum::{
    Extension, Json,
    extract::{Query, State},
};
use chrono::Utc;

/// Platform metrics for a date, defaulting to today.
///
/// # Endpoint
///
/// `GET /api/v1/analytics/platform?date=2025-06-01`
///
/// Admins always have access; other users need a plan with advanced
/// analytics.
///
/// # Response
///
/// - **Success (200 OK)**: The metrics row for the date, freshly recomputed
/// - **Error (403)**: Caller's plan does not include advanced analytics
pub async fn platform_metrics(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Query(query): Query<MetricsQuery>,
) -> Result<Json<PlatformMetrics>, AppError> {
    if !auth.is_admin() {
        let plan = subscription_service::effective_plan(&pool, auth.user_id).await?;
        if !plan.has_advanced_analytics {
            return Err(AppError::SubscriptionRequired(
                "Advanced analytics requires a pro or enterprise plan".to_string(),
            ));
        }
    }

    let date = query.date.unwrap_or_else(|| Utc::now().date_naive());

    let metrics = analytics_service::platform_metrics_for(&pool, date).await?;

    Ok(Json(metrics))
}

/// The caller's recent activity, newest first.
pub async fn recent_activity(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<ActivityResponse>>, AppError> {
    let activities = analytics_service::recent_activity(&pool, auth.user_id).await?;

    let responses: Vec<ActivityResponse> = activities.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}
