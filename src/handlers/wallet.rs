//! Wallet HTTP handlers.
//!
//! This module implements the wallet endpoints:
//! - GET /api/v1/wallet - Balance and lifetime totals
//! - POST /api/v1/wallet/recharge - Add funds (demo payment)
//! - GET /api/v1/wallet/transactions - Ledger, newest first

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::AuthContext,
    models::analytics::ACTIVITY_WALLET_RECHARGED,
    models::wallet::{RechargeRequest, TransactionResponse, WalletResponse},
    services::{analytics_service, wallet_service},
};
use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};

/// Get the caller's wallet, creating it on first touch.
pub async fn get_wallet(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<WalletResponse>, AppError> {
    let wallet = wallet_service::get_or_create_wallet(&pool, auth.user_id).await?;

    Ok(Json(wallet.into()))
}

/// Recharge the caller's wallet.
///
/// # Endpoint
///
/// `POST /api/v1/wallet/recharge`
///
/// # Request Body
///
/// ```json
/// {
///   "amount_cents": 50000,
///   "payment_method": "demo"
/// }
/// ```
///
/// # Response
///
/// - **Success (201 Created)**: The credit transaction with before/after
///   balance snapshots
/// - **Error (400)**: Amount is zero or negative
pub async fn recharge(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
    Json(request): Json<RechargeRequest>,
) -> Result<impl IntoResponse, AppError> {
    let transaction = wallet_service::recharge(
        &pool,
        auth.user_id,
        request.amount_cents,
        &request.payment_method,
    )
    .await?;

    analytics_service::record_activity(
        &pool,
        auth.user_id,
        ACTIVITY_WALLET_RECHARGED,
        &format!("Recharged wallet with {} cents", request.amount_cents),
    )
    .await;

    Ok((
        StatusCode::CREATED,
        Json(TransactionResponse::from(transaction)),
    ))
}

/// List the caller's wallet transactions, newest first.
pub async fn list_transactions(
    State(pool): State<DbPool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<Json<Vec<TransactionResponse>>, AppError> {
    let transactions = wallet_service::list_transactions(&pool, auth.user_id).await?;

    let responses: Vec<TransactionResponse> = transactions.into_iter().map(Into::into).collect();

    Ok(Json(responses))
}
