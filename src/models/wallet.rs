//! Wallet and wallet transaction models.
//!
//! This module defines:
//! - `Wallet`: Database entity holding a user's balance in integer cents
//! - `WalletTransaction`: The append-only ledger of credits and debits
//! - Request bodies and response types for the wallet endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Ledger entry kinds.
pub const TXN_RECHARGE: &str = "recharge";
pub const TXN_DELIVERY_PAYMENT: &str = "delivery_payment";
pub const TXN_SUBSCRIPTION_PAYMENT: &str = "subscription_payment";
pub const TXN_REFUND: &str = "refund";

/// Represents a wallet record from the database.
///
/// # Database Table
///
/// Maps to the `wallets` table, one row per user (`user_id` is unique).
/// Wallets are created lazily on first use with a zero balance. All money
/// fields are integer cents (INR paise).
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Wallet {
    pub id: Uuid,
    pub user_id: Uuid,

    /// Current spendable balance; never negative
    pub balance_cents: i64,

    /// Lifetime sum of recharges
    pub total_recharged_cents: i64,

    /// Lifetime sum of debits
    pub total_spent_cents: i64,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// One entry in a wallet's ledger.
///
/// # Database Table
///
/// Maps to the `wallet_transactions` table. Every entry snapshots the balance
/// on both sides of the movement so the ledger can be audited without
/// replaying it.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct WalletTransaction {
    pub id: Uuid,
    pub wallet_id: Uuid,

    /// One of the `TXN_*` constants
    pub transaction_type: String,

    /// Always positive; the direction comes from the type
    pub amount_cents: i64,

    /// One of "pending", "completed", "failed", "refunded"
    pub status: String,

    /// Generated unique reference (`WTX-` prefixed)
    pub transaction_id: String,

    pub payment_method: String,

    pub description: String,

    /// What this movement paid for (delivery id, subscription id), if anything
    pub reference_id: Option<Uuid>,

    pub balance_before_cents: i64,

    pub balance_after_cents: i64,

    pub created_at: DateTime<Utc>,
}

/// Request body for recharging a wallet.
///
/// `amount_cents` must be positive; zero or negative is a 400.
///
/// # JSON Example
///
/// ```json
/// {
///   "amount_cents": 50000,
///   "payment_method": "demo"
/// }
/// ```
#[derive(Debug, Deserialize)]
pub struct RechargeRequest {
    pub amount_cents: i64,

    #[serde(default = "default_payment_method")]
    pub payment_method: String,
}

fn default_payment_method() -> String {
    "demo".to_string()
}

/// Response body for wallet endpoints.
#[derive(Debug, Serialize)]
pub struct WalletResponse {
    pub id: Uuid,
    pub balance_cents: i64,
    pub total_recharged_cents: i64,
    pub total_spent_cents: i64,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
}

impl From<Wallet> for WalletResponse {
    fn from(w: Wallet) -> Self {
        Self {
            id: w.id,
            balance_cents: w.balance_cents,
            total_recharged_cents: w.total_recharged_cents,
            total_spent_cents: w.total_spent_cents,
            is_active: w.is_active,
            updated_at: w.updated_at,
        }
    }
}

/// Response body for ledger entries.
#[derive(Debug, Serialize)]
pub struct TransactionResponse {
    pub id: Uuid,
    pub transaction_type: String,
    pub amount_cents: i64,
    pub status: String,
    pub transaction_id: String,
    pub payment_method: String,
    pub description: String,
    pub reference_id: Option<Uuid>,
    pub balance_before_cents: i64,
    pub balance_after_cents: i64,
    pub created_at: DateTime<Utc>,
}

impl From<WalletTransaction> for TransactionResponse {
    fn from(t: WalletTransaction) -> Self {
        Self {
            id: t.id,
            transaction_type: t.transaction_type,
            amount_cents: t.amount_cents,
            status: t.status,
            transaction_id: t.transaction_id,
            payment_method: t.payment_method,
            description: t.description,
            reference_id: t.reference_id,
            balance_before_cents: t.balance_before_cents,
            balance_after_cents: t.balance_after_cents,
            created_at: t.created_at,
        }
    }
}
