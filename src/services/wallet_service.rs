//! Wallet service - Core business logic for the in-app wallet.
//!
//! This service handles:
//! - Lazy wallet creation
//! - Atomic balance updates with ledger entries
//! - Balance validation for debits
//!
//! # Atomicity Guarantees
//!
//! All balance updates happen within PostgreSQL transactions. The wallet row
//! is locked with `FOR UPDATE` so concurrent movements serialize, and every
//! ledger entry snapshots the balance before and after.

use crate::{
    db::DbPool,
    error::AppError,
    models::wallet::{TXN_RECHARGE, Wallet, WalletTransaction},
};
use sqlx::PgConnection;
use uuid::Uuid;

/// Generate a unique ledger reference (`WTX-` prefixed).
fn generate_transaction_ref() -> String {
    format!("WTX-{}", Uuid::new_v4().simple())
}

/// Fetch a user's wallet, creating it with a zero balance on first use.
pub async fn get_or_create_wallet(pool: &DbPool, user_id: Uuid) -> Result<Wallet, AppError> {
    // ON CONFLICT makes the lazy create race-safe; the follow-up SELECT
    // returns whichever row won.
    sqlx::query(
        r#"
        INSERT INTO wallets (user_id)
        VALUES ($1)
        ON CONFLICT (user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .execute(pool)
    .await?;

    let wallet = sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE user_id = $1")
        .bind(user_id)
        .fetch_one(pool)
        .await?;

    Ok(wallet)
}

/// Recharge a wallet (add money).
///
/// # Process
///
/// 1. Validate the amount
/// 2. Start database transaction
/// 3. Lock (or lazily create) the wallet row
/// 4. Update balance and lifetime recharge total
/// 5. Record the ledger entry
/// 6. Commit (or rollback on error)
///
/// # Errors
///
/// - `InvalidRequest`: Amount is zero or negative
/// - `Database`: Database error occurred
pub async fn recharge(
    pool: &DbPool,
    user_id: Uuid,
    amount_cents: i64,
    payment_method: &str,
) -> Result<WalletTransaction, AppError> {
    // Validate amount
    if amount_cents <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    // Start database transaction
    let mut tx = pool.begin().await?;

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

    let transaction = credit_locked(
        &mut *tx,
        user_id,
        amount_cents,
        TXN_RECHARGE,
        payment_method,
        "Wallet recharge",
        None,
    )
    .await?;

    // Recharges also bump the lifetime total
    sqlx::query(
        "UPDATE wallets SET total_recharged_cents = total_recharged_cents + $1 WHERE user_id = $2",
    )
    .bind(amount_cents)
    .bind(user_id)
    .execute(&mut *tx)
    .await?;

    // Commit all changes atomically
    tx.commit().await?;

    Ok(transaction)
}

/// Debit a wallet inside the caller's open database transaction.
///
/// Locks the wallet row, rejects overdrafts, updates the balance and the
/// lifetime spend total, and writes the ledger entry. The caller owns the
/// transaction: on `Err` it must roll back (or drop the transaction, which
/// rolls back implicitly).
///
/// # Errors
///
/// - `InvalidRequest`: Amount is zero or negative
/// - `InsufficientBalance`: Balance would go negative
pub async fn debit_locked(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount_cents: i64,
    transaction_type: &str,
    payment_method: &str,
    description: &str,
    reference_id: Option<Uuid>,
) -> Result<WalletTransaction, AppError> {
    if amount_cents <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    // Lock the wallet and check the balance
    let (wallet_id, balance_before): (Uuid, i64) = sqlx::query_as(
        "SELECT id, balance_cents FROM wallets WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_optional(&mut *conn)
    .await?
    .ok_or(AppError::InsufficientBalance)?;

    // Validate sufficient balance
    if balance_before < amount_cents {
        return Err(AppError::InsufficientBalance);
    }

    let balance_after = balance_before - amount_cents;

    sqlx::query(
        r#"
        UPDATE wallets
        SET balance_cents = $1,
            total_spent_cents = total_spent_cents + $2,
            updated_at = NOW()
        WHERE id = $3
        "#,
    )
    .bind(balance_after)
    .bind(amount_cents)
    .bind(wallet_id)
    .execute(&mut *conn)
    .await?;

    let transaction = insert_ledger_entry(
        conn,
        wallet_id,
        transaction_type,
        amount_cents,
        payment_method,
        description,
        reference_id,
        balance_before,
        balance_after,
    )
    .await?;

    Ok(transaction)
}

/// Credit a wallet inside the caller's open database transaction.
///
/// Used for recharges and refunds. The wallet row must already exist.
pub async fn credit_locked(
    conn: &mut PgConnection,
    user_id: Uuid,
    amount_cents: i64,
    transaction_type: &str,
    payment_method: &str,
    description: &str,
    reference_id: Option<Uuid>,
) -> Result<WalletTransaction, AppError> {
    if amount_cents <= 0 {
        return Err(AppError::InvalidRequest(
            "Amount must be positive".to_string(),
        ));
    }

    let (wallet_id, balance_before): (Uuid, i64) = sqlx::query_as(
        "SELECT id, balance_cents FROM wallets WHERE user_id = $1 FOR UPDATE",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    let balance_after = balance_before + amount_cents;

    sqlx::query(
        r#"
        UPDATE wallets
        SET balance_cents = $1,
            updated_at = NOW()
        WHERE id = $2
        "#,
    )
    .bind(balance_after)
    .bind(wallet_id)
    .execute(&mut *conn)
    .await?;

    let transaction = insert_ledger_entry(
        conn,
        wallet_id,
        transaction_type,
        amount_cents,
        payment_method,
        description,
        reference_id,
        balance_before,
        balance_after,
    )
    .await?;

    Ok(transaction)
}

#[allow(clippy::too_many_arguments)]
async fn insert_ledger_entry(
    conn: &mut PgConnection,
    wallet_id: Uuid,
    transaction_type: &str,
    amount_cents: i64,
    payment_method: &str,
    description: &str,
    reference_id: Option<Uuid>,
    balance_before: i64,
    balance_after: i64,
) -> Result<WalletTransaction, AppError> {
    let transaction = sqlx::query_as::<_, WalletTransaction>(
        r#"
        INSERT INTO wallet_transactions (
            wallet_id,
            transaction_type,
            amount_cents,
            status,
            transaction_id,
            payment_method,
            description,
            reference_id,
            balance_before_cents,
            balance_after_cents
        )
        VALUES ($1, $2, $3, 'completed', $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(wallet_id)
    .bind(transaction_type)
    .bind(amount_cents)
    .bind(generate_transaction_ref())
    .bind(payment_method)
    .bind(description)
    .bind(reference_id)
    .bind(balance_before)
    .bind(balance_after)
    .fetch_one(&mut *conn)
    .await?;

    Ok(transaction)
}

/// List a wallet's ledger, newest first.
pub async fn list_transactions(
    pool: &DbPool,
    user_id: Uuid,
) -> Result<Vec<WalletTransaction>, AppError> {
    let transactions = sqlx::query_as::<_, WalletTransaction>(
        r#"
        SELECT wt.*
        FROM wallet_transactions wt
        JOIN wallets w ON w.id = wt.wallet_id
        WHERE w.user_id = $1
        ORDER BY wt.created_at DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(transactions)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transaction_refs_are_prefixed_and_unique() {
        let a = generate_transaction_ref();
        let b = generate_transaction_ref();
        assert!(a.starts_with("WTX-"));
        assert_ne!(a, b);
    }
}
