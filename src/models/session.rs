//! Login session model.
//!
//! Sessions back the bearer-token authentication flow. The token handed to the
//! client is random; only its SHA-256 hash is stored here, so the sessions
//! table alone cannot be used to impersonate anyone.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Represents a session record from the database.
///
/// # Database Table
///
/// Maps to the `sessions` table with columns:
/// - `id`: Unique identifier (UUID)
/// - `user_id`: The user this session authenticates
/// - `token_hash`: SHA-256 hash of the bearer token (64 hex characters)
/// - `created_at`: When the session was issued
/// - `expires_at`: Hard expiry; the auth middleware rejects sessions past it
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Session {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token_hash: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}
