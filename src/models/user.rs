//! User data models and API request/response types.
//!
//! This module defines:
//! - `User`: Database entity representing a platform user
//! - `RegisterRequest` / `LoginRequest`: Auth request bodies
//! - `UserResponse` / `LoginResponse`: Response bodies returned to clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Every role a user can hold on the platform.
///
/// Donor and receiver roles come in two flavors each; role checks that apply
/// to the whole family use prefix matching (see `AuthContext::is_donor`).
pub const ROLES: [&str; 7] = [
    "admin",
    "donor_restaurant",
    "donor_individual",
    "receiver_ngo",
    "receiver_shelter",
    "volunteer",
    "corporate",
];

/// Whether a role string is one of the known [`ROLES`].
pub fn is_valid_role(role: &str) -> bool {
    ROLES.contains(&role)
}

/// Represents a user record from the database.
///
/// # Database Table
///
/// Maps to the `users` table. Each user:
/// - Authenticates with email + password (stored as salt + HMAC-SHA256 hash)
/// - Has exactly one role that gates which endpoints they may call
/// - May carry coordinates used for nearby-donation search and delivery pickup
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    /// Unique identifier for this user
    pub id: Uuid,

    /// Login email, unique across the platform
    pub email: String,

    /// Hex HMAC-SHA256 of the password, keyed by `password_salt`
    pub password_hash: String,

    /// Hex-encoded per-user random salt
    pub password_salt: String,

    /// Role string, one of [`ROLES`]
    pub role: String,

    pub full_name: String,

    pub phone_number: String,

    /// Free-form postal address
    pub address: String,

    /// Last known latitude in decimal degrees
    pub latitude: Option<f64>,

    /// Last known longitude in decimal degrees
    pub longitude: Option<f64>,

    /// Whether an operator has verified this user's documents
    pub is_verified: bool,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

/// Request body for creating a new user account.
///
/// # JSON Example
///
/// ```json
/// {
///   "full_name": "Akshaya Patra Foundation",
///   "email": "ngo@example.org",
///   "password": "hunter2hunter2",
///   "confirm_password": "hunter2hunter2",
///   "role": "receiver_ngo",
///   "phone_number": "+91-9876543213"
/// }
/// ```
///
/// # Validation
///
/// - `password` must equal `confirm_password` (400 otherwise)
/// - `email` must not already be registered (409 otherwise)
/// - `role` must be a known role (400 otherwise)
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub full_name: String,

    pub email: String,

    pub password: String,

    pub confirm_password: String,

    pub role: String,

    #[serde(default)]
    pub phone_number: String,

    #[serde(default)]
    pub address: String,

    pub latitude: Option<f64>,

    pub longitude: Option<f64>,
}

/// Request body for logging in.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Public view of a user, safe to return to API clients.
///
/// Password material is never serialized.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: Uuid,
    pub email: String,
    pub role: String,
    pub full_name: String,
    pub phone_number: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub is_verified: bool,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            full_name: user.full_name,
            phone_number: user.phone_number,
            address: user.address,
            latitude: user.latitude,
            longitude: user.longitude,
            is_verified: user.is_verified,
            created_at: user.created_at,
        }
    }
}

/// Response body for a successful login.
///
/// The `token` is the bearer session token. It is shown exactly once;
/// only its SHA-256 hash is persisted.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_listed_roles_are_valid() {
        for role in ROLES {
            assert!(is_valid_role(role));
        }
    }

    #[test]
    fn unknown_roles_are_rejected() {
        assert!(!is_valid_role("superuser"));
        assert!(!is_valid_role("donor"));
        assert!(!is_valid_role(""));
    }
}
