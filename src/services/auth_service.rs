//! Authentication service: registration, login, and session management.
//!
//! # Password Storage
//!
//! Passwords are never stored. Each user gets a random 16-byte salt and the
//! database keeps `hex(HMAC-SHA256(key = salt, message = password))`. Login
//! recomputes the MAC and compares.
//!
//! # Sessions
//!
//! A successful login mints a 32-byte random hex token. The client keeps the
//! token; the database keeps only its SHA-256 hash with a hard expiry.

use crate::{
    db::DbPool,
    error::AppError,
    middleware::auth::hash_token,
    models::{
        session::Session,
        user::{RegisterRequest, User, is_valid_role},
    },
};
use chrono::{Duration, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use uuid::Uuid;

type HmacSha256 = Hmac<Sha256>;

/// Generate a random 16-byte salt, hex encoded.
pub fn generate_salt() -> String {
    let bytes: [u8; 16] = rand::random();
    hex::encode(bytes)
}

/// Hash a password with the given hex salt.
///
/// # Output
///
/// 64 hex characters (the HMAC-SHA256 digest)
pub fn hash_password(password: &str, salt_hex: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(salt_hex.as_bytes()).expect("HMAC key length is valid");
    mac.update(password.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

/// Check a password attempt against a stored salt + hash pair.
pub fn verify_password(password: &str, salt_hex: &str, stored_hash: &str) -> bool {
    hash_password(password, salt_hex) == stored_hash
}

/// Generate a session token for the client.
///
/// # Output
///
/// 64 hex characters (32 random bytes)
pub fn generate_session_token() -> String {
    let bytes: [u8; 32] = rand::random();
    hex::encode(bytes)
}

/// Register a new user account.
///
/// # Process
///
/// 1. Validate the role and the password/confirmation pair
/// 2. Reject emails that already have an account
/// 3. Salt and hash the password
/// 4. Insert the user row
///
/// # Errors
///
/// - `InvalidRequest`: Unknown role or blank required field
/// - `PasswordMismatch`: Confirmation does not match
/// - `EmailTaken`: Email already registered
pub async fn register(pool: &DbPool, req: RegisterRequest) -> Result<User, AppError> {
    if !is_valid_role(&req.role) {
        return Err(AppError::InvalidRequest(format!(
            "Unknown role: {}",
            req.role
        )));
    }

    if req.full_name.trim().is_empty() || req.email.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "Name and email are required".to_string(),
        ));
    }

    if req.password.is_empty() || req.password != req.confirm_password {
        return Err(AppError::PasswordMismatch);
    }

    let email = req.email.trim().to_lowercase();

    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
        .bind(&email)
        .fetch_one(pool)
        .await?;

    if exists {
        return Err(AppError::EmailTaken);
    }

    let salt = generate_salt();
    let password_hash = hash_password(&req.password, &salt);

    let user = sqlx::query_as::<_, User>(
        r#"
        INSERT INTO users (
            email,
            password_hash,
            password_salt,
            role,
            full_name,
            phone_number,
            address,
            latitude,
            longitude
        )
        VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        RETURNING *
        "#,
    )
    .bind(&email)
    .bind(&password_hash)
    .bind(&salt)
    .bind(&req.role)
    .bind(req.full_name.trim())
    .bind(&req.phone_number)
    .bind(&req.address)
    .bind(req.latitude)
    .bind(req.longitude)
    .fetch_one(pool)
    .await?;

    Ok(user)
}

/// Log a user in and mint a session.
///
/// Returns the plaintext token (shown to the client exactly once) together
/// with the user row.
///
/// # Errors
///
/// - `InvalidCredentials`: Unknown email or wrong password. The two cases are
///   indistinguishable to the caller on purpose.
pub async fn login(
    pool: &DbPool,
    email: &str,
    password: &str,
    session_ttl_hours: i64,
) -> Result<(String, User), AppError> {
    let email = email.trim().to_lowercase();

    let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
        .bind(&email)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    if !verify_password(password, &user.password_salt, &user.password_hash) {
        return Err(AppError::InvalidCredentials);
    }

    let token = generate_session_token();
    let expires_at = Utc::now() + Duration::hours(session_ttl_hours);

    sqlx::query_as::<_, Session>(
        r#"
        INSERT INTO sessions (user_id, token_hash, expires_at)
        VALUES ($1, $2, $3)
        RETURNING *
        "#,
    )
    .bind(user.id)
    .bind(hash_token(&token))
    .bind(expires_at)
    .fetch_one(pool)
    .await?;

    Ok((token, user))
}

/// Delete the session behind a bearer token. Unknown tokens are a no-op.
pub async fn logout(pool: &DbPool, token: &str) -> Result<(), AppError> {
    sqlx::query("DELETE FROM sessions WHERE token_hash = $1")
        .bind(hash_token(token))
        .execute(pool)
        .await?;

    Ok(())
}

/// Fetch a user by id.
pub async fn get_user(pool: &DbPool, user_id: Uuid) -> Result<User, AppError> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
        .bind(user_id)
        .fetch_optional(pool)
        .await?
        .ok_or(AppError::UserNotFound)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hashing_round_trips() {
        let salt = generate_salt();
        let hash = hash_password("hunter2hunter2", &salt);
        assert!(verify_password("hunter2hunter2", &salt, &hash));
    }

    #[test]
    fn wrong_password_fails_verification() {
        let salt = generate_salt();
        let hash = hash_password("correct horse", &salt);
        assert!(!verify_password("wrong horse", &salt, &hash));
    }

    #[test]
    fn salts_are_unique_per_user() {
        assert_ne!(generate_salt(), generate_salt());
    }

    #[test]
    fn same_password_different_salt_different_hash() {
        let a = hash_password("password123", &generate_salt());
        let b = hash_password("password123", &generate_salt());
        assert_ne!(a, b);
    }

    #[test]
    fn session_tokens_are_64_hex_chars() {
        let token = generate_session_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(token, generate_session_token());
    }
}
