//! Session token authentication middleware.
//!
//! This middleware intercepts every protected request to:
//! 1. Extract the session token from the Authorization header
//! 2. Hash it and verify a live session exists in the database
//! 3. Inject authentication context into the request
//! 4. Reject unauthorized requests with HTTP 401

use crate::{db::DbPool, error::AppError};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Authentication context attached to authenticated requests.
///
/// This struct is inserted into the request's extension map and can be
/// extracted by route handlers to know who made the request.
#[derive(Debug, Clone)]
pub struct AuthContext {
    /// ID of the authenticated user
    ///
    /// Used to scope database queries (e.g., only show this user's donations)
    pub user_id: Uuid,

    /// Role of the authenticated user
    ///
    /// One of: admin, donor_restaurant, donor_individual, receiver_ngo,
    /// receiver_shelter, volunteer, corporate. Donor and receiver roles form
    /// families matched by prefix.
    pub role: String,

    /// Full name of the user making the request
    pub full_name: String,
}

impl AuthContext {
    /// True for both donor roles (restaurant and individual).
    pub fn is_donor(&self) -> bool {
        self.role.starts_with("donor")
    }

    /// True for both receiver roles (NGO and shelter).
    pub fn is_receiver(&self) -> bool {
        self.role.starts_with("receiver")
    }

    pub fn is_volunteer(&self) -> bool {
        self.role == "volunteer"
    }

    pub fn is_admin(&self) -> bool {
        self.role == "admin"
    }
}

/// Row shape returned by the session lookup join.
#[derive(Debug, sqlx::FromRow)]
struct SessionUser {
    user_id: Uuid,
    role: String,
    full_name: String,
}

/// Compute the SHA-256 hex digest of a session token.
///
/// Tokens are stored hashed so a leaked sessions table cannot be replayed.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Session token authentication middleware function.
///
/// # Flow
///
/// 1. Extract `Authorization: Bearer <token>` header from request
/// 2. Hash the `<token>` using SHA-256
/// 3. Query the sessions table (joined with users) for a matching,
///    unexpired session
/// 4. If found: inject `AuthContext` into request, call next handler
/// 5. If not found: return 401 Unauthorized error
///
/// # Headers
///
/// Expected header format:
/// ```
/// Authorization: Bearer abc123xyz
/// ```
pub async fn auth_middleware(
    State(pool): State<DbPool>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    // Step 1: Extract Authorization header
    let auth_header = request
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .ok_or(AppError::InvalidSession)?;

    // Step 2: Extract Bearer token
    // Expected format: "Bearer <session_token>"
    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::InvalidSession)?;

    // Step 3: Hash the token and look up a live session
    let token_hash = hash_token(token);

    let session = sqlx::query_as::<_, SessionUser>(
        r#"
        SELECT u.id AS user_id, u.role, u.full_name
        FROM sessions s
        JOIN users u ON u.id = s.user_id
        WHERE s.token_hash = $1 AND s.expires_at > NOW()
        "#,
    )
    .bind(&token_hash)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::InvalidSession)?;

    // Step 4: Create authentication context
    let auth_context = AuthContext {
        user_id: session.user_id,
        role: session.role,
        full_name: session.full_name,
    };

    // Step 5: Inject context into request extensions
    // Route handlers can now extract this using Extension<AuthContext>
    request.extensions_mut().insert(auth_context);

    // Step 6: Call the next middleware/handler
    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(role: &str) -> AuthContext {
        AuthContext {
            user_id: Uuid::new_v4(),
            role: role.to_string(),
            full_name: "Test User".to_string(),
        }
    }

    #[test]
    fn donor_roles_match_by_prefix() {
        assert!(ctx("donor_restaurant").is_donor());
        assert!(ctx("donor_individual").is_donor());
        assert!(!ctx("receiver_ngo").is_donor());
        assert!(!ctx("volunteer").is_donor());
    }

    #[test]
    fn receiver_roles_match_by_prefix() {
        assert!(ctx("receiver_ngo").is_receiver());
        assert!(ctx("receiver_shelter").is_receiver());
        assert!(!ctx("donor_individual").is_receiver());
    }

    #[test]
    fn exact_roles() {
        assert!(ctx("volunteer").is_volunteer());
        assert!(ctx("admin").is_admin());
        assert!(!ctx("corporate").is_admin());
        assert!(!ctx("corporate").is_donor());
        assert!(!ctx("corporate").is_receiver());
    }

    #[test]
    fn token_hash_is_hex_sha256() {
        let h = hash_token("secret-token");
        assert_eq!(h.len(), 64);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
        // Deterministic
        assert_eq!(h, hash_token("secret-token"));
        assert_ne!(h, hash_token("other-token"));
    }
}
