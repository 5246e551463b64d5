//! Error types and HTTP error response handling.
//!
//! This module defines all application errors and how they are converted
//! into HTTP responses with appropriate status codes and JSON bodies.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// Application-wide error type.
///
/// This enum represents all possible errors that can occur in the application.
/// Each variant maps to a specific HTTP status code and error message.
///
/// # Error Categories
///
/// - **Database Errors**: Any sqlx::Error from database operations
/// - **Authentication Errors**: Bad credentials or invalid session tokens
/// - **Authorization Errors**: Wrong role or missing subscription tier
/// - **Resource Errors**: Requested rows that do not exist or are not owned by the caller
/// - **Business Logic Errors**: Operations that violate marketplace rules
/// - **Validation Errors**: Invalid request data
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Database operation failed (e.g., connection error, query error).
    ///
    /// This wraps any sqlx::Error using the `#[from]` attribute, which
    /// automatically implements `From<sqlx::Error> for AppError`.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Email/password pair did not match a user.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// Session token is missing, unknown, or expired.
    ///
    /// Returns HTTP 401 Unauthorized.
    #[error("Invalid or expired session token")]
    InvalidSession,

    /// Authenticated user's role does not allow this operation.
    ///
    /// Returns HTTP 403 Forbidden.
    #[error("You do not have permission to perform this action")]
    Forbidden,

    /// Feature is locked behind a higher subscription tier.
    ///
    /// Returns HTTP 403 Forbidden. The String names the required tier or feature.
    #[error("This feature requires a {0} subscription")]
    SubscriptionRequired(String),

    /// Monthly quota from the user's subscription plan is exhausted.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Plan limit reached: {0}")]
    PlanLimitReached(String),

    /// Registration attempted with an email that already has an account.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Email already exists")]
    EmailTaken,

    /// Password and confirmation did not match during registration.
    ///
    /// Returns HTTP 400 Bad Request.
    #[error("Passwords do not match")]
    PasswordMismatch,

    /// Requested user does not exist.
    #[error("User not found")]
    UserNotFound,

    /// Donation does not exist or doesn't belong to the authenticated donor.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("Donation not found")]
    DonationNotFound,

    /// Donation request does not exist or is not visible to the caller.
    #[error("Request not found")]
    RequestNotFound,

    /// Receiver has already requested this donation (unique pair violation).
    ///
    /// Returns HTTP 409 Conflict.
    #[error("You have already requested this donation")]
    DuplicateRequest,

    /// Delivery does not exist or is not visible to the caller.
    #[error("Delivery not found")]
    DeliveryNotFound,

    /// No available volunteer with known coordinates could be matched.
    ///
    /// Returns HTTP 404 Not Found.
    #[error("No volunteer available for this pickup")]
    NoVolunteerAvailable,

    /// Volunteer profile does not exist for this user.
    #[error("Volunteer profile not found")]
    ProfileNotFound,

    /// Volunteer profile already exists for this user.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Volunteer profile already exists")]
    ProfileExists,

    /// Delivery has already been rated.
    ///
    /// Returns HTTP 409 Conflict.
    #[error("Delivery has already been rated")]
    DuplicateRating,

    /// Subscription plan does not exist or is inactive.
    #[error("Subscription plan not found")]
    PlanNotFound,

    /// Wallet has insufficient balance for the requested operation.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Insufficient balance")]
    InsufficientBalance,

    /// Submitted delivery OTP did not match.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    #[error("Invalid OTP")]
    InvalidOtp,

    /// Delivery is not in a status that allows the requested transition.
    ///
    /// Returns HTTP 422 Unprocessable Entity.
    /// The String describes the rejected transition.
    #[error("Invalid delivery status: {0}")]
    InvalidDeliveryStatus(String),

    /// Request body or parameters are invalid.
    ///
    /// Returns HTTP 400 Bad Request.
    /// The String contains details about what was invalid.
    #[error("Invalid request")]
    InvalidRequest(String),
}

/// Convert AppError into an HTTP response.
///
/// This implementation allows Axum handlers to return `Result<T, AppError>`
/// and have errors automatically converted to proper HTTP responses.
///
/// # Response Format
///
/// All errors return JSON in this format:
/// ```json
/// {
///   "error": {
///     "code": "error_type",
///     "message": "Human-readable error message"
///   }
/// }
/// ```
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Map each error variant to (HTTP status, error code, message)
        let (status, code, message) = match self {
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                self.to_string(),
            ),
            AppError::InvalidSession => {
                (StatusCode::UNAUTHORIZED, "invalid_session", self.to_string())
            }
            AppError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.to_string()),
            AppError::SubscriptionRequired(_) => (
                StatusCode::FORBIDDEN,
                "subscription_required",
                self.to_string(),
            ),
            AppError::PlanLimitReached(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "plan_limit_reached",
                self.to_string(),
            ),
            AppError::EmailTaken => (StatusCode::CONFLICT, "email_taken", self.to_string()),
            AppError::PasswordMismatch => (
                StatusCode::BAD_REQUEST,
                "password_mismatch",
                self.to_string(),
            ),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", self.to_string()),
            AppError::DonationNotFound => {
                (StatusCode::NOT_FOUND, "donation_not_found", self.to_string())
            }
            AppError::RequestNotFound => {
                (StatusCode::NOT_FOUND, "request_not_found", self.to_string())
            }
            AppError::DuplicateRequest => {
                (StatusCode::CONFLICT, "duplicate_request", self.to_string())
            }
            AppError::DeliveryNotFound => {
                (StatusCode::NOT_FOUND, "delivery_not_found", self.to_string())
            }
            AppError::NoVolunteerAvailable => (
                StatusCode::NOT_FOUND,
                "no_volunteer_available",
                self.to_string(),
            ),
            AppError::ProfileNotFound => {
                (StatusCode::NOT_FOUND, "profile_not_found", self.to_string())
            }
            AppError::ProfileExists => (StatusCode::CONFLICT, "profile_exists", self.to_string()),
            AppError::DuplicateRating => {
                (StatusCode::CONFLICT, "duplicate_rating", self.to_string())
            }
            AppError::PlanNotFound => (StatusCode::NOT_FOUND, "plan_not_found", self.to_string()),
            AppError::InsufficientBalance => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "insufficient_balance",
                self.to_string(),
            ),
            AppError::InvalidOtp => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_otp",
                self.to_string(),
            ),
            AppError::InvalidDeliveryStatus(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "invalid_delivery_status",
                self.to_string(),
            ),
            AppError::InvalidRequest(ref msg) => {
                (StatusCode::BAD_REQUEST, "invalid_request", msg.clone())
            }
            AppError::Database(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
                "An internal error occurred".to_string(),
            ),
        };

        // Build JSON response body
        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        // Return the response with status code and JSON body
        (status, body).into_response()
    }
}
