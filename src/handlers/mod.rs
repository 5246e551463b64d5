//! HTTP request handlers (route handlers).
//!
//! Each handler is an async function that:
//! 1. Receives HTTP request data (JSON body, URL params, etc.)
//! 2. Performs business logic (database queries, validation)
//! 3. Returns HTTP response (JSON, status code)

/// Platform metrics and activity feed endpoints
pub mod analytics;
/// Registration, login, and session endpoints
pub mod auth;
/// Delivery lifecycle endpoints
pub mod deliveries;
/// Donation listing and request endpoints
pub mod donations;
/// Liveness probe
pub mod health;
/// Plan catalog and subscription endpoints
pub mod subscriptions;
/// Volunteer profile and earnings endpoints
pub mod volunteers;
/// Wallet balance and ledger endpoints
pub mod wallet;
