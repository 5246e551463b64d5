//! Data models representing database entities.
//!
//! This module contains all data structures that map to database tables,
//! plus the request/response types the API exchanges with clients.

/// Daily metrics and user activity audit trail
pub mod analytics;
/// Delivery lifecycle, fees, and ratings
pub mod delivery;
/// Donation listings, requests, and notifications
pub mod donation;
/// Login session model
pub mod session;
/// Subscription plans, enrollments, and billing
pub mod subscription;
/// Platform user model
pub mod user;
/// Volunteer profiles and earnings
pub mod volunteer;
/// Wallet and its transaction ledger
pub mod wallet;
