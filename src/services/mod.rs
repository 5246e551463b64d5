//! Business logic services.
//!
//! Services contain core business logic separated from HTTP handlers.
//! They handle database transactions, validation, and complex operations.

pub mod analytics_service;
pub mod auth_service;
pub mod delivery_service;
pub mod fee;
pub mod geo;
pub mod subscription_service;
pub mod wallet_service;
