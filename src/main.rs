//! KindPlate - Main Application Entry Point
//!
//! This is a REST API server for a food donation platform. Donors list
//! surplus food, receivers claim it, and volunteers carry approved donations
//! across town, with wallet payments and subscription tiers on top.
//!
//! # Architecture
//!
//! - **Web Framework**: Axum (async HTTP server)
//! - **Database**: PostgreSQL with sqlx (async queries)
//! - **Authentication**: Bearer session tokens with SHA-256 hashing
//! - **Format**: JSON requests/responses
//!
//! # Startup Flow
//!
//! 1. Load configuration from environment variables
//! 2. Create database connection pool
//! 3. Run database migrations
//! 4. Build HTTP router with routes and middleware
//! 5. Start server on configured port

mod config;
mod db;
mod error;
mod handlers;
mod middleware;
mod models;
mod services;

use tracing_subscriber::EnvFilter;

use axum::{
    Extension, Router, middleware as axum_middleware,
    routing::{delete, get, post, put},
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging with tracing subscriber. Reads RUST_LOG environment variable (defaults to "info" level)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    // Load configuration
    let config = config::Config::from_env()?;
    tracing::info!("Configuration loaded");

    // Create database pool
    let pool = db::create_pool(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database pool created");

    // Run migrations
    db::run_migrations(&pool).await?;
    tracing::info!("Database migrations complete");

    // Create authenticated routes (API endpoints)
    let authenticated_routes = Router::new()
        // Session routes
        .route("/api/v1/auth/logout", post(handlers::auth::logout))
        .route("/api/v1/auth/me", get(handlers::auth::me))
        // Donation marketplace routes
        .route("/api/v1/donations", post(handlers::donations::create_donation))
        .route("/api/v1/donations", get(handlers::donations::browse_donations))
        .route(
            "/api/v1/donations/mine",
            get(handlers::donations::list_my_donations),
        )
        .route("/api/v1/donations/{id}", get(handlers::donations::get_donation))
        .route(
            "/api/v1/donations/{id}",
            put(handlers::donations::update_donation),
        )
        .route(
            "/api/v1/donations/{id}",
            delete(handlers::donations::delete_donation),
        )
        .route(
            "/api/v1/donations/{id}/requests",
            post(handlers::donations::create_request),
        )
        .route(
            "/api/v1/requests/{id}/status",
            post(handlers::donations::update_request_status),
        )
        .route(
            "/api/v1/notifications",
            get(handlers::donations::notifications),
        )
        .route(
            "/api/v1/notifications/read",
            post(handlers::donations::mark_notifications_read),
        )
        // Delivery lifecycle routes
        .route(
            "/api/v1/deliveries",
            post(handlers::deliveries::create_delivery),
        )
        .route(
            "/api/v1/deliveries",
            get(handlers::deliveries::list_deliveries),
        )
        .route(
            "/api/v1/deliveries/{id}",
            get(handlers::deliveries::get_delivery),
        )
        .route(
            "/api/v1/deliveries/{id}/fee",
            get(handlers::deliveries::get_fee),
        )
        .route(
            "/api/v1/deliveries/{id}/pay",
            post(handlers::deliveries::pay_delivery),
        )
        .route(
            "/api/v1/deliveries/{id}/assign",
            post(handlers::deliveries::assign_delivery),
        )
        .route(
            "/api/v1/deliveries/{id}/pickup",
            post(handlers::deliveries::pickup_delivery),
        )
        .route(
            "/api/v1/deliveries/{id}/complete",
            post(handlers::deliveries::complete_delivery),
        )
        .route(
            "/api/v1/deliveries/{id}/cancel",
            post(handlers::deliveries::cancel_delivery),
        )
        .route(
            "/api/v1/deliveries/{id}/rating",
            post(handlers::deliveries::rate_delivery),
        )
        // Volunteer routes
        .route(
            "/api/v1/volunteers/profile",
            post(handlers::volunteers::create_profile),
        )
        .route(
            "/api/v1/volunteers/profile",
            get(handlers::volunteers::get_profile),
        )
        .route(
            "/api/v1/volunteers/location",
            put(handlers::volunteers::update_location),
        )
        .route(
            "/api/v1/volunteers/status",
            put(handlers::volunteers::update_availability),
        )
        .route(
            "/api/v1/volunteers/earnings",
            get(handlers::volunteers::list_earnings),
        )
        // Subscription routes
        .route(
            "/api/v1/subscriptions/subscribe",
            post(handlers::subscriptions::subscribe),
        )
        .route(
            "/api/v1/subscriptions/current",
            get(handlers::subscriptions::current_subscription),
        )
        .route(
            "/api/v1/subscriptions/billing",
            get(handlers::subscriptions::billing_history),
        )
        // Wallet routes
        .route("/api/v1/wallet", get(handlers::wallet::get_wallet))
        .route("/api/v1/wallet/recharge", post(handlers::wallet::recharge))
        .route(
            "/api/v1/wallet/transactions",
            get(handlers::wallet::list_transactions),
        )
        // Analytics routes
        .route(
            "/api/v1/analytics/platform",
            get(handlers::analytics::platform_metrics),
        )
        .route(
            "/api/v1/analytics/activity",
            get(handlers::analytics::recent_activity),
        )
        // Apply authentication middleware to all routes in this group
        .route_layer(axum_middleware::from_fn_with_state(
            pool.clone(),
            middleware::auth::auth_middleware,
        ));

    // Combine authenticated routes with public routes
    let app = Router::new()
        // Public routes (no authentication required)
        .route("/health", get(handlers::health::health_check))
        .route("/api/v1/auth/register", post(handlers::auth::register))
        .route("/api/v1/auth/login", post(handlers::auth::login))
        .route("/api/v1/plans", get(handlers::subscriptions::list_plans))
        // Merge authenticated routes
        .merge(authenticated_routes)
        // Add distributed tracing middleware for observability
        .layer(TraceLayer::new_for_http())
        // Browser clients run on a different origin in development
        .layer(CorsLayer::permissive())
        // Handlers read session TTL and other settings from the config
        .layer(Extension(config.clone()))
        // Share database pool with all handlers via State extraction
        .with_state(pool);

    // Bind to network address and start server
    let addr = format!("0.0.0.0:{}", config.server_port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    // Start serving HTTP requests
    // This blocks forever, handling requests concurrently with tokio
    axum::serve(listener, app).await?;

    Ok(())
}
