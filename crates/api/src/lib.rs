//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - REST API routes under `/api/v1`
//! - Authentication middleware and the household guard
//! - Request extractors that answer with the JSON error body
//! - The dashboard view cache

pub mod cache;
pub mod error;
pub mod extractors;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use nestegg_db::{LocalTransactionStore, RetryPolicy};
use nestegg_shared::{AppConfig, JwtConfig, JwtService};
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use cache::ViewCache;
pub use error::{ApiError, ApiResult};

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// JWT service for validating session tokens.
    pub jwt_service: Arc<JwtService>,
    /// In-memory transactions for guests without a session.
    pub guest_transactions: LocalTransactionStore,
    /// Cached dashboard views.
    pub views: ViewCache,
    /// Retry policy for transient storage failures.
    pub retry: RetryPolicy,
}

impl AppState {
    /// Builds the state from loaded configuration and an open pool.
    #[must_use]
    pub fn new(config: &AppConfig, db: DatabaseConnection) -> Self {
        let jwt_service = JwtService::new(JwtConfig {
            secret: config.jwt.secret.clone(),
            access_token_expires_minutes: i64::try_from(config.jwt.access_token_expiry_secs / 60)
                .unwrap_or(i64::MAX),
        });
        Self {
            db: Arc::new(db),
            jwt_service: Arc::new(jwt_service),
            guest_transactions: LocalTransactionStore::new(),
            views: ViewCache::with_config(config.cache.max_capacity, config.cache.ttl_secs),
            retry: RetryPolicy::from(&config.retry),
        }
    }

    /// Connection handle for building a repository.
    #[must_use]
    pub fn conn(&self) -> DatabaseConnection {
        (*self.db).clone()
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", routes::api_routes_with_state(state.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
