//! Storefront API Library
//!
//! Catalog, cart, checkout and transaction services behind an axum HTTP API.
#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![allow(elided_lifetimes_in_paths)]
#![warn(clippy::all, clippy::perf, clippy::dbg_macro)]

pub mod auth;
pub mod config;
pub mod db;
pub mod entities;
pub mod errors;
pub mod events;
pub mod handlers;
pub mod middleware_helpers;
pub mod migrator;
pub mod repositories;
pub mod services;
pub mod tracing;

use axum::{extract::FromRef, http::HeaderValue, Router};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
};

use crate::auth::{AuthConfig, AuthService};
use crate::config::AppConfig;
use crate::events::EventSender;
use crate::services::{
    commerce::{CartService, CheckoutPricing, CheckoutService, ProductCatalogService},
    transactions::TransactionService,
    users::UserService,
};

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub auth: Arc<AuthService>,
    pub product_catalog: Arc<ProductCatalogService>,
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub transactions: Arc<TransactionService>,
    pub users: Arc<UserService>,
}

impl AppServices {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        config: &AppConfig,
    ) -> Self {
        Self {
            auth: Arc::new(AuthService::new(
                db.clone(),
                AuthConfig::from(config),
                event_sender.clone(),
            )),
            product_catalog: Arc::new(ProductCatalogService::new(
                db.clone(),
                event_sender.clone(),
            )),
            cart: Arc::new(CartService::new(db.clone(), event_sender.clone())),
            checkout: Arc::new(CheckoutService::new(
                db.clone(),
                event_sender.clone(),
                CheckoutPricing::from(config),
            )),
            transactions: Arc::new(TransactionService::new(db.clone(), event_sender.clone())),
            users: Arc::new(UserService::new(db, event_sender)),
        }
    }
}

// App state definition
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<DatabaseConnection>,
    pub config: Arc<AppConfig>,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>, config: AppConfig) -> Self {
        let services = AppServices::new(db.clone(), event_sender, &config);
        Self {
            db,
            config: Arc::new(config),
            services,
        }
    }
}

impl FromRef<AppState> for Arc<AuthService> {
    fn from_ref(state: &AppState) -> Self {
        state.services.auth.clone()
    }
}

/// Every versioned endpoint, mounted under `/api/v1`
pub fn api_v1_routes() -> Router<AppState> {
    Router::new()
        .nest("/auth", handlers::auth::auth_routes())
        .nest("/categories", handlers::commerce::categories::categories_routes())
        .nest("/products", handlers::commerce::products::products_routes())
        .nest("/cart", handlers::commerce::carts::carts_routes())
        .nest("/checkout", handlers::commerce::checkout::checkout_routes())
        .nest("/transactions", handlers::transactions::transactions_routes())
        .nest("/admin/users", handlers::users::admin_users_routes())
        .nest(
            "/admin/transactions",
            handlers::transactions::admin_transactions_routes(),
        )
        .merge(handlers::health::health_routes())
}

/// Full application router with the HTTP middleware stack applied
pub fn build_router(state: AppState) -> Router {
    let cors_layer = cors_layer(&state.config);
    let timeout = state.config.request_timeout();

    Router::new()
        .nest("/api/v1", api_v1_routes())
        .merge(handlers::health::health_routes())
        // HTTP tracing layer for consistent request/response telemetry
        .layer(crate::tracing::configure_http_tracing())
        .layer(TimeoutLayer::new(timeout))
        .layer(cors_layer)
        // Ensure every request carries a request id for traceability
        .layer(axum::middleware::from_fn(
            middleware_helpers::request_id_middleware,
        ))
        .with_state(state)
}

fn cors_layer(cfg: &AppConfig) -> CorsLayer {
    let origins: Vec<HeaderValue> = cfg
        .cors_origins()
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();

    if !origins.is_empty() {
        CorsLayer::new()
            .allow_origin(origins)
            .allow_methods(Any)
            .allow_headers(Any)
    } else if cfg.is_production() {
        ::tracing::warn!("No CORS origins configured; cross-origin requests will be rejected");
        CorsLayer::new()
    } else {
        ::tracing::info!("Using permissive CORS because explicit origins were not configured");
        CorsLayer::permissive()
    }
}
