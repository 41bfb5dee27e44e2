#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Method, Request},
    response::Response,
    Router,
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::Set;
use serde_json::Value;
use storefront_api::{
    auth::{user, UserRole},
    build_router,
    config::AppConfig,
    db,
    entities::commerce::product,
    events::{self, EventSender},
    repositories::UserRepository,
    services::commerce::{AddToCartRequest, ProductRequest},
    AppState,
};
use tokio::sync::mpsc;
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_JWT_SECRET: &str = "test_secret_key_for_testing_purposes_only_32chars";

/// Helper harness for spinning up an application state backed by an in-memory SQLite database.
pub struct TestApp {
    router: Router,
    pub state: AppState,
    _event_task: tokio::task::JoinHandle<()>,
}

impl TestApp {
    /// Construct a new test application with fresh database state.
    pub async fn new() -> Self {
        let mut cfg = AppConfig::new(
            "sqlite::memory:".to_string(),
            TEST_JWT_SECRET.to_string(),
            "127.0.0.1".to_string(),
            18_080,
            "test".to_string(),
        );
        // A single pooled connection keeps every query on the same in-memory database.
        cfg.db_max_connections = 1;
        cfg.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to run migrations in tests");

        let (event_tx, event_rx) = mpsc::channel(256);
        let event_sender = Arc::new(EventSender::new(event_tx));
        let event_task = tokio::spawn(events::process_events(event_rx, cfg.low_stock_threshold));

        let state = AppState::new(Arc::new(pool), event_sender, cfg);
        let router = build_router(state.clone());

        Self {
            router,
            state,
            _event_task: event_task,
        }
    }

    /// Inserts a user directly and returns it with a signed bearer token.
    pub async fn seed_user(&self, email: &str, role: UserRole) -> (user::Model, String) {
        let now = Utc::now();
        let model = UserRepository
            .create(
                &*self.state.db,
                user::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(format!("Test {}", email)),
                    email: Set(email.to_lowercase()),
                    password_hash: Set(String::new()),
                    role: Set(role),
                    created_at: Set(now),
                    updated_at: Set(now),
                },
            )
            .await
            .expect("seed user for tests");

        let token = self
            .state
            .services
            .auth
            .generate_token(&model)
            .expect("sign test token");
        (model, token)
    }

    pub async fn seed_customer(&self) -> (user::Model, String) {
        let email = format!("customer-{}@example.com", Uuid::new_v4().simple());
        self.seed_user(&email, UserRole::Customer).await
    }

    pub async fn seed_admin(&self) -> (user::Model, String) {
        let email = format!("admin-{}@example.com", Uuid::new_v4().simple());
        self.seed_user(&email, UserRole::Admin).await
    }

    /// Creates a product through the catalog service; purchase price is half the selling price.
    pub async fn seed_product(&self, name: &str, price: Decimal, stock: i32) -> product::Model {
        self.state
            .services
            .product_catalog
            .create_product(ProductRequest {
                name: name.to_string(),
                description: Some(format!("{} seeded for integration tests", name)),
                purchase_price: price / Decimal::from(2),
                selling_price: price,
                stock,
                category_id: None,
                image_url: None,
            })
            .await
            .expect("seed product for tests")
    }

    pub async fn add_to_cart(&self, user_id: Uuid, product_id: Uuid, quantity: i32) {
        self.state
            .services
            .cart
            .add_to_cart(
                user_id,
                AddToCartRequest {
                    product_id,
                    quantity,
                },
            )
            .await
            .expect("add item to cart");
    }

    pub async fn product_stock(&self, product_id: Uuid) -> i32 {
        self.state
            .services
            .product_catalog
            .get_product(product_id)
            .await
            .expect("product exists")
            .stock
    }

    /// Send a request against the router with an optional bearer token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        token: Option<&str>,
    ) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(tok) = token {
            builder = builder.header("authorization", format!("Bearer {}", tok));
        }

        let body = if let Some(json) = body {
            builder = builder.header("content-type", "application/json");
            Body::from(serde_json::to_vec(&json).expect("failed to serialize json request body"))
        } else {
            Body::empty()
        };

        let request = builder.body(body).expect("failed to build request");
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("router error during test request")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        self._event_task.abort();
    }
}

/// Reads a response body as JSON
pub async fn response_json(response: Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read response body");
    serde_json::from_slice(&bytes).expect("response body is JSON")
}
