mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::json;

// ===== Health Tests =====

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::new().await;

    let response = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers().contains_key("x-request-id"));

    let body = response_json(response).await;
    assert_eq!(body["status"], "up");
    assert_eq!(body["checks"]["database"]["status"], "up");
}

// ===== Auth Tests =====

#[tokio::test]
async fn register_login_and_profile() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Dewi",
                "email": "Dewi@Example.com",
                "password": "s3cret-pass"
            })),
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = response_json(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["email"], "dewi@example.com");
    assert_eq!(body["data"]["role"], "customer");
    assert!(body["data"].get("password_hash").is_none());

    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/auth/register",
            Some(json!({
                "name": "Dewi again",
                "email": "dewi@example.com",
                "password": "another-pass"
            })),
            None,
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let wrong = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "dewi@example.com", "password": "nope-nope" })),
            None,
        )
        .await;
    assert_eq!(wrong.status(), StatusCode::UNAUTHORIZED);

    let login = app
        .request(
            Method::POST,
            "/api/v1/auth/login",
            Some(json!({ "email": "dewi@example.com", "password": "s3cret-pass" })),
            None,
        )
        .await;
    assert_eq!(login.status(), StatusCode::OK);
    let body = response_json(login).await;
    let token = body["data"]["access_token"]
        .as_str()
        .expect("access token")
        .to_string();
    assert_eq!(body["data"]["token_type"], "Bearer");

    let profile = app
        .request(Method::GET, "/api/v1/auth/profile", None, Some(&token))
        .await;
    assert_eq!(profile.status(), StatusCode::OK);
    let body = response_json(profile).await;
    assert_eq!(body["data"]["name"], "Dewi");
}

#[tokio::test]
async fn protected_routes_require_a_valid_token() {
    let app = TestApp::new().await;

    let missing = app.request(Method::GET, "/api/v1/cart", None, None).await;
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);

    let garbage = app
        .request(Method::GET, "/api/v1/cart", None, Some("not-a-jwt"))
        .await;
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    let body = response_json(garbage).await;
    assert_eq!(body["code"], "AUTH_INVALID_TOKEN");
}

// ===== Catalog Tests =====

#[tokio::test]
async fn catalog_writes_are_admin_only_and_hide_purchase_price() {
    let app = TestApp::new().await;
    let (_, customer_token) = app.seed_customer().await;
    let (_, admin_token) = app.seed_admin().await;

    let forbidden = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "Home Office" })),
            Some(&customer_token),
        )
        .await;
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let created = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "Home Office" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(created.status(), StatusCode::CREATED);
    let category = response_json(created).await;
    assert_eq!(category["data"]["slug"], "home-office");
    let category_id = category["data"]["id"].as_str().unwrap().to_string();

    let duplicate = app
        .request(
            Method::POST,
            "/api/v1/categories",
            Some(json!({ "name": "home office" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(duplicate.status(), StatusCode::CONFLICT);

    let bad_price = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Desk Lamp",
                "purchase_price": "50000",
                "selling_price": "40000",
                "stock": 3,
                "category_id": category_id
            })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(bad_price.status(), StatusCode::BAD_REQUEST);

    let product = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({
                "name": "Desk Lamp",
                "purchase_price": "40000",
                "selling_price": "55000",
                "stock": 3,
                "category_id": category_id
            })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(product.status(), StatusCode::CREATED);
    let product = response_json(product).await;
    let product_id = product["data"]["id"].as_str().unwrap().to_string();

    let public = app
        .request(
            Method::GET,
            &format!("/api/v1/products/{}", product_id),
            None,
            None,
        )
        .await;
    assert_eq!(public.status(), StatusCode::OK);
    let body = response_json(public).await;
    assert!(body["data"].get("purchase_price").is_none());
    assert_eq!(body["data"]["name"], "Desk Lamp");

    let listed = app
        .request(
            Method::GET,
            &format!("/api/v1/products?category_id={}", category_id),
            None,
            None,
        )
        .await;
    assert_eq!(listed.status(), StatusCode::OK);
    let body = response_json(listed).await;
    assert_eq!(body["data"].as_array().map(Vec::len), Some(1));
    assert_eq!(body["meta"]["pagination"]["total"], 1);
}

// ===== Cart and Checkout Tests =====

#[tokio::test]
async fn cart_checkout_and_confirm_over_http() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_customer().await;
    let a = app.seed_product("Product A", dec!(10000), 5).await;
    let b = app.seed_product("Product B", dec!(5000), 5).await;

    for (product_id, quantity) in [(a.id, 2), (b.id, 1)] {
        let added = app
            .request(
                Method::POST,
                "/api/v1/cart",
                Some(json!({ "product_id": product_id, "quantity": quantity })),
                Some(&token),
            )
            .await;
        assert_eq!(added.status(), StatusCode::CREATED);
    }

    let count = app
        .request(Method::GET, "/api/v1/cart/count", None, Some(&token))
        .await;
    assert_eq!(response_json(count).await["data"]["count"], 2);

    let checkout_body = json!({
        "shipping_address": "Jl. Sudirman 5, Jakarta",
        "payment_method": "bank_transfer"
    });

    let summary = app
        .request(
            Method::POST,
            "/api/v1/checkout/summary",
            Some(checkout_body.clone()),
            Some(&token),
        )
        .await;
    assert_eq!(summary.status(), StatusCode::OK);
    let summary = response_json(summary).await;
    assert_eq!(summary["data"]["total_items"], 3);

    let checkout = app
        .request(
            Method::POST,
            "/api/v1/checkout",
            Some(checkout_body.clone()),
            Some(&token),
        )
        .await;
    assert_eq!(checkout.status(), StatusCode::CREATED);
    let created = response_json(checkout).await;
    assert_eq!(created["data"]["status"], "pending");
    let transaction_id = created["data"]["transaction_id"]
        .as_str()
        .unwrap()
        .to_string();

    let empty = app
        .request(Method::POST, "/api/v1/checkout", Some(checkout_body), Some(&token))
        .await;
    assert_eq!(empty.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(empty).await["code"], "EMPTY_CART");

    let confirm_uri = format!("/api/v1/transactions/{}/confirm", transaction_id);
    let confirmed = app
        .request(
            Method::POST,
            &confirm_uri,
            Some(json!({ "payment_proof": "receipt.png" })),
            Some(&token),
        )
        .await;
    assert_eq!(confirmed.status(), StatusCode::OK);
    assert_eq!(response_json(confirmed).await["data"]["status"], "paid");

    let again = app
        .request(
            Method::POST,
            &confirm_uri,
            Some(json!({ "payment_proof": "receipt.png" })),
            Some(&token),
        )
        .await;
    assert_eq!(again.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response_json(again).await["code"], "INVALID_STATE");

    let history = app
        .request(Method::GET, "/api/v1/transactions", None, Some(&token))
        .await;
    assert_eq!(history.status(), StatusCode::OK);
    assert_eq!(
        response_json(history).await["data"].as_array().map(Vec::len),
        Some(1)
    );
}

#[tokio::test]
async fn another_users_transaction_is_forbidden() {
    let app = TestApp::new().await;
    let (owner, _) = app.seed_customer().await;
    let (_, stranger_token) = app.seed_customer().await;
    let a = app.seed_product("Product A", dec!(10000), 5).await;
    app.add_to_cart(owner.id, a.id, 1).await;
    let created = app
        .state
        .services
        .checkout
        .process_checkout(
            owner.id,
            storefront_api::services::commerce::CheckoutRequest {
                shipping_address: "Somewhere 1".to_string(),
                payment_method: storefront_api::entities::commerce::PaymentMethod::Cod,
                notes: None,
            },
        )
        .await
        .unwrap();

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/transactions/{}", created.transaction_id),
            None,
            Some(&stranger_token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
    assert_eq!(response_json(response).await["code"], "FORBIDDEN");
}

#[tokio::test]
async fn insufficient_stock_error_names_the_product() {
    let app = TestApp::new().await;
    let (_, token) = app.seed_customer().await;
    let a = app.seed_product("Product A", dec!(10000), 1).await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/cart",
            Some(json!({ "product_id": a.id, "quantity": 2 })),
            Some(&token),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["code"], "INSUFFICIENT_STOCK");
    assert_eq!(
        body["message"],
        "insufficient stock for product Product A (available: 1, requested: 2)"
    );
}

// ===== Admin Tests =====

#[tokio::test]
async fn admin_transaction_routes_reject_customers() {
    let app = TestApp::new().await;
    let (customer, customer_token) = app.seed_customer().await;
    let (_, admin_token) = app.seed_admin().await;
    let a = app.seed_product("Product A", dec!(10000), 5).await;
    app.add_to_cart(customer.id, a.id, 1).await;
    let created = app
        .state
        .services
        .checkout
        .process_checkout(
            customer.id,
            storefront_api::services::commerce::CheckoutRequest {
                shipping_address: "Somewhere 1".to_string(),
                payment_method: storefront_api::entities::commerce::PaymentMethod::EWallet,
                notes: None,
            },
        )
        .await
        .unwrap();

    let denied = app
        .request(
            Method::GET,
            "/api/v1/admin/transactions",
            None,
            Some(&customer_token),
        )
        .await;
    assert_eq!(denied.status(), StatusCode::FORBIDDEN);

    let listed = app
        .request(
            Method::GET,
            "/api/v1/admin/transactions?status=pending",
            None,
            Some(&admin_token),
        )
        .await;
    assert_eq!(listed.status(), StatusCode::OK);
    let body = response_json(listed).await;
    assert_eq!(body["meta"]["pagination"]["total"], 1);

    let status_uri = format!("/api/v1/admin/transactions/{}/status", created.transaction_id);
    let to_paid = app
        .request(
            Method::PUT,
            &status_uri,
            Some(json!({ "status": "paid" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(to_paid.status(), StatusCode::BAD_REQUEST);

    let expired = app
        .request(
            Method::PUT,
            &status_uri,
            Some(json!({ "status": "expired" })),
            Some(&admin_token),
        )
        .await;
    assert_eq!(expired.status(), StatusCode::OK);
    assert_eq!(response_json(expired).await["data"]["status"], "expired");
}
