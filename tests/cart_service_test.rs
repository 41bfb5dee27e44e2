mod common;

use assert_matches::assert_matches;
use common::TestApp;
use rust_decimal_macros::dec;
use storefront_api::{
    errors::ServiceError,
    repositories::CartRepository,
    services::commerce::{AddToCartRequest, UpdateCartItemRequest},
};
use uuid::Uuid;

#[tokio::test]
async fn adding_same_product_twice_merges_into_one_line() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer().await;
    let mug = app.seed_product("Ceramic Mug", dec!(3500), 10).await;

    app.add_to_cart(customer.id, mug.id, 2).await;
    app.add_to_cart(customer.id, mug.id, 3).await;

    let cart = app.state.services.cart.get_cart(customer.id).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].quantity, 5);
    assert_eq!(cart.items[0].subtotal, dec!(17500));
    assert_eq!(cart.total_items, 5);
    assert_eq!(cart.total_price, dec!(17500));
}

#[tokio::test]
async fn merged_quantity_may_not_exceed_stock() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer().await;
    let mug = app.seed_product("Ceramic Mug", dec!(3500), 4).await;
    app.add_to_cart(customer.id, mug.id, 3).await;

    let result = app
        .state
        .services
        .cart
        .add_to_cart(
            customer.id,
            AddToCartRequest {
                product_id: mug.id,
                quantity: 2,
            },
        )
        .await;

    assert_matches!(
        result,
        Err(ServiceError::InsufficientStock { available: 4, requested: 5, .. })
    );
    let cart = app.state.services.cart.get_cart(customer.id).await.unwrap();
    assert_eq!(cart.items[0].quantity, 3);
}

#[tokio::test]
async fn merge_that_would_overflow_is_rejected() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer().await;
    let bulk = app.seed_product("Bulk Screws", dec!(10), i32::MAX).await;
    CartRepository
        .add_or_increment(&*app.state.db, customer.id, bulk.id, i32::MAX)
        .await
        .unwrap();

    let result = app
        .state
        .services
        .cart
        .add_to_cart(
            customer.id,
            AddToCartRequest {
                product_id: bulk.id,
                quantity: 1,
            },
        )
        .await;

    assert_matches!(result, Err(ServiceError::ValidationError(_)));
    let cart = app.state.services.cart.get_cart(customer.id).await.unwrap();
    assert_eq!(cart.items[0].quantity, i32::MAX);
    assert_eq!(cart.total_items, i64::from(i32::MAX));
}

#[tokio::test]
async fn adding_unknown_product_fails() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer().await;
    let missing = Uuid::new_v4();

    let result = app
        .state
        .services
        .cart
        .add_to_cart(
            customer.id,
            AddToCartRequest {
                product_id: missing,
                quantity: 1,
            },
        )
        .await;

    assert_matches!(result, Err(ServiceError::ProductNotFound(id)) if id == missing);
}

#[tokio::test]
async fn count_is_number_of_distinct_lines() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer().await;
    let a = app.seed_product("Product A", dec!(1000), 10).await;
    let b = app.seed_product("Product B", dec!(2000), 10).await;
    app.add_to_cart(customer.id, a.id, 4).await;
    app.add_to_cart(customer.id, b.id, 1).await;

    let count = app
        .state
        .services
        .cart
        .get_cart_item_count(customer.id)
        .await
        .unwrap();
    assert_eq!(count, 2);
}

#[tokio::test]
async fn update_replaces_quantity() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer().await;
    let a = app.seed_product("Product A", dec!(1000), 10).await;
    app.add_to_cart(customer.id, a.id, 4).await;

    let updated = app
        .state
        .services
        .cart
        .update_cart_item(customer.id, a.id, UpdateCartItemRequest { quantity: 1 })
        .await
        .unwrap();
    assert_eq!(updated.quantity, 1);

    let too_many = app
        .state
        .services
        .cart
        .update_cart_item(customer.id, a.id, UpdateCartItemRequest { quantity: 11 })
        .await;
    assert_matches!(too_many, Err(ServiceError::InsufficientStock { .. }));
}

#[tokio::test]
async fn updating_or_removing_missing_line_is_not_found() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer().await;
    let a = app.seed_product("Product A", dec!(1000), 10).await;

    let update = app
        .state
        .services
        .cart
        .update_cart_item(customer.id, a.id, UpdateCartItemRequest { quantity: 1 })
        .await;
    assert_matches!(update, Err(ServiceError::NotFound(msg)) if msg == "cart item not found");

    let remove = app
        .state
        .services
        .cart
        .remove_from_cart(customer.id, a.id)
        .await;
    assert_matches!(remove, Err(ServiceError::NotFound(_)));
}

#[tokio::test]
async fn carts_are_isolated_per_user() {
    let app = TestApp::new().await;
    let (alice, _) = app.seed_customer().await;
    let (bob, _) = app.seed_customer().await;
    let a = app.seed_product("Product A", dec!(1000), 10).await;
    app.add_to_cart(alice.id, a.id, 2).await;

    let remove = app.state.services.cart.remove_from_cart(bob.id, a.id).await;
    assert_matches!(remove, Err(ServiceError::NotFound(_)));

    app.state.services.cart.clear_cart(bob.id).await.unwrap();
    let cart = app.state.services.cart.get_cart(alice.id).await.unwrap();
    assert_eq!(cart.total_items, 2);
}

#[tokio::test]
async fn remove_and_clear_empty_the_cart() {
    let app = TestApp::new().await;
    let (customer, _) = app.seed_customer().await;
    let a = app.seed_product("Product A", dec!(1000), 10).await;
    let b = app.seed_product("Product B", dec!(2000), 10).await;
    app.add_to_cart(customer.id, a.id, 1).await;
    app.add_to_cart(customer.id, b.id, 1).await;

    app.state
        .services
        .cart
        .remove_from_cart(customer.id, a.id)
        .await
        .unwrap();
    let cart = app.state.services.cart.get_cart(customer.id).await.unwrap();
    assert_eq!(cart.items.len(), 1);
    assert_eq!(cart.items[0].product_id, b.id);

    app.state.services.cart.clear_cart(customer.id).await.unwrap();
    let cart = app.state.services.cart.get_cart(customer.id).await.unwrap();
    assert!(cart.items.is_empty());
    assert_eq!(cart.total_price, dec!(0));
}
