mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use sea_orm::{ActiveModelTrait, Set};
use storefront_api::{entities::commerce::product, repositories::ProductRepository};
use uuid::Uuid;

#[tokio::test]
async fn prices_keep_their_fractional_digits() {
    let app = TestApp::new().await;
    let seeded = app.seed_product("Espresso Beans", dec!(1200), 10).await;

    let mut active: product::ActiveModel = seeded.clone().into();
    active.selling_price = Set(dec!(1234.25));
    active.purchase_price = Set(dec!(617.125));
    active.update(&*app.state.db).await.unwrap();

    let stored = ProductRepository
        .find_by_id(&*app.state.db, seeded.id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(stored.selling_price, dec!(1234.25));
    assert_eq!(stored.purchase_price, dec!(617.125));
}

#[tokio::test]
async fn decrement_never_drives_stock_negative() {
    let app = TestApp::new().await;
    let seeded = app.seed_product("Last Unit", dec!(9000), 1).await;
    let db = &*app.state.db;

    let refused = ProductRepository
        .decrement_stock(db, seeded.id, 2)
        .await
        .unwrap();
    assert_eq!(refused, None);
    assert_eq!(app.product_stock(seeded.id).await, 1);

    let taken = ProductRepository
        .decrement_stock(db, seeded.id, 1)
        .await
        .unwrap();
    assert_eq!(taken, Some(0));
    assert_eq!(app.product_stock(seeded.id).await, 0);

    let empty = ProductRepository
        .decrement_stock(db, seeded.id, 1)
        .await
        .unwrap();
    assert_eq!(empty, None);
    assert_eq!(app.product_stock(seeded.id).await, 0);
}

#[tokio::test]
async fn decrement_of_unknown_product_is_refused() {
    let app = TestApp::new().await;

    let result = ProductRepository
        .decrement_stock(&*app.state.db, Uuid::new_v4(), 1)
        .await
        .unwrap();
    assert_eq!(result, None);
}
