use crate::{
    entities::commerce::{cart_item, product},
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{CartLine, CartRepository, ProductRepository},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddToCartRequest {
    pub product_id: Uuid,
    #[validate(range(min = 1, max = 10000, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCartItemRequest {
    #[validate(range(min = 1, max = 10000, message = "Quantity must be at least 1"))]
    pub quantity: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartItemResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub product_name: String,
    pub product_price: Decimal,
    pub product_image: Option<String>,
    pub quantity: i32,
    pub subtotal: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CartItemResponse {
    fn new(item: cart_item::Model, product: &product::Model) -> Self {
        Self {
            id: item.id,
            user_id: item.user_id,
            product_id: item.product_id,
            product_name: product.name.clone(),
            product_price: product.selling_price,
            product_image: product.image_url.clone(),
            quantity: item.quantity,
            subtotal: product.selling_price * Decimal::from(item.quantity),
            created_at: item.created_at,
            updated_at: item.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CartResponse {
    pub items: Vec<CartItemResponse>,
    /// Sum of line quantities
    pub total_items: i64,
    pub total_price: Decimal,
}

impl CartResponse {
    fn from_lines(lines: Vec<CartLine>) -> Self {
        let items: Vec<CartItemResponse> = lines
            .into_iter()
            .filter_map(|CartLine { item, product }| {
                product.map(|p| CartItemResponse::new(item, &p))
            })
            .collect();
        let total_items: i64 = items.iter().map(|i| i64::from(i.quantity)).sum();
        let total_price: Decimal = items.iter().map(|i| i.subtotal).sum();
        Self {
            items,
            total_items,
            total_price,
        }
    }
}

/// Shopping cart operations for an authenticated user
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    carts: CartRepository,
    products: ProductRepository,
}

impl CartService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db,
            event_sender,
            carts: CartRepository,
            products: ProductRepository,
        }
    }

    /// Adds a product, merging into an existing line. The merged quantity
    /// may not exceed current stock.
    #[instrument(skip(self))]
    pub async fn add_to_cart(
        &self,
        user_id: Uuid,
        request: AddToCartRequest,
    ) -> Result<CartItemResponse, ServiceError> {
        request.validate()?;

        let txn = self.db.begin().await?;
        let product = self
            .products
            .find_by_id(&txn, request.product_id)
            .await?
            .ok_or(ServiceError::ProductNotFound(request.product_id))?;

        let already_in_cart = self
            .carts
            .find(&txn, user_id, request.product_id)
            .await?
            .map(|line| line.quantity)
            .unwrap_or(0);
        let merged = already_in_cart.checked_add(request.quantity).ok_or_else(|| {
            ServiceError::ValidationError("cart quantity is too large".to_string())
        })?;
        ensure_stock(&product, merged)?;

        let item = self
            .carts
            .add_or_increment(&txn, user_id, request.product_id, request.quantity)
            .await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartItemAdded {
                user_id,
                product_id: request.product_id,
                quantity: request.quantity,
            })
            .await;
        info!(%user_id, product_id = %request.product_id, quantity = merged, "Cart item added");

        Ok(CartItemResponse::new(item, &product))
    }

    #[instrument(skip(self))]
    pub async fn get_cart(&self, user_id: Uuid) -> Result<CartResponse, ServiceError> {
        let lines = self.carts.list(&*self.db, user_id).await?;
        Ok(CartResponse::from_lines(lines))
    }

    /// Replaces the quantity of an existing line
    #[instrument(skip(self))]
    pub async fn update_cart_item(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        request: UpdateCartItemRequest,
    ) -> Result<CartItemResponse, ServiceError> {
        request.validate()?;

        let product = self
            .products
            .find_by_id(&*self.db, product_id)
            .await?
            .ok_or(ServiceError::ProductNotFound(product_id))?;
        ensure_stock(&product, request.quantity)?;

        let item = self
            .carts
            .set_quantity(&*self.db, user_id, product_id, request.quantity)
            .await?
            .ok_or_else(|| ServiceError::NotFound("cart item not found".to_string()))?;

        self.event_sender
            .send_or_log(Event::CartItemUpdated {
                user_id,
                product_id,
                quantity: request.quantity,
            })
            .await;

        Ok(CartItemResponse::new(item, &product))
    }

    #[instrument(skip(self))]
    pub async fn remove_from_cart(
        &self,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<(), ServiceError> {
        if !self.carts.remove(&*self.db, user_id, product_id).await? {
            return Err(ServiceError::NotFound("cart item not found".to_string()));
        }

        self.event_sender
            .send_or_log(Event::CartItemRemoved {
                user_id,
                product_id,
            })
            .await;
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn clear_cart(&self, user_id: Uuid) -> Result<(), ServiceError> {
        let removed = self.carts.clear(&*self.db, user_id).await?;
        info!(%user_id, removed, "Cart cleared");
        self.event_sender
            .send_or_log(Event::CartCleared(user_id))
            .await;
        Ok(())
    }

    /// Number of distinct lines in the cart
    #[instrument(skip(self))]
    pub async fn get_cart_item_count(&self, user_id: Uuid) -> Result<u64, ServiceError> {
        Ok(self.carts.count(&*self.db, user_id).await?)
    }
}

fn ensure_stock(product: &product::Model, requested: i32) -> Result<(), ServiceError> {
    if product.stock < requested {
        return Err(ServiceError::InsufficientStock {
            product_id: product.id,
            product_name: product.name.clone(),
            available: product.stock,
            requested,
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    fn product(stock: i32) -> product::Model {
        let now = Utc::now();
        product::Model {
            id: Uuid::new_v4(),
            category_id: None,
            name: "Mug".into(),
            description: None,
            purchase_price: dec!(2000),
            selling_price: dec!(3500),
            stock,
            image_url: Some("https://img.example/mug.png".into()),
            created_at: now,
            updated_at: now,
        }
    }

    fn item(product_id: Uuid, quantity: i32) -> cart_item::Model {
        let now = Utc::now();
        cart_item::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id,
            quantity,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn ensure_stock_allows_exact_quantity() {
        let p = product(3);
        assert!(ensure_stock(&p, 3).is_ok());
        assert_matches!(
            ensure_stock(&p, 4),
            Err(ServiceError::InsufficientStock { available: 3, requested: 4, .. })
        );
    }

    #[test]
    fn cart_response_total_items_is_not_bounded_by_i32() {
        let a = product(i32::MAX);
        let b = product(i32::MAX);
        let lines = vec![
            CartLine {
                item: item(a.id, i32::MAX),
                product: Some(a),
            },
            CartLine {
                item: item(b.id, i32::MAX),
                product: Some(b),
            },
        ];
        let cart = CartResponse::from_lines(lines);
        assert_eq!(cart.total_items, 2 * i64::from(i32::MAX));
    }

    #[test]
    fn cart_response_totals_sum_quantities_and_subtotals() {
        let a = product(10);
        let b = product(10);
        let lines = vec![
            CartLine {
                item: item(a.id, 2),
                product: Some(a),
            },
            CartLine {
                item: item(b.id, 1),
                product: Some(b),
            },
        ];
        let cart = CartResponse::from_lines(lines);
        assert_eq!(cart.items.len(), 2);
        assert_eq!(cart.total_items, 3);
        assert_eq!(cart.total_price, dec!(10500));
        assert_eq!(cart.items[0].subtotal, dec!(7000));
    }

    #[test]
    fn add_request_rejects_zero_quantity() {
        let request = AddToCartRequest {
            product_id: Uuid::new_v4(),
            quantity: 0,
        };
        assert!(request.validate().is_err());
    }
}
