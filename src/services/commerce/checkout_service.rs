//! Checkout engine: turns a user's cart into an immutable transaction and
//! guards the transaction's payment lifecycle.
//!
//! A checkout validates every cart line against current stock before any
//! write, then persists the header, the line snapshots, the stock decrements
//! and the cart clear inside one database transaction. Any failure leaves
//! stock, cart and transactions exactly as they were.

use crate::{
    config::AppConfig,
    entities::commerce::{
        transaction::{self, PaymentMethod, TransactionStatus},
        transaction_item,
    },
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{
        transaction_repository::TransactionWithItems, CartLine, CartRepository,
        ProductRepository, TransactionRepository,
    },
};
use chrono::{DateTime, Utc};
use metrics::{counter, histogram};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, Set, TransactionTrait};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Shipping and payment-page settings used to price a checkout
#[derive(Debug, Clone)]
pub struct CheckoutPricing {
    pub shipping_rate_per_unit: Decimal,
    pub shipping_minimum: Decimal,
    pub payment_base_url: String,
}

impl Default for CheckoutPricing {
    fn default() -> Self {
        Self {
            shipping_rate_per_unit: Decimal::from(5000),
            shipping_minimum: Decimal::from(10000),
            payment_base_url: "https://payment.example.com".to_string(),
        }
    }
}

impl From<&AppConfig> for CheckoutPricing {
    fn from(cfg: &AppConfig) -> Self {
        Self {
            shipping_rate_per_unit: cfg.shipping_rate_per_unit,
            shipping_minimum: cfg.shipping_minimum,
            payment_base_url: cfg.payment_base_url.clone(),
        }
    }
}

impl CheckoutPricing {
    /// `max(minimum, total_quantity * rate)`
    pub fn shipping_cost(&self, total_quantity: i64) -> Decimal {
        let per_unit = self.shipping_rate_per_unit * Decimal::from(total_quantity);
        per_unit.max(self.shipping_minimum)
    }

    /// Payment page for the chosen method; cash on delivery has none.
    pub fn payment_url(&self, method: PaymentMethod, transaction_id: Uuid) -> Option<String> {
        let path = match method {
            PaymentMethod::BankTransfer => "bank-transfer",
            PaymentMethod::CreditCard => "credit-card",
            PaymentMethod::EWallet => "e-wallet",
            PaymentMethod::Cod => return None,
        };
        Some(format!(
            "{}/{}?transaction_id={}",
            self.payment_base_url.trim_end_matches('/'),
            path,
            transaction_id
        ))
    }
}

/// Checkout input shared by the summary and the real checkout
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CheckoutRequest {
    #[validate(length(
        min = 1,
        max = 1000,
        message = "Shipping address must be between 1 and 1000 characters"
    ))]
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConfirmPaymentRequest {
    #[validate(length(
        min = 1,
        max = 500,
        message = "Payment proof is required"
    ))]
    pub payment_proof: String,
    #[validate(length(max = 1000, message = "Notes cannot exceed 1000 characters"))]
    pub notes: Option<String>,
}

/// Non-persisted quote for the current cart
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CheckoutSummary {
    pub total_items: i64,
    /// Merchandise subtotal
    pub total_amount: Decimal,
    pub shipping_cost: Decimal,
    pub grand_total: Decimal,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionItemResponse {
    pub product_id: Uuid,
    pub product_name: String,
    pub product_price: Decimal,
    pub quantity: i32,
    pub subtotal: Decimal,
}

impl From<transaction_item::Model> for TransactionItemResponse {
    fn from(item: transaction_item::Model) -> Self {
        Self {
            subtotal: item.subtotal(),
            product_id: item.product_id,
            product_name: item.product_name,
            product_price: item.unit_price,
            quantity: item.quantity,
        }
    }
}

/// Full snapshot of a transaction and its lines
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TransactionResponse {
    pub transaction_id: Uuid,
    pub user_id: Uuid,
    pub status: TransactionStatus,
    pub total_amount: Decimal,
    pub shipping_cost: Decimal,
    pub shipping_address: String,
    pub payment_method: PaymentMethod,
    pub payment_url: Option<String>,
    pub payment_proof: Option<String>,
    pub notes: Option<String>,
    pub items: Vec<TransactionItemResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<TransactionWithItems> for TransactionResponse {
    fn from((header, items): TransactionWithItems) -> Self {
        Self {
            transaction_id: header.id,
            user_id: header.user_id,
            status: header.status,
            total_amount: header.total_amount,
            shipping_cost: header.shipping_cost,
            shipping_address: header.shipping_address,
            payment_method: header.payment_method,
            payment_url: header.payment_url,
            payment_proof: header.payment_proof,
            notes: header.notes,
            items: items.into_iter().map(Into::into).collect(),
            created_at: header.created_at,
            updated_at: header.updated_at,
        }
    }
}

/// A validated cart line priced at the current selling price
#[derive(Debug, Clone, PartialEq)]
pub struct PricedLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub available: i32,
}

impl PricedLine {
    pub fn subtotal(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckoutTotals {
    pub total_items: i64,
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub grand_total: Decimal,
}

impl CheckoutTotals {
    pub fn compute(lines: &[PricedLine], pricing: &CheckoutPricing) -> Self {
        let total_items: i64 = lines.iter().map(|l| i64::from(l.quantity)).sum();
        let subtotal: Decimal = lines.iter().map(PricedLine::subtotal).sum();
        let shipping_cost = pricing.shipping_cost(total_items);
        Self {
            total_items,
            subtotal,
            shipping_cost,
            grand_total: subtotal + shipping_cost,
        }
    }
}

/// Checks every line before anything is written: the cart must be non-empty,
/// each product must exist and hold at least the requested quantity.
pub fn price_cart(lines: Vec<CartLine>) -> Result<Vec<PricedLine>, ServiceError> {
    if lines.is_empty() {
        return Err(ServiceError::EmptyCart);
    }

    lines
        .into_iter()
        .map(|CartLine { item, product }| {
            let product = product.ok_or(ServiceError::ProductNotFound(item.product_id))?;
            if product.stock < item.quantity {
                return Err(ServiceError::InsufficientStock {
                    product_id: product.id,
                    product_name: product.name,
                    available: product.stock,
                    requested: item.quantity,
                });
            }
            Ok(PricedLine {
                product_id: product.id,
                product_name: product.name,
                unit_price: product.selling_price,
                quantity: item.quantity,
                available: product.stock,
            })
        })
        .collect()
}

/// Checkout and payment-confirmation workflow
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    pricing: CheckoutPricing,
    carts: CartRepository,
    products: ProductRepository,
    transactions: TransactionRepository,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: Arc<EventSender>,
        pricing: CheckoutPricing,
    ) -> Self {
        Self {
            db,
            event_sender,
            pricing,
            carts: CartRepository,
            products: ProductRepository,
            transactions: TransactionRepository,
        }
    }

    /// Quotes the current cart without side effects
    #[instrument(skip(self, request))]
    pub async fn get_checkout_summary(
        &self,
        user_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<CheckoutSummary, ServiceError> {
        request.validate()?;

        let lines = self.carts.list(&*self.db, user_id).await?;
        let priced = price_cart(lines)?;
        let totals = CheckoutTotals::compute(&priced, &self.pricing);

        Ok(CheckoutSummary {
            total_items: totals.total_items,
            total_amount: totals.subtotal,
            shipping_cost: totals.shipping_cost,
            grand_total: totals.grand_total,
            payment_method: request.payment_method,
            shipping_address: request.shipping_address,
            notes: request.notes,
        })
    }

    /// Converts the cart into a `pending` transaction
    #[instrument(skip(self, request), fields(payment_method = %request.payment_method))]
    pub async fn process_checkout(
        &self,
        user_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<TransactionResponse, ServiceError> {
        request.validate()?;
        let start = std::time::Instant::now();

        let result = self.checkout_in_transaction(user_id, request).await;

        histogram!(
            "storefront_checkout.duration_seconds",
            start.elapsed().as_secs_f64()
        );
        match &result {
            Ok(created) => {
                counter!("storefront_checkout.completed", 1);
                info!(
                    transaction_id = %created.transaction_id,
                    total_amount = %created.total_amount,
                    "Checkout completed"
                );
            }
            Err(e) => {
                counter!("storefront_checkout.failed", 1, "reason" => e.code());
                warn!(error = %e, "Checkout failed");
            }
        }
        result
    }

    async fn checkout_in_transaction(
        &self,
        user_id: Uuid,
        request: CheckoutRequest,
    ) -> Result<TransactionResponse, ServiceError> {
        let txn = self.db.begin().await?;

        let lines = self.carts.list(&txn, user_id).await?;
        let priced = price_cart(lines)?;
        let totals = CheckoutTotals::compute(&priced, &self.pricing);

        let transaction_id = Uuid::new_v4();
        let payment_url = self
            .pricing
            .payment_url(request.payment_method, transaction_id);
        let now = Utc::now();

        let header = self
            .transactions
            .create(
                &txn,
                transaction::ActiveModel {
                    id: Set(transaction_id),
                    user_id: Set(user_id),
                    status: Set(TransactionStatus::Pending),
                    total_amount: Set(totals.grand_total),
                    shipping_cost: Set(totals.shipping_cost),
                    shipping_address: Set(request.shipping_address),
                    payment_method: Set(request.payment_method),
                    payment_url: Set(payment_url),
                    payment_proof: Set(None),
                    notes: Set(request.notes),
                    created_at: Set(now),
                    updated_at: Set(now),
                },
            )
            .await?;

        let mut items = Vec::with_capacity(priced.len());
        let mut decrements = Vec::with_capacity(priced.len());
        for line in &priced {
            let item = self
                .transactions
                .create_item(
                    &txn,
                    transaction_item::ActiveModel {
                        id: Set(Uuid::new_v4()),
                        transaction_id: Set(transaction_id),
                        product_id: Set(line.product_id),
                        product_name: Set(line.product_name.clone()),
                        quantity: Set(line.quantity),
                        unit_price: Set(line.unit_price),
                        created_at: Set(now),
                    },
                )
                .await?;
            items.push(item);

            // A concurrent checkout may have taken the stock since validation.
            let remaining = self
                .products
                .decrement_stock(&txn, line.product_id, line.quantity)
                .await?;
            let Some(remaining) = remaining else {
                let available = self
                    .products
                    .find_by_id(&txn, line.product_id)
                    .await?
                    .map(|p| p.stock)
                    .unwrap_or(0);
                return Err(ServiceError::InsufficientStock {
                    product_id: line.product_id,
                    product_name: line.product_name.clone(),
                    available,
                    requested: line.quantity,
                });
            };
            decrements.push((line.product_id, line.quantity, remaining));
        }

        self.carts.clear(&txn, user_id).await?;
        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CheckoutCompleted {
                transaction_id,
                user_id,
                total_amount: header.total_amount,
                payment_method: header.payment_method,
            })
            .await;
        for (product_id, quantity, remaining) in decrements {
            self.event_sender
                .send_or_log(Event::StockDecremented {
                    product_id,
                    quantity,
                    remaining,
                })
                .await;
        }
        self.event_sender
            .send_or_log(Event::CartCleared(user_id))
            .await;

        Ok((header, items).into())
    }

    /// Moves a `pending` transaction owned by `user_id` to `paid`
    #[instrument(skip(self, request))]
    pub async fn confirm_payment(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
        request: ConfirmPaymentRequest,
    ) -> Result<TransactionResponse, ServiceError> {
        request.validate()?;

        let existing = self.owned_transaction(user_id, transaction_id).await?;
        if existing.status != TransactionStatus::Pending {
            return Err(ServiceError::InvalidState(
                "transaction is not in pending status".to_string(),
            ));
        }

        let mut changes = transaction::ActiveModel {
            status: Set(TransactionStatus::Paid),
            payment_proof: Set(Some(request.payment_proof)),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if request.notes.is_some() {
            changes.notes = Set(request.notes);
        }

        let updated = self
            .transactions
            .update_if_status(
                &*self.db,
                transaction_id,
                TransactionStatus::Pending,
                changes,
            )
            .await?;
        if !updated {
            // Lost a race with another confirmation or an admin update.
            return Err(ServiceError::InvalidState(
                "transaction is not in pending status".to_string(),
            ));
        }

        self.event_sender
            .send_or_log(Event::PaymentConfirmed {
                transaction_id,
                user_id,
            })
            .await;
        info!(%transaction_id, "Payment confirmed");

        self.load(transaction_id).await
    }

    /// Every transaction of the user, newest first
    #[instrument(skip(self))]
    pub async fn get_user_transactions(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<TransactionResponse>, ServiceError> {
        let rows = self.transactions.list_by_user(&*self.db, user_id).await?;
        Ok(rows.into_iter().map(Into::into).collect())
    }

    #[instrument(skip(self))]
    pub async fn get_transaction_by_id(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<TransactionResponse, ServiceError> {
        self.owned_transaction(user_id, transaction_id).await?;
        self.load(transaction_id).await
    }

    async fn owned_transaction(
        &self,
        user_id: Uuid,
        transaction_id: Uuid,
    ) -> Result<transaction::Model, ServiceError> {
        let existing = self
            .transactions
            .find_by_id(&*self.db, transaction_id)
            .await?
            .ok_or(ServiceError::TransactionNotFound(transaction_id))?;

        if existing.user_id != user_id {
            warn!(%transaction_id, %user_id, "Access to another user's transaction denied");
            return Err(ServiceError::Forbidden(
                "unauthorized access to transaction".to_string(),
            ));
        }
        Ok(existing)
    }

    async fn load(&self, transaction_id: Uuid) -> Result<TransactionResponse, ServiceError> {
        self.transactions
            .find_with_items(&*self.db, transaction_id)
            .await?
            .map(Into::into)
            .ok_or(ServiceError::TransactionNotFound(transaction_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::commerce::{cart_item, product};
    use assert_matches::assert_matches;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;

    fn line(price: Decimal, quantity: i32, stock: i32) -> CartLine {
        let now = Utc::now();
        let product_id = Uuid::new_v4();
        CartLine {
            item: cart_item::Model {
                id: Uuid::new_v4(),
                user_id: Uuid::new_v4(),
                product_id,
                quantity,
                created_at: now,
                updated_at: now,
            },
            product: Some(product::Model {
                id: product_id,
                category_id: None,
                name: format!("product-{}", price),
                description: None,
                purchase_price: Decimal::ZERO,
                selling_price: price,
                stock,
                image_url: None,
                created_at: now,
                updated_at: now,
            }),
        }
    }

    // ===== Shipping Tests =====

    #[test]
    fn shipping_has_a_floor() {
        let pricing = CheckoutPricing::default();
        assert_eq!(pricing.shipping_cost(1), dec!(10000));
        assert_eq!(pricing.shipping_cost(2), dec!(10000));
        assert_eq!(pricing.shipping_cost(3), dec!(15000));
        assert_eq!(pricing.shipping_cost(10), dec!(50000));
    }

    // ===== Payment URL Tests =====

    #[test]
    fn payment_url_per_method() {
        let pricing = CheckoutPricing {
            payment_base_url: "https://pay.test/".to_string(),
            ..Default::default()
        };
        let id = Uuid::new_v4();
        assert_eq!(
            pricing.payment_url(PaymentMethod::BankTransfer, id),
            Some(format!("https://pay.test/bank-transfer?transaction_id={}", id))
        );
        assert_eq!(
            pricing.payment_url(PaymentMethod::CreditCard, id),
            Some(format!("https://pay.test/credit-card?transaction_id={}", id))
        );
        assert_eq!(
            pricing.payment_url(PaymentMethod::EWallet, id),
            Some(format!("https://pay.test/e-wallet?transaction_id={}", id))
        );
        assert_eq!(pricing.payment_url(PaymentMethod::Cod, id), None);
    }

    // ===== Cart Pricing Tests =====

    #[test]
    fn empty_cart_is_rejected() {
        assert_matches!(price_cart(vec![]), Err(ServiceError::EmptyCart));
    }

    #[test]
    fn missing_product_is_rejected() {
        let mut orphan = line(dec!(100), 1, 5);
        orphan.product = None;
        let product_id = orphan.item.product_id;
        assert_matches!(
            price_cart(vec![orphan]),
            Err(ServiceError::ProductNotFound(id)) if id == product_id
        );
    }

    #[test]
    fn insufficient_stock_names_the_product() {
        let ok = line(dec!(5000), 1, 5);
        let short = line(dec!(10000), 2, 1);
        let short_id = short.item.product_id;

        assert_matches!(
            price_cart(vec![ok, short]),
            Err(ServiceError::InsufficientStock { product_id, available: 1, requested: 2, .. })
                if product_id == short_id
        );
    }

    #[test]
    fn totals_for_reference_cart() {
        let priced =
            price_cart(vec![line(dec!(10000), 2, 5), line(dec!(5000), 1, 5)]).unwrap();
        let totals = CheckoutTotals::compute(&priced, &CheckoutPricing::default());
        assert_eq!(totals.total_items, 3);
        assert_eq!(totals.subtotal, dec!(25000));
        assert_eq!(totals.shipping_cost, dec!(15000));
        assert_eq!(totals.grand_total, dec!(40000));
    }

    #[test]
    fn totals_count_quantities_beyond_i32() {
        let priced = price_cart(vec![
            line(dec!(1), i32::MAX, i32::MAX),
            line(dec!(1), i32::MAX, i32::MAX),
        ])
        .unwrap();
        let totals = CheckoutTotals::compute(&priced, &CheckoutPricing::default());
        assert_eq!(totals.total_items, 2 * i64::from(i32::MAX));
        assert_eq!(
            totals.shipping_cost,
            Decimal::from(2 * i64::from(i32::MAX)) * dec!(5000)
        );
    }

    proptest! {
        #[test]
        fn grand_total_is_subtotal_plus_shipping(
            entries in prop::collection::vec((1i64..1_000_000, 1i32..50), 1..8)
        ) {
            let lines: Vec<CartLine> = entries
                .iter()
                .map(|(price, qty)| line(Decimal::from(*price), *qty, *qty))
                .collect();
            let priced = price_cart(lines).unwrap();
            let pricing = CheckoutPricing::default();
            let totals = CheckoutTotals::compute(&priced, &pricing);

            let expected_subtotal: Decimal = entries
                .iter()
                .map(|(price, qty)| Decimal::from(*price) * Decimal::from(*qty))
                .sum();
            let quantity: i64 = entries.iter().map(|(_, qty)| i64::from(*qty)).sum();
            let expected_shipping =
                (Decimal::from(quantity) * dec!(5000)).max(dec!(10000));

            prop_assert_eq!(totals.subtotal, expected_subtotal);
            prop_assert_eq!(totals.shipping_cost, expected_shipping);
            prop_assert_eq!(totals.grand_total, expected_subtotal + expected_shipping);
        }
    }
}
