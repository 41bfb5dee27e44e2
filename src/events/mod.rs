use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::entities::commerce::{PaymentMethod, TransactionStatus};

/// Handle for publishing domain events to the background processor
#[derive(Clone, Debug)]
pub struct EventSender {
    sender: mpsc::Sender<Event>,
}

impl EventSender {
    /// Creates a new EventSender
    pub fn new(sender: mpsc::Sender<Event>) -> Self {
        Self { sender }
    }

    /// Sends an event asynchronously
    pub async fn send(&self, event: Event) -> Result<(), String> {
        self.sender
            .send(event)
            .await
            .map_err(|e| format!("Failed to send event: {}", e))
    }

    /// Sends an event, logging instead of failing when the channel is closed.
    /// Events are published after commit, so a lost event never undoes a write.
    pub async fn send_or_log(&self, event: Event) {
        if let Err(e) = self.send(event).await {
            warn!("Dropping domain event: {}", e);
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Event {
    // Identity events
    UserRegistered(Uuid),
    UserCreated(Uuid),
    UserUpdated(Uuid),
    UserDeleted(Uuid),

    // Catalog events
    CategoryCreated(Uuid),
    CategoryUpdated(Uuid),
    CategoryDeleted(Uuid),
    ProductCreated(Uuid),
    ProductUpdated(Uuid),
    ProductDeleted(Uuid),

    // Cart events
    CartItemAdded {
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemUpdated {
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    },
    CartItemRemoved {
        user_id: Uuid,
        product_id: Uuid,
    },
    CartCleared(Uuid),

    // Checkout events
    CheckoutCompleted {
        transaction_id: Uuid,
        user_id: Uuid,
        total_amount: Decimal,
        payment_method: PaymentMethod,
    },
    StockDecremented {
        product_id: Uuid,
        quantity: i32,
        remaining: i32,
    },
    PaymentConfirmed {
        transaction_id: Uuid,
        user_id: Uuid,
    },
    TransactionStatusChanged {
        transaction_id: Uuid,
        old_status: TransactionStatus,
        new_status: TransactionStatus,
    },
}

/// Consumes events until every sender is dropped
pub async fn process_events(mut rx: mpsc::Receiver<Event>, low_stock_threshold: i32) {
    info!("Starting event processing loop");

    while let Some(event) = rx.recv().await {
        match event {
            Event::CheckoutCompleted {
                transaction_id,
                user_id,
                total_amount,
                payment_method,
            } => {
                info!(
                    %transaction_id,
                    %user_id,
                    %total_amount,
                    %payment_method,
                    "Checkout completed"
                );
            }
            Event::StockDecremented {
                product_id,
                quantity,
                remaining,
            } => {
                handle_stock_decrement(product_id, quantity, remaining, low_stock_threshold);
            }
            Event::TransactionStatusChanged {
                transaction_id,
                old_status,
                new_status,
            } => {
                info!(
                    %transaction_id,
                    %old_status,
                    %new_status,
                    "Transaction status changed"
                );
            }
            other => info!("Received event: {:?}", other),
        }
    }

    info!("Event processing loop stopped");
}

fn handle_stock_decrement(product_id: Uuid, quantity: i32, remaining: i32, threshold: i32) {
    info!(
        "Stock decremented: product={}, sold={}, remaining={}",
        product_id, quantity, remaining
    );

    if remaining == 0 {
        warn!("Product {} is out of stock", product_id);
    } else if remaining < threshold {
        warn!(
            "Low stock alert: product {} has {} units left (threshold {})",
            product_id, remaining, threshold
        );
    }
}
