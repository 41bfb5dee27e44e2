use crate::{
    entities::commerce::transaction::{self, TransactionStatus},
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{PageRequest, TransactionRepository},
    services::commerce::TransactionResponse,
};
use chrono::Utc;
use sea_orm::{DatabaseConnection, Set};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TransactionListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub status: Option<TransactionStatus>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionPage {
    pub transactions: Vec<TransactionResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateTransactionStatusRequest {
    pub status: TransactionStatus,
}

/// Back-office view over every user's transactions
#[derive(Clone)]
pub struct TransactionService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    transactions: TransactionRepository,
}

impl TransactionService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db,
            event_sender,
            transactions: TransactionRepository,
        }
    }

    #[instrument(skip(self))]
    pub async fn list_transactions(
        &self,
        query: TransactionListQuery,
    ) -> Result<TransactionPage, ServiceError> {
        let page = PageRequest::new(query.page, query.limit);
        let (rows, total) = self
            .transactions
            .list_all(&*self.db, query.status, page)
            .await?;

        Ok(TransactionPage {
            transactions: rows.into_iter().map(Into::into).collect(),
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    #[instrument(skip(self))]
    pub async fn get_transaction(&self, id: Uuid) -> Result<TransactionResponse, ServiceError> {
        self.transactions
            .find_with_items(&*self.db, id)
            .await?
            .map(Into::into)
            .ok_or(ServiceError::TransactionNotFound(id))
    }

    /// Marks a pending transaction failed or expired. Stock taken at
    /// checkout is not returned.
    #[instrument(skip(self))]
    pub async fn update_transaction_status(
        &self,
        id: Uuid,
        request: UpdateTransactionStatusRequest,
    ) -> Result<TransactionResponse, ServiceError> {
        let existing = self
            .transactions
            .find_by_id(&*self.db, id)
            .await?
            .ok_or(ServiceError::TransactionNotFound(id))?;

        let old_status = existing.status;
        let new_status = request.status;
        if !old_status.admin_can_transition_to(new_status) {
            return Err(ServiceError::InvalidState(format!(
                "cannot change transaction status from {} to {}",
                old_status, new_status
            )));
        }

        let changes = transaction::ActiveModel {
            status: Set(new_status),
            updated_at: Set(Utc::now()),
            ..Default::default()
        };
        if !self
            .transactions
            .update_if_status(&*self.db, id, old_status, changes)
            .await?
        {
            return Err(ServiceError::InvalidState(
                "transaction is not in pending status".to_string(),
            ));
        }

        self.event_sender
            .send_or_log(Event::TransactionStatusChanged {
                transaction_id: id,
                old_status,
                new_status,
            })
            .await;
        info!(transaction_id = %id, %old_status, %new_status, "Transaction status updated");

        self.get_transaction(id).await
    }
}
