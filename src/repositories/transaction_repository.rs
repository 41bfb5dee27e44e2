use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, LoaderTrait,
    PaginatorTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use super::PageRequest;
use crate::entities::commerce::transaction::{self, Entity as Transaction, TransactionStatus};
use crate::entities::commerce::transaction_item::{self, Entity as TransactionItem};

/// A transaction header with its line snapshots
pub type TransactionWithItems = (transaction::Model, Vec<transaction_item::Model>);

/// Transaction headers and their frozen lines
#[derive(Debug, Clone, Copy, Default)]
pub struct TransactionRepository;

impl TransactionRepository {
    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        model: transaction::ActiveModel,
    ) -> Result<transaction::Model, DbErr> {
        model.insert(conn).await
    }

    pub async fn create_item(
        &self,
        conn: &impl ConnectionTrait,
        model: transaction_item::ActiveModel,
    ) -> Result<transaction_item::Model, DbErr> {
        model.insert(conn).await
    }

    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: Uuid,
    ) -> Result<Option<transaction::Model>, DbErr> {
        Transaction::find_by_id(id).one(conn).await
    }

    pub async fn find_with_items(
        &self,
        conn: &impl ConnectionTrait,
        id: Uuid,
    ) -> Result<Option<TransactionWithItems>, DbErr> {
        let Some(header) = self.find_by_id(conn, id).await? else {
            return Ok(None);
        };
        let items = self.items_for(conn, id).await?;
        Ok(Some((header, items)))
    }

    pub async fn items_for(
        &self,
        conn: &impl ConnectionTrait,
        transaction_id: Uuid,
    ) -> Result<Vec<transaction_item::Model>, DbErr> {
        TransactionItem::find()
            .filter(transaction_item::Column::TransactionId.eq(transaction_id))
            .order_by_asc(transaction_item::Column::CreatedAt)
            .order_by_asc(transaction_item::Column::Id)
            .all(conn)
            .await
    }

    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        model: transaction::ActiveModel,
    ) -> Result<transaction::Model, DbErr> {
        model.update(conn).await
    }

    /// Applies the `Set` columns of `changes` only while the row is still in
    /// `expected` status. Returns whether the row was updated, so two racing
    /// transitions cannot both succeed.
    pub async fn update_if_status(
        &self,
        conn: &impl ConnectionTrait,
        id: Uuid,
        expected: TransactionStatus,
        changes: transaction::ActiveModel,
    ) -> Result<bool, DbErr> {
        let result = Transaction::update_many()
            .set(changes)
            .filter(transaction::Column::Id.eq(id))
            .filter(transaction::Column::Status.eq(expected))
            .exec(conn)
            .await?;
        Ok(result.rows_affected == 1)
    }

    /// All transactions of one user, newest first, with their lines
    pub async fn list_by_user(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
    ) -> Result<Vec<TransactionWithItems>, DbErr> {
        let headers = Transaction::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .order_by_desc(transaction::Column::CreatedAt)
            .order_by_desc(transaction::Column::Id)
            .all(conn)
            .await?;
        self.attach_items(conn, headers).await
    }

    pub async fn count_by_user(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
    ) -> Result<u64, DbErr> {
        Transaction::find()
            .filter(transaction::Column::UserId.eq(user_id))
            .count(conn)
            .await
    }

    /// Paged listing across all users, optionally filtered by status
    pub async fn list_all(
        &self,
        conn: &impl ConnectionTrait,
        status: Option<TransactionStatus>,
        page: PageRequest,
    ) -> Result<(Vec<TransactionWithItems>, u64), DbErr> {
        let mut query = Transaction::find();
        if let Some(status) = status {
            query = query.filter(transaction::Column::Status.eq(status));
        }

        let paginator = query
            .order_by_desc(transaction::Column::CreatedAt)
            .order_by_desc(transaction::Column::Id)
            .paginate(conn, page.limit);

        let total = paginator.num_items().await?;
        let headers = paginator.fetch_page(page.index()).await?;
        Ok((self.attach_items(conn, headers).await?, total))
    }

    async fn attach_items(
        &self,
        conn: &impl ConnectionTrait,
        headers: Vec<transaction::Model>,
    ) -> Result<Vec<TransactionWithItems>, DbErr> {
        let items = headers.load_many(TransactionItem, conn).await?;
        Ok(headers.into_iter().zip(items).collect())
    }
}
