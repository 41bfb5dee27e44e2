use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect,
};
use uuid::Uuid;

use super::PageRequest;
use crate::entities::commerce::product::{self, Entity as Product};

/// Products and their stock counters
#[derive(Debug, Clone, Copy, Default)]
pub struct ProductRepository;

impl ProductRepository {
    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: Uuid,
    ) -> Result<Option<product::Model>, DbErr> {
        Product::find_by_id(id).one(conn).await
    }

    /// Paged listing, newest first, optionally limited to one category
    pub async fn list(
        &self,
        conn: &impl ConnectionTrait,
        category_id: Option<Uuid>,
        page: PageRequest,
    ) -> Result<(Vec<product::Model>, u64), DbErr> {
        let mut query = Product::find();
        if let Some(category_id) = category_id {
            query = query.filter(product::Column::CategoryId.eq(category_id));
        }

        let paginator = query
            .order_by_desc(product::Column::CreatedAt)
            .order_by_asc(product::Column::Id)
            .paginate(conn, page.limit);

        let total = paginator.num_items().await?;
        let products = paginator.fetch_page(page.index()).await?;
        Ok((products, total))
    }

    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        model: product::ActiveModel,
    ) -> Result<product::Model, DbErr> {
        model.insert(conn).await
    }

    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        model: product::ActiveModel,
    ) -> Result<product::Model, DbErr> {
        model.update(conn).await
    }

    /// Returns whether a row was deleted
    pub async fn delete(&self, conn: &impl ConnectionTrait, id: Uuid) -> Result<bool, DbErr> {
        let result = Product::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }

    /// Decrements stock in a single conditional statement
    /// (`stock = stock - q WHERE id = ? AND stock >= q`).
    ///
    /// Returns the remaining stock, or `None` when the row is missing or
    /// holds fewer than `quantity` units; stock is left untouched then.
    pub async fn decrement_stock(
        &self,
        conn: &impl ConnectionTrait,
        id: Uuid,
        quantity: i32,
    ) -> Result<Option<i32>, DbErr> {
        let result = Product::update_many()
            .col_expr(
                product::Column::Stock,
                Expr::col(product::Column::Stock).sub(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(id))
            .filter(product::Column::Stock.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Ok(None);
        }

        Product::find_by_id(id)
            .select_only()
            .column(product::Column::Stock)
            .into_tuple::<i32>()
            .one(conn)
            .await
    }
}
