use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::entities::commerce::cart_item::{self, Entity as CartItem};
use crate::entities::commerce::product::{self, Entity as Product};

/// A cart line joined with its product. The product is `None` only if it
/// disappeared underneath the cart.
#[derive(Debug, Clone)]
pub struct CartLine {
    pub item: cart_item::Model,
    pub product: Option<product::Model>,
}

/// Per-user cart lines. Every query is scoped to one user.
#[derive(Debug, Clone, Copy, Default)]
pub struct CartRepository;

impl CartRepository {
    pub async fn find(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<Option<cart_item::Model>, DbErr> {
        CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(conn)
            .await
    }

    /// Adds `quantity` to the user's line for `product_id`, creating the line
    /// when absent.
    pub async fn add_or_increment(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<cart_item::Model, DbErr> {
        let now = Utc::now();
        match self.find(conn, user_id, product_id).await? {
            Some(existing) => {
                let merged = existing.quantity.saturating_add(quantity);
                let mut active: cart_item::ActiveModel = existing.into();
                active.quantity = Set(merged);
                active.updated_at = Set(now);
                active.update(conn).await
            }
            None => {
                cart_item::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    user_id: Set(user_id),
                    product_id: Set(product_id),
                    quantity: Set(quantity),
                    created_at: Set(now),
                    updated_at: Set(now),
                }
                .insert(conn)
                .await
            }
        }
    }

    /// Overwrites the quantity of an existing line; `None` if there is no line.
    pub async fn set_quantity(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Option<cart_item::Model>, DbErr> {
        let Some(existing) = self.find(conn, user_id, product_id).await? else {
            return Ok(None);
        };
        let mut active: cart_item::ActiveModel = existing.into();
        active.quantity = Set(quantity);
        active.updated_at = Set(Utc::now());
        active.update(conn).await.map(Some)
    }

    /// Returns whether a line was removed
    pub async fn remove(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
        product_id: Uuid,
    ) -> Result<bool, DbErr> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected > 0)
    }

    /// Deletes every line of the user's cart, returning how many went away
    pub async fn clear(&self, conn: &impl ConnectionTrait, user_id: Uuid) -> Result<u64, DbErr> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Lines in insertion order, each joined with its product
    pub async fn list(
        &self,
        conn: &impl ConnectionTrait,
        user_id: Uuid,
    ) -> Result<Vec<CartLine>, DbErr> {
        let rows = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .order_by_asc(cart_item::Column::Id)
            .find_also_related(Product)
            .all(conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(item, product)| CartLine { item, product })
            .collect())
    }

    /// Number of distinct lines in the user's cart
    pub async fn count(&self, conn: &impl ConnectionTrait, user_id: Uuid) -> Result<u64, DbErr> {
        CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .count(conn)
            .await
    }
}
