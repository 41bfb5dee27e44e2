use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder,
};
use uuid::Uuid;

use super::PageRequest;
use crate::auth::user::{self, Entity as User, UserRole};

#[derive(Debug, Clone, Copy, Default)]
pub struct UserRepository;

impl UserRepository {
    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: Uuid,
    ) -> Result<Option<user::Model>, DbErr> {
        User::find_by_id(id).one(conn).await
    }

    /// Emails are stored lower-cased, so lookups normalize the same way
    pub async fn find_by_email(
        &self,
        conn: &impl ConnectionTrait,
        email: &str,
    ) -> Result<Option<user::Model>, DbErr> {
        User::find()
            .filter(user::Column::Email.eq(email.trim().to_lowercase()))
            .one(conn)
            .await
    }

    /// Paged listing, newest first, optionally limited to one role
    pub async fn list(
        &self,
        conn: &impl ConnectionTrait,
        role: Option<UserRole>,
        page: PageRequest,
    ) -> Result<(Vec<user::Model>, u64), DbErr> {
        let mut query = User::find();
        if let Some(role) = role {
            query = query.filter(user::Column::Role.eq(role));
        }

        let paginator = query
            .order_by_desc(user::Column::CreatedAt)
            .order_by_asc(user::Column::Id)
            .paginate(conn, page.limit);

        let total = paginator.num_items().await?;
        let users = paginator.fetch_page(page.index()).await?;
        Ok((users, total))
    }

    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        model: user::ActiveModel,
    ) -> Result<user::Model, DbErr> {
        model.insert(conn).await
    }

    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        model: user::ActiveModel,
    ) -> Result<user::Model, DbErr> {
        model.update(conn).await
    }

    /// Returns whether a row was deleted
    pub async fn delete(&self, conn: &impl ConnectionTrait, id: Uuid) -> Result<bool, DbErr> {
        let result = User::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }
}
