use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QueryOrder,
};
use uuid::Uuid;

use crate::entities::commerce::category::{self, Entity as Category};

#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryRepository;

impl CategoryRepository {
    pub async fn find_by_id(
        &self,
        conn: &impl ConnectionTrait,
        id: Uuid,
    ) -> Result<Option<category::Model>, DbErr> {
        Category::find_by_id(id).one(conn).await
    }

    pub async fn find_by_slug(
        &self,
        conn: &impl ConnectionTrait,
        slug: &str,
    ) -> Result<Option<category::Model>, DbErr> {
        Category::find()
            .filter(category::Column::Slug.eq(slug))
            .one(conn)
            .await
    }

    pub async fn list(&self, conn: &impl ConnectionTrait) -> Result<Vec<category::Model>, DbErr> {
        Category::find()
            .order_by_asc(category::Column::Name)
            .all(conn)
            .await
    }

    pub async fn create(
        &self,
        conn: &impl ConnectionTrait,
        model: category::ActiveModel,
    ) -> Result<category::Model, DbErr> {
        model.insert(conn).await
    }

    pub async fn update(
        &self,
        conn: &impl ConnectionTrait,
        model: category::ActiveModel,
    ) -> Result<category::Model, DbErr> {
        model.update(conn).await
    }

    pub async fn delete(&self, conn: &impl ConnectionTrait, id: Uuid) -> Result<bool, DbErr> {
        let result = Category::delete_by_id(id).exec(conn).await?;
        Ok(result.rows_affected > 0)
    }
}
