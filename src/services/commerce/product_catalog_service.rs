use crate::{
    entities::commerce::category::{self, slugify},
    entities::commerce::product,
    errors::ServiceError,
    events::{Event, EventSender},
    repositories::{CategoryRepository, PageRequest, ProductRepository},
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{DatabaseConnection, DbErr, Set, SqlErr};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::{Validate, ValidationError};

fn validate_non_negative(value: &Decimal) -> Result<(), ValidationError> {
    if value.is_sign_negative() && !value.is_zero() {
        let mut err = ValidationError::new("non_negative");
        err.message = Some("Price cannot be negative".into());
        return Err(err);
    }
    Ok(())
}

fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some("Name cannot be empty".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CategoryRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"),
        custom = "validate_not_blank"
    )]
    pub name: String,
}

/// Body for both creating and replacing a product
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductRequest {
    #[validate(
        length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"),
        custom = "validate_not_blank"
    )]
    pub name: String,
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[validate(custom = "validate_non_negative")]
    pub purchase_price: Decimal,
    #[validate(custom = "validate_non_negative")]
    pub selling_price: Decimal,
    #[validate(range(min = 0, message = "Stock cannot be negative"))]
    pub stock: i32,
    pub category_id: Option<Uuid>,
    #[validate(url(message = "Image URL must be a valid URL"))]
    pub image_url: Option<String>,
}

impl ProductRequest {
    fn check(&self) -> Result<(), ServiceError> {
        self.validate()?;
        if self.selling_price <= self.purchase_price {
            return Err(ServiceError::ValidationError(
                "selling price must be greater than purchase price".to_string(),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductListQuery {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub category_id: Option<Uuid>,
}

/// Customer-facing product view; purchase price is withheld
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PublicProductResponse {
    pub id: Uuid,
    pub category_id: Option<Uuid>,
    pub name: String,
    pub description: Option<String>,
    pub selling_price: Decimal,
    pub stock: i32,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<product::Model> for PublicProductResponse {
    fn from(p: product::Model) -> Self {
        Self {
            id: p.id,
            category_id: p.category_id,
            name: p.name,
            description: p.description,
            selling_price: p.selling_price,
            stock: p.stock,
            image_url: p.image_url,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductPage {
    pub items: Vec<PublicProductResponse>,
    pub total: u64,
    pub page: u64,
    pub limit: u64,
}

/// Categories and products
#[derive(Clone)]
pub struct ProductCatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
    categories: CategoryRepository,
    products: ProductRepository,
}

impl ProductCatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self {
            db,
            event_sender,
            categories: CategoryRepository,
            products: ProductRepository,
        }
    }

    // ----- categories -----

    #[instrument(skip(self))]
    pub async fn create_category(
        &self,
        request: CategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        request.validate()?;
        let slug = slugify(&request.name);
        self.ensure_unique_slug(&slug, None).await?;

        let now = Utc::now();
        let created = self
            .categories
            .create(
                &*self.db,
                category::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    name: Set(request.name.trim().to_string()),
                    slug: Set(slug.clone()),
                    created_at: Set(now),
                    updated_at: Set(now),
                },
            )
            .await
            .map_err(|e| slug_conflict(e, &slug))?;

        self.event_sender
            .send_or_log(Event::CategoryCreated(created.id))
            .await;
        info!(category_id = %created.id, slug = %created.slug, "Category created");
        Ok(created)
    }

    pub async fn list_categories(&self) -> Result<Vec<category::Model>, ServiceError> {
        Ok(self.categories.list(&*self.db).await?)
    }

    pub async fn get_category(&self, id: Uuid) -> Result<category::Model, ServiceError> {
        self.categories
            .find_by_id(&*self.db, id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("category {} not found", id)))
    }

    /// Renames a category; the slug follows the new name
    #[instrument(skip(self))]
    pub async fn update_category(
        &self,
        id: Uuid,
        request: CategoryRequest,
    ) -> Result<category::Model, ServiceError> {
        request.validate()?;
        let existing = self.get_category(id).await?;
        let slug = slugify(&request.name);
        self.ensure_unique_slug(&slug, Some(id)).await?;

        let mut active: category::ActiveModel = existing.into();
        active.name = Set(request.name.trim().to_string());
        active.slug = Set(slug.clone());
        active.updated_at = Set(Utc::now());

        let updated = self
            .categories
            .update(&*self.db, active)
            .await
            .map_err(|e| slug_conflict(e, &slug))?;

        self.event_sender
            .send_or_log(Event::CategoryUpdated(id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_category(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.categories.delete(&*self.db, id).await? {
            return Err(ServiceError::NotFound(format!("category {} not found", id)));
        }
        self.event_sender
            .send_or_log(Event::CategoryDeleted(id))
            .await;
        info!(category_id = %id, "Category deleted");
        Ok(())
    }

    async fn ensure_unique_slug(&self, slug: &str, except: Option<Uuid>) -> Result<(), ServiceError> {
        match self.categories.find_by_slug(&*self.db, slug).await? {
            Some(found) if Some(found.id) != except => Err(ServiceError::Conflict(
                "category name already exists".to_string(),
            )),
            _ => Ok(()),
        }
    }

    // ----- products -----

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        request: ProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.check()?;
        self.ensure_category(request.category_id).await?;

        let now = Utc::now();
        let created = self
            .products
            .create(
                &*self.db,
                product::ActiveModel {
                    id: Set(Uuid::new_v4()),
                    category_id: Set(request.category_id),
                    name: Set(request.name.trim().to_string()),
                    description: Set(request.description),
                    purchase_price: Set(request.purchase_price),
                    selling_price: Set(request.selling_price),
                    stock: Set(request.stock),
                    image_url: Set(request.image_url),
                    created_at: Set(now),
                    updated_at: Set(now),
                },
            )
            .await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(created.id))
            .await;
        info!(product_id = %created.id, "Product created");
        Ok(created)
    }

    pub async fn list_products(&self, query: ProductListQuery) -> Result<ProductPage, ServiceError> {
        let page = PageRequest::new(query.page, query.limit);
        let (products, total) = self
            .products
            .list(&*self.db, query.category_id, page)
            .await?;

        Ok(ProductPage {
            items: products.into_iter().map(Into::into).collect(),
            total,
            page: page.page,
            limit: page.limit,
        })
    }

    pub async fn get_product(&self, id: Uuid) -> Result<product::Model, ServiceError> {
        self.products
            .find_by_id(&*self.db, id)
            .await?
            .ok_or(ServiceError::ProductNotFound(id))
    }

    /// Replaces every editable field. Existing transaction lines keep the
    /// name and price they were sold at.
    #[instrument(skip(self))]
    pub async fn update_product(
        &self,
        id: Uuid,
        request: ProductRequest,
    ) -> Result<product::Model, ServiceError> {
        request.check()?;
        let existing = self.get_product(id).await?;
        self.ensure_category(request.category_id).await?;

        let mut active: product::ActiveModel = existing.into();
        active.category_id = Set(request.category_id);
        active.name = Set(request.name.trim().to_string());
        active.description = Set(request.description);
        active.purchase_price = Set(request.purchase_price);
        active.selling_price = Set(request.selling_price);
        active.stock = Set(request.stock);
        active.image_url = Set(request.image_url);
        active.updated_at = Set(Utc::now());

        let updated = self.products.update(&*self.db, active).await?;
        self.event_sender
            .send_or_log(Event::ProductUpdated(id))
            .await;
        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_product(&self, id: Uuid) -> Result<(), ServiceError> {
        if !self.products.delete(&*self.db, id).await? {
            return Err(ServiceError::ProductNotFound(id));
        }
        self.event_sender
            .send_or_log(Event::ProductDeleted(id))
            .await;
        info!(product_id = %id, "Product deleted");
        Ok(())
    }

    async fn ensure_category(&self, category_id: Option<Uuid>) -> Result<(), ServiceError> {
        if let Some(id) = category_id {
            self.get_category(id).await?;
        }
        Ok(())
    }
}

fn slug_conflict(err: DbErr, slug: &str) -> ServiceError {
    match err.sql_err() {
        Some(SqlErr::UniqueConstraintViolation(_)) => {
            ServiceError::Conflict(format!("category slug {} already exists", slug))
        }
        _ => ServiceError::DatabaseError(err),
    }
}
