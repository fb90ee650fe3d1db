use crate::{
    db::DbPool,
    entities::{product, supplier_product},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder,
    QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub name: String,
    pub model: String,
    pub released_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone)]
pub struct ProductUpdate {
    pub name: String,
    pub model: String,
    pub released_at: DateTime<Utc>,
}

/// Service for the shared product catalog.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DbPool>,
}

impl ProductService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(&self, input: NewProduct) -> Result<product::Model, ServiceError> {
        let mut active = product::ActiveModel {
            name: Set(input.name),
            model: Set(input.model),
            ..Default::default()
        };
        if let Some(released_at) = input.released_at {
            active.released_at = Set(released_at);
        }

        let created = active.insert(&*self.db).await?;
        info!(product_id = created.id, "product created");
        Ok(created)
    }

    #[instrument(skip(self))]
    pub async fn get(&self, product_id: i64) -> Result<Option<product::Model>, ServiceError> {
        Ok(product::Entity::find_by_id(product_id).one(&*self.db).await?)
    }

    /// Newest releases first.
    #[instrument(skip(self))]
    pub async fn list(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<(Vec<product::Model>, u64), ServiceError> {
        let total = product::Entity::find().count(&*self.db).await?;
        let products = product::Entity::find()
            .order_by_desc(product::Column::ReleasedAt)
            .limit(limit)
            .offset(offset)
            .all(&*self.db)
            .await?;
        Ok((products, total))
    }

    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        product_id: i64,
        update: ProductUpdate,
    ) -> Result<product::Model, ServiceError> {
        let existing = product::Entity::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))?;

        let mut active: product::ActiveModel = existing.into();
        active.name = Set(update.name);
        active.model = Set(update.model);
        active.released_at = Set(update.released_at);

        let updated = active.update(&*self.db).await?;
        info!(product_id, "product updated");
        Ok(updated)
    }

    /// Deletes the product and its supplier links; suppliers themselves are
    /// untouched.
    #[instrument(skip(self))]
    pub async fn delete(&self, product_id: i64) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        product::Entity::find_by_id(product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("product {}", product_id)))?;

        supplier_product::Entity::delete_many()
            .filter(supplier_product::Column::ProductId.eq(product_id))
            .exec(&txn)
            .await?;
        product::Entity::delete_by_id(product_id).exec(&txn).await?;

        txn.commit().await?;
        info!(product_id, "product deleted");
        Ok(())
    }
}
