use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Product entity, shared across suppliers (many-to-many, no ownership).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Product name
    #[validate(length(
        min = 1,
        max = 25,
        message = "Product name must be between 1 and 25 characters"
    ))]
    pub name: String,

    /// Model code
    #[validate(length(
        min = 1,
        max = 100,
        message = "Product model must be between 1 and 100 characters"
    ))]
    pub model: String,

    /// Release timestamp
    pub released_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::supplier_product::Entity")]
    SupplierProducts,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        super::supplier_product::Relation::Supplier.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::supplier_product::Relation::Product.def().rev())
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.released_at {
                active_model.released_at = Set(Utc::now());
            }
        }

        // The auto-increment id is NotSet on insert; the validation snapshot
        // needs a placeholder so the conversion succeeds.
        let mut snapshot = active_model.clone();
        if let ActiveValue::NotSet = snapshot.id {
            snapshot.id = Set(0);
        }
        let model: Model = snapshot.try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}
