use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, ActiveValue::Set, ConnectionTrait};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Kind of node in the supplier network.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "i16", db_type = "SmallInteger")]
#[serde(rename_all = "snake_case")]
pub enum SupplierType {
    /// Root of a supply chain; never has a parent supplier.
    #[sea_orm(num_value = 0)]
    Factory,
    #[sea_orm(num_value = 1)]
    DealershipCenter,
    #[sea_orm(num_value = 2)]
    IndividualEntrepreneur,
}

/// Supplier entity: a node in the self-referencing supplier forest.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "suppliers")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Display name of the supplier
    #[validate(length(
        min = 1,
        max = 50,
        message = "Supplier title must be between 1 and 50 characters"
    ))]
    pub title: String,

    /// Node kind; factories form the roots of the hierarchy
    pub supplier_type: SupplierType,

    /// Outstanding debt towards the parent supplier; never negative
    pub debt: Decimal,

    /// Owned contact record (1:1, deleted together with the supplier)
    #[sea_orm(unique)]
    pub contact_id: i64,

    /// Upstream supplier; None for roots. Deleting the parent nulls this
    /// reference on children rather than cascading.
    pub parent_id: Option<i64>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::contact::Entity",
        from = "Column::ContactId",
        to = "super::contact::Column::Id"
    )]
    Contact,
    #[sea_orm(
        belongs_to = "Entity",
        from = "Column::ParentId",
        to = "Column::Id"
    )]
    Parent,
    #[sea_orm(has_many = "super::supplier_product::Entity")]
    SupplierProducts,
    #[sea_orm(has_many = "super::supplier_employee::Entity")]
    SupplierEmployees,
}

impl Related<super::contact::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Contact.def()
    }
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        super::supplier_product::Relation::Product.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::supplier_product::Relation::Supplier.def().rev())
    }
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        super::supplier_employee::Relation::User.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::supplier_employee::Relation::Supplier.def().rev())
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
            if let ActiveValue::NotSet = active_model.debt {
                active_model.debt = Set(Decimal::ZERO);
            }
            active_model.created_at = Set(Utc::now());
        }

        active_model.updated_at = Set(Some(Utc::now()));

        // The auto-increment id is NotSet on insert; the validation snapshot
        // needs a placeholder so the conversion succeeds.
        let mut snapshot = active_model.clone();
        if let ActiveValue::NotSet = snapshot.id {
            snapshot.id = Set(0);
        }
        let model: Model = snapshot.try_into().map_err(|_| {
            DbErr::Custom("Failed to convert ActiveModel to Model for validation".to_string())
        })?;

        if model.debt.is_sign_negative() {
            return Err(DbErr::Custom("Supplier debt cannot be negative".to_string()));
        }

        if let Err(err) = model.validate() {
            return Err(DbErr::Custom(format!("Validation error: {}", err)));
        }

        Ok(active_model)
    }
}
