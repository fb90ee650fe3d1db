use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Employee identity, linked many-to-many with suppliers and used only for
/// access filtering on the read API.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique)]
    pub username: String,

    pub email: String,

    pub is_active: bool,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::supplier_employee::Entity")]
    SupplierEmployees,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        super::supplier_employee::Relation::Supplier.def()
    }

    fn via() -> Option<RelationDef> {
        Some(super::supplier_employee::Relation::User.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}
