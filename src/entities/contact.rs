use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Contact entity: postal details owned exclusively by one supplier.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize, Validate)]
#[sea_orm(table_name = "contacts")]
pub struct Model {
    /// Primary key
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Contact email, unique across the whole network
    #[sea_orm(unique)]
    #[validate(email(message = "Contact email must be a valid email address"))]
    #[validate(length(max = 100, message = "Contact email cannot exceed 100 characters"))]
    pub email: String,

    #[validate(length(min = 1, max = 100, message = "Country must be between 1 and 100 characters"))]
    pub country: String,

    #[validate(length(min = 1, max = 100, message = "City must be between 1 and 100 characters"))]
    pub city: String,

    #[validate(length(min = 1, max = 100, message = "Street must be between 1 and 100 characters"))]
    pub street: String,

    #[validate(length(min = 1, max = 50, message = "House number must be between 1 and 50 characters"))]
    pub house_number: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_one = "super::supplier::Entity")]
    Supplier,
}

impl Related<super::supplier::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Supplier.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
