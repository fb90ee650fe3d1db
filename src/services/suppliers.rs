use crate::{
    db::DbPool,
    entities::{contact, supplier, supplier_employee, supplier_product, SupplierType},
    errors::ServiceError,
};
use rust_decimal::Decimal;
use sea_orm::sea_query::{Expr, Func, SimpleExpr};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, JoinType, PaginatorTrait, QueryFilter,
    QuerySelect, RelationTrait, Set, TransactionTrait, Value,
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Defensive bound on parent-chain walks. Hierarchies are cycle-free by
/// construction, but a future bug must degrade into an error, not a hang.
pub const MAX_HIERARCHY_DEPTH: u32 = 64;

/// Rejects hierarchy assignments the data model forbids.
pub fn validate_hierarchy(
    supplier_type: SupplierType,
    parent_id: Option<i64>,
) -> Result<(), ServiceError> {
    if supplier_type == SupplierType::Factory && parent_id.is_some() {
        return Err(ServiceError::ValidationError(
            "a factory cannot have a parent supplier".to_string(),
        ));
    }
    Ok(())
}

#[derive(Debug, Clone)]
pub struct NewContact {
    pub email: String,
    pub country: String,
    pub city: String,
    pub street: String,
    pub house_number: String,
}

#[derive(Debug, Clone)]
pub struct NewSupplier {
    pub title: String,
    pub supplier_type: SupplierType,
    pub parent_id: Option<i64>,
    pub contact: NewContact,
    pub product_ids: Vec<i64>,
    pub employee_ids: Vec<i64>,
}

/// Full-replacement update, mirroring PUT semantics. `None` collections
/// leave the corresponding links untouched.
#[derive(Debug, Clone)]
pub struct SupplierUpdate {
    pub title: String,
    pub supplier_type: SupplierType,
    pub parent_id: Option<i64>,
    pub contact: Option<NewContact>,
    pub product_ids: Option<Vec<i64>>,
    pub employee_ids: Option<Vec<i64>>,
}

/// Supplier with everything the API exposes about it.
#[derive(Debug, Clone)]
pub struct SupplierDetails {
    pub supplier: supplier::Model,
    pub contact: contact::Model,
    pub level: u32,
    pub product_ids: Vec<i64>,
    pub employee_ids: Vec<i64>,
}

/// Service managing the supplier hierarchy and its read views.
#[derive(Clone)]
pub struct SupplierService {
    db: Arc<DbPool>,
}

impl SupplierService {
    pub fn new(db: Arc<DbPool>) -> Self {
        Self { db }
    }

    /// Creates a supplier together with its owned contact and link rows,
    /// all in one transaction.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create(&self, input: NewSupplier) -> Result<supplier::Model, ServiceError> {
        validate_hierarchy(input.supplier_type, input.parent_id)?;

        let txn = self.db.begin().await?;

        if let Some(parent_id) = input.parent_id {
            supplier::Entity::find_by_id(parent_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "parent supplier {} does not exist",
                        parent_id
                    ))
                })?;
        }

        let contact = contact::ActiveModel {
            email: Set(input.contact.email),
            country: Set(input.contact.country),
            city: Set(input.contact.city),
            street: Set(input.contact.street),
            house_number: Set(input.contact.house_number),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        let created = supplier::ActiveModel {
            title: Set(input.title),
            supplier_type: Set(input.supplier_type),
            debt: Set(Decimal::ZERO),
            contact_id: Set(contact.id),
            parent_id: Set(input.parent_id),
            ..Default::default()
        }
        .insert(&txn)
        .await?;

        link_products(&txn, created.id, &input.product_ids).await?;
        link_employees(&txn, created.id, &input.employee_ids).await?;

        txn.commit().await?;
        info!(supplier_id = created.id, "supplier created");
        Ok(created)
    }

    /// Replaces a supplier's fields; optionally its contact and links.
    #[instrument(skip(self, update))]
    pub async fn update(
        &self,
        supplier_id: i64,
        update: SupplierUpdate,
    ) -> Result<supplier::Model, ServiceError> {
        validate_hierarchy(update.supplier_type, update.parent_id)?;
        if update.parent_id == Some(supplier_id) {
            return Err(ServiceError::ValidationError(
                "a supplier cannot be its own parent".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let existing = supplier::Entity::find_by_id(supplier_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("supplier {}", supplier_id)))?;

        if let Some(parent_id) = update.parent_id {
            supplier::Entity::find_by_id(parent_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::ValidationError(format!(
                        "parent supplier {} does not exist",
                        parent_id
                    ))
                })?;
        }

        if let Some(contact_update) = update.contact {
            let contact = contact::Entity::find_by_id(existing.contact_id)
                .one(&txn)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!(
                        "supplier {} has a dangling contact reference",
                        supplier_id
                    ))
                })?;
            let mut active: contact::ActiveModel = contact.into();
            active.email = Set(contact_update.email);
            active.country = Set(contact_update.country);
            active.city = Set(contact_update.city);
            active.street = Set(contact_update.street);
            active.house_number = Set(contact_update.house_number);
            active.update(&txn).await?;
        }

        let contact_id = existing.contact_id;
        let mut active: supplier::ActiveModel = existing.into();
        active.title = Set(update.title);
        active.supplier_type = Set(update.supplier_type);
        active.parent_id = Set(update.parent_id);
        let updated = active.update(&txn).await?;

        if let Some(product_ids) = update.product_ids {
            supplier_product::Entity::delete_many()
                .filter(supplier_product::Column::SupplierId.eq(supplier_id))
                .exec(&txn)
                .await?;
            link_products(&txn, supplier_id, &product_ids).await?;
        }
        if let Some(employee_ids) = update.employee_ids {
            supplier_employee::Entity::delete_many()
                .filter(supplier_employee::Column::SupplierId.eq(supplier_id))
                .exec(&txn)
                .await?;
            link_employees(&txn, supplier_id, &employee_ids).await?;
        }

        txn.commit().await?;
        info!(supplier_id, contact_id, "supplier updated");
        Ok(updated)
    }

    /// Deletes a supplier. Children keep existing with a nulled parent
    /// reference; the owned contact and link rows go with the supplier.
    #[instrument(skip(self))]
    pub async fn delete(&self, supplier_id: i64) -> Result<(), ServiceError> {
        let txn = self.db.begin().await?;

        let existing = supplier::Entity::find_by_id(supplier_id)
            .one(&txn)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("supplier {}", supplier_id)))?;

        supplier::Entity::update_many()
            .col_expr(supplier::Column::ParentId, Expr::value(Value::BigInt(None)))
            .filter(supplier::Column::ParentId.eq(supplier_id))
            .exec(&txn)
            .await?;

        supplier_product::Entity::delete_many()
            .filter(supplier_product::Column::SupplierId.eq(supplier_id))
            .exec(&txn)
            .await?;
        supplier_employee::Entity::delete_many()
            .filter(supplier_employee::Column::SupplierId.eq(supplier_id))
            .exec(&txn)
            .await?;

        supplier::Entity::delete_by_id(supplier_id).exec(&txn).await?;
        contact::Entity::delete_by_id(existing.contact_id)
            .exec(&txn)
            .await?;

        txn.commit().await?;
        info!(supplier_id, "supplier deleted");
        Ok(())
    }

    /// Fetches one supplier with contact, links and computed level.
    #[instrument(skip(self))]
    pub async fn get(&self, supplier_id: i64) -> Result<Option<SupplierDetails>, ServiceError> {
        let Some(found) = supplier::Entity::find_by_id(supplier_id)
            .one(&*self.db)
            .await?
        else {
            return Ok(None);
        };

        let mut details = self.load_details(vec![found]).await?;
        Ok(details.pop())
    }

    /// Depth of a supplier in the forest: 0 for roots, else 1 + parent's.
    pub async fn level_of(&self, of: &supplier::Model) -> Result<u32, ServiceError> {
        let mut level = 0u32;
        let mut parent_id = of.parent_id;

        while let Some(id) = parent_id {
            level += 1;
            if level > MAX_HIERARCHY_DEPTH {
                return Err(ServiceError::InternalError(format!(
                    "supplier {} exceeds the hierarchy depth bound of {}",
                    of.id, MAX_HIERARCHY_DEPTH
                )));
            }
            let parent = supplier::Entity::find_by_id(id)
                .one(&*self.db)
                .await?
                .ok_or_else(|| {
                    ServiceError::InternalError(format!("dangling parent reference {}", id))
                })?;
            parent_id = parent.parent_id;
        }

        Ok(level)
    }

    /// Suppliers visible to `user_id` whose contact country matches
    /// (case-insensitive exact).
    #[instrument(skip(self))]
    pub async fn list_by_country(
        &self,
        user_id: i64,
        country: &str,
    ) -> Result<Vec<SupplierDetails>, ServiceError> {
        let suppliers = supplier::Entity::find()
            .join(JoinType::InnerJoin, supplier::Relation::Contact.def())
            .join(
                JoinType::InnerJoin,
                supplier::Relation::SupplierEmployees.def(),
            )
            .filter(supplier_employee::Column::UserId.eq(user_id))
            .filter(
                Expr::expr(Func::lower(Expr::col((
                    contact::Entity,
                    contact::Column::Country,
                ))))
                .eq(country.to_lowercase()),
            )
            .all(&*self.db)
            .await?;

        self.load_details(suppliers).await
    }

    /// Suppliers visible to `user_id` that carry the given product.
    #[instrument(skip(self))]
    pub async fn list_by_product(
        &self,
        user_id: i64,
        product_id: i64,
    ) -> Result<Vec<SupplierDetails>, ServiceError> {
        let suppliers = supplier::Entity::find()
            .join(
                JoinType::InnerJoin,
                supplier::Relation::SupplierProducts.def(),
            )
            .filter(supplier_product::Column::ProductId.eq(product_id))
            .join(
                JoinType::InnerJoin,
                supplier::Relation::SupplierEmployees.def(),
            )
            .filter(supplier_employee::Column::UserId.eq(user_id))
            .all(&*self.db)
            .await?;

        self.load_details(suppliers).await
    }

    /// Suppliers visible to `user_id` whose debt exceeds the network-wide
    /// average. The average is computed fresh on every call.
    #[instrument(skip(self))]
    pub async fn list_debt_above_average(
        &self,
        user_id: i64,
    ) -> Result<Vec<SupplierDetails>, ServiceError> {
        let average: Option<Decimal> = supplier::Entity::find()
            .select_only()
            .column_as(
                SimpleExpr::from(Func::avg(Expr::col((
                    supplier::Entity,
                    supplier::Column::Debt,
                )))),
                "avg_debt",
            )
            .into_tuple::<Option<Decimal>>()
            .one(&*self.db)
            .await?
            .flatten();

        let Some(average) = average else {
            return Ok(Vec::new());
        };

        let suppliers = supplier::Entity::find()
            .join(
                JoinType::InnerJoin,
                supplier::Relation::SupplierEmployees.def(),
            )
            .filter(supplier_employee::Column::UserId.eq(user_id))
            .filter(supplier::Column::Debt.gt(average))
            .all(&*self.db)
            .await?;

        self.load_details(suppliers).await
    }

    /// Total number of suppliers in the network.
    pub async fn count(&self) -> Result<u64, ServiceError> {
        Ok(supplier::Entity::find().count(&*self.db).await?)
    }

    async fn load_details(
        &self,
        suppliers: Vec<supplier::Model>,
    ) -> Result<Vec<SupplierDetails>, ServiceError> {
        if suppliers.is_empty() {
            return Ok(Vec::new());
        }

        let supplier_ids: Vec<i64> = suppliers.iter().map(|s| s.id).collect();
        let contact_ids: Vec<i64> = suppliers.iter().map(|s| s.contact_id).collect();

        let contacts: HashMap<i64, contact::Model> = contact::Entity::find()
            .filter(contact::Column::Id.is_in(contact_ids))
            .all(&*self.db)
            .await?
            .into_iter()
            .map(|c| (c.id, c))
            .collect();

        let product_links = supplier_product::Entity::find()
            .filter(supplier_product::Column::SupplierId.is_in(supplier_ids.clone()))
            .all(&*self.db)
            .await?;
        let employee_links = supplier_employee::Entity::find()
            .filter(supplier_employee::Column::SupplierId.is_in(supplier_ids))
            .all(&*self.db)
            .await?;

        let mut details = Vec::with_capacity(suppliers.len());
        for supplier in suppliers {
            let contact = contacts.get(&supplier.contact_id).cloned().ok_or_else(|| {
                ServiceError::InternalError(format!(
                    "supplier {} has no contact record",
                    supplier.id
                ))
            })?;
            let level = self.level_of(&supplier).await?;
            let product_ids = product_links
                .iter()
                .filter(|l| l.supplier_id == supplier.id)
                .map(|l| l.product_id)
                .collect();
            let employee_ids = employee_links
                .iter()
                .filter(|l| l.supplier_id == supplier.id)
                .map(|l| l.user_id)
                .collect();

            details.push(SupplierDetails {
                supplier,
                contact,
                level,
                product_ids,
                employee_ids,
            });
        }

        Ok(details)
    }
}

async fn link_products(
    txn: &sea_orm::DatabaseTransaction,
    supplier_id: i64,
    product_ids: &[i64],
) -> Result<(), ServiceError> {
    if product_ids.is_empty() {
        return Ok(());
    }
    let rows = product_ids.iter().map(|product_id| supplier_product::ActiveModel {
        supplier_id: Set(supplier_id),
        product_id: Set(*product_id),
    });
    supplier_product::Entity::insert_many(rows).exec(txn).await?;
    Ok(())
}

async fn link_employees(
    txn: &sea_orm::DatabaseTransaction,
    supplier_id: i64,
    employee_ids: &[i64],
) -> Result<(), ServiceError> {
    if employee_ids.is_empty() {
        return Ok(());
    }
    let rows = employee_ids.iter().map(|user_id| supplier_employee::ActiveModel {
        supplier_id: Set(supplier_id),
        user_id: Set(*user_id),
    });
    supplier_employee::Entity::insert_many(rows).exec(txn).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn factory_with_parent_is_rejected() {
        let err = validate_hierarchy(SupplierType::Factory, Some(1)).unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[test]
    fn factory_without_parent_is_fine() {
        assert!(validate_hierarchy(SupplierType::Factory, None).is_ok());
    }

    #[test]
    fn non_factory_with_parent_is_fine() {
        assert!(validate_hierarchy(SupplierType::DealershipCenter, Some(1)).is_ok());
        assert!(validate_hierarchy(SupplierType::IndividualEntrepreneur, None).is_ok());
    }
}
