//! Supplier hierarchy reads: level computation and detail assembly.

use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::Arc;

use retailnet_api::{
    entities::{contact, supplier, supplier_employee, supplier_product, SupplierType},
    errors::ServiceError,
    services::suppliers::{NewContact, NewSupplier, SupplierService},
};

fn test_supplier(id: i64, supplier_type: SupplierType, parent_id: Option<i64>) -> supplier::Model {
    supplier::Model {
        id,
        title: format!("Supplier {}", id),
        supplier_type,
        debt: Decimal::ZERO,
        contact_id: id + 100,
        parent_id,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn test_contact(id: i64) -> contact::Model {
    contact::Model {
        id,
        email: format!("contact{}@example.com", id),
        country: "Japan".to_string(),
        city: "Tokyo".to_string(),
        street: "Main".to_string(),
        house_number: "1".to_string(),
    }
}

fn new_supplier_input(title: &str) -> NewSupplier {
    NewSupplier {
        title: title.to_string(),
        supplier_type: SupplierType::Factory,
        parent_id: None,
        contact: NewContact {
            email: "factory@example.com".to_string(),
            country: "Japan".to_string(),
            city: "Tokyo".to_string(),
            street: "Main".to_string(),
            house_number: "1".to_string(),
        },
        product_ids: vec![],
        employee_ids: vec![],
    }
}

#[tokio::test]
async fn create_inserts_contact_then_supplier() {
    // Inserted rows come back via RETURNING: first the contact, then the
    // supplier with its generated id.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![test_contact(101)]])
        .append_query_results(vec![vec![test_supplier(1, SupplierType::Factory, None)]])
        .into_connection();
    let service = SupplierService::new(Arc::new(db));

    let created = service.create(new_supplier_input("Supplier 1")).await.unwrap();

    assert_eq!(created.id, 1);
    assert_eq!(created.contact_id, 101);
    assert_eq!(created.debt, Decimal::ZERO);
}

#[tokio::test]
async fn create_rejects_oversized_title_before_inserting() {
    // The contact row is consumed before supplier validation runs; the
    // supplier insert itself must never execute.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![test_contact(101)]])
        .into_connection();
    let service = SupplierService::new(Arc::new(db));

    let err = service
        .create(new_supplier_input(&"x".repeat(51)))
        .await
        .unwrap_err();

    match err {
        ServiceError::DatabaseError(sea_orm::DbErr::Custom(msg)) => {
            assert!(msg.contains("Validation error"), "unexpected message: {}", msg);
        }
        other => panic!("expected a validation failure, got {:?}", other),
    }
}

#[tokio::test]
async fn level_walks_the_parent_chain() {
    // entrepreneur(3) -> dealership(2) -> factory(1)
    let factory = test_supplier(1, SupplierType::Factory, None);
    let dealership = test_supplier(2, SupplierType::DealershipCenter, Some(1));
    let entrepreneur = test_supplier(3, SupplierType::IndividualEntrepreneur, Some(2));

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![dealership], vec![factory]])
        .into_connection();
    let service = SupplierService::new(Arc::new(db));

    let level = service.level_of(&entrepreneur).await.unwrap();
    assert_eq!(level, 2);
}

#[tokio::test]
async fn roots_are_level_zero_without_any_lookup() {
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let service = SupplierService::new(Arc::new(db));

    let factory = test_supplier(1, SupplierType::Factory, None);
    assert_eq!(service.level_of(&factory).await.unwrap(), 0);
}

#[tokio::test]
async fn dangling_parent_reference_is_an_internal_error() {
    let child = test_supplier(3, SupplierType::DealershipCenter, Some(2));

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<supplier::Model>::new()])
        .into_connection();
    let service = SupplierService::new(Arc::new(db));

    let err = service.level_of(&child).await.unwrap_err();
    assert!(matches!(err, ServiceError::InternalError(_)));
}

#[tokio::test]
async fn get_assembles_contact_links_and_level() {
    let root = test_supplier(1, SupplierType::Factory, None);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![root]])
        .append_query_results(vec![vec![test_contact(101)]])
        .append_query_results(vec![vec![
            supplier_product::Model {
                supplier_id: 1,
                product_id: 11,
            },
            supplier_product::Model {
                supplier_id: 1,
                product_id: 12,
            },
        ]])
        .append_query_results(vec![vec![supplier_employee::Model {
            supplier_id: 1,
            user_id: 42,
        }]])
        .into_connection();
    let service = SupplierService::new(Arc::new(db));

    let details = service.get(1).await.unwrap().unwrap();

    assert_eq!(details.supplier.id, 1);
    assert_eq!(details.contact.id, 101);
    assert_eq!(details.level, 0);
    assert_eq!(details.product_ids, vec![11, 12]);
    assert_eq!(details.employee_ids, vec![42]);
}

#[tokio::test]
async fn statistics_returns_suppliers_above_the_average() {
    use sea_orm::Value;
    use std::collections::BTreeMap;

    let mut indebted = test_supplier(1, SupplierType::Factory, None);
    indebted.debt = Decimal::new(20_000, 2);

    let avg_row = BTreeMap::from([(
        "avg_debt",
        Value::Decimal(Some(Box::new(Decimal::new(10_000, 2)))),
    )]);

    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![avg_row]])
        .append_query_results(vec![vec![indebted]])
        .append_query_results(vec![vec![test_contact(101)]])
        .append_query_results(vec![Vec::<supplier_product::Model>::new()])
        .append_query_results(vec![vec![supplier_employee::Model {
            supplier_id: 1,
            user_id: 42,
        }]])
        .into_connection();
    let service = SupplierService::new(Arc::new(db));

    let details = service.list_debt_above_average(42).await.unwrap();

    assert_eq!(details.len(), 1);
    assert_eq!(details[0].supplier.debt, Decimal::new(20_000, 2));
}

#[tokio::test]
async fn statistics_is_empty_when_there_are_no_suppliers() {
    use sea_orm::Value;
    use std::collections::BTreeMap;

    // No rows at all: the average is undefined, so nothing can exceed it.
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<BTreeMap<&str, Value>>::new()])
        .into_connection();
    let service = SupplierService::new(Arc::new(db));

    assert!(service.list_debt_above_average(42).await.unwrap().is_empty());
}

#[tokio::test]
async fn get_returns_none_for_unknown_supplier() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<supplier::Model>::new()])
        .into_connection();
    let service = SupplierService::new(Arc::new(db));

    assert!(service.get(404).await.unwrap().is_none());
}
