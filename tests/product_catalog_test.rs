//! Product catalog: create path and model validation.

use chrono::Utc;
use sea_orm::{DatabaseBackend, DbErr, MockDatabase};
use std::sync::Arc;

use retailnet_api::{
    entities::product,
    errors::ServiceError,
    services::products::{NewProduct, ProductService},
};

fn test_product(id: i64) -> product::Model {
    product::Model {
        id,
        name: "Widget".to_string(),
        model: "W-100".to_string(),
        released_at: Utc::now(),
    }
}

#[tokio::test]
async fn create_inserts_with_generated_id_and_default_release() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![test_product(1)]])
        .into_connection();
    let service = ProductService::new(Arc::new(db));

    let created = service
        .create(NewProduct {
            name: "Widget".to_string(),
            model: "W-100".to_string(),
            released_at: None,
        })
        .await
        .unwrap();

    assert_eq!(created.id, 1);
    assert_eq!(created.name, "Widget");
}

#[tokio::test]
async fn oversized_name_is_rejected_before_the_insert_runs() {
    // No mocked results: reaching the database would fail differently.
    let db = MockDatabase::new(DatabaseBackend::Postgres).into_connection();
    let service = ProductService::new(Arc::new(db));

    let err = service
        .create(NewProduct {
            name: "x".repeat(26),
            model: "W-100".to_string(),
            released_at: None,
        })
        .await
        .unwrap_err();

    match err {
        ServiceError::DatabaseError(DbErr::Custom(msg)) => {
            assert!(msg.contains("Validation error"), "unexpected message: {}", msg);
        }
        other => panic!("expected a validation failure, got {:?}", other),
    }
}
