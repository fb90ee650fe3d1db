//! QR contact card workflow: rendering, delivery and failure modes.

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{DatabaseBackend, MockDatabase};
use std::sync::{Arc, Mutex};

use retailnet_api::{
    entities::{contact, supplier, SupplierType},
    mailer::{Mailer, MailerError, OutboundEmail},
    services::qr_card::{QrCardError, QrCardService},
};

/// Captures outbound mail instead of sending it.
#[derive(Default)]
struct RecordingMailer {
    sent: Mutex<Vec<OutboundEmail>>,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutboundEmail) -> Result<(), MailerError> {
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

/// Always fails, to exercise the delivery error path.
struct BrokenMailer;

#[async_trait]
impl Mailer for BrokenMailer {
    async fn send(&self, _email: OutboundEmail) -> Result<(), MailerError> {
        Err(MailerError::Transport("connection refused".to_string()))
    }
}

fn test_supplier() -> supplier::Model {
    supplier::Model {
        id: 7,
        title: "Northwind Factory".to_string(),
        supplier_type: SupplierType::Factory,
        debt: Decimal::ZERO,
        contact_id: 3,
        parent_id: None,
        created_at: Utc::now(),
        updated_at: None,
    }
}

fn test_contact() -> contact::Model {
    contact::Model {
        id: 3,
        email: "office@northwind.example".to_string(),
        country: "Norway".to_string(),
        city: "Bergen".to_string(),
        street: "Strandgaten".to_string(),
        house_number: "12b".to_string(),
    }
}

#[tokio::test]
async fn generates_and_mails_a_png_card() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![test_supplier()]])
        .append_query_results(vec![vec![test_contact()]])
        .into_connection();
    let mailer = Arc::new(RecordingMailer::default());
    let service = QrCardService::new(Arc::new(db), mailer.clone());

    let delivery = service
        .generate_and_send(7, "boss@example.com")
        .await
        .unwrap();

    assert_eq!(delivery.supplier_id, 7);
    assert_eq!(delivery.recipient, "boss@example.com");

    let sent = mailer.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let email = &sent[0];
    assert_eq!(email.to, "boss@example.com");
    assert!(email.subject.contains("Northwind Factory"));
    assert!(email.body.contains("office@northwind.example"));

    let attachment = email.attachment.as_ref().unwrap();
    assert_eq!(attachment.filename, "qr_7.png");
    assert_eq!(attachment.content_type, "image/png");
    // PNG signature
    assert_eq!(
        &attachment.bytes[..8],
        &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']
    );
}

#[tokio::test]
async fn unknown_supplier_is_reported_as_not_found() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![Vec::<supplier::Model>::new()])
        .into_connection();
    let mailer = Arc::new(RecordingMailer::default());
    let service = QrCardService::new(Arc::new(db), mailer.clone());

    let err = service
        .generate_and_send(99, "boss@example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, QrCardError::NotFound(99)));
    assert!(mailer.sent.lock().unwrap().is_empty());
}

#[tokio::test]
async fn transport_failures_surface_as_delivery_errors() {
    let db = MockDatabase::new(DatabaseBackend::Postgres)
        .append_query_results(vec![vec![test_supplier()]])
        .append_query_results(vec![vec![test_contact()]])
        .into_connection();
    let service = QrCardService::new(Arc::new(db), Arc::new(BrokenMailer));

    let err = service
        .generate_and_send(7, "boss@example.com")
        .await
        .unwrap_err();

    assert!(matches!(err, QrCardError::Delivery(_)));
}
