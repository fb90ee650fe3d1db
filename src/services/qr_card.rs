//! QR contact-card workflow.
//!
//! Runs as a fire-and-forget background job: loads a supplier's contact
//! data, renders it into a QR code PNG and mails it to the requested
//! address. Failures are typed so the worker can log them distinctly, but
//! they never reach the enqueuing HTTP caller.

use crate::{
    db::DbPool,
    entities::{contact, supplier},
    mailer::{EmailAttachment, Mailer, OutboundEmail},
};
use image::{DynamicImage, ImageFormat, Luma};
use qrcode::{EcLevel, QrCode};
use sea_orm::EntityTrait;
use std::io::Cursor;
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, instrument};

/// Closed failure set for the workflow, replacing the historical
/// catch-all-and-stringify behavior.
#[derive(Debug, Error)]
pub enum QrCardError {
    #[error("supplier {0} not found")]
    NotFound(i64),
    #[error("storage error: {0}")]
    Storage(#[from] sea_orm::DbErr),
    #[error("QR encoding failed: {0}")]
    Encoding(String),
    #[error("delivery failed: {0}")]
    Delivery(String),
}

/// Successful delivery receipt, used only for logging.
#[derive(Debug, Clone)]
pub struct QrCardDelivery {
    pub supplier_id: i64,
    pub recipient: String,
}

/// Generates and emails supplier contact QR cards.
pub struct QrCardService {
    db: Arc<DbPool>,
    mailer: Arc<dyn Mailer>,
}

impl QrCardService {
    pub fn new(db: Arc<DbPool>, mailer: Arc<dyn Mailer>) -> Self {
        Self { db, mailer }
    }

    /// Looks up the supplier, renders its contact card as a QR PNG and
    /// mails it to `email`.
    #[instrument(skip(self))]
    pub async fn generate_and_send(
        &self,
        supplier_id: i64,
        email: &str,
    ) -> Result<QrCardDelivery, QrCardError> {
        let supplier = supplier::Entity::find_by_id(supplier_id)
            .one(&*self.db)
            .await?
            .ok_or(QrCardError::NotFound(supplier_id))?;
        let contact = contact::Entity::find_by_id(supplier.contact_id)
            .one(&*self.db)
            .await?
            .ok_or(QrCardError::NotFound(supplier_id))?;

        let card = contact_card_text(&supplier, &contact);
        let png = render_qr_png(&card)?;

        let outbound = OutboundEmail {
            to: email.to_string(),
            subject: format!("Supplier contact QR code: {}", supplier.title),
            body: format!("Contact details for supplier {}:\n{}", supplier.title, card),
            attachment: Some(EmailAttachment {
                filename: format!("qr_{}.png", supplier_id),
                content_type: "image/png".to_string(),
                bytes: png,
            }),
        };

        self.mailer
            .send(outbound)
            .await
            .map_err(|e| QrCardError::Delivery(e.to_string()))?;

        info!(supplier_id, recipient = email, "QR contact card delivered");
        Ok(QrCardDelivery {
            supplier_id,
            recipient: email.to_string(),
        })
    }
}

/// Fixed multi-line layout of the data encoded into the QR code.
pub fn contact_card_text(supplier: &supplier::Model, contact: &contact::Model) -> String {
    format!(
        "{}\nEmail: {}\nAddress: {}, {}, {}, {}",
        supplier.title,
        contact.email,
        contact.country,
        contact.city,
        contact.street,
        contact.house_number
    )
}

/// Renders text into a PNG QR code: error correction level L, auto-sized,
/// default quiet-zone margin.
pub fn render_qr_png(text: &str) -> Result<Vec<u8>, QrCardError> {
    let code = QrCode::with_error_correction_level(text.as_bytes(), EcLevel::L)
        .map_err(|e| QrCardError::Encoding(e.to_string()))?;

    let rendered = code.render::<Luma<u8>>().build();
    let mut png = Vec::new();
    DynamicImage::ImageLuma8(rendered)
        .write_to(&mut Cursor::new(&mut png), ImageFormat::Png)
        .map_err(|e| QrCardError::Encoding(e.to_string()))?;

    Ok(png)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rust_decimal::Decimal;

    fn test_supplier() -> supplier::Model {
        supplier::Model {
            id: 7,
            title: "Northwind Factory".into(),
            supplier_type: crate::entities::SupplierType::Factory,
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
            email: "office@northwind.example".into(),
            country: "Norway".into(),
            city: "Bergen".into(),
            street: "Strandgaten".into(),
            house_number: "12b".into(),
        }
    }

    #[test]
    fn card_layout_is_stable() {
        let text = contact_card_text(&test_supplier(), &test_contact());
        assert_eq!(
            text,
            "Northwind Factory\nEmail: office@northwind.example\nAddress: Norway, Bergen, Strandgaten, 12b"
        );
    }

    #[test]
    fn rendered_qr_is_a_png() {
        let png = render_qr_png("hello").unwrap();
        // PNG signature
        assert_eq!(&png[..8], &[0x89, b'P', b'N', b'G', b'\r', b'\n', 0x1a, b'\n']);
    }

    #[test]
    fn oversized_payload_reports_encoding_failure() {
        // Past the QR version 40 capacity even at level L.
        let huge = "x".repeat(10_000);
        assert!(matches!(
            render_qr_png(&huge),
            Err(QrCardError::Encoding(_))
        ));
    }
}
