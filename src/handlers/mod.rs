pub mod admin;
pub mod common;
pub mod products;
pub mod qr;
pub mod suppliers;

use crate::{
    db::DbPool,
    mailer::Mailer,
    message_queue::MessageQueue,
    services::{
        debt::DebtService, products::ProductService, qr_card::QrCardService,
        suppliers::SupplierService,
    },
};
use std::sync::Arc;

// Re-export AppState so handler modules can import it as crate::handlers::AppState
pub use crate::AppState;

/// Services layer that encapsulates business logic used by HTTP handlers
/// and background workers.
#[derive(Clone)]
pub struct AppServices {
    pub suppliers: Arc<SupplierService>,
    pub products: Arc<ProductService>,
    pub debt: Arc<DebtService>,
    pub qr_cards: Arc<QrCardService>,
}

impl AppServices {
    pub fn new(db: Arc<DbPool>, queue: Arc<dyn MessageQueue>, mailer: Arc<dyn Mailer>) -> Self {
        let suppliers = Arc::new(SupplierService::new(db.clone()));
        let products = Arc::new(ProductService::new(db.clone()));
        let debt = Arc::new(DebtService::new(db.clone(), queue));
        let qr_cards = Arc::new(QrCardService::new(db, mailer));

        Self {
            suppliers,
            products,
            debt,
            qr_cards,
        }
    }
}
