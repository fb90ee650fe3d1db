pub mod debt;
pub mod products;
pub mod qr_card;
pub mod suppliers;
