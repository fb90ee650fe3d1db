//! Sea-ORM entities for the supplier network schema.

pub mod contact;
pub mod product;
pub mod supplier;
pub mod supplier_employee;
pub mod supplier_product;
pub mod user;

pub use supplier::SupplierType;
