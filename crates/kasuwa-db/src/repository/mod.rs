//! # Repository Module
//!
//! Pool-bound CRUD for the ledger store tables.
//!
//! Repositories handle single-entity reads and writes. Anything touching
//! `products.stock_quantity` or `customers.outstanding_balance_kobo`, or
//! spanning multiple rows, belongs to the engines in [`crate::engine`] -
//! repositories deliberately have no way to mutate those fields.

pub mod customer;
pub mod product;
pub mod report;
pub mod sale;
