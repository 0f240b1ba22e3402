//! # kasuwa-db: Database Layer for Kasuwa POS
//!
//! This crate provides database access for the Kasuwa POS system and the
//! three transactional engines that own every multi-row mutation.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Kasuwa POS Data Flow                             │
//! │                                                                         │
//! │  Calling layer (create_sale / record_payment / adjust_stock)           │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     kasuwa-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐   ┌───────────────┐   ┌──────────────┐    │   │
//! │  │   │   Database    │   │    Engines    │   │ Repositories │    │   │
//! │  │   │   (pool.rs)   │   │  checkout.rs  │   │  product.rs  │    │   │
//! │  │   │               │   │   credit.rs   │   │ customer.rs  │    │   │
//! │  │   │ SqlitePool    │◄──│   stock.rs    │   │   sale.rs    │    │   │
//! │  │   │ + Clock       │   │ (transactions)│   │  report.rs   │    │   │
//! │  │   └───────────────┘   └───────────────┘   └──────────────┘    │   │
//! │  │                                                                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │                     SQLite Database (WAL mode)                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//! - [`engine`] - Checkout, credit-ledger and stock engines
//! - [`repository`] - Repository implementations (product, customer, ...)
//! - [`activity`] - Fire-and-forget activity log
//!
//! ## Usage
//!
//! ```rust,ignore
//! use kasuwa_core::{CartLine, PaymentMethod};
//! use kasuwa_db::{Database, DbConfig};
//! use kasuwa_db::engine::checkout::SaleRequest;
//!
//! let db = Database::new(DbConfig::new("path/to/kasuwa.db")).await?;
//!
//! let completed = db.checkout().create_sale(SaleRequest {
//!     lines: vec![CartLine::new(product_id, 3)],
//!     discount_kobo: 0,
//!     payment_method: PaymentMethod::Cash,
//!     customer_id: None,
//!     credit_due_date: None,
//!     cashier_id: cashier.to_string(),
//! }).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod activity;
pub mod engine;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::DbError;
pub use pool::{Database, DbConfig};

// Engine re-exports for convenience
pub use engine::checkout::{CheckoutService, CompletedSale, SaleRequest};
pub use engine::credit::{CreditService, PaymentRequest};
pub use engine::stock::StockService;

// Repository re-exports
pub use repository::customer::CustomerRepository;
pub use repository::product::ProductRepository;
pub use repository::report::ReportRepository;
pub use repository::sale::SaleRepository;
