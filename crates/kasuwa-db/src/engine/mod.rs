//! # Transactional Engines
//!
//! Every multi-row mutation in the system lives here, and every one of them
//! runs inside a single SQLite transaction:
//!
//! - [`checkout`] - the sale orchestrator: cart validation, price snapshots,
//!   stock decrements and (for credit sales) the credit-limit gate
//! - [`credit`] - the credit ledger: repayments, overdue aging, summaries
//! - [`stock`] - stock adjustments with an append-only movement trail
//!
//! ## Concurrency Model
//! SQLite has a single writer, so two checkouts never interleave their
//! writes. The engines still guard their hot updates
//! (`stock_quantity >= ?`, `outstanding_balance_kobo + ? <= limit`) so a
//! stale in-transaction read can never push a row past its invariant: a
//! guard that matches zero rows becomes a typed domain error and the whole
//! transaction rolls back.

pub mod checkout;
pub mod credit;
pub mod stock;
