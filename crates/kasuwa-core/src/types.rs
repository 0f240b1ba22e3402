//! # Domain Types
//!
//! Core domain types used throughout Kasuwa POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │      Sale       │   │  CreditPayment  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku (business) │   │  transaction_id │   │  sale_id (FK)   │       │
//! │  │  stock_quantity │   │  payment_method │   │  amount_kobo    │       │
//! │  │  price_kobo     │   │  credit_amount  │   │  payment_date   │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Customer     │   │    SaleItem     │   │  StockMovement  │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  credit_limit   │   │  price snapshot │   │  previous/new   │       │
//! │  │  outstanding    │   │  quantity       │   │  append-only    │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Dual-Key Identity Pattern
//! Every entity has:
//! - `id`: UUID v4 - immutable, used for database relations
//! - Business ID where one exists: (sku, transaction_id) - human-readable
//!
//! ## Hot Mutable Fields
//! `Product::stock_quantity` and `Customer::outstanding_balance_kobo` are the
//! two fields concurrent sales fight over. They are only ever mutated inside
//! the kasuwa-db engines' transactions, never through plain row updates.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::money::Money;

// =============================================================================
// Payment Method
// =============================================================================

/// How a sale is settled at the till.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// Paid in full at the till.
    Cash,
    /// Booked against the customer's credit account, due later.
    Credit,
}

// =============================================================================
// Settlement Method
// =============================================================================

/// How a credit repayment was received.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SettlementMethod {
    Cash,
    BankTransfer,
    Pos,
    MobileMoney,
}

// =============================================================================
// Stock Movement Type
// =============================================================================

/// Direction of a stock movement.
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Stock received (restock, return to shelf).
    In,
    /// Stock leaving (sale).
    Out,
    /// Manual correction (recount).
    Adjustment,
}

// =============================================================================
// Product
// =============================================================================

/// A product available for sale.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Stock Keeping Unit - business identifier, unique.
    pub sku: String,

    /// Barcode (EAN-13, UPC-A, etc.) - unique when present.
    pub barcode: Option<String>,

    /// Display name shown to cashier and on receipt.
    pub name: String,

    /// Optional description for product details.
    pub description: Option<String>,

    /// Category label for filtering and reporting.
    pub category: Option<String>,

    /// Selling price in kobo.
    pub price_kobo: i64,

    /// Cost in kobo (for margin reporting).
    pub cost_kobo: i64,

    /// Current stock level. Never negative; mutated only by the stock engine.
    pub stock_quantity: i64,

    /// Reorder threshold for the low-stock report.
    pub min_stock_level: i64,

    /// Whether product is active (soft delete).
    pub is_active: bool,

    /// When the product was created.
    pub created_at: DateTime<Utc>,

    /// When the product was last updated.
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the selling price as a Money type.
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_kobo(self.price_kobo)
    }

    /// Checks whether the requested quantity can be sold from current stock.
    pub fn can_sell(&self, quantity: i64) -> bool {
        self.is_active && quantity > 0 && self.stock_quantity >= quantity
    }

    /// Checks whether the product sits at or below its reorder threshold.
    pub fn is_low_stock(&self) -> bool {
        self.stock_quantity <= self.min_stock_level
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer with an optional credit account.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Unique among active customers when present.
    pub phone: Option<String>,
    /// Unique among active customers when present.
    pub email: Option<String>,
    pub address: Option<String>,

    /// Maximum outstanding credit in kobo. Zero means unlimited.
    pub credit_limit_kobo: i64,

    /// Running total of unpaid credit in kobo. Always >= 0.
    /// Mutated only by the credit engine as sales post and payments land.
    pub outstanding_balance_kobo: i64,

    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    /// Returns the credit limit as Money.
    #[inline]
    pub fn credit_limit(&self) -> Money {
        Money::from_kobo(self.credit_limit_kobo)
    }

    /// Returns the outstanding balance as Money.
    #[inline]
    pub fn outstanding_balance(&self) -> Money {
        Money::from_kobo(self.outstanding_balance_kobo)
    }

    /// Whether this customer has a finite credit limit.
    #[inline]
    pub fn has_credit_limit(&self) -> bool {
        self.credit_limit_kobo > 0
    }

    /// Checks whether a new credit purchase fits under the limit.
    ///
    /// A zero limit means unlimited credit.
    pub fn can_take_credit(&self, amount: Money) -> bool {
        if !self.has_credit_limit() {
            return true;
        }
        self.outstanding_balance_kobo + amount.kobo() <= self.credit_limit_kobo
    }
}

// =============================================================================
// Sale
// =============================================================================

/// A completed sale transaction.
///
/// Immutable once created; credit payments reference it but never change it.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Sale {
    pub id: String,
    /// Human-readable business identifier, e.g. `TXN-1726000000000-7KQ2M`.
    pub transaction_id: String,
    pub cashier_id: String,
    /// Present iff this is a credit sale.
    pub customer_id: Option<String>,
    /// Grand total after discount, in kobo.
    pub total_kobo: i64,
    pub discount_kobo: i64,
    pub payment_method: PaymentMethod,
    /// Due date for credit sales; None for cash.
    pub credit_due_date: Option<NaiveDate>,
    /// Equals total_kobo for credit sales, 0 for cash.
    pub credit_amount_kobo: i64,
    pub created_at: DateTime<Utc>,
}

impl Sale {
    /// Returns the grand total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_kobo(self.total_kobo)
    }

    /// Returns the amount booked against the customer's credit account.
    #[inline]
    pub fn credit_amount(&self) -> Money {
        Money::from_kobo(self.credit_amount_kobo)
    }

    /// Whether this sale was booked on credit.
    #[inline]
    pub fn is_credit(&self) -> bool {
        self.payment_method == PaymentMethod::Credit
    }
}

// =============================================================================
// Sale Item
// =============================================================================

/// A line item in a sale.
/// Uses snapshot pattern to freeze the unit price at time of sale:
/// later price changes never retroactively affect historical sales.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SaleItem {
    pub id: String,
    pub sale_id: String,
    pub product_id: String,
    /// Quantity sold. Always > 0.
    pub quantity: i64,
    /// Unit price in kobo at time of sale (frozen).
    pub unit_price_kobo: i64,
    /// unit_price × quantity.
    pub total_kobo: i64,
    pub created_at: DateTime<Utc>,
}

impl SaleItem {
    /// Returns the frozen unit price as Money.
    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_kobo(self.unit_price_kobo)
    }

    /// Returns the line total as Money.
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_kobo(self.total_kobo)
    }
}

// =============================================================================
// Credit Payment
// =============================================================================

/// A repayment against a specific credit sale.
/// Immutable once recorded.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditPayment {
    pub id: String,
    pub sale_id: String,
    pub customer_id: String,
    /// Amount in kobo. Always > 0 and never more than the sale's
    /// remaining balance at the time it was recorded.
    pub amount_kobo: i64,
    pub payment_date: NaiveDate,
    pub method: SettlementMethod,
    pub notes: Option<String>,
    /// User who recorded the payment.
    pub recorded_by: String,
    pub created_at: DateTime<Utc>,
}

impl CreditPayment {
    /// Returns the payment amount as Money.
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_kobo(self.amount_kobo)
    }
}

// =============================================================================
// Stock Movement
// =============================================================================

/// Audit record for a stock change. Append-only, never mutated.
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StockMovement {
    pub id: String,
    pub product_id: String,
    pub movement_type: MovementType,
    /// Magnitude of the change. Always > 0; direction lives in movement_type.
    pub quantity: i64,
    pub previous_stock: i64,
    pub new_stock: i64,
    pub reason: String,
    /// Entity kind that caused the movement, e.g. "sale".
    pub reference_type: Option<String>,
    pub reference_id: Option<String>,
    pub performed_by: String,
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Overdue Aging
// =============================================================================

/// Severity bands for overdue credit, used by reporting (not enforcement).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverdueSeverity {
    /// 1-7 days overdue.
    Warning,
    /// 8-30 days overdue.
    Danger,
    /// 31+ days overdue.
    Critical,
}

impl OverdueSeverity {
    /// Classifies a days-overdue count into a severity band.
    ///
    /// Zero or negative days (not yet due) has no severity.
    pub fn from_days_overdue(days: i64) -> Option<Self> {
        match days {
            d if d <= 0 => None,
            1..=7 => Some(OverdueSeverity::Warning),
            8..=30 => Some(OverdueSeverity::Danger),
            _ => Some(OverdueSeverity::Critical),
        }
    }
}

/// Whole calendar days between a due date and today, truncated.
///
/// This is the single days-overdue definition used everywhere: positive
/// when the due date has passed, zero on the due date, negative before it.
#[inline]
pub fn days_overdue(due_date: NaiveDate, today: NaiveDate) -> i64 {
    (today - due_date).num_days()
}

// =============================================================================
// Unit Tests
// =============================================================================
