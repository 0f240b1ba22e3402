//! Development seed tool.
//!
//! Populates a database with a small shop's worth of products and customers,
//! plus a couple of sales so the credit views have something to show.
//!
//! ```text
//! cargo run --bin seed -- [path/to/kasuwa.db]
//! ```

use chrono::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

use kasuwa_core::{CartLine, Money, PaymentMethod, SettlementMethod};
use kasuwa_db::engine::checkout::SaleRequest;
use kasuwa_db::engine::credit::PaymentRequest;
use kasuwa_db::repository::customer::NewCustomer;
use kasuwa_db::repository::product::NewProduct;
use kasuwa_db::{Database, DbConfig};

const CASHIER: &str = "seed";

fn product(sku: &str, name: &str, category: &str, price_naira: i64, stock: i64) -> NewProduct {
    NewProduct {
        sku: sku.to_string(),
        barcode: None,
        name: name.to_string(),
        description: None,
        category: Some(category.to_string()),
        price_kobo: Money::from_naira(price_naira).kobo(),
        cost_kobo: Money::from_naira(price_naira * 7 / 10).kobo(),
        stock_quantity: stock,
        min_stock_level: 5,
    }
}

fn customer(name: &str, phone: &str, limit_naira: i64) -> NewCustomer {
    NewCustomer {
        name: name.to_string(),
        phone: Some(phone.to_string()),
        email: None,
        address: None,
        credit_limit_kobo: Money::from_naira(limit_naira).kobo(),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let path = std::env::args().nth(1).unwrap_or_else(|| "kasuwa.db".to_string());
    info!(path = %path, "Seeding database");

    let db = Database::new(DbConfig::new(&path)).await?;

    let products = [
        product("RICE-5KG", "Rice 5kg", "Grains", 5500, 40),
        product("RICE-1KG", "Rice 1kg", "Grains", 1200, 80),
        product("SEMO-1KG", "Golden Penny Semovita 1kg", "Grains", 950, 60),
        product("OIL-1L", "Vegetable Oil 1L", "Cooking", 1800, 35),
        product("MILK-400G", "Peak Milk Powder 400g", "Dairy", 2900, 25),
        product("MILO-500G", "Milo 500g", "Beverages", 2600, 30),
        product("SUGAR-1KG", "St. Louis Sugar 1kg", "Baking", 1100, 50),
        product("SOAP-BAR", "Laundry Soap Bar", "Household", 450, 100),
        product("DETERGENT", "Detergent 900g", "Household", 1500, 45),
        product("SPAGHETTI", "Spaghetti 500g", "Pasta", 750, 90),
    ];

    let mut product_ids = Vec::new();
    for p in products {
        let created = db.products().create(p).await?;
        product_ids.push(created.id);
    }
    info!(count = product_ids.len(), "Products seeded");

    let customers = [
        customer("Amina Yusuf", "08031234567", 50_000),
        customer("Bello Musa", "08157654321", 20_000),
        customer("Chinedu Okeke", "07069876543", 0), // no limit
    ];

    let mut customer_ids = Vec::new();
    for c in customers {
        let created = db.customers().create(c).await?;
        customer_ids.push(created.id);
    }
    info!(count = customer_ids.len(), "Customers seeded");

    // A cash sale, a part-paid credit sale and an overdue one.
    db.checkout()
        .create_sale(SaleRequest {
            lines: vec![
                CartLine::new(&product_ids[0], 1),
                CartLine::new(&product_ids[3], 2),
            ],
            discount_kobo: 0,
            payment_method: PaymentMethod::Cash,
            customer_id: None,
            credit_due_date: None,
            cashier_id: CASHIER.to_string(),
        })
        .await?;

    let today = db.clock().today();
    let credit = db
        .checkout()
        .create_sale(SaleRequest {
            lines: vec![CartLine::new(&product_ids[4], 3)],
            discount_kobo: 0,
            payment_method: PaymentMethod::Credit,
            customer_id: Some(customer_ids[0].clone()),
            credit_due_date: Some(today + Duration::days(14)),
            cashier_id: CASHIER.to_string(),
        })
        .await?;
    db.credit()
        .record_payment(PaymentRequest {
            sale_id: credit.sale.id.clone(),
            customer_id: customer_ids[0].clone(),
            amount_kobo: Money::from_naira(3000).kobo(),
            payment_date: None,
            method: SettlementMethod::Cash,
            notes: Some("Part payment at till".to_string()),
            recorded_by: CASHIER.to_string(),
        })
        .await?;

    db.checkout()
        .create_sale(SaleRequest {
            lines: vec![CartLine::new(&product_ids[1], 5)],
            discount_kobo: 0,
            payment_method: PaymentMethod::Credit,
            customer_id: Some(customer_ids[1].clone()),
            credit_due_date: Some(today - Duration::days(10)),
            cashier_id: CASHIER.to_string(),
        })
        .await?;

    let summary = db.credit().credit_summary().await?;
    info!(
        outstanding = %summary.total_outstanding,
        overdue = summary.overdue_count,
        "Seed complete"
    );

    Ok(())
}
