//! # Cart Module
//!
//! The cart as submitted to the checkout engine: an ordered list of
//! product references and quantities. The engine resolves prices itself
//! (snapshotting at sale time), so a cart line carries no money at all -
//! a client can never dictate what it pays.

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::validation::{validate_line_quantity, validate_uuid};
use crate::MAX_CART_LINES;

/// One line of a submitted cart: which product, how many.
///
/// Order matters: the checkout engine processes lines in the order given,
/// so stock errors are reported against the first offending line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub product_id: String,
    pub quantity: i64,
}

impl CartLine {
    pub fn new(product_id: impl Into<String>, quantity: i64) -> Self {
        CartLine {
            product_id: product_id.into(),
            quantity,
        }
    }
}

/// Validates a cart before the checkout engine touches the database.
///
/// ## Rules
/// - Cart must not be empty
/// - At most [`MAX_CART_LINES`] lines
/// - Every line: valid product UUID, quantity in 1..=999
pub fn validate_cart(lines: &[CartLine]) -> Result<(), ValidationError> {
    if lines.is_empty() {
        return Err(ValidationError::Cart("Sale items are required".to_string()));
    }

    if lines.len() > MAX_CART_LINES {
        return Err(ValidationError::Cart(format!(
            "Cart cannot have more than {} lines",
            MAX_CART_LINES
        )));
    }

    for line in lines {
        validate_uuid(&line.product_id)?;
        validate_line_quantity(line.quantity)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const PRODUCT_ID: &str = "550e8400-e29b-41d4-a716-446655440000";

    #[test]
    fn test_empty_cart_rejected() {
        let err = validate_cart(&[]).unwrap_err();
        assert_eq!(err.to_string(), "Sale items are required");
    }

    #[test]
    fn test_valid_cart() {
        let lines = vec![CartLine::new(PRODUCT_ID, 3), CartLine::new(PRODUCT_ID, 1)];
        assert!(validate_cart(&lines).is_ok());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let lines = vec![CartLine::new(PRODUCT_ID, 0)];
        assert!(validate_cart(&lines).is_err());
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let lines = vec![CartLine::new(PRODUCT_ID, -2)];
        assert!(validate_cart(&lines).is_err());
    }

    #[test]
    fn test_bad_product_id_rejected() {
        let lines = vec![CartLine::new("not-a-uuid", 1)];
        assert!(validate_cart(&lines).is_err());
    }

    #[test]
    fn test_too_many_lines_rejected() {
        let lines: Vec<CartLine> = (0..=MAX_CART_LINES)
            .map(|_| CartLine::new(PRODUCT_ID, 1))
            .collect();
        assert!(validate_cart(&lines).is_err());
    }
}
