use std::collections::HashSet;

use super::{Cart, Product, ValidationError, ValidationResult};

/// Trait for validating models
pub trait Validate {
    fn validate(&self) -> ValidationResult<()>;
}

/// Validation constants
pub const MIN_CART_AMOUNT: u32 = 1;

impl Validate for Product {
    fn validate(&self) -> ValidationResult<()> {
        validate_cart_amount(self)
    }
}

impl Validate for Cart {
    fn validate(&self) -> ValidationResult<()> {
        let mut seen = HashSet::new();
        for product in self {
            product.validate()?;
            if !seen.insert(product.id) {
                return Err(ValidationError::DuplicateProduct {
                    product_id: product.id,
                });
            }
        }
        Ok(())
    }
}

pub fn validate_cart_amount(product: &Product) -> ValidationResult<()> {
    if product.amount < MIN_CART_AMOUNT {
        return Err(ValidationError::InvalidAmount {
            product_id: product.id,
            amount: product.amount,
        });
    }
    Ok(())
}

/// Drop lines that break the cart invariants, keeping the first occurrence
/// of every id. Returns the cleaned cart and what was dropped.
pub fn sanitize_cart(cart: Cart) -> (Cart, Vec<ValidationError>) {
    let mut seen = HashSet::new();
    let mut kept = Vec::with_capacity(cart.len());
    let mut issues = Vec::new();

    for product in cart.iter() {
        if let Err(e) = validate_cart_amount(product) {
            issues.push(e);
            continue;
        }
        if !seen.insert(product.id) {
            issues.push(ValidationError::DuplicateProduct {
                product_id: product.id,
            });
            continue;
        }
        kept.push(product.clone());
    }

    (Cart::from(kept), issues)
}
