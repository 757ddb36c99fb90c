use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{Product, ProductId};

/// Ordered list of cart lines, first-added first, unique by product id
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    products: Vec<Product>,
}

/// Summary of a cart used by the cart page header
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartSummary {
    pub total_items: u64,
    pub subtotal: Decimal,
    pub is_empty: bool,
}

impl Cart {
    /// Create a new empty cart
    pub fn new() -> Self {
        Self::default()
    }

    /// Cart lines in insertion order
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Product> {
        self.products.iter()
    }

    pub fn len(&self) -> usize {
        self.products.len()
    }

    pub fn is_empty(&self) -> bool {
        self.products.is_empty()
    }

    /// Index of the line holding `product_id`
    pub fn position(&self, product_id: ProductId) -> Option<usize> {
        self.products.iter().position(|p| p.id == product_id)
    }

    /// Get a specific line from the cart
    pub fn get(&self, product_id: ProductId) -> Option<&Product> {
        self.products.iter().find(|p| p.id == product_id)
    }

    pub fn contains(&self, product_id: ProductId) -> bool {
        self.get(product_id).is_some()
    }

    /// Amount held for `product_id`, zero when absent
    pub fn amount_of(&self, product_id: ProductId) -> u32 {
        self.get(product_id).map(|p| p.amount).unwrap_or(0)
    }

    /// Append a new line. Returns false and leaves the cart untouched when
    /// the id is already present.
    pub fn push(&mut self, product: Product) -> bool {
        if self.contains(product.id) {
            return false;
        }
        self.products.push(product);
        true
    }

    /// Replace the amount of an existing line in place
    pub fn set_amount(&mut self, product_id: ProductId, amount: u32) -> bool {
        match self.products.iter_mut().find(|p| p.id == product_id) {
            Some(product) => {
                product.amount = amount;
                true
            }
            None => false,
        }
    }

    /// Remove a line, keeping the order of the others
    pub fn remove(&mut self, product_id: ProductId) -> Option<Product> {
        let index = self.position(product_id)?;
        Some(self.products.remove(index))
    }

    /// Total number of units across all lines
    pub fn total_items(&self) -> u64 {
        self.products.iter().map(|p| u64::from(p.amount)).sum()
    }

    /// Sum of every line total
    pub fn subtotal(&self) -> Decimal {
        self.products.iter().map(Product::line_total).sum()
    }

    pub fn summary(&self) -> CartSummary {
        CartSummary {
            total_items: self.total_items(),
            subtotal: self.subtotal(),
            is_empty: self.is_empty(),
        }
    }
}

impl From<Vec<Product>> for Cart {
    fn from(products: Vec<Product>) -> Self {
        Self { products }
    }
}

impl<'a> IntoIterator for &'a Cart {
    type Item = &'a Product;
    type IntoIter = std::slice::Iter<'a, Product>;

    fn into_iter(self) -> Self::IntoIter {
        self.products.iter()
    }
}
