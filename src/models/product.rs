use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Catalog key of a product
pub type ProductId = u64;

/// Product held in the cart, `amount` is the quantity in the cart (not stock)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(alias = "image")]
    pub image_url: String,
    pub amount: u32,
}

/// Product metadata as returned by the catalog
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogProduct {
    pub id: ProductId,
    pub title: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub price: Decimal,
    #[serde(alias = "image")]
    pub image_url: String,
}

/// Remaining quantity of a product at the stock service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stock {
    pub id: ProductId,
    #[serde(deserialize_with = "oversold_as_empty")]
    pub amount: u32,
}

/// Oversold products report negative stock, which holds nothing
fn oversold_as_empty<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    let amount = i64::deserialize(deserializer)?;
    Ok(u32::try_from(amount.max(0)).unwrap_or(u32::MAX))
}

impl Product {
    /// Price of this line (unit price times amount)
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.amount)
    }
}

impl CatalogProduct {
    /// Turn catalog metadata into a cart line holding `amount` units
    pub fn into_cart_product(self, amount: u32) -> Product {
        Product {
            id: self.id,
            title: self.title,
            price: self.price,
            image_url: self.image_url,
            amount,
        }
    }
}

impl Stock {
    /// Whether `requested` units can be held in a cart
    pub fn covers(&self, requested: u32) -> bool {
        requested <= self.amount
    }
}
