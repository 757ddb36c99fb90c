use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;
use tracing::{debug, instrument};

use crate::models::{CatalogProduct, LookupError, LookupResult, ProductId, Stock};

/// Authoritative remaining quantity per product
#[async_trait]
pub trait StockService: Send + Sync {
    async fn get_stock(&self, product_id: ProductId) -> LookupResult<Stock>;
}

/// Product metadata lookup
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn get_product(&self, product_id: ProductId) -> LookupResult<CatalogProduct>;
}

/// In-process inventory serving both stock and catalog lookups.
///
/// Used for local sessions without a remote API, for seeding demo data and
/// as a deterministic collaborator in tests and benchmarks.
#[derive(Default)]
pub struct InMemoryInventory {
    products: RwLock<HashMap<ProductId, CatalogProduct>>,
    stock: RwLock<HashMap<ProductId, u32>>,
}

impl InMemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a product together with its stock level
    pub async fn insert(&self, product: CatalogProduct, stock: u32) {
        let id = product.id;
        self.products.write().await.insert(id, product);
        self.stock.write().await.insert(id, stock);
    }

    pub async fn set_stock(&self, product_id: ProductId, amount: u32) {
        self.stock.write().await.insert(product_id, amount);
    }
}

#[async_trait]
impl StockService for InMemoryInventory {
    #[instrument(skip(self))]
    async fn get_stock(&self, product_id: ProductId) -> LookupResult<Stock> {
        let stock = self.stock.read().await;
        let amount = stock
            .get(&product_id)
            .copied()
            .ok_or(LookupError::NotFound {
                resource: "stock",
                product_id,
            })?;
        debug!("Stock for product {}: {}", product_id, amount);
        Ok(Stock {
            id: product_id,
            amount,
        })
    }
}

#[async_trait]
impl ProductCatalog for InMemoryInventory {
    #[instrument(skip(self))]
    async fn get_product(&self, product_id: ProductId) -> LookupResult<CatalogProduct> {
        self.products
            .read()
            .await
            .get(&product_id)
            .cloned()
            .ok_or(LookupError::NotFound {
                resource: "product",
                product_id,
            })
    }
}
