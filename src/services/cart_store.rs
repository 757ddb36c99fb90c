use std::sync::Arc;
use tokio::sync::{watch, Mutex};
use tracing::{info, instrument, warn};

use crate::models::{
    sanitize_cart, Cart, CartError, CartOperation, CartResult, CatalogProduct, ProductId,
    RepositoryResult,
};
use crate::observability::Metrics;
use crate::repositories::CartRepository;

use super::{Notifier, ProductCatalog, StockService};

/// Completion signal of a cart mutation
#[derive(Debug)]
pub enum MutationOutcome {
    /// The new cart was persisted and published
    Committed(Arc<Cart>),
    /// Nothing to do, the cart is untouched and nothing was reported
    Skipped,
    /// The cart is untouched and the error was already sent to the notifier
    Rejected(CartError),
}

impl MutationOutcome {
    pub fn is_committed(&self) -> bool {
        matches!(self, MutationOutcome::Committed(_))
    }

    pub fn is_rejected(&self) -> bool {
        matches!(self, MutationOutcome::Rejected(_))
    }

    pub fn cart(&self) -> Option<&Arc<Cart>> {
        match self {
            MutationOutcome::Committed(cart) => Some(cart),
            _ => None,
        }
    }

    pub fn error(&self) -> Option<&CartError> {
        match self {
            MutationOutcome::Rejected(err) => Some(err),
            _ => None,
        }
    }
}

/// Cart state manager reconciling every mutation against the stock service.
///
/// Each mutation works on a private copy of the cart and commits it by
/// persisting the full snapshot and then publishing it to subscribers.
/// Mutations on one store are serialized; reads never wait for them.
pub struct CartStore {
    stock_service: Arc<dyn StockService>,
    catalog: Arc<dyn ProductCatalog>,
    repository: Arc<dyn CartRepository>,
    notifier: Arc<dyn Notifier>,
    metrics: Option<Arc<Metrics>>,
    snapshot: watch::Sender<Arc<Cart>>,
    mutation_lock: Mutex<()>,
}

impl CartStore {
    /// Open a store, rehydrating the cart from the repository snapshot
    #[instrument(skip_all)]
    pub async fn open(
        stock_service: Arc<dyn StockService>,
        catalog: Arc<dyn ProductCatalog>,
        repository: Arc<dyn CartRepository>,
        notifier: Arc<dyn Notifier>,
    ) -> RepositoryResult<Self> {
        let stored = repository.load_cart().await?.unwrap_or_default();

        let (cart, issues) = sanitize_cart(stored);
        for issue in &issues {
            warn!("Dropping invalid line from cart snapshot: {}", issue);
        }
        if !issues.is_empty() {
            match repository.save_cart(&cart).await {
                Ok(()) => info!("Rewrote cart snapshot without {} invalid lines", issues.len()),
                Err(e) => warn!("Failed to rewrite repaired cart snapshot: {}", e),
            }
        }

        info!("Cart store opened with {} products", cart.len());
        let (snapshot, _) = watch::channel(Arc::new(cart));

        Ok(Self {
            stock_service,
            catalog,
            repository,
            notifier,
            metrics: None,
            snapshot,
            mutation_lock: Mutex::new(()),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        metrics.set_cart_items(self.cart().total_items());
        self.metrics = Some(metrics);
        self
    }

    /// Current cart snapshot
    pub fn cart(&self) -> Arc<Cart> {
        self.snapshot.borrow().clone()
    }

    /// Receive every committed cart
    pub fn subscribe(&self) -> watch::Receiver<Arc<Cart>> {
        self.snapshot.subscribe()
    }

    /// Add one unit of a product, appending it when not in the cart yet
    #[instrument(skip(self))]
    pub async fn add_product(&self, product_id: ProductId) -> MutationOutcome {
        info!("Adding product to cart");
        let result = self.try_add_product(product_id).await;
        self.finish(CartOperation::Add, result)
    }

    /// Remove a product line from the cart
    #[instrument(skip(self))]
    pub async fn remove_product(&self, product_id: ProductId) -> MutationOutcome {
        info!("Removing product from cart");
        let result = self.try_remove_product(product_id).await;
        self.finish(CartOperation::Remove, result)
    }

    /// Set the amount held for a product already in the cart.
    /// Non-positive amounts are ignored.
    #[instrument(skip(self))]
    pub async fn update_product_amount(&self, product_id: ProductId, amount: i64) -> MutationOutcome {
        if amount <= 0 {
            info!("Ignoring non-positive amount");
            if let Some(metrics) = &self.metrics {
                metrics.record_cart_operation(CartOperation::Update.as_str(), "skipped");
            }
            return MutationOutcome::Skipped;
        }

        info!("Updating product amount");
        let result = self
            .try_update_product_amount(product_id, amount.unsigned_abs())
            .await;
        self.finish(CartOperation::Update, result)
    }

    async fn try_add_product(&self, product_id: ProductId) -> CartResult<Arc<Cart>> {
        let _guard = self.mutation_lock.lock().await;
        let mut cart = Cart::clone(&self.cart());

        let (stock, product) = tokio::try_join!(
            self.stock_service.get_stock(product_id),
            self.catalog.get_product(product_id),
        )
        .map_err(|e| CartError::lookup(CartOperation::Add, e))?;

        match cart.get(product_id).map(|p| p.amount) {
            Some(current) => {
                let candidate = current.saturating_add(1);
                if !stock.covers(candidate) {
                    return Err(CartError::OutOfStock {
                        product_id,
                        requested: u64::from(candidate),
                        available: stock.amount,
                    });
                }
                cart.set_amount(product_id, candidate);
            }
            None => {
                if !stock.covers(1) {
                    return Err(CartError::OutOfStock {
                        product_id,
                        requested: 1,
                        available: stock.amount,
                    });
                }
                let product = CatalogProduct {
                    id: product_id,
                    ..product
                };
                cart.push(product.into_cart_product(1));
            }
        }

        self.commit(CartOperation::Add, cart).await
    }

    async fn try_remove_product(&self, product_id: ProductId) -> CartResult<Arc<Cart>> {
        let _guard = self.mutation_lock.lock().await;
        let mut cart = Cart::clone(&self.cart());

        if cart.remove(product_id).is_none() {
            return Err(CartError::ProductNotFound {
                operation: CartOperation::Remove,
                product_id,
            });
        }

        self.commit(CartOperation::Remove, cart).await
    }

    async fn try_update_product_amount(
        &self,
        product_id: ProductId,
        amount: u64,
    ) -> CartResult<Arc<Cart>> {
        let _guard = self.mutation_lock.lock().await;
        let mut cart = Cart::clone(&self.cart());

        let stock = self
            .stock_service
            .get_stock(product_id)
            .await
            .map_err(|e| CartError::lookup(CartOperation::Update, e))?;

        let requested = match u32::try_from(amount) {
            Ok(requested) if stock.covers(requested) => requested,
            _ => {
                return Err(CartError::OutOfStock {
                    product_id,
                    requested: amount,
                    available: stock.amount,
                })
            }
        };

        if !cart.set_amount(product_id, requested) {
            return Err(CartError::ProductNotFound {
                operation: CartOperation::Update,
                product_id,
            });
        }

        self.commit(CartOperation::Update, cart).await
    }

    /// Persist then publish. The exposed snapshot only changes once the
    /// write succeeded.
    async fn commit(&self, operation: CartOperation, cart: Cart) -> CartResult<Arc<Cart>> {
        let saved = self.repository.save_cart(&cart).await;
        if let Some(metrics) = &self.metrics {
            metrics.record_persistence_write(saved.is_ok());
        }
        saved.map_err(|e| CartError::write(operation, e))?;

        let cart = Arc::new(cart);
        self.snapshot.send_replace(cart.clone());
        Ok(cart)
    }

    fn finish(&self, operation: CartOperation, result: CartResult<Arc<Cart>>) -> MutationOutcome {
        match result {
            Ok(cart) => {
                info!(
                    operation = %operation,
                    products = cart.len(),
                    total_items = cart.total_items(),
                    "Cart mutation committed"
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_cart_operation(operation.as_str(), "success");
                    metrics.set_cart_items(cart.total_items());
                }
                MutationOutcome::Committed(cart)
            }
            Err(err) => {
                warn!(
                    operation = %operation,
                    kind = err.kind(),
                    error = %err,
                    "Cart mutation rejected"
                );
                self.notifier.error(err.user_message());
                if let Some(metrics) = &self.metrics {
                    metrics.record_cart_operation(operation.as_str(), err.kind());
                }
                MutationOutcome::Rejected(err)
            }
        }
    }
}
