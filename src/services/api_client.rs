use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{error, info, instrument, Instrument};

use crate::models::{CatalogProduct, LookupError, LookupResult, ProductId, Stock};
use crate::observability::Metrics;

use super::{ProductCatalog, StockService};

/// REST client for the stock and product endpoints of the store API
pub struct HttpInventoryClient {
    client: reqwest::Client,
    base_url: String,
    metrics: Option<Arc<Metrics>>,
}

/// A remote resource addressable by product id
#[derive(Debug, Clone, Copy)]
struct Resource {
    name: &'static str,
    path: &'static str,
}

const STOCK: Resource = Resource {
    name: "stock",
    path: "stock",
};

const PRODUCT: Resource = Resource {
    name: "product",
    path: "products",
};

impl HttpInventoryClient {
    /// Create a client with its own connection pool and request timeout
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> LookupResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| LookupError::Transport {
                message: format!("Failed to build HTTP client: {}", e),
            })?;
        Ok(Self::with_client(client, base_url))
    }

    /// Create a client reusing an existing `reqwest::Client`
    pub fn with_client(client: reqwest::Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client,
            base_url,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<Metrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url_for(&self, resource: Resource, product_id: ProductId) -> String {
        format!("{}/{}/{}", self.base_url, resource.path, product_id)
    }

    /// Create an HTTP client span for a lookup
    fn create_client_span(&self, resource: Resource, url: &str) -> tracing::Span {
        tracing::info_span!(
            "inventory_api",
            "otel.kind" = "client",
            "otel.name" = format!("GET /{}", resource.path),
            "http.method" = "GET",
            "http.url" = %url,
            "http.status_code" = tracing::field::Empty,
            "peer.service" = resource.name,
        )
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: Resource,
        product_id: ProductId,
    ) -> LookupResult<T> {
        let url = self.url_for(resource, product_id);
        let span = self.create_client_span(resource, &url);
        let start = Instant::now();

        let result: LookupResult<T> = async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(map_reqwest_error)?;

            let status = response.status();
            tracing::Span::current().record("http.status_code", status.as_u16());

            if status == StatusCode::NOT_FOUND {
                return Err(LookupError::NotFound {
                    resource: resource.name,
                    product_id,
                });
            }
            if !status.is_success() {
                return Err(LookupError::UnexpectedStatus {
                    status: status.as_u16(),
                    url: url.clone(),
                });
            }

            response.json::<T>().await.map_err(|e| LookupError::Decode {
                message: e.to_string(),
            })
        }
        .instrument(span)
        .await;

        if let Some(metrics) = &self.metrics {
            metrics.record_collaborator_request(
                resource.name,
                result.is_ok(),
                start.elapsed().as_secs_f64(),
            );
        }
        if let Err(e) = &result {
            error!("Inventory lookup failed: {}", e);
        }
        result
    }
}

fn map_reqwest_error(error: reqwest::Error) -> LookupError {
    if error.is_timeout() {
        LookupError::Timeout
    } else {
        LookupError::Transport {
            message: error.to_string(),
        }
    }
}

#[async_trait]
impl StockService for HttpInventoryClient {
    #[instrument(skip(self))]
    async fn get_stock(&self, product_id: ProductId) -> LookupResult<Stock> {
        let stock: Stock = self.get_json(STOCK, product_id).await?;
        info!("Stock for product {}: {}", product_id, stock.amount);
        Ok(stock)
    }
}

#[async_trait]
impl ProductCatalog for HttpInventoryClient {
    #[instrument(skip(self))]
    async fn get_product(&self, product_id: ProductId) -> LookupResult<CatalogProduct> {
        self.get_json(PRODUCT, product_id).await
    }
}
