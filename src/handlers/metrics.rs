use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::{error, instrument};

use crate::observability::Metrics;

const EXPOSITION_CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Prometheus scrape endpoint
#[instrument(name = "metrics_handler", skip_all)]
pub async fn metrics_handler(State(metrics): State<Arc<Metrics>>) -> Response {
    let encoded = match metrics.encode() {
        Ok(text) => text,
        Err(e) => {
            error!(error = %e, "Failed to encode metrics");
            return (StatusCode::INTERNAL_SERVER_ERROR, "Failed to encode metrics").into_response();
        }
    };

    ([(header::CONTENT_TYPE, EXPOSITION_CONTENT_TYPE)], encoded).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, routing::get, Router};
    use rust_decimal_macros::dec;
    use tower::ServiceExt;

    use crate::models::CatalogProduct;
    use crate::repositories::InMemoryCartRepository;
    use crate::services::{InMemoryInventory, TracingNotifier};
    use crate::CartStore;

    async fn scrape(metrics: Arc<Metrics>) -> (StatusCode, String, String) {
        let app = Router::new()
            .route("/metrics", get(metrics_handler))
            .with_state(metrics);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let content_type = response.headers()[header::CONTENT_TYPE]
            .to_str()
            .unwrap()
            .to_string();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, content_type, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_scrape_reports_cart_gauge_after_commits() {
        let inventory = Arc::new(InMemoryInventory::new());
        inventory
            .insert(
                CatalogProduct {
                    id: 1,
                    title: "Tênis Adidas Duramo Lite 2.0".to_string(),
                    price: dec!(219.90),
                    image_url: "duramo.jpg".to_string(),
                },
                4,
            )
            .await;
        let metrics = Arc::new(Metrics::new().unwrap());
        let store = CartStore::open(
            inventory.clone(),
            inventory,
            Arc::new(InMemoryCartRepository::new()),
            Arc::new(TracingNotifier),
        )
        .await
        .unwrap()
        .with_metrics(metrics.clone());

        store.add_product(1).await;
        store.update_product_amount(1, 4).await;
        store.update_product_amount(1, 5).await;

        let (status, content_type, body) = scrape(metrics).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(content_type, EXPOSITION_CONTENT_TYPE);
        assert!(body.contains("cart_items 4"));
        assert!(body.contains("cart_operations_total{operation=\"update\",status=\"success\"} 1"));
        assert!(body.contains("cart_operations_total{operation=\"update\",status=\"out_of_stock\"} 1"));
    }

    #[tokio::test]
    async fn test_scrape_of_fresh_registry() {
        let (status, _, body) = scrape(Arc::new(Metrics::new().unwrap())).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("cart_items 0"));
    }
}
