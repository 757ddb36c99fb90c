pub mod cart;
pub mod health;
pub mod metrics;

pub use cart::*;
pub use health::*;
pub use metrics::*;

use axum::{middleware, routing::get, Router};
use std::sync::Arc;
use std::time::Duration;
use tower_http::{cors::CorsLayer, timeout::TimeoutLayer, trace::TraceLayer};

use crate::observability::{observability_middleware, Metrics};
use crate::services::CartStore;

/// Assemble the full application router
pub fn create_app(store: Arc<CartStore>, metrics: Arc<Metrics>, request_timeout: Duration) -> Router {
    let metrics_for_middleware = metrics.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/metrics", get(metrics_handler))
        .with_state(metrics)
        .merge(create_cart_router(store))
        // Layers run outer to inner, bottom first
        .layer(TimeoutLayer::new(request_timeout))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(move |req, next| {
            observability_middleware(metrics_for_middleware.clone(), req, next)
        }))
}
