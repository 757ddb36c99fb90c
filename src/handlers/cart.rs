use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::models::{Cart, CartError, CartSummary, FailureKind, ProductId};
use crate::services::{CartStore, MutationOutcome};

/// Body of an amount update
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct UpdateAmountRequest {
    pub amount: i64,
}

/// State for cart handlers
#[derive(Clone)]
pub struct CartHandlerState {
    pub store: Arc<CartStore>,
}

type HandlerError = (StatusCode, Json<Value>);

/// Create cart router with all endpoints
pub fn create_cart_router(store: Arc<CartStore>) -> Router {
    let state = CartHandlerState { store };

    Router::new()
        .route("/api/cart", get(get_cart))
        .route("/api/cart/summary", get(get_cart_summary))
        .route(
            "/api/cart/items/:product_id",
            post(add_product)
                .put(update_product_amount)
                .delete(remove_product),
        )
        .with_state(state)
}

/// Current cart
#[instrument(skip(state))]
pub async fn get_cart(State(state): State<CartHandlerState>) -> Json<Cart> {
    Json(Cart::clone(&state.store.cart()))
}

#[instrument(skip(state))]
pub async fn get_cart_summary(State(state): State<CartHandlerState>) -> Json<CartSummary> {
    Json(state.store.cart().summary())
}

/// Add one unit of a product
#[instrument(skip(state))]
pub async fn add_product(
    State(state): State<CartHandlerState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Cart>, HandlerError> {
    info!("Adding product {} to cart", product_id);
    outcome_to_response(&state, state.store.add_product(product_id).await)
}

/// Set the amount of a product already in the cart
#[instrument(skip(state, request))]
pub async fn update_product_amount(
    State(state): State<CartHandlerState>,
    Path(product_id): Path<ProductId>,
    Json(request): Json<UpdateAmountRequest>,
) -> Result<Json<Cart>, HandlerError> {
    info!(
        "Updating product {} to amount {}",
        product_id, request.amount
    );
    let outcome = state
        .store
        .update_product_amount(product_id, request.amount)
        .await;
    outcome_to_response(&state, outcome)
}

/// Remove a product line
#[instrument(skip(state))]
pub async fn remove_product(
    State(state): State<CartHandlerState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<Cart>, HandlerError> {
    info!("Removing product {} from cart", product_id);
    outcome_to_response(&state, state.store.remove_product(product_id).await)
}

fn outcome_to_response(
    state: &CartHandlerState,
    outcome: MutationOutcome,
) -> Result<Json<Cart>, HandlerError> {
    match outcome {
        MutationOutcome::Committed(cart) => Ok(Json(Cart::clone(&cart))),
        MutationOutcome::Skipped => Ok(Json(Cart::clone(&state.store.cart()))),
        MutationOutcome::Rejected(err) => {
            warn!("Cart mutation rejected: {}", err);
            Err(cart_error_to_response(&err))
        }
    }
}

/// Convert CartError to HTTP response
fn cart_error_to_response(err: &CartError) -> HandlerError {
    let status = match err {
        CartError::OutOfStock { .. } => StatusCode::CONFLICT,
        CartError::ProductNotFound { .. } => StatusCode::NOT_FOUND,
        CartError::OperationFailed { source, .. } => match source {
            FailureKind::Lookup(_) => StatusCode::BAD_GATEWAY,
            FailureKind::Write(_) => StatusCode::INTERNAL_SERVER_ERROR,
        },
    };

    (
        status,
        Json(json!({
            "error": err.user_message(),
            "timestamp": chrono::Utc::now().to_rfc3339(),
        })),
    )
}
