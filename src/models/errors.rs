use thiserror::Error;

use super::{CartOperation, ProductId, OUT_OF_STOCK_MESSAGE};

/// Errors reported by cart mutations
#[derive(Debug, Error)]
pub enum CartError {
    #[error("Out of stock: product_id={product_id}, requested={requested}, available={available}")]
    OutOfStock {
        product_id: ProductId,
        requested: u64,
        available: u32,
    },

    #[error("Product not in cart: product_id={product_id}, operation={operation}")]
    ProductNotFound {
        operation: CartOperation,
        product_id: ProductId,
    },

    #[error("Cart {operation} failed: {source}")]
    OperationFailed {
        operation: CartOperation,
        #[source]
        source: FailureKind,
    },
}

/// Underlying cause of an `OperationFailed`
#[derive(Debug, Error)]
pub enum FailureKind {
    #[error("lookup failed: {0}")]
    Lookup(#[from] LookupError),

    #[error("write failed: {0}")]
    Write(#[from] RepositoryError),
}

/// Errors raised by the stock service or the product catalog
#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{resource} not found: product_id={product_id}")]
    NotFound {
        resource: &'static str,
        product_id: ProductId,
    },

    #[error("Unexpected status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("Transport error: {message}")]
    Transport { message: String },

    #[error("Timeout occurred during lookup")]
    Timeout,

    #[error("Invalid response body: {message}")]
    Decode { message: String },
}

/// Errors raised by cart snapshot storage
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Storage I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },

    #[error("Serialization error: {source}")]
    Serialization {
        #[from]
        source: serde_json::Error,
    },

    #[error("Write failed: {message}")]
    WriteFailed { message: String },
}

/// Validation errors for cart snapshots
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("Invalid amount for product {product_id}: {amount}")]
    InvalidAmount { product_id: ProductId, amount: u32 },

    #[error("Duplicate product in cart: {product_id}")]
    DuplicateProduct { product_id: ProductId },
}

impl CartError {
    pub fn lookup(operation: CartOperation, source: LookupError) -> Self {
        CartError::OperationFailed {
            operation,
            source: FailureKind::Lookup(source),
        }
    }

    pub fn write(operation: CartOperation, source: RepositoryError) -> Self {
        CartError::OperationFailed {
            operation,
            source: FailureKind::Write(source),
        }
    }

    /// Simplified message surfaced to the user through the notifier
    pub fn user_message(&self) -> &'static str {
        match self {
            CartError::OutOfStock { .. } => OUT_OF_STOCK_MESSAGE,
            CartError::ProductNotFound { operation, .. } => operation.failure_message(),
            CartError::OperationFailed { operation, .. } => operation.failure_message(),
        }
    }

    /// Short label of the structured kind, used in logs and metrics
    pub fn kind(&self) -> &'static str {
        match self {
            CartError::OutOfStock { .. } => "out_of_stock",
            CartError::ProductNotFound { .. } => "product_not_found",
            CartError::OperationFailed {
                source: FailureKind::Lookup(_),
                ..
            } => "lookup_failed",
            CartError::OperationFailed {
                source: FailureKind::Write(_),
                ..
            } => "write_failed",
        }
    }
}

/// Result type alias for cart operations
pub type CartResult<T> = Result<T, CartError>;

/// Result type alias for stock and catalog lookups
pub type LookupResult<T> = Result<T, LookupError>;

/// Result type alias for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Result type alias for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;
