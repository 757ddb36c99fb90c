use serde::{Deserialize, Serialize};
use std::fmt;

/// Message shown when a requested quantity exceeds the available stock
pub const OUT_OF_STOCK_MESSAGE: &str = "Requested quantity is out of stock";

/// Cart mutations exposed by the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CartOperation {
    Add,
    Remove,
    Update,
}

impl CartOperation {
    /// Fixed user-facing message for a failed operation
    pub fn failure_message(&self) -> &'static str {
        match self {
            CartOperation::Add => "Failed to add product",
            CartOperation::Remove => "Failed to remove product",
            CartOperation::Update => "Failed to update product amount",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            CartOperation::Add => "add",
            CartOperation::Remove => "remove",
            CartOperation::Update => "update",
        }
    }
}

impl fmt::Display for CartOperation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cart_operation_display() {
        assert_eq!(CartOperation::Add.to_string(), "add");
        assert_eq!(CartOperation::Remove.to_string(), "remove");
        assert_eq!(CartOperation::Update.to_string(), "update");
    }

    #[test]
    fn test_failure_messages_are_operation_specific() {
        assert_ne!(
            CartOperation::Add.failure_message(),
            CartOperation::Remove.failure_message()
        );
        assert_ne!(
            CartOperation::Remove.failure_message(),
            CartOperation::Update.failure_message()
        );
    }
}
