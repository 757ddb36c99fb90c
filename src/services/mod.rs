// Services module - cart state and its collaborators

pub mod api_client;
pub mod cart_store;
pub mod inventory;
pub mod notifier;

pub use api_client::HttpInventoryClient;
pub use cart_store::{CartStore, MutationOutcome};
pub use inventory::{InMemoryInventory, ProductCatalog, StockService};
pub use notifier::{BroadcastNotifier, Notification, NotificationLevel, Notifier, TracingNotifier};
