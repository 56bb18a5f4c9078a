pub mod in_memory_reconciliation;
pub mod paypal_adapter;
pub mod paypal_client;
pub mod paypal_models;
pub mod paypal_webhook;

pub use in_memory_reconciliation::InMemoryReconciliation;
pub use paypal_adapter::{PayPalAdapter, PayPalConnector};
pub use paypal_client::PayPalClient;
