pub mod adapters;
pub mod config;

pub use adapters::{InMemoryReconciliation, PayPalAdapter, PayPalConnector};
pub use config::{PayPalConfig, ServerConfig};
