pub mod paypal_config;
pub mod server_config;

pub use paypal_config::PayPalConfig;
pub use server_config::ServerConfig;
