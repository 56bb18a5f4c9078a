pub mod payment_gateway_port;
pub mod reconciliation_port;
pub mod webhook_port;

pub use payment_gateway_port::{GatewayConnector, PaymentGatewayPort};
pub use reconciliation_port::{ApplyOutcome, ReconciliationPort};
pub use webhook_port::{CaptureOutcome, OrderCapture, WebhookSignatureVerifier};
