pub mod dto;
pub mod payment_service;

pub use dto::{ChargeRequest, ErrorResponse, RefundRequest, SavePaymentMethodRequest, WebhookAck};
pub use payment_service::PaymentService;
