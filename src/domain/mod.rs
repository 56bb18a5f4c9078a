pub mod entities;
pub mod errors;
pub mod events;
pub mod value_objects;

pub use entities::{
    CustomerDetails, PaymentPayload, PaymentResponse, PaymentStatus, RefundResponse,
    SavePaymentMethodPayload,
};
pub use errors::{CallFailure, DomainError, DomainResult};
pub use events::WebhookResponse;
pub use value_objects::{PaymentEventStatus, RawPayload, WebhookType, format_amount, parse_amount};
