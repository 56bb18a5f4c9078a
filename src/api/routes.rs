use super::handlers::*;
use crate::ports::{GatewayConnector, ReconciliationPort};
use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

pub fn create_router<C, R>(state: AppState<C, R>) -> Router
where
    C: GatewayConnector + 'static,
    R: ReconciliationPort + 'static,
{
    Router::new()
        .route("/health", get(health_check))
        .route("/api/payments", post(create_payment::<C, R>))
        .route("/api/payments/stored", post(charge_stored_payment::<C, R>))
        .route("/api/payments/:transaction_id", get(verify_payment::<C, R>))
        .route(
            "/api/payments/:transaction_id/refund",
            post(refund_payment::<C, R>),
        )
        .route("/api/payment-methods", post(save_payment_method::<C, R>))
        .route(
            "/api/payment-methods/confirm",
            post(confirm_payment_method::<C, R>),
        )
        .route("/api/webhooks/paypal", post(paypal_webhook::<C, R>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
