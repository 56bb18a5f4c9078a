use crate::application::{
    ChargeRequest, ErrorResponse, PaymentService, RefundRequest, SavePaymentMethodRequest,
    WebhookAck,
};
use crate::domain::errors::DomainError;
use crate::infrastructure::adapters::paypal_webhook::VERIFICATION_HEADERS;
use crate::ports::{ApplyOutcome, GatewayConnector, ReconciliationPort};
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{error, info};

/// 应用状态
pub struct AppState<C: GatewayConnector, R: ReconciliationPort> {
    pub payment_service: Arc<PaymentService<C, R>>,
}

impl<C: GatewayConnector, R: ReconciliationPort> Clone for AppState<C, R> {
    fn clone(&self) -> Self {
        Self {
            payment_service: self.payment_service.clone(),
        }
    }
}

type ApiError = (StatusCode, Json<ErrorResponse>);

/// 领域错误映射为HTTP错误
fn api_error(code: &str, e: DomainError) -> ApiError {
    let status = match &e {
        DomainError::Validation(_)
        | DomainError::InvalidAmount(_)
        | DomainError::Serialization(_) => StatusCode::BAD_REQUEST,
        DomainError::WebhookVerification(_) => StatusCode::UNAUTHORIZED,
        DomainError::GatewayCall { .. } | DomainError::Authentication(_) => {
            StatusCode::BAD_GATEWAY
        }
        DomainError::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    error!("{} ({}): {}", code, status, e);

    (
        status,
        Json(ErrorResponse::new(code.to_string(), e.to_string())),
    )
}

/// 发起支付
pub async fn create_payment<C: GatewayConnector, R: ReconciliationPort>(
    State(state): State<AppState<C, R>>,
    Json(request): Json<ChargeRequest>,
) -> Result<Response, ApiError> {
    info!("Received payment request: {}", request.order_id);

    state
        .payment_service
        .charge(request)
        .await
        .map(|response| (StatusCode::CREATED, Json(response)).into_response())
        .map_err(|e| api_error("PAYMENT_ERROR", e))
}

/// 使用已保存的支付方式扣款
pub async fn charge_stored_payment<C: GatewayConnector, R: ReconciliationPort>(
    State(state): State<AppState<C, R>>,
    Json(request): Json<ChargeRequest>,
) -> Result<Response, ApiError> {
    info!("Received stored payment request: {}", request.order_id);

    state
        .payment_service
        .charge_stored(request)
        .await
        .map(|response| (StatusCode::CREATED, Json(response)).into_response())
        .map_err(|e| api_error("PAYMENT_ERROR", e))
}

/// 发起保存支付方式
pub async fn save_payment_method<C: GatewayConnector, R: ReconciliationPort>(
    State(state): State<AppState<C, R>>,
    Json(request): Json<SavePaymentMethodRequest>,
) -> Result<Response, ApiError> {
    state
        .payment_service
        .save_payment_method(request)
        .await
        .map(|response| (StatusCode::CREATED, Json(response)).into_response())
        .map_err(|e| api_error("PAYMENT_METHOD_ERROR", e))
}

/// 完成保存支付方式，没有可确认的token时返回204
pub async fn confirm_payment_method<C: GatewayConnector, R: ReconciliationPort>(
    State(state): State<AppState<C, R>>,
    Json(data): Json<HashMap<String, String>>,
) -> Result<Response, ApiError> {
    state
        .payment_service
        .confirm_payment_method(&data)
        .await
        .map(|response| match response {
            Some(confirmed) => (StatusCode::OK, Json(confirmed)).into_response(),
            None => StatusCode::NO_CONTENT.into_response(),
        })
        .map_err(|e| api_error("PAYMENT_METHOD_ERROR", e))
}

/// 查询交易状态
pub async fn verify_payment<C: GatewayConnector, R: ReconciliationPort>(
    State(state): State<AppState<C, R>>,
    Path(transaction_id): Path<String>,
) -> Result<Response, ApiError> {
    state
        .payment_service
        .verify(&transaction_id)
        .await
        .map(|status| (StatusCode::OK, Json(status)).into_response())
        .map_err(|e| api_error("QUERY_ERROR", e))
}

/// 退款
pub async fn refund_payment<C: GatewayConnector, R: ReconciliationPort>(
    State(state): State<AppState<C, R>>,
    Path(transaction_id): Path<String>,
    Json(request): Json<RefundRequest>,
) -> Result<Response, ApiError> {
    state
        .payment_service
        .refund(&transaction_id, request)
        .await
        .map(|refund| (StatusCode::OK, Json(refund)).into_response())
        .map_err(|e| api_error("REFUND_ERROR", e))
}

/// PayPal回调
///
/// HeaderMap中的名称均为小写，按PayPal文档中的名称重新组装后交给网关。
pub async fn paypal_webhook<C: GatewayConnector, R: ReconciliationPort>(
    State(state): State<AppState<C, R>>,
    headers: HeaderMap,
    body: String,
) -> Result<Response, ApiError> {
    info!("Received PayPal webhook");

    let headers = provider_headers(&headers);

    state
        .payment_service
        .handle_webhook(&body, &headers)
        .await
        .map(|(event, outcome)| {
            let ack = WebhookAck {
                webhook_type: event.webhook_type.to_string(),
                status: event.status.to_string(),
                outcome: match outcome {
                    ApplyOutcome::Applied => "applied",
                    ApplyOutcome::Duplicate => "duplicate",
                    ApplyOutcome::Ignored => "ignored",
                }
                .to_string(),
            };
            (StatusCode::OK, Json(ack)).into_response()
        })
        .map_err(|e| api_error("WEBHOOK_ERROR", e))
}

fn provider_headers(headers: &HeaderMap) -> HashMap<String, String> {
    VERIFICATION_HEADERS
        .iter()
        .filter_map(|name| {
            headers
                .get(*name)
                .and_then(|value| value.to_str().ok())
                .map(|value| (name.to_string(), value.to_string()))
        })
        .collect()
}

/// 健康检查
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{HeaderName, HeaderValue};

    #[test]
    fn test_provider_headers_use_documented_names() {
        let mut headers = HeaderMap::new();
        headers.insert("paypal-transmission-sig", HeaderValue::from_static("sig"));
        headers.insert(
            HeaderName::from_bytes(b"PAYPAL-AUTH-ALGO").unwrap(),
            HeaderValue::from_static("SHA256withRSA"),
        );
        headers.insert("x-other", HeaderValue::from_static("ignored"));

        let mapped = provider_headers(&headers);

        assert_eq!(mapped.get("Paypal-Transmission-Sig").map(String::as_str), Some("sig"));
        assert_eq!(
            mapped.get("Paypal-Auth-Algo").map(String::as_str),
            Some("SHA256withRSA")
        );
        assert_eq!(mapped.len(), 2);
    }

    #[test]
    fn test_error_status_mapping() {
        let (status, _) = api_error(
            "WEBHOOK_ERROR",
            DomainError::WebhookVerification("FAILURE".to_string()),
        );
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = api_error(
            "PAYMENT_ERROR",
            DomainError::rejected("charge", "ORDER1", Some(500), "boom"),
        );
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, _) = api_error(
            "QUERY_ERROR",
            DomainError::Authentication("invalid_client".to_string()),
        );
        assert_eq!(status, StatusCode::BAD_GATEWAY);

        let (status, body) =
            api_error("PAYMENT_ERROR", DomainError::Validation("bad".to_string()));
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body.0.error, "PAYMENT_ERROR");
    }
}
