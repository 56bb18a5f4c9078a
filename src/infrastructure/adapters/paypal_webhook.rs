//! PayPal Webhook验签与事件翻译
//!
//! 处理顺序固定：先由 [`WebhookSignatureVerifier`] 向PayPal回传验签，
//! 验签通过后才由 [`WebhookTranslator`] 读取事件内容。

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::normalize_currency;
use crate::domain::{PaymentEventStatus, RawPayload, WebhookResponse, WebhookType};
use crate::infrastructure::adapters::paypal_client::PayPalClient;
use crate::infrastructure::adapters::paypal_models::{
    Capture, FeeBreakdown, Order, PaymentToken, Refund, VerifyWebhookRequest,
    VerifyWebhookResponse, WebhookEnvelope,
};
use crate::ports::{OrderCapture, WebhookSignatureVerifier};
use async_trait::async_trait;
use std::collections::HashMap;
use tracing::{debug, warn};

pub const PAYPAL_GATEWAY: &str = "paypal";

pub const HEADER_AUTH_ALGO: &str = "Paypal-Auth-Algo";
pub const HEADER_CERT_URL: &str = "Paypal-Cert-Url";
pub const HEADER_TRANSMISSION_ID: &str = "Paypal-Transmission-Id";
pub const HEADER_TRANSMISSION_SIG: &str = "Paypal-Transmission-Sig";
pub const HEADER_TRANSMISSION_TIME: &str = "Paypal-Transmission-Time";

/// 验签所需的全部请求头
pub const VERIFICATION_HEADERS: [&str; 5] = [
    HEADER_AUTH_ALGO,
    HEADER_CERT_URL,
    HEADER_TRANSMISSION_ID,
    HEADER_TRANSMISSION_SIG,
    HEADER_TRANSMISSION_TIME,
];

/// PayPal事件类型
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayPalEventType {
    /// 买家已批准订单，资金尚未转移
    CheckoutOrderApproved,
    PaymentCaptureCompleted,
    PaymentCaptureRefunded,
    VaultPaymentTokenCreated,
    Other(String),
}

impl From<&str> for PayPalEventType {
    fn from(value: &str) -> Self {
        match value {
            "CHECKOUT.ORDER.APPROVED" => PayPalEventType::CheckoutOrderApproved,
            "PAYMENT.CAPTURE.COMPLETED" => PayPalEventType::PaymentCaptureCompleted,
            "PAYMENT.CAPTURE.REFUNDED" => PayPalEventType::PaymentCaptureRefunded,
            "VAULT.PAYMENT-TOKEN.CREATED" => PayPalEventType::VaultPaymentTokenCreated,
            other => PayPalEventType::Other(other.to_string()),
        }
    }
}

/// 通过PayPal的 verify-webhook-signature 接口验签
pub struct PayPalWebhookVerifier {
    client: PayPalClient,
    webhook_id: String,
}

impl PayPalWebhookVerifier {
    pub fn new(client: PayPalClient, webhook_id: impl Into<String>) -> Self {
        Self {
            client,
            webhook_id: webhook_id.into(),
        }
    }
}

#[async_trait]
impl WebhookSignatureVerifier for PayPalWebhookVerifier {
    async fn verify_signature(
        &self,
        event: &RawPayload,
        headers: &HashMap<String, String>,
    ) -> DomainResult<()> {
        if self.webhook_id.is_empty() {
            return Err(DomainError::WebhookVerification(
                "webhook id is not configured".to_string(),
            ));
        }

        let header = |name: &str| {
            headers
                .get(name)
                .map(String::as_str)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| DomainError::WebhookVerification(format!("missing header {}", name)))
        };

        let transmission_id = header(HEADER_TRANSMISSION_ID)?;
        let body = VerifyWebhookRequest {
            auth_algo: header(HEADER_AUTH_ALGO)?,
            cert_url: header(HEADER_CERT_URL)?,
            transmission_id,
            transmission_sig: header(HEADER_TRANSMISSION_SIG)?,
            transmission_time: header(HEADER_TRANSMISSION_TIME)?,
            webhook_id: &self.webhook_id,
            webhook_event: event.as_raw_value(),
        };

        let response = self
            .client
            .post_json(
                "/v1/notifications/verify-webhook-signature",
                &body,
                &uuid::Uuid::new_v4().to_string(),
                "verify_webhook_signature",
                transmission_id,
            )
            .await?
            .error_for_status("verify_webhook_signature", transmission_id)?;

        let (verdict, _) =
            response.parse::<VerifyWebhookResponse>("verify_webhook_signature", transmission_id)?;

        if verdict.verification_status == "SUCCESS" {
            debug!("Webhook {} verified", transmission_id);
            Ok(())
        } else {
            Err(DomainError::WebhookVerification(format!(
                "transmission {} returned {}",
                transmission_id, verdict.verification_status
            )))
        }
    }
}

/// 将已验签的PayPal事件翻译为标准化事件
///
/// 只有 `CHECKOUT.ORDER.APPROVED` 分支有副作用：通过注入的 [`OrderCapture`]
/// 完成capture后才视为支付成功。
#[derive(Debug, Clone)]
pub struct WebhookTranslator {
    default_currency: String,
}

impl WebhookTranslator {
    pub fn new(default_currency: &str) -> Self {
        Self {
            default_currency: normalize_currency(default_currency),
        }
    }

    pub async fn translate<C>(
        &self,
        envelope: &WebhookEnvelope,
        raw: RawPayload,
        capture: &C,
    ) -> DomainResult<WebhookResponse>
    where
        C: OrderCapture + ?Sized,
    {
        let event_type = PayPalEventType::from(envelope.event_type.as_str());
        let resource = &envelope.resource;

        let event = match event_type {
            PayPalEventType::CheckoutOrderApproved => {
                let order: Order = serde_json::from_value(resource.clone())?;
                let order_id = order.purchase_units.first().and_then(|u| u.order_id());
                let captured = capture.capture(&order.id).await?;

                let mut event = self
                    .event(WebhookType::Payment, PaymentEventStatus::Success, raw)
                    .with_order_id(order_id)
                    .with_metadata("paypal_order_id", order.id.clone());
                event.transaction_id = Some(captured.capture_id);
                event.amount = captured.amount;
                event.fee = captured.fee;
                event.currency = captured.currency;
                event
            }
            PayPalEventType::PaymentCaptureCompleted => {
                let captured: Capture = serde_json::from_value(resource.clone())?;
                let order_id = captured.invoice_id.clone().or(captured.custom_id.clone());

                let mut event = self
                    .event(WebhookType::Payment, PaymentEventStatus::Success, raw)
                    .with_order_id(order_id);
                event.fee = FeeBreakdown::fee(captured.seller_receivable_breakdown.as_ref())?;
                if let Some(amount) = &captured.amount {
                    event.amount = amount.minor_units()?;
                    event.currency = amount.currency();
                }
                event.transaction_id = Some(captured.id);
                event
            }
            PayPalEventType::PaymentCaptureRefunded => {
                let refund: Refund = serde_json::from_value(resource.clone())?;
                let order_id = refund.invoice_id.clone().or(refund.custom_id.clone());

                let mut event = self
                    .event(WebhookType::Refund, PaymentEventStatus::Success, raw)
                    .with_order_id(order_id);
                if let Some(capture_id) = refund.capture_id() {
                    event = event.with_metadata("capture_id", capture_id);
                }
                event.fee = FeeBreakdown::fee(refund.seller_payable_breakdown.as_ref())?;
                if let Some(amount) = &refund.amount {
                    event.amount = amount.minor_units()?;
                    event.currency = amount.currency();
                }
                event.transaction_id = Some(refund.id);
                event
            }
            PayPalEventType::VaultPaymentTokenCreated => {
                let token: PaymentToken =
                    serde_json::from_value(resource.clone()).unwrap_or_default();
                let token_id = token.id.filter(|id| !id.is_empty());
                let customer_id = token
                    .customer
                    .and_then(|customer| customer.id)
                    .filter(|id| !id.is_empty());

                match (token_id, customer_id) {
                    (Some(token_id), Some(customer_id)) => {
                        let mut event = self
                            .event(WebhookType::Setup, PaymentEventStatus::Success, raw)
                            .with_metadata("customer_id", customer_id.clone());
                        event.transaction_id = Some(token_id);
                        event.customer_id = Some(customer_id);
                        event
                    }
                    (token_id, customer_id) => {
                        warn!(
                            event_id = ?envelope.id,
                            payment_token_id = ?token_id,
                            customer_id = ?customer_id,
                            "Vault webhook is missing identifiers"
                        );
                        self.event(WebhookType::Setup, PaymentEventStatus::Failed, raw)
                            .with_metadata("payment_token_id", token_id)
                            .with_metadata("customer_id", customer_id)
                    }
                }
            }
            PayPalEventType::Other(name) => {
                debug!("Ignoring unhandled PayPal event type: {}", name);
                self.event(WebhookType::Unknown, PaymentEventStatus::Pending, raw)
            }
        };

        Ok(event
            .with_metadata("event_id", envelope.id.clone())
            .with_metadata("event_type", envelope.event_type.clone()))
    }

    fn event(
        &self,
        webhook_type: WebhookType,
        status: PaymentEventStatus,
        raw: RawPayload,
    ) -> WebhookResponse {
        WebhookResponse::new(
            webhook_type,
            status,
            PAYPAL_GATEWAY,
            self.default_currency.clone(),
            raw,
        )
    }
}

/// 完整的Webhook处理流程：解析 -> 验签 -> 翻译
///
/// 验签失败时直接返回错误，不会进入翻译（也不会触发capture）。
pub async fn process_webhook<V, C>(
    verifier: &V,
    translator: &WebhookTranslator,
    capture: &C,
    body: &str,
    headers: &HashMap<String, String>,
) -> DomainResult<WebhookResponse>
where
    V: WebhookSignatureVerifier + ?Sized,
    C: OrderCapture + ?Sized,
{
    let raw = RawPayload::from_json(body)?;
    verifier.verify_signature(&raw, headers).await?;

    let envelope: WebhookEnvelope = serde_json::from_str(raw.get())?;
    translator.translate(&envelope, raw, capture).await
}
