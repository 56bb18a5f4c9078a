use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{format_amount, normalize_currency, provider_currency};
use crate::domain::{
    CustomerDetails, PaymentPayload, PaymentResponse, PaymentStatus, RefundResponse,
    SavePaymentMethodPayload, WebhookResponse,
};
use crate::infrastructure::adapters::paypal_client::{PayPalClient, ProviderResponse};
use crate::infrastructure::adapters::paypal_models::{
    Capture, FeeBreakdown, Order, PaymentToken, Refund, SetupToken, find_link, is_completed,
};
use crate::infrastructure::adapters::paypal_webhook::{
    PAYPAL_GATEWAY, PayPalWebhookVerifier, WebhookTranslator, process_webhook,
};
use crate::infrastructure::config::PayPalConfig;
use crate::ports::{CaptureOutcome, GatewayConnector, OrderCapture, PaymentGatewayPort};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// 保存支付方式完成后PayPal在return_url上附带的setup token参数
pub const APPROVAL_TOKEN_PARAM: &str = "approval_token_id";

/// PayPal描述字段上限
const MAX_DESCRIPTION_CHARS: usize = 127;

/// PayPal支付适配器
///
/// 通过 [`PayPalAdapter::connect`] 一次性完成配置和认证，构造完成即可用，之后不可修改。
pub struct PayPalAdapter {
    client: PayPalClient,
    verifier: PayPalWebhookVerifier,
    translator: WebhookTranslator,
    default_currency: String,
}

impl PayPalAdapter {
    /// 认证并创建适配器
    pub async fn connect(config: PayPalConfig) -> DomainResult<Self> {
        let client = PayPalClient::authenticate(&config).await?;
        info!(
            "PayPal adapter authenticated (sandbox: {})",
            config.sandbox
        );

        Ok(Self {
            verifier: PayPalWebhookVerifier::new(client.clone(), config.webhook_id.clone()),
            translator: WebhookTranslator::new(&config.default_currency),
            default_currency: provider_currency(&config.default_currency),
            client,
        })
    }

    /// 从扁平配置表创建；缺少凭证时在任何网络请求之前失败
    pub async fn from_map(values: &HashMap<String, String>) -> DomainResult<Self> {
        let config = PayPalConfig::from_map(values)?;
        Self::connect(config).await
    }

    /// 创建订单请求体
    fn order_body(payload: &PaymentPayload, payment_source: Value) -> Value {
        let description: String = payload
            .description
            .chars()
            .take(MAX_DESCRIPTION_CHARS)
            .collect();

        json!({
            "intent": "CAPTURE",
            "purchase_units": [{
                "reference_id": payload.order_id,
                "invoice_id": payload.order_id,
                "custom_id": payload.order_id,
                "description": description,
                "amount": {
                    "currency_code": provider_currency(&payload.currency),
                    "value": format_amount(payload.amount),
                }
            }],
            "payment_source": payment_source,
        })
    }

    /// 状态查询，订单不存在时回退到capture查询
    async fn fetch_status(&self, transaction_id: &str) -> DomainResult<PaymentStatus> {
        let id = path_segment(transaction_id)?;

        let response = self
            .client
            .get(&format!("/v2/checkout/orders/{}", id), "verify", transaction_id)
            .await?;

        if response.status != 404 {
            let response = response.error_for_status("verify", transaction_id)?;
            let (order, raw) = response.parse::<Order>("verify", transaction_id)?;
            let amount = order.purchase_units.first().and_then(|u| u.amount.as_ref());

            return Ok(PaymentStatus {
                status: lowercase_status(order.status.as_deref()),
                transaction_id: order.id,
                amount: amount.map(|a| a.minor_units()).transpose()?.unwrap_or(0),
                currency: amount
                    .map(|a| a.currency())
                    .unwrap_or_else(|| normalize_currency(&self.default_currency)),
                raw,
            });
        }

        debug!("No PayPal order {}, looking up capture", transaction_id);
        let response = self
            .client
            .get(&format!("/v2/payments/captures/{}", id), "verify", transaction_id)
            .await?
            .error_for_status("verify", transaction_id)?;
        let (capture, raw) = response.parse::<Capture>("verify", transaction_id)?;

        Ok(PaymentStatus {
            status: lowercase_status(capture.status.as_deref()),
            transaction_id: capture.id,
            amount: capture
                .amount
                .as_ref()
                .map(|a| a.minor_units())
                .transpose()?
                .unwrap_or(0),
            currency: capture
                .amount
                .as_ref()
                .map(|a| a.currency())
                .unwrap_or_else(|| normalize_currency(&self.default_currency)),
            raw,
        })
    }
}

/// PayPal连接器
///
/// 持有已校验的配置，每次 [`GatewayConnector::connect`] 都重新认证，
/// access token的有效期不会超过一次业务操作。
#[derive(Debug, Clone)]
pub struct PayPalConnector {
    config: PayPalConfig,
}

impl PayPalConnector {
    pub fn new(config: PayPalConfig) -> Self {
        Self { config }
    }

    /// 从扁平配置表创建；只校验配置，不发起网络请求
    pub fn from_map(values: &HashMap<String, String>) -> DomainResult<Self> {
        Ok(Self::new(PayPalConfig::from_map(values)?))
    }

    pub fn config(&self) -> &PayPalConfig {
        &self.config
    }
}

#[async_trait]
impl GatewayConnector for PayPalConnector {
    type Gateway = PayPalAdapter;

    async fn connect(&self) -> DomainResult<Arc<PayPalAdapter>> {
        debug!("Connecting PayPal adapter");
        Ok(Arc::new(PayPalAdapter::connect(self.config.clone()).await?))
    }
}

#[async_trait]
impl OrderCapture for PayPalAdapter {
    /// capture已批准的订单
    ///
    /// 使用固定的 `PayPal-Request-Id`，重复capture返回同一笔capture。
    async fn capture(&self, order_id: &str) -> DomainResult<CaptureOutcome> {
        let id = path_segment(order_id)?;

        let response = self
            .client
            .post_json(
                &format!("/v2/checkout/orders/{}/capture", id),
                &json!({}),
                &format!("capture-{}", order_id),
                "capture",
                order_id,
            )
            .await?
            .error_for_status("capture", order_id)?;

        let (order, raw) = response.parse::<Order>("capture", order_id)?;
        let capture = completed_capture(&order, &response, "capture", order_id)?;

        Ok(CaptureOutcome {
            capture_id: capture.id.clone(),
            amount: capture
                .amount
                .as_ref()
                .map(|a| a.minor_units())
                .transpose()?
                .unwrap_or(0),
            fee: FeeBreakdown::fee(capture.seller_receivable_breakdown.as_ref())?,
            currency: capture
                .amount
                .as_ref()
                .map(|a| a.currency())
                .unwrap_or_else(|| normalize_currency(&self.default_currency)),
            raw,
        })
    }
}

#[async_trait]
impl PaymentGatewayPort for PayPalAdapter {
    fn name(&self) -> &'static str {
        PAYPAL_GATEWAY
    }

    /// 创建订单，返回买家确认地址
    async fn charge(&self, payload: &PaymentPayload) -> DomainResult<PaymentResponse> {
        let body = Self::order_body(
            payload,
            json!({
                "paypal": {
                    "experience_context": {
                        "return_url": payload.success_url,
                        "cancel_url": payload.cancel_url,
                        "user_action": "PAY_NOW",
                        "shipping_preference": "NO_SHIPPING",
                    }
                }
            }),
        );

        let response = self
            .client
            .post_json(
                "/v2/checkout/orders",
                &body,
                &uuid::Uuid::new_v4().to_string(),
                "charge",
                &payload.order_id,
            )
            .await?
            .error_for_status("charge", &payload.order_id)?;

        let (order, raw) = response.parse::<Order>("charge", &payload.order_id)?;

        if is_completed(order.status.as_deref()) {
            if let Some(capture) = order.first_capture().filter(|c| c.is_completed()) {
                return Ok(PaymentResponse::completed(capture.id.clone(), raw)
                    .with_previous_transaction(order.id.clone()));
            }
        }

        match find_link(&order.links, &["payer-action", "approve"]) {
            Some(url) => Ok(PaymentResponse::redirect(url, order.id.clone(), raw)),
            None => Err(DomainError::rejected(
                "charge",
                &payload.order_id,
                Some(response.status),
                format!(
                    "order {} has status {} and no approval link: {}",
                    order.id,
                    order.status.as_deref().unwrap_or("MISSING"),
                    response.body
                ),
            )),
        }
    }

    /// 创建vault setup token，返回买家授权地址
    async fn save_payment_method(
        &self,
        payload: &SavePaymentMethodPayload,
    ) -> DomainResult<PaymentResponse> {
        let description: String = payload
            .description
            .chars()
            .take(MAX_DESCRIPTION_CHARS)
            .collect();
        let body = json!({
            "payment_source": {
                "paypal": {
                    "description": description,
                    "usage_type": "MERCHANT",
                    "customer_type": "CONSUMER",
                    "experience_context": {
                        "return_url": payload.redirect_url,
                        "cancel_url": payload.cancel_url,
                        "shipping_preference": "NO_SHIPPING",
                    }
                }
            }
        });

        let response = self
            .client
            .post_json(
                "/v3/vault/setup-tokens",
                &body,
                &uuid::Uuid::new_v4().to_string(),
                "save_payment_method",
                "setup_token",
            )
            .await?
            .error_for_status("save_payment_method", "setup_token")?;

        let (token, raw) = response.parse::<SetupToken>("save_payment_method", "setup_token")?;

        match find_link(&token.links, &["approve", "payer-action"]) {
            Some(url) => Ok(PaymentResponse::redirect(url, token.id.clone(), raw)),
            None => Err(DomainError::rejected(
                "save_payment_method",
                &token.id,
                Some(response.status),
                format!("setup token has no approval link: {}", response.body),
            )),
        }
    }

    /// PayPal没有预创建客户的概念
    async fn create_customer(&self, _customer: &CustomerDetails) -> DomainResult<String> {
        Ok(String::new())
    }

    async fn charge_stored_payment_method(
        &self,
        payload: &PaymentPayload,
    ) -> DomainResult<PaymentResponse> {
        let vault_id = payload
            .payment_token_id
            .as_deref()
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                DomainError::Validation(format!(
                    "Order {} has no stored payment token",
                    payload.order_id
                ))
            })?;

        let body = Self::order_body(payload, json!({ "paypal": { "vault_id": vault_id } }));

        let response = self
            .client
            .post_json(
                "/v2/checkout/orders",
                &body,
                &uuid::Uuid::new_v4().to_string(),
                "charge_stored_payment_method",
                &payload.order_id,
            )
            .await?
            .error_for_status("charge_stored_payment_method", &payload.order_id)?;

        let (order, raw) =
            response.parse::<Order>("charge_stored_payment_method", &payload.order_id)?;
        let capture = completed_capture(
            &order,
            &response,
            "charge_stored_payment_method",
            &payload.order_id,
        )?;

        Ok(PaymentResponse::completed(capture.id.clone(), raw)
            .with_previous_transaction(order.id.clone()))
    }

    async fn refund(
        &self,
        transaction_id: &str,
        amount: Option<i64>,
        currency: Option<&str>,
    ) -> DomainResult<RefundResponse> {
        let id = path_segment(transaction_id)?;
        let body = match amount {
            Some(amount) => json!({
                "amount": {
                    "value": format_amount(amount),
                    "currency_code": provider_currency(currency.unwrap_or(&self.default_currency)),
                }
            }),
            None => json!({}),
        };

        let response = self
            .client
            .post_json(
                &format!("/v2/payments/captures/{}/refund", id),
                &body,
                &uuid::Uuid::new_v4().to_string(),
                "refund",
                transaction_id,
            )
            .await?
            .error_for_status("refund", transaction_id)?;

        let (refund, raw) = response.parse::<Refund>("refund", transaction_id)?;

        let success = match refund.status.as_deref().map(str::to_ascii_uppercase).as_deref() {
            Some("COMPLETED") => true,
            Some("PENDING") => false,
            other => {
                return Err(DomainError::rejected(
                    "refund",
                    transaction_id,
                    Some(response.status),
                    format!(
                        "refund {} has status {}: {}",
                        refund.id,
                        other.unwrap_or("MISSING"),
                        response.body
                    ),
                ));
            }
        };

        let refunded = match &refund.amount {
            Some(money) => money.minor_units()?,
            None => amount.unwrap_or(0),
        };

        Ok(RefundResponse {
            success,
            refund_id: refund.id,
            transaction_id: transaction_id.to_string(),
            amount: refunded,
            raw,
        })
    }

    async fn verify(&self, transaction_id: &str) -> DomainResult<PaymentStatus> {
        self.fetch_status(transaction_id).await
    }

    /// 将setup token换成可复用的payment token
    async fn confirm(
        &self,
        data: &HashMap<String, String>,
    ) -> DomainResult<Option<PaymentResponse>> {
        let Some(setup_token) = data
            .get(APPROVAL_TOKEN_PARAM)
            .map(|token| token.trim())
            .filter(|token| !token.is_empty())
        else {
            return Ok(None);
        };

        let body = json!({
            "payment_source": {
                "token": { "id": setup_token, "type": "SETUP_TOKEN" }
            }
        });

        let response = self
            .client
            .post_json(
                "/v3/vault/payment-tokens",
                &body,
                &uuid::Uuid::new_v4().to_string(),
                "confirm",
                setup_token,
            )
            .await?
            .error_for_status("confirm", setup_token)?;

        let (token, raw) = response.parse::<PaymentToken>("confirm", setup_token)?;
        let token_id = token.id.filter(|id| !id.is_empty()).ok_or_else(|| {
            DomainError::rejected(
                "confirm",
                setup_token,
                Some(response.status),
                format!("no payment token id: {}", response.body),
            )
        })?;

        Ok(Some(
            PaymentResponse::completed(token_id, raw).with_previous_transaction(setup_token),
        ))
    }

    async fn handle_webhook(
        &self,
        body: &str,
        headers: &HashMap<String, String>,
    ) -> DomainResult<WebhookResponse> {
        process_webhook(&self.verifier, &self.translator, self, body, headers).await
    }
}

/// 订单中的第一笔capture，且状态必须为COMPLETED
fn completed_capture<'a>(
    order: &'a Order,
    response: &ProviderResponse,
    operation: &'static str,
    order_id: &str,
) -> DomainResult<&'a Capture> {
    match order.first_capture() {
        Some(capture) if capture.is_completed() => Ok(capture),
        Some(capture) => Err(DomainError::rejected(
            operation,
            order_id,
            Some(response.status),
            format!(
                "order {} capture status {}: {}",
                order_id,
                capture.status.as_deref().unwrap_or("MISSING"),
                response.body
            ),
        )),
        None => Err(DomainError::rejected(
            operation,
            order_id,
            Some(response.status),
            format!(
                "order {} has status {} and no capture: {}",
                order_id,
                order.status.as_deref().unwrap_or("MISSING"),
                response.body
            ),
        )),
    }
}

fn lowercase_status(status: Option<&str>) -> String {
    status.unwrap_or("unknown").to_ascii_lowercase()
}

/// 渠道ID只允许出现在URL路径的单个片段中
fn path_segment(id: &str) -> DomainResult<&str> {
    let valid = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(id)
    } else {
        Err(DomainError::Validation(format!("Invalid PayPal id: {:?}", id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_path_segment() {
        assert_eq!(path_segment("5O190127TN364715T").unwrap(), "5O190127TN364715T");
        assert!(path_segment("").is_err());
        assert!(path_segment("../oauth2/token").is_err());
        assert!(path_segment("A B").is_err());
    }

    #[test]
    fn test_order_body() {
        let payload = PaymentPayload::new(
            "ORDER1",
            1250,
            "usd",
            "x".repeat(200),
            "https://shop/success",
            "https://shop/cancel",
        )
        .unwrap();

        let body = PayPalAdapter::order_body(&payload, json!({ "paypal": {} }));

        let unit = &body["purchase_units"][0];
        assert_eq!(body["intent"], "CAPTURE");
        assert_eq!(unit["invoice_id"], "ORDER1");
        assert_eq!(unit["amount"]["value"], "12.50");
        assert_eq!(unit["amount"]["currency_code"], "USD");
        assert_eq!(unit["description"].as_str().unwrap().len(), MAX_DESCRIPTION_CHARS);
    }

    #[test]
    fn test_lowercase_status() {
        assert_eq!(lowercase_status(Some("COMPLETED")), "completed");
        assert_eq!(lowercase_status(None), "unknown");
    }
}
