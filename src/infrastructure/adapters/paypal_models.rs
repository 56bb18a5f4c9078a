//! PayPal REST API 请求/响应结构
//!
//! 只声明适配器用到的字段，其余字段保留在原始JSON中。

use crate::domain::errors::DomainResult;
use crate::domain::value_objects::{normalize_currency, parse_amount};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;

#[derive(Debug, Deserialize)]
pub struct AccessTokenResponse {
    pub access_token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Money {
    pub currency_code: String,
    pub value: String,
}

impl Money {
    /// 金额（分）
    pub fn minor_units(&self) -> DomainResult<i64> {
        parse_amount(&self.value)
    }

    pub fn currency(&self) -> String {
        normalize_currency(&self.currency_code)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Link {
    pub href: String,
    pub rel: String,
}

/// 在links中查找指定rel
pub fn find_link<'a>(links: &'a [Link], rels: &[&str]) -> Option<&'a str> {
    rels.iter().find_map(|rel| {
        links
            .iter()
            .find(|link| link.rel.eq_ignore_ascii_case(rel))
            .map(|link| link.href.as_str())
    })
}

#[derive(Debug, Clone, Deserialize)]
pub struct FeeBreakdown {
    pub paypal_fee: Option<Money>,
}

impl FeeBreakdown {
    pub fn fee(breakdown: Option<&FeeBreakdown>) -> DomainResult<i64> {
        match breakdown.and_then(|b| b.paypal_fee.as_ref()) {
            Some(fee) => fee.minor_units(),
            None => Ok(0),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Capture {
    pub id: String,
    pub status: Option<String>,
    pub amount: Option<Money>,
    pub invoice_id: Option<String>,
    pub custom_id: Option<String>,
    pub seller_receivable_breakdown: Option<FeeBreakdown>,
}

impl Capture {
    /// 状态必须与 `COMPLETED` 完全一致（忽略大小写）
    pub fn is_completed(&self) -> bool {
        is_completed(self.status.as_deref())
    }
}

/// PayPal状态词汇中的"已完成"，精确匹配而非前缀/子串匹配
pub fn is_completed(status: Option<&str>) -> bool {
    status.is_some_and(|s| s.eq_ignore_ascii_case("completed"))
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Payments {
    #[serde(default)]
    pub captures: Vec<Capture>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseUnit {
    pub reference_id: Option<String>,
    pub invoice_id: Option<String>,
    pub custom_id: Option<String>,
    pub amount: Option<Money>,
    pub payments: Option<Payments>,
}

impl PurchaseUnit {
    /// 商户订单号：优先invoice_id，其次custom_id
    pub fn order_id(&self) -> Option<String> {
        self.invoice_id.clone().or_else(|| self.custom_id.clone())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Order {
    pub id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
    #[serde(default)]
    pub purchase_units: Vec<PurchaseUnit>,
}

impl Order {
    pub fn first_capture(&self) -> Option<&Capture> {
        self.purchase_units
            .iter()
            .filter_map(|unit| unit.payments.as_ref())
            .flat_map(|payments| payments.captures.iter())
            .next()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Refund {
    pub id: String,
    pub status: Option<String>,
    pub amount: Option<Money>,
    pub invoice_id: Option<String>,
    pub custom_id: Option<String>,
    pub seller_payable_breakdown: Option<FeeBreakdown>,
    #[serde(default)]
    pub links: Vec<Link>,
}

impl Refund {
    /// 从 `up` 链接中取出被退款的capture ID
    pub fn capture_id(&self) -> Option<String> {
        find_link(&self.links, &["up"])
            .and_then(|href| href.trim_end_matches('/').rsplit('/').next())
            .filter(|id| !id.is_empty())
            .map(String::from)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SetupToken {
    pub id: String,
    pub status: Option<String>,
    #[serde(default)]
    pub links: Vec<Link>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct VaultCustomer {
    pub id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PaymentToken {
    pub id: Option<String>,
    pub customer: Option<VaultCustomer>,
}

/// verify-webhook-signature 请求体，`webhook_event` 原样嵌入收到的报文
#[derive(Debug, Serialize)]
pub struct VerifyWebhookRequest<'a> {
    pub auth_algo: &'a str,
    pub cert_url: &'a str,
    pub transmission_id: &'a str,
    pub transmission_sig: &'a str,
    pub transmission_time: &'a str,
    pub webhook_id: &'a str,
    pub webhook_event: &'a RawValue,
}

#[derive(Debug, Deserialize)]
pub struct VerifyWebhookResponse {
    pub verification_status: String,
}

/// Webhook信封
#[derive(Debug, Clone, Deserialize)]
pub struct WebhookEnvelope {
    pub id: Option<String>,
    pub event_type: String,
    #[serde(default)]
    pub resource: serde_json::Value,
}
