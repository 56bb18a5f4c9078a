use crate::domain::value_objects::{PaymentEventStatus, RawPayload, WebhookType};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

/// metadata中始终存在的订单号键
pub const METADATA_ORDER_ID: &str = "order_id";

/// 与渠道无关的标准化Webhook事件
///
/// 所有渠道的回调都归一为该结构，交给订单/对账子系统按
/// `(transaction_id, webhook_type)` 幂等处理。
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WebhookResponse {
    #[serde(rename = "type")]
    pub webhook_type: WebhookType,
    pub status: PaymentEventStatus,
    pub transaction_id: Option<String>,
    pub customer_id: Option<String>,
    pub order_id: Option<String>,
    /// 金额（分）
    pub amount: i64,
    /// 手续费（分）
    pub fee: i64,
    /// 小写币种
    pub currency: String,
    pub metadata: BTreeMap<String, Value>,
    pub payment_gateway: String,
    pub raw: RawPayload,
}

impl WebhookResponse {
    /// 创建事件，`metadata.order_id` 默认为null
    pub fn new(
        webhook_type: WebhookType,
        status: PaymentEventStatus,
        payment_gateway: impl Into<String>,
        currency: impl Into<String>,
        raw: RawPayload,
    ) -> Self {
        let mut metadata = BTreeMap::new();
        metadata.insert(METADATA_ORDER_ID.to_string(), Value::Null);

        Self {
            webhook_type,
            status,
            transaction_id: None,
            customer_id: None,
            order_id: None,
            amount: 0,
            fee: 0,
            currency: currency.into(),
            metadata,
            payment_gateway: payment_gateway.into(),
            raw,
        }
    }

    /// 设置订单号，同时写入 `metadata.order_id`
    pub fn with_order_id(mut self, order_id: Option<String>) -> Self {
        self.metadata.insert(
            METADATA_ORDER_ID.to_string(),
            order_id.clone().map(Value::String).unwrap_or(Value::Null),
        );
        self.order_id = order_id;
        self
    }

    pub fn with_metadata(mut self, key: &str, value: impl Into<Value>) -> Self {
        if key != METADATA_ORDER_ID {
            self.metadata.insert(key.to_string(), value.into());
        }
        self
    }

    /// 对账去重键
    pub fn dedupe_key(&self) -> Option<(String, WebhookType)> {
        self.transaction_id
            .as_ref()
            .map(|id| (id.clone(), self.webhook_type))
    }
}
