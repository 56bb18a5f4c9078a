use serde::{Deserialize, Serialize};

/// 发起支付请求
#[derive(Debug, Deserialize)]
pub struct ChargeRequest {
    /// 商户订单号
    pub order_id: String,

    /// 支付金额（分）
    pub amount: i64,

    /// 币种，默认USD
    pub currency: Option<String>,

    pub description: String,

    pub success_url: String,

    pub cancel_url: String,

    /// 已保存的支付方式token（已保存支付方式扣款时必填）
    pub payment_token_id: Option<String>,
}

/// 保存支付方式请求
#[derive(Debug, Deserialize)]
pub struct SavePaymentMethodRequest {
    pub redirect_url: String,
    pub cancel_url: String,
    pub description: String,
}

/// 退款请求，金额为空时全额退款
#[derive(Debug, Default, Deserialize)]
pub struct RefundRequest {
    pub amount: Option<i64>,
    pub currency: Option<String>,
}

/// Webhook确认响应
#[derive(Debug, Serialize)]
pub struct WebhookAck {
    #[serde(rename = "type")]
    pub webhook_type: String,
    pub status: String,
    pub outcome: String,
}

/// 错误响应
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(error: String, message: String) -> Self {
        Self { error, message }
    }
}
