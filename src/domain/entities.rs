use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::value_objects::{RawPayload, normalize_currency};
use serde::{Deserialize, Serialize};

/// 支付请求（由结账子系统构造）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentPayload {
    /// 商户订单号
    pub order_id: String,

    /// 支付金额（分）
    pub amount: i64,

    /// 币种
    pub currency: String,

    /// 商品描述
    pub description: String,

    /// 用户确认支付后的跳转地址
    pub success_url: String,

    /// 用户取消支付后的跳转地址
    pub cancel_url: String,

    /// 已保存的支付方式token（仅用于已保存支付方式扣款）
    pub payment_token_id: Option<String>,
}

impl PaymentPayload {
    pub fn new(
        order_id: impl Into<String>,
        amount: i64,
        currency: impl Into<String>,
        description: impl Into<String>,
        success_url: impl Into<String>,
        cancel_url: impl Into<String>,
    ) -> DomainResult<Self> {
        let order_id = order_id.into();
        if order_id.trim().is_empty() {
            return Err(DomainError::Validation(
                "Order id must not be empty".to_string(),
            ));
        }

        if amount <= 0 {
            return Err(DomainError::InvalidAmount(
                "Amount must be greater than 0".to_string(),
            ));
        }

        let currency = currency.into();
        if currency.trim().len() != 3 {
            return Err(DomainError::Validation(format!(
                "Currency must be a 3-letter code, got {:?}",
                currency
            )));
        }

        Ok(Self {
            order_id,
            amount,
            currency: normalize_currency(&currency),
            description: description.into(),
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            payment_token_id: None,
        })
    }

    /// 附带已保存的支付方式token
    pub fn with_payment_token(mut self, payment_token_id: impl Into<String>) -> Self {
        self.payment_token_id = Some(payment_token_id.into());
        self
    }
}

/// 保存支付方式请求（不立即扣款）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavePaymentMethodPayload {
    pub redirect_url: String,
    pub cancel_url: String,
    pub description: String,
}

impl SavePaymentMethodPayload {
    pub fn new(
        redirect_url: impl Into<String>,
        cancel_url: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            redirect_url: redirect_url.into(),
            cancel_url: cancel_url.into(),
            description: description.into(),
        }
    }
}

/// 客户信息
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerDetails {
    pub email: String,
    pub name: Option<String>,
}

/// 发起/扣款/确认的结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentResponse {
    /// 是否需要跳转到渠道页面由用户确认
    pub is_redirect: bool,

    pub redirect_url: Option<String>,

    /// 渠道交易号
    pub transaction_id: String,

    /// 前一个关联ID（如capture对应的PayPal订单号）
    pub previous_transaction_id: Option<String>,

    /// 内嵌支付表单（PayPal不使用）
    pub payment_form: Option<String>,

    /// 渠道原始响应，仅存档
    pub raw: RawPayload,
}

impl PaymentResponse {
    /// 需要用户跳转确认的结果
    pub fn redirect(
        redirect_url: impl Into<String>,
        transaction_id: impl Into<String>,
        raw: RawPayload,
    ) -> Self {
        Self {
            is_redirect: true,
            redirect_url: Some(redirect_url.into()),
            transaction_id: transaction_id.into(),
            previous_transaction_id: None,
            payment_form: None,
            raw,
        }
    }

    /// 已同步完成的结果
    pub fn completed(transaction_id: impl Into<String>, raw: RawPayload) -> Self {
        Self {
            is_redirect: false,
            redirect_url: None,
            transaction_id: transaction_id.into(),
            previous_transaction_id: None,
            payment_form: None,
            raw,
        }
    }

    pub fn with_previous_transaction(mut self, previous: impl Into<String>) -> Self {
        self.previous_transaction_id = Some(previous.into());
        self
    }
}

/// 退款结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RefundResponse {
    pub success: bool,
    pub refund_id: String,
    /// 被退款的交易号
    pub transaction_id: String,
    /// 退款金额（分）
    pub amount: i64,
    pub raw: RawPayload,
}

/// 交易状态查询结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PaymentStatus {
    /// 小写的渠道状态，如 `completed`、`approved`
    pub status: String,
    pub transaction_id: String,
    pub amount: i64,
    /// 小写币种
    pub currency: String,
    pub raw: RawPayload,
}

impl PaymentStatus {
    pub fn is_completed(&self) -> bool {
        self.status == "completed"
    }
}
