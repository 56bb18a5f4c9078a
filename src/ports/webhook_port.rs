use crate::domain::RawPayload;
use crate::domain::errors::DomainResult;
use async_trait::async_trait;
use std::collections::HashMap;

/// Webhook验签
///
/// 返回 `Ok(())` 表示渠道明确确认验签成功，其余情况一律返回错误。
#[async_trait]
pub trait WebhookSignatureVerifier: Send + Sync {
    /// `event` 是收到的原始报文，必须原样回传给渠道
    async fn verify_signature(
        &self,
        event: &RawPayload,
        headers: &HashMap<String, String>,
    ) -> DomainResult<()>;
}

/// 订单capture结果
#[derive(Debug, Clone, PartialEq)]
pub struct CaptureOutcome {
    /// capture交易号
    pub capture_id: String,
    /// 金额（分）
    pub amount: i64,
    /// 手续费（分）
    pub fee: i64,
    /// 小写币种
    pub currency: String,
    pub raw: RawPayload,
}

/// 对已批准的订单执行capture
///
/// 对同一订单重复capture必须返回已有的capture，而不是新建。
#[async_trait]
pub trait OrderCapture: Send + Sync {
    async fn capture(&self, order_id: &str) -> DomainResult<CaptureOutcome>;
}
