use crate::domain::errors::DomainResult;
use crate::domain::WebhookResponse;
use async_trait::async_trait;

/// 对账处理结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// 首次处理
    Applied,
    /// 重复投递，已忽略
    Duplicate,
    /// 没有交易号，无需处理
    Ignored,
}

/// 订单/对账子系统端口接口
///
/// 渠道超时会重复投递同一事件，实现方需按 `(transaction_id, type)` 去重。
#[async_trait]
pub trait ReconciliationPort: Send + Sync {
    async fn apply(&self, event: &WebhookResponse) -> DomainResult<ApplyOutcome>;
}
