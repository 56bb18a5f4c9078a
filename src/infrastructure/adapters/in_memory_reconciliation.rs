use crate::domain::errors::DomainResult;
use crate::domain::{PaymentEventStatus, WebhookResponse, WebhookType};
use crate::ports::reconciliation_port::{ApplyOutcome, ReconciliationPort};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::{debug, info};

/// 已处理的事件记录
#[derive(Debug, Clone)]
pub struct ReconciledEvent {
    pub event: WebhookResponse,
    pub applied_at: DateTime<Utc>,
}

/// 内存对账实现
///
/// 按 `(transaction_id, type)` 去重，重复投递直接忽略。
/// 记录只增不减且进程重启即丢失，仅作为参考实现和测试使用；生产环境应接入持久化的订单存储。
#[derive(Default)]
pub struct InMemoryReconciliation {
    events: Mutex<HashMap<(String, WebhookType), ReconciledEvent>>,
}

impl InMemoryReconciliation {
    pub fn new() -> Self {
        Self::default()
    }

    /// 根据交易号和类型查找
    pub fn find(&self, transaction_id: &str, webhook_type: WebhookType) -> Option<ReconciledEvent> {
        self.events
            .lock()
            .ok()?
            .get(&(transaction_id.to_string(), webhook_type))
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.events.lock().map(|events| events.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl ReconciliationPort for InMemoryReconciliation {
    async fn apply(&self, event: &WebhookResponse) -> DomainResult<ApplyOutcome> {
        let Some(key) = event.dedupe_key() else {
            debug!("Webhook event has no transaction id, nothing to reconcile");
            return Ok(ApplyOutcome::Ignored);
        };

        // 锁中毒时沿用内部数据，记录本身不会处于半写状态
        let mut events = self
            .events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if events.contains_key(&key) {
            debug!("Duplicate webhook delivery for {} ({})", key.0, key.1);
            return Ok(ApplyOutcome::Duplicate);
        }

        if event.status == PaymentEventStatus::Success {
            info!(
                "Reconciled {} {} for order {:?}",
                event.webhook_type, key.0, event.order_id
            );
        }

        events.insert(
            key,
            ReconciledEvent {
                event: event.clone(),
                applied_at: Utc::now(),
            },
        );

        Ok(ApplyOutcome::Applied)
    }
}
