use crate::domain::errors::DomainResult;
use crate::domain::{
    CustomerDetails, PaymentPayload, PaymentResponse, PaymentStatus, RefundResponse,
    SavePaymentMethodPayload, WebhookResponse,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

/// 支付网关端口接口
///
/// 结账子系统只依赖此接口，与具体渠道无关。所有网络错误和渠道拒绝都以
/// `DomainError::GatewayCall` 返回，适配器内部不做重试。
#[async_trait]
pub trait PaymentGatewayPort: Send + Sync {
    /// 渠道标识，如 `paypal`
    fn name(&self) -> &'static str;

    /// 发起即时扣款支付：返回跳转确认地址，或已完成的交易号
    async fn charge(&self, payload: &PaymentPayload) -> DomainResult<PaymentResponse>;

    /// 发起保存支付方式流程（不扣款），总是需要跳转
    async fn save_payment_method(
        &self,
        payload: &SavePaymentMethodPayload,
    ) -> DomainResult<PaymentResponse>;

    /// 在渠道侧创建客户；不支持的渠道返回空字符串
    async fn create_customer(&self, customer: &CustomerDetails) -> DomainResult<String>;

    /// 使用已保存的支付方式扣款，capture状态不是completed时返回错误
    async fn charge_stored_payment_method(
        &self,
        payload: &PaymentPayload,
    ) -> DomainResult<PaymentResponse>;

    /// 退款；`amount` 为空时全额退款，`currency` 为空时使用默认币种
    async fn refund(
        &self,
        transaction_id: &str,
        amount: Option<i64>,
        currency: Option<&str>,
    ) -> DomainResult<RefundResponse>;

    /// 只读查询交易状态
    async fn verify(&self, transaction_id: &str) -> DomainResult<PaymentStatus>;

    /// 完成保存支付方式流程；输入中没有setup token时返回 `None`
    async fn confirm(
        &self,
        data: &HashMap<String, String>,
    ) -> DomainResult<Option<PaymentResponse>>;

    /// 验签并翻译Webhook
    async fn handle_webhook(
        &self,
        body: &str,
        headers: &HashMap<String, String>,
    ) -> DomainResult<WebhookResponse>;
}

/// 网关连接器
///
/// 适配器只在构造时认证一次且不刷新token，长期运行的服务通过连接器
/// 为每个业务操作取得一个刚认证过的网关实例。
#[async_trait]
pub trait GatewayConnector: Send + Sync {
    type Gateway: PaymentGatewayPort;

    async fn connect(&self) -> DomainResult<Arc<Self::Gateway>>;
}

/// 直接复用已有实例，适用于没有会话状态的网关（如测试替身）
#[async_trait]
impl<G: PaymentGatewayPort + 'static> GatewayConnector for Arc<G> {
    type Gateway = G;

    async fn connect(&self) -> DomainResult<Arc<G>> {
        Ok(Arc::clone(self))
    }
}
