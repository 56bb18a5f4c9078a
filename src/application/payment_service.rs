use crate::application::dto::{ChargeRequest, RefundRequest, SavePaymentMethodRequest};
use crate::domain::errors::DomainResult;
use crate::domain::{
    PaymentPayload, PaymentResponse, PaymentStatus, RefundResponse, SavePaymentMethodPayload,
    WebhookResponse,
};
use crate::infrastructure::config::paypal_config::DEFAULT_CURRENCY;
use crate::ports::{ApplyOutcome, GatewayConnector, PaymentGatewayPort, ReconciliationPort};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// 支付服务
///
/// 结账与对账子系统的调用方：按顺序调用网关，记录结果并把Webhook事件交给对账端口。
/// 每个操作都通过连接器取得新的网关实例，不跨请求复用access token。
pub struct PaymentService<C: GatewayConnector, R: ReconciliationPort> {
    connector: C,
    reconciliation: Arc<R>,
}

impl<C: GatewayConnector, R: ReconciliationPort> PaymentService<C, R> {
    pub fn new(connector: C, reconciliation: Arc<R>) -> Self {
        Self {
            connector,
            reconciliation,
        }
    }

    async fn gateway(&self) -> DomainResult<Arc<C::Gateway>> {
        self.connector
            .connect()
            .await
            .inspect_err(|e| error!("Gateway connection failed: {}", e))
    }

    fn payload(request: ChargeRequest) -> DomainResult<PaymentPayload> {
        let payload = PaymentPayload::new(
            request.order_id,
            request.amount,
            request.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
            request.description,
            request.success_url,
            request.cancel_url,
        )?;

        Ok(match request.payment_token_id {
            Some(token) => payload.with_payment_token(token),
            None => payload,
        })
    }

    /// 发起支付
    pub async fn charge(&self, request: ChargeRequest) -> DomainResult<PaymentResponse> {
        let payload = Self::payload(request)?;
        let gateway = self.gateway().await?;
        info!(
            "Creating {} payment for order: {}",
            gateway.name(),
            payload.order_id
        );

        let response = gateway.charge(&payload).await.inspect_err(|e| {
            error!("Charge failed for order {}: {}", payload.order_id, e);
        })?;

        info!(
            "Payment initiated for order {}: {} (redirect: {})",
            payload.order_id, response.transaction_id, response.is_redirect
        );
        Ok(response)
    }

    /// 使用已保存的支付方式扣款
    pub async fn charge_stored(&self, request: ChargeRequest) -> DomainResult<PaymentResponse> {
        info!("Charging stored payment method for order: {}", request.order_id);
        let payload = Self::payload(request)?;

        let response = self
            .gateway()
            .await?
            .charge_stored_payment_method(&payload)
            .await
            .inspect_err(|e| {
                error!("Stored charge failed for order {}: {}", payload.order_id, e);
            })?;

        info!(
            "Stored payment captured for order {}: {}",
            payload.order_id, response.transaction_id
        );
        Ok(response)
    }

    /// 发起保存支付方式流程
    pub async fn save_payment_method(
        &self,
        request: SavePaymentMethodRequest,
    ) -> DomainResult<PaymentResponse> {
        let payload = SavePaymentMethodPayload::new(
            request.redirect_url,
            request.cancel_url,
            request.description,
        );

        let response = self.gateway().await?.save_payment_method(&payload).await?;
        info!("Setup token created: {}", response.transaction_id);
        Ok(response)
    }

    /// 完成保存支付方式流程
    pub async fn confirm_payment_method(
        &self,
        data: &HashMap<String, String>,
    ) -> DomainResult<Option<PaymentResponse>> {
        let response = self.gateway().await?.confirm(data).await?;
        match &response {
            Some(confirmed) => info!("Payment method vaulted: {}", confirmed.transaction_id),
            None => debug!("Nothing to confirm"),
        }
        Ok(response)
    }

    /// 退款
    pub async fn refund(
        &self,
        transaction_id: &str,
        request: RefundRequest,
    ) -> DomainResult<RefundResponse> {
        info!(
            "Refunding {} (amount: {:?})",
            transaction_id, request.amount
        );

        let response = self
            .gateway()
            .await?
            .refund(transaction_id, request.amount, request.currency.as_deref())
            .await
            .inspect_err(|e| error!("Refund failed for {}: {}", transaction_id, e))?;

        if !response.success {
            warn!(
                "Refund {} for {} is not completed yet",
                response.refund_id, transaction_id
            );
        }
        Ok(response)
    }

    /// 查询交易状态
    pub async fn verify(&self, transaction_id: &str) -> DomainResult<PaymentStatus> {
        debug!("Verifying transaction: {}", transaction_id);
        self.gateway().await?.verify(transaction_id).await
    }

    /// 处理Webhook：验签、翻译后交给对账
    pub async fn handle_webhook(
        &self,
        body: &str,
        headers: &HashMap<String, String>,
    ) -> DomainResult<(WebhookResponse, ApplyOutcome)> {
        let event = self
            .gateway()
            .await?
            .handle_webhook(body, headers)
            .await
            .inspect_err(|e| error!("Webhook rejected: {}", e))?;

        info!(
            "Webhook translated: {} {} ({:?})",
            event.webhook_type, event.status, event.transaction_id
        );

        let outcome = self.reconciliation.apply(&event).await?;
        Ok((event, outcome))
    }
}
