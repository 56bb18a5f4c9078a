use paypal_gateway_core::api::{self, AppState};
use paypal_gateway_core::application::PaymentService;
use paypal_gateway_core::infrastructure::{
    InMemoryReconciliation, PayPalConfig, PayPalConnector, ServerConfig,
};
use paypal_gateway_core::ports::GatewayConnector;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 加载环境变量
    dotenvy::dotenv().ok();

    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    info!("Starting PayPal gateway service...");

    // 加载PayPal配置，缺少凭证时直接退出
    let paypal_config = PayPalConfig::from_env()?;
    info!(
        "PayPal configuration loaded (sandbox: {}, api: {})",
        paypal_config.sandbox, paypal_config.api_base
    );

    // 启动时先认证一次，凭证错误直接退出；之后每个请求各自认证
    let connector = PayPalConnector::new(paypal_config);
    connector.connect().await?;
    info!("PayPal credentials verified");

    let reconciliation = Arc::new(InMemoryReconciliation::new());

    let payment_service = Arc::new(PaymentService::new(connector, reconciliation));

    let app = api::create_router(AppState { payment_service });

    let server_config = ServerConfig::from_env();
    let addr = server_config.bind_addr();

    info!("Server listening on {}", addr);
    info!("Available endpoints:");
    info!("  GET  /health - Health check");
    info!("  POST /api/payments - Create payment");
    info!("  POST /api/payments/stored - Charge stored payment method");
    info!("  GET  /api/payments/:transaction_id - Verify payment");
    info!("  POST /api/payments/:transaction_id/refund - Refund payment");
    info!("  POST /api/payment-methods - Save payment method");
    info!("  POST /api/payment-methods/confirm - Confirm payment method");
    info!("  POST /api/webhooks/paypal - PayPal webhook");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
