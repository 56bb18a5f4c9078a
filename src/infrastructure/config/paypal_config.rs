use crate::domain::errors::{DomainError, DomainResult};
use std::collections::HashMap;
use std::time::Duration;

pub const SANDBOX_API_BASE: &str = "https://api-m.sandbox.paypal.com";
pub const LIVE_API_BASE: &str = "https://api-m.paypal.com";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_CURRENCY: &str = "USD";

/// PayPal配置
///
/// 构造时一次性校验，之后不可修改。
#[derive(Clone)]
pub struct PayPalConfig {
    pub client_id: String,

    pub client_secret: String,

    /// Webhook ID（用于回调验签）
    pub webhook_id: String,

    pub sandbox: bool,

    /// API基础URL，按sandbox标志确定
    pub api_base: String,

    /// 单次请求超时
    pub timeout: Duration,

    /// 退款等未指定币种时使用
    pub default_currency: String,
}

impl PayPalConfig {
    /// 从扁平配置表构造：`client_id`、`client_secret`、`webhook_id`、`sandbox`
    pub fn from_map(values: &HashMap<String, String>) -> DomainResult<Self> {
        let client_id = required(values, "client_id")?;
        let client_secret = required(values, "client_secret")?;
        let webhook_id = values
            .get("webhook_id")
            .map(|v| v.trim().to_string())
            .unwrap_or_default();
        let sandbox = match values.get("sandbox") {
            Some(raw) => parse_flag(raw)?,
            None => false,
        };

        Ok(Self {
            client_id,
            client_secret,
            webhook_id,
            sandbox,
            api_base: if sandbox { SANDBOX_API_BASE } else { LIVE_API_BASE }.to_string(),
            timeout: DEFAULT_TIMEOUT,
            default_currency: DEFAULT_CURRENCY.to_string(),
        })
    }

    /// 从环境变量加载
    pub fn from_env() -> DomainResult<Self> {
        let mut values = HashMap::new();
        for (key, var) in [
            ("client_id", "PAYPAL_CLIENT_ID"),
            ("client_secret", "PAYPAL_CLIENT_SECRET"),
            ("webhook_id", "PAYPAL_WEBHOOK_ID"),
            ("sandbox", "PAYPAL_SANDBOX"),
        ] {
            if let Ok(value) = std::env::var(var) {
                values.insert(key.to_string(), value);
            }
        }

        Self::from_map(&values)
    }

    /// 覆盖API基础URL（测试或代理）
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_default_currency(mut self, currency: impl Into<String>) -> Self {
        self.default_currency = currency.into().to_ascii_uppercase();
        self
    }
}

// 凭证不进入日志
impl std::fmt::Debug for PayPalConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PayPalConfig")
            .field("client_id", &self.client_id)
            .field("client_secret", &"***")
            .field("webhook_id", &self.webhook_id)
            .field("sandbox", &self.sandbox)
            .field("api_base", &self.api_base)
            .field("timeout", &self.timeout)
            .field("default_currency", &self.default_currency)
            .finish()
    }
}

fn required(values: &HashMap<String, String>, key: &str) -> DomainResult<String> {
    values
        .get(key)
        .map(|v| v.trim())
        .filter(|v| !v.is_empty())
        .map(String::from)
        .ok_or_else(|| DomainError::Configuration(format!("Missing PayPal {}", key)))
}

fn parse_flag(raw: &str) -> DomainResult<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        other => Err(DomainError::Configuration(format!(
            "Invalid sandbox flag: {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_sandbox_resolves_base_url() {
        let config = PayPalConfig::from_map(&values(&[
            ("client_id", "id"),
            ("client_secret", "secret"),
            ("webhook_id", "WH-1"),
            ("sandbox", "true"),
        ]))
        .unwrap();

        assert!(config.sandbox);
        assert_eq!(config.api_base, SANDBOX_API_BASE);
        assert_eq!(config.webhook_id, "WH-1");
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.default_currency, "USD");
    }

    #[test]
    fn test_live_is_default() {
        let config =
            PayPalConfig::from_map(&values(&[("client_id", "id"), ("client_secret", "secret")]))
                .unwrap();

        assert!(!config.sandbox);
        assert_eq!(config.api_base, LIVE_API_BASE);
        assert!(config.webhook_id.is_empty());
    }

    #[test]
    fn test_missing_client_secret() {
        let result = PayPalConfig::from_map(&values(&[("client_id", "id"), ("sandbox", "1")]));

        match result {
            Err(DomainError::Configuration(message)) => assert!(message.contains("client_secret")),
            other => panic!("expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_blank_client_id() {
        let result =
            PayPalConfig::from_map(&values(&[("client_id", "  "), ("client_secret", "secret")]));

        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_invalid_sandbox_flag() {
        let result = PayPalConfig::from_map(&values(&[
            ("client_id", "id"),
            ("client_secret", "secret"),
            ("sandbox", "maybe"),
        ]));

        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_debug_hides_secret() {
        let config =
            PayPalConfig::from_map(&values(&[("client_id", "id"), ("client_secret", "s3cr3t")]))
                .unwrap()
                .with_api_base("http://127.0.0.1:9999/");

        let debug = format!("{:?}", config);
        assert!(!debug.contains("s3cr3t"));
        assert_eq!(config.api_base, "http://127.0.0.1:9999");
    }
}
