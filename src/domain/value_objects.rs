use crate::domain::errors::{DomainError, DomainResult};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use serde_json::value::RawValue;
use std::fmt;
use std::str::FromStr;

/// 最小货币单位（分）转换为渠道要求的两位小数字符串
///
/// `1250` -> `"12.50"`
pub fn format_amount(minor_units: i64) -> String {
    Decimal::new(minor_units, 2).to_string()
}

/// 渠道的小数金额字符串转换为最小货币单位（分）
///
/// 乘以100后按"四舍五入，远离零"取整，全程使用十进制运算，不经过浮点数。
pub fn parse_amount(value: &str) -> DomainResult<i64> {
    let decimal = Decimal::from_str(value.trim())
        .map_err(|e| DomainError::InvalidAmount(format!("{:?}: {}", value, e)))?;
    to_minor_units(decimal)
}

/// 十进制金额转换为分
pub fn to_minor_units(amount: Decimal) -> DomainResult<i64> {
    amount
        .checked_mul(Decimal::ONE_HUNDRED)
        .map(|cents| cents.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero))
        .and_then(|cents| cents.to_i64())
        .ok_or_else(|| DomainError::InvalidAmount(format!("{} is out of range", amount)))
}

/// 内部统一使用小写币种代码
pub fn normalize_currency(code: &str) -> String {
    code.trim().to_ascii_lowercase()
}

/// 渠道要求大写币种代码
pub fn provider_currency(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// 渠道原始报文
///
/// 保存收到的JSON文本本身，序列化时原样输出，键顺序和数字写法都不变。
#[derive(Debug, Clone, Serialize)]
#[serde(transparent)]
pub struct RawPayload(Box<RawValue>);

impl RawPayload {
    /// 校验为合法JSON后保存，不重新编码
    pub fn from_json(text: impl Into<String>) -> DomainResult<Self> {
        Ok(Self(RawValue::from_string(text.into())?))
    }

    pub fn get(&self) -> &str {
        self.0.get()
    }

    pub fn as_raw_value(&self) -> &RawValue {
        &self.0
    }

    /// 解析为 `serde_json::Value`，仅用于读取字段
    pub fn to_value(&self) -> DomainResult<serde_json::Value> {
        Ok(serde_json::from_str(self.get())?)
    }
}

impl PartialEq for RawPayload {
    fn eq(&self, other: &Self) -> bool {
        self.get() == other.get()
    }
}

/// Webhook事件类型（封闭枚举）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WebhookType {
    /// 支付
    Payment,
    /// 退款
    Refund,
    /// 保存支付方式（vault）
    Setup,
    /// 未识别的事件
    Unknown,
}

impl fmt::Display for WebhookType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebhookType::Payment => write!(f, "payment"),
            WebhookType::Refund => write!(f, "refund"),
            WebhookType::Setup => write!(f, "setup"),
            WebhookType::Unknown => write!(f, "unknown"),
        }
    }
}

/// 支付事件状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentEventStatus {
    /// 待处理
    Pending,
    /// 成功
    Success,
    /// 失败
    Failed,
}

impl fmt::Display for PaymentEventStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PaymentEventStatus::Pending => write!(f, "pending"),
            PaymentEventStatus::Success => write!(f, "success"),
            PaymentEventStatus::Failed => write!(f, "failed"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(1250), "12.50");
        assert_eq!(format_amount(0), "0.00");
        assert_eq!(format_amount(5), "0.05");
        assert_eq!(format_amount(100), "1.00");
        assert_eq!(format_amount(123456789), "1234567.89");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("12.50").unwrap(), 1250);
        assert_eq!(parse_amount("5.00").unwrap(), 500);
        assert_eq!(parse_amount("5").unwrap(), 500);
        assert_eq!(parse_amount(" 0.10 ").unwrap(), 10);
    }

    #[test]
    fn test_parse_amount_rounds_half_away_from_zero() {
        assert_eq!(parse_amount("0.005").unwrap(), 1);
        assert_eq!(parse_amount("0.004").unwrap(), 0);
        assert_eq!(parse_amount("1.015").unwrap(), 102);
        assert_eq!(parse_amount("-0.005").unwrap(), -1);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        assert!(matches!(
            parse_amount("12,50"),
            Err(DomainError::InvalidAmount(_))
        ));
        assert!(matches!(parse_amount(""), Err(DomainError::InvalidAmount(_))));
    }

    #[test]
    fn test_amount_round_trip_full_range() {
        for x in 0..=10_000_000i64 {
            assert_eq!(parse_amount(&format_amount(x)).unwrap(), x);
        }
    }

    #[test]
    fn test_raw_payload_is_verbatim() {
        let body = r#"{"id":"WH-9","event_version":"1.0","resource":{"id":"X","amount":1.10}}"#;
        let raw = RawPayload::from_json(body).unwrap();

        assert_eq!(raw.get(), body);
        assert_eq!(serde_json::to_string(&raw).unwrap(), body);
        assert_eq!(raw.to_value().unwrap()["resource"]["id"], "X");
    }

    #[test]
    fn test_raw_payload_rejects_invalid_json() {
        assert!(matches!(
            RawPayload::from_json("{not json"),
            Err(DomainError::Serialization(_))
        ));
    }

    #[test]
    fn test_currency_case() {
        assert_eq!(normalize_currency("USD"), "usd");
        assert_eq!(provider_currency("eur"), "EUR");
    }
}
