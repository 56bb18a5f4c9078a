use std::fmt;
use thiserror::Error;

/// 网关调用失败的具体原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallFailure {
    /// 网络层错误（连接失败、超时等）
    Transport(String),
    /// 支付渠道拒绝：非2xx响应，或响应成功但语义失败（如capture状态不是COMPLETED）
    Rejected { status: Option<u16>, body: String },
}

impl fmt::Display for CallFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallFailure::Transport(message) => write!(f, "transport error: {}", message),
            CallFailure::Rejected {
                status: Some(status),
                body,
            } => write!(f, "provider returned {}: {}", status, body),
            CallFailure::Rejected { status: None, body } => {
                write!(f, "provider rejected request: {}", body)
            }
        }
    }
}

/// 领域层错误类型
#[derive(Error, Debug)]
pub enum DomainError {
    /// 配置错误（缺少凭证等），构造时抛出
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 获取access token失败
    #[error("Authentication failed: {0}")]
    Authentication(String),

    /// 网关调用失败，包含操作名、相关ID和渠道原始错误
    #[error("Gateway call `{operation}` failed for {reference}: {failure}")]
    GatewayCall {
        operation: &'static str,
        reference: String,
        failure: CallFailure,
    },

    /// Webhook验签失败
    #[error("Webhook verification failed: {0}")]
    WebhookVerification(String),

    /// 金额无效
    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    /// 验证错误
    #[error("Validation error: {0}")]
    Validation(String),

    /// 序列化错误
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl DomainError {
    pub fn transport(
        operation: &'static str,
        reference: impl Into<String>,
        err: impl fmt::Display,
    ) -> Self {
        DomainError::GatewayCall {
            operation,
            reference: reference.into(),
            failure: CallFailure::Transport(err.to_string()),
        }
    }

    pub fn rejected(
        operation: &'static str,
        reference: impl Into<String>,
        status: Option<u16>,
        body: impl Into<String>,
    ) -> Self {
        DomainError::GatewayCall {
            operation,
            reference: reference.into(),
            failure: CallFailure::Rejected {
                status,
                body: body.into(),
            },
        }
    }

    /// 是否属于"网关调用失败"类别
    pub fn is_gateway_call(&self) -> bool {
        matches!(self, DomainError::GatewayCall { .. })
    }
}

/// 领域结果类型
pub type DomainResult<T> = Result<T, DomainError>;
