use crate::domain::RawPayload;
use crate::domain::errors::{DomainError, DomainResult};
use crate::infrastructure::adapters::paypal_models::AccessTokenResponse;
use crate::infrastructure::config::PayPalConfig;
use reqwest::Client;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;

/// 渠道原始响应：状态码 + 响应体，不做解释
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub status: u16,
    pub body: String,
}

impl ProviderResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// 非2xx时转换为渠道拒绝错误
    pub fn error_for_status(self, operation: &'static str, reference: &str) -> DomainResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(DomainError::rejected(
                operation,
                reference,
                Some(self.status),
                self.body,
            ))
        }
    }

    /// 解析为结构体，同时原样保留响应体
    pub fn parse<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        reference: &str,
    ) -> DomainResult<(T, RawPayload)> {
        let raw = RawPayload::from_json(self.body.as_str()).map_err(|e| {
            DomainError::rejected(
                operation,
                reference,
                Some(self.status),
                format!("unparseable body ({}): {}", e, self.body),
            )
        })?;
        let parsed = serde_json::from_str(raw.get()).map_err(|e| {
            DomainError::rejected(
                operation,
                reference,
                Some(self.status),
                format!("unexpected body ({}): {}", e, self.body),
            )
        })?;
        Ok((parsed, raw))
    }
}

/// PayPal HTTP客户端
///
/// 构造时获取一次access token，之后不自动刷新；token过期后请求会直接失败。
#[derive(Clone)]
pub struct PayPalClient {
    http: Client,
    api_base: String,
    access_token: String,
}

impl PayPalClient {
    /// OAuth2 client-credentials 认证
    pub async fn authenticate(config: &PayPalConfig) -> DomainResult<Self> {
        let http = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| DomainError::Configuration(format!("HTTP client: {}", e)))?;

        let url = format!("{}/v1/oauth2/token", config.api_base);
        debug!("Requesting PayPal access token from {}", url);

        let response = http
            .post(&url)
            .basic_auth(&config.client_id, Some(&config.client_secret))
            .header("Accept", "application/json")
            .form(&[("grant_type", "client_credentials")])
            .send()
            .await
            .map_err(|e| DomainError::Authentication(format!("token endpoint unreachable: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::Authentication(format!("token response unreadable: {}", e)))?;

        if !status.is_success() {
            return Err(DomainError::Authentication(format!(
                "token endpoint returned {}: {}",
                status, body
            )));
        }

        let access_token = serde_json::from_str::<AccessTokenResponse>(&body)
            .ok()
            .and_then(|token| token.access_token)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| {
                DomainError::Authentication("token endpoint returned no access_token".to_string())
            })?;

        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            access_token,
        })
    }

    /// 带bearer token的JSON POST
    pub async fn post_json<B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
        request_id: &str,
        operation: &'static str,
        reference: &str,
    ) -> DomainResult<ProviderResponse> {
        let url = format!("{}{}", self.api_base, path);
        debug!("PayPal {} POST {}", operation, path);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.access_token)
            .header("Content-Type", "application/json")
            .header("Accept", "application/json")
            .header("Prefer", "return=representation")
            .header("PayPal-Request-Id", request_id)
            .json(body)
            .send()
            .await
            .map_err(|e| DomainError::transport(operation, reference, e))?;

        Self::read(response, operation, reference).await
    }

    /// 带bearer token的GET
    pub async fn get(
        &self,
        path: &str,
        operation: &'static str,
        reference: &str,
    ) -> DomainResult<ProviderResponse> {
        let url = format!("{}{}", self.api_base, path);
        debug!("PayPal {} GET {}", operation, path);

        let response = self
            .http
            .get(&url)
            .bearer_auth(&self.access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| DomainError::transport(operation, reference, e))?;

        Self::read(response, operation, reference).await
    }

    async fn read(
        response: reqwest::Response,
        operation: &'static str,
        reference: &str,
    ) -> DomainResult<ProviderResponse> {
        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|e| DomainError::transport(operation, reference, e))?;
        debug!("PayPal {} responded {}", operation, status);

        Ok(ProviderResponse { status, body })
    }
}
