/// HTTP服务配置
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: String,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: std::env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: std::env::var("SERVER_PORT").unwrap_or_else(|_| "3000".to_string()),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
