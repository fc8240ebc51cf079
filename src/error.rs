use thiserror::Error;

/// Failures raised while talking to the upstream API.
///
/// Every variant is terminal for the request that produced it, nothing is retried.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("API Token 未提供")]
    MissingCredential,

    #[error("API Token 格式无效")]
    InvalidCredential,

    #[error("无效的端点: {0}")]
    InvalidEndpoint(String),

    #[error("API 错误：状态码 {status}, 响应体: {body}")]
    Upstream { status: u16, body: String },

    #[error("请求超时，请检查网络连接")]
    Timeout,

    #[error("网络请求失败: {0}")]
    Transport(reqwest::Error),

    #[error("解析响应失败: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    /// HTTP status this error is surfaced with at a handler boundary
    pub fn status_code(&self) -> u16 {
        match self {
            ClientError::MissingCredential | ClientError::InvalidCredential => 401,
            ClientError::InvalidEndpoint(_) => 400,
            ClientError::Upstream { status, .. } if *status >= 400 => *status,
            _ => 500,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(value: reqwest::Error) -> Self {
        if value.is_timeout() {
            ClientError::Timeout
        } else {
            ClientError::Transport(value)
        }
    }
}
