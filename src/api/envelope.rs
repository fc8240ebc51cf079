use crate::error::ClientError;
use log::warn;
use rocket::http::Status;
use rocket::response::Responder;
use rocket::serde::json::Json;
use rocket::{catch, response, Request};
use serde::{Deserialize, Serialize};

pub type ApiResult<T> = Result<Json<ApiData<T>>, ApiError>;

/// Success envelope, carries either `data` or `message` depending on the endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiData<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiData<T> {
    pub fn ok(data: T) -> ApiResult<T> {
        Ok(Json(ApiData {
            success: true,
            data: Some(data),
            message: None,
        }))
    }
}

impl ApiData<()> {
    pub fn message(msg: String) -> ApiResult<()> {
        Ok(Json(ApiData {
            success: true,
            data: None,
            message: Some(msg),
        }))
    }
}

/// Failure envelope `{success:false, error}`
#[derive(Debug, Serialize)]
pub struct ApiError {
    #[serde(skip)]
    pub status: Status,
    pub success: bool,
    pub error: String,
}

impl ApiError {
    pub fn new(status: Status, error: impl ToString) -> Self {
        Self {
            status,
            success: false,
            error: error.to_string(),
        }
    }
}

impl From<ClientError> for ApiError {
    fn from(value: ClientError) -> Self {
        Self::new(Status::new(value.status_code()), value)
    }
}

impl<'r> Responder<'r, 'static> for ApiError {
    fn respond_to(self, request: &'r Request<'_>) -> response::Result<'static> {
        warn!(
            "{} {} failed ({}): {}",
            request.method(),
            request.uri().path(),
            self.status.code,
            self.error
        );
        let status = self.status;
        (status, Json(self)).respond_to(request)
    }
}

/// Errors raised by the framework itself (unknown route, bad body) use the same envelope
#[catch(default)]
pub fn default_catcher(status: Status, _req: &Request) -> ApiError {
    let error = match status.code {
        404 => "未找到端点",
        _ => status.reason().unwrap_or("请求失败"),
    };
    ApiError::new(status, error)
}
