use crate::alice::FormFields;
use crate::error::ClientError;
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use reqwest::{Client, Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

/// Outbound request body
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Sent as multipart/form-data
    Form(FormFields),
    Json(Value),
}

/// Raw upstream reply, status is not interpreted
#[derive(Debug, Clone)]
pub struct RawResponse {
    pub status: StatusCode,
    pub text: String,
}

pub struct JsonApi {
    pub client: Client,
    pub base: String,
}

impl JsonApi {
    /// Client authenticated with `Authorization: Bearer <token>` on every call
    pub fn bearer(base: &str, token: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        let mut headers = HeaderMap::new();
        let value = HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ClientError::InvalidCredential)?;
        headers.insert(AUTHORIZATION, value);

        let mut builder = Client::builder().default_headers(headers);
        if let Some(t) = timeout {
            builder = builder.timeout(t);
        }
        Ok(Self {
            client: builder.build()?,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Upstream paths are appended to the base, `Url::join` would drop the
    /// base path (`/cli/v1`).
    fn url(&self, path: &str) -> Result<Url, ClientError> {
        if !path.starts_with('/') {
            return Err(ClientError::InvalidEndpoint(path.to_string()));
        }
        Url::parse(&format!("{}{}", self.base, path))
            .map_err(|_| ClientError::InvalidEndpoint(path.to_string()))
    }

    /// Issue exactly one call and return whatever came back
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<RawResponse, ClientError> {
        debug!(">> {} {}", method, path);
        let mut req = self.client.request(method, self.url(path)?);
        req = match body {
            RequestBody::Empty => req,
            RequestBody::Form(f) => req.multipart(f.into_multipart()),
            RequestBody::Json(v) => req
                .header("Content-Type", "application/json")
                .body(serde_json::to_string(&v)?),
        };
        let rsp = req.send().await?;
        let status = rsp.status();
        let text = rsp.text().await?;
        #[cfg(debug_assertions)]
        debug!("<< {} {}", status, text);
        Ok(RawResponse { status, text })
    }

    /// Like [JsonApi::send] but non-2xx replies become [ClientError::Upstream]
    pub async fn req<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<T, ClientError> {
        let rsp = self.send(method, path, body).await?;
        if rsp.status.is_success() {
            Ok(serde_json::from_str(&rsp.text)?)
        } else {
            Err(ClientError::Upstream {
                status: rsp.status.as_u16(),
                body: rsp.text,
            })
        }
    }
}
