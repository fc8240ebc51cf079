use crate::alice::{AliceClient, DEFAULT_BASE_URL};
use crate::credential::Credential;
use crate::error::ClientError;
use anyhow::Result;
use config::{Config, File, Source};
use serde::{Deserialize, Serialize};
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

pub const ENV_BASE_URL: &str = "ALICE_API_BASE_URL";
pub const ENV_TOKEN: &str = "ALICE_API_TOKEN";

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct Settings {
    /// Listen address for http server
    pub listen: Option<String>,

    /// Upstream API configuration
    #[serde(default)]
    pub api: ApiConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "kebab-case")]
pub struct ApiConfig {
    /// Base URL of the provider API, upstream paths are appended to it
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Fallback credential used when a caller presents none, for local use only
    pub token: Option<String>,

    /// Timeout in seconds for the REST routes, unset means no timeout
    pub timeout: Option<u64>,

    /// Timeout in seconds for the worker-style routes and the generic proxy
    #[serde(default = "default_proxy_timeout")]
    pub proxy_timeout: u64,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_proxy_timeout() -> u64 {
    30
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            token: None,
            timeout: None,
            proxy_timeout: default_proxy_timeout(),
        }
    }
}

impl Settings {
    /// Load from a yaml file (missing file is fine) with environment overrides
    pub fn load(path: Option<PathBuf>) -> Result<Self> {
        let file = File::from(path.unwrap_or(PathBuf::from("config.yaml"))).required(false);
        Self::load_from(file, |k| std::env::var(k).ok())
    }

    pub fn load_from<S>(source: S, env: impl Fn(&str) -> Option<String>) -> Result<Self>
    where
        S: Source + Send + Sync + 'static,
    {
        let settings = Config::builder()
            .add_source(source)
            .set_override_option("api.base-url", env(ENV_BASE_URL).filter(|v| !v.is_empty()))?
            .set_override_option("api.token", env(ENV_TOKEN).filter(|v| !v.is_empty()))?
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        Ok(match &self.listen {
            Some(i) => i.parse()?,
            None => SocketAddr::new(IpAddr::from([0, 0, 0, 0]), 8000),
        })
    }
}

impl ApiConfig {
    /// Client for the REST routes
    pub fn client(&self, credential: Credential) -> Result<AliceClient, ClientError> {
        self.client_with_timeout(credential, self.timeout.map(Duration::from_secs))
    }

    /// Client for the worker-style routes and the generic proxy
    pub fn proxy_client(&self, credential: Credential) -> Result<AliceClient, ClientError> {
        self.client_with_timeout(credential, Some(Duration::from_secs(self.proxy_timeout)))
    }

    fn client_with_timeout(
        &self,
        credential: Credential,
        timeout: Option<Duration>,
    ) -> Result<AliceClient, ClientError> {
        let token = credential.resolve(self.token.as_deref())?;
        AliceClient::new(&self.base_url, &token, timeout)
    }
}
