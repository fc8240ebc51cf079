use crate::error::ClientError;
use crate::json_api::{JsonApi, RawResponse, RequestBody};
use log::info;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::time::Duration;

mod form;
pub mod model;
mod operation;

pub use form::FormFields;
pub use model::*;
pub use operation::Operation;

pub const DEFAULT_BASE_URL: &str = "https://app.alice.ws/cli/v1";

/// Client for the provider's CLI API, bound to one credential
pub struct AliceClient {
    api: JsonApi,
}

impl AliceClient {
    pub fn new(base: &str, token: &str, timeout: Option<Duration>) -> Result<Self, ClientError> {
        if token.trim().is_empty() {
            return Err(ClientError::MissingCredential);
        }
        Ok(Self {
            api: JsonApi::bearer(base, token, timeout)?,
        })
    }

    /// Run an operation and return the full upstream envelope
    pub async fn call<T: DeserializeOwned>(&self, op: Operation) -> Result<Envelope<T>, ClientError> {
        if op.is_write() {
            info!("{} {}", op.method(), op.path());
        }
        self.api.req(op.method(), op.path(), op.body()).await
    }

    /// Run an operation without interpreting the reply status
    pub async fn forward(&self, op: Operation) -> Result<RawResponse, ClientError> {
        self.api.send(op.method(), op.path(), op.body()).await
    }

    /// Send an arbitrary request to the upstream API, used by the proxy endpoints
    pub async fn forward_raw(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<RawResponse, ClientError> {
        self.api.send(method, path, body).await
    }

    /// Like [AliceClient::forward_raw] but a non-2xx reply is an error and the
    /// JSON is returned untouched
    pub async fn relay(
        &self,
        method: Method,
        path: &str,
        body: RequestBody,
    ) -> Result<Value, ClientError> {
        self.api.req(method, path, body).await
    }

    /// Unwrap `data`, an envelope without it is the provider reporting an
    /// error in-band with its own status and message
    async fn data<T: DeserializeOwned>(&self, op: Operation) -> Result<T, ClientError> {
        let envelope = self.call::<Value>(op).await?;
        match envelope.data {
            Some(data) => Ok(decode_record(data)?),
            None => Err(ClientError::Upstream {
                status: u16::try_from(envelope.status).unwrap_or_default(),
                body: envelope.message,
            }),
        }
    }

    async fn message(&self, op: Operation) -> Result<String, ClientError> {
        Ok(self.call::<Value>(op).await?.message)
    }

    pub async fn list_instances(&self) -> Result<Vec<Instance>, ClientError> {
        self.data(Operation::ListInstances).await
    }

    pub async fn deploy_instance(&self, params: DeployParams) -> Result<DeployResponse, ClientError> {
        self.data(Operation::Deploy(params)).await
    }

    /// Returns the upstream message
    pub async fn destroy_instance(&self, id: &str) -> Result<String, ClientError> {
        self.message(Operation::Destroy { id: id.to_string() }).await
    }

    /// Returns the upstream message
    pub async fn power_instance(&self, id: &str, action: PowerAction) -> Result<String, ClientError> {
        self.message(Operation::Power {
            id: id.to_string(),
            action,
        })
        .await
    }

    pub async fn rebuild_instance(&self, params: RebuildParams) -> Result<RebuildResponse, ClientError> {
        self.data(Operation::Rebuild(params)).await
    }

    pub async fn list_plans(&self) -> Result<Vec<Plan>, ClientError> {
        self.data(Operation::ListPlans).await
    }

    pub async fn get_os_by_plan(&self, plan_id: &str) -> Result<Vec<OsGroup>, ClientError> {
        self.data(Operation::OsByPlan {
            plan_id: plan_id.to_string(),
        })
        .await
    }

    pub async fn renew_instance(&self, params: RenewalParams) -> Result<RenewalResponse, ClientError> {
        self.data(Operation::Renew(params)).await
    }

    pub async fn get_instance_state(&self, id: &str) -> Result<StateResponse, ClientError> {
        self.data(Operation::State { id: id.to_string() }).await
    }

    pub async fn list_ssh_keys(&self) -> Result<Vec<SshKey>, ClientError> {
        self.data(Operation::ListSshKeys).await
    }

    pub async fn get_evo_permissions(&self) -> Result<EvoPermissions, ClientError> {
        self.data(Operation::EvoPermissions).await
    }

    pub async fn get_user_info(&self) -> Result<UserInfo, ClientError> {
        self.data(Operation::UserInfo).await
    }

    pub async fn execute_command(
        &self,
        params: ExecuteCommandParams,
    ) -> Result<ExecuteCommandResponse, ClientError> {
        self.data(Operation::ExecuteCommand(params)).await
    }

    pub async fn get_command_result(
        &self,
        params: GetCommandResultParams,
    ) -> Result<CommandResult, ClientError> {
        self.data(Operation::GetCommandResult(params)).await
    }
}
