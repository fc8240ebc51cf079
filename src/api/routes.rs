use crate::alice::{
    CommandResult, DeployParams, DeployResponse, EvoPermissions, ExecuteCommandParams,
    ExecuteCommandResponse, FormFields, GetCommandResultParams, Instance, OsGroup, Plan,
    RebuildParams, RebuildResponse, RenewalParams, RenewalResponse, SshKey, StateResponse,
    UserInfo,
};
use crate::api::envelope::{ApiData, ApiError, ApiResult};
use crate::api::model::{PowerRequest, ProxyRequest, RebuildRequest, RenewRequest};
use crate::credential::Credential;
use crate::json_api::RequestBody;
use crate::settings::Settings;
use reqwest::Method;
use rocket::http::Status;
use rocket::serde::json::Json;
use rocket::{delete, get, post, routes, Route, State};
use serde_json::Value;

pub fn routes() -> Vec<Route> {
    routes![
        v1_list_instances,
        v1_deploy_instance,
        v1_destroy_instance,
        v1_power_instance,
        v1_rebuild_instance,
        v1_renew_instance,
        v1_instance_state,
        v1_list_plans,
        v1_plan_os,
        v1_user_info,
        v1_list_ssh_keys,
        v1_permissions,
        v1_execute_command,
        v1_command_result,
        v1_proxy
    ]
}

/// List all instances
#[get("/api/instances")]
async fn v1_list_instances(
    auth: Credential,
    settings: &State<Settings>,
) -> ApiResult<Vec<Instance>> {
    let client = settings.api.client(auth)?;
    ApiData::ok(client.list_instances().await?)
}

/// Deploy a new instance
#[post("/api/instances", data = "<req>")]
async fn v1_deploy_instance(
    auth: Credential,
    settings: &State<Settings>,
    req: Json<DeployParams>,
) -> ApiResult<DeployResponse> {
    let client = settings.api.client(auth)?;
    ApiData::ok(client.deploy_instance(req.into_inner()).await?)
}

/// Destroy an instance
#[delete("/api/instances/<id>")]
async fn v1_destroy_instance(
    auth: Credential,
    settings: &State<Settings>,
    id: &str,
) -> ApiResult<()> {
    let client = settings.api.client(auth)?;
    ApiData::message(client.destroy_instance(id).await?)
}

#[post("/api/instances/<id>/power", data = "<req>")]
async fn v1_power_instance(
    auth: Credential,
    settings: &State<Settings>,
    id: &str,
    req: Json<PowerRequest>,
) -> ApiResult<()> {
    let client = settings.api.client(auth)?;
    ApiData::message(client.power_instance(id, req.action).await?)
}

/// Reinstall an instance, the upstream wipes the disk
#[post("/api/instances/<id>/rebuild", data = "<req>")]
async fn v1_rebuild_instance(
    auth: Credential,
    settings: &State<Settings>,
    id: &str,
    req: Json<RebuildRequest>,
) -> ApiResult<RebuildResponse> {
    let client = settings.api.client(auth)?;
    let req = req.into_inner();
    ApiData::ok(
        client
            .rebuild_instance(RebuildParams {
                id: id.to_string(),
                os: req.os,
                ssh_key: req.ssh_key,
                boot_script: req.boot_script,
            })
            .await?,
    )
}

#[post("/api/instances/<id>/renew", data = "<req>")]
async fn v1_renew_instance(
    auth: Credential,
    settings: &State<Settings>,
    id: &str,
    req: Json<RenewRequest>,
) -> ApiResult<RenewalResponse> {
    let client = settings.api.client(auth)?;
    ApiData::ok(
        client
            .renew_instance(RenewalParams {
                id: id.to_string(),
                time: req.into_inner().time,
            })
            .await?,
    )
}

#[get("/api/instances/<id>/state")]
async fn v1_instance_state(
    auth: Credential,
    settings: &State<Settings>,
    id: &str,
) -> ApiResult<StateResponse> {
    let client = settings.api.client(auth)?;
    ApiData::ok(client.get_instance_state(id).await?)
}

/// List plans with their stock
#[get("/api/plans")]
async fn v1_list_plans(auth: Credential, settings: &State<Settings>) -> ApiResult<Vec<Plan>> {
    let client = settings.api.client(auth)?;
    ApiData::ok(client.list_plans().await?)
}

#[get("/api/plans/<id>/os")]
async fn v1_plan_os(
    auth: Credential,
    settings: &State<Settings>,
    id: &str,
) -> ApiResult<Vec<OsGroup>> {
    let client = settings.api.client(auth)?;
    ApiData::ok(client.get_os_by_plan(id).await?)
}

#[get("/api/user/info")]
async fn v1_user_info(auth: Credential, settings: &State<Settings>) -> ApiResult<UserInfo> {
    let client = settings.api.client(auth)?;
    ApiData::ok(client.get_user_info().await?)
}

#[get("/api/user/sshkeys")]
async fn v1_list_ssh_keys(auth: Credential, settings: &State<Settings>) -> ApiResult<Vec<SshKey>> {
    let client = settings.api.client(auth)?;
    ApiData::ok(client.list_ssh_keys().await?)
}

#[get("/api/user/permissions")]
async fn v1_permissions(
    auth: Credential,
    settings: &State<Settings>,
) -> ApiResult<EvoPermissions> {
    let client = settings.api.client(auth)?;
    ApiData::ok(client.get_evo_permissions().await?)
}

/// Start a command on an instance, poll [v1_command_result] for the output
#[post("/api/command/execute", data = "<req>")]
async fn v1_execute_command(
    auth: Credential,
    settings: &State<Settings>,
    req: Json<ExecuteCommandParams>,
) -> ApiResult<ExecuteCommandResponse> {
    let client = settings.api.client(auth)?;
    ApiData::ok(client.execute_command(req.into_inner()).await?)
}

#[post("/api/command/result", data = "<req>")]
async fn v1_command_result(
    auth: Credential,
    settings: &State<Settings>,
    req: Json<GetCommandResultParams>,
) -> ApiResult<CommandResult> {
    let client = settings.api.client(auth)?;
    ApiData::ok(client.get_command_result(req.into_inner()).await?)
}

/// Forward an arbitrary upstream call and return its JSON as-is
#[post("/api/proxy", data = "<req>")]
async fn v1_proxy(
    auth: Credential,
    settings: &State<Settings>,
    req: Json<ProxyRequest>,
) -> Result<Json<Value>, ApiError> {
    let req = req.into_inner();
    let client = settings.api.proxy_client(auth.or(req.token.as_deref()))?;
    let method = match req.method.as_deref().map(str::to_uppercase).as_deref() {
        None | Some("GET") => Method::GET,
        Some("POST") => Method::POST,
        Some(m) => {
            return Err(ApiError::new(
                Status::BadRequest,
                format!("不支持的请求方法: {}", m),
            ))
        }
    };
    let body = match (&method, req.body) {
        (&Method::POST, Some(b)) => RequestBody::Form(FormFields::from_json(&b)),
        _ => RequestBody::Empty,
    };
    Ok(Json(client.relay(method, &req.endpoint, body).await?))
}
