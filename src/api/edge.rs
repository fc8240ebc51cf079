//! Worker-style surface: the dashboard page, flat legacy routes that wrap the
//! whole upstream reply, and a catch-all forwarder for `/api/<upstream path>`.
//!
//! Every call here uses the proxy timeout.
use crate::alice::{DeployParams, FormFields, Operation, RebuildParams, RenewalParams};
use crate::api::envelope::ApiError;
use crate::api::model::{LegacyIdRequest, LegacyOsRequest, LegacyPowerRequest};
use crate::credential::Credential;
use crate::error::ClientError;
use crate::json_api::{RawResponse, RequestBody};
use crate::settings::Settings;
use reqwest::Method;
use rocket::form::Form;
use rocket::http::Status;
use rocket::response::content::RawHtml;
use rocket::serde::json::Json;
use rocket::{get, post, routes, Route, State};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const DASHBOARD: &str = include_str!("../../static/index.html");

type EdgeResult = Result<(Status, Json<Value>), ApiError>;

pub fn routes() -> Vec<Route> {
    routes![
        dashboard,
        index,
        legacy_instances,
        legacy_deploy,
        legacy_destroy,
        legacy_power,
        legacy_rebuild,
        legacy_plans,
        legacy_os,
        legacy_renew,
        legacy_state,
        legacy_ssh_keys,
        legacy_permissions,
        legacy_user,
        legacy_wrong_method,
        forward_get,
        forward_post_json,
        forward_post_form
    ]
}

#[get("/")]
fn dashboard() -> RawHtml<&'static str> {
    RawHtml(DASHBOARD)
}

#[get("/api")]
fn index() -> Json<Value> {
    Json(json!({
        "message": "Alice.ws API Proxy",
        "endpoints": {
            "GET /instances": "列出所有实例",
            "POST /deploy": "部署新实例 (需要: product_id, os_id, time, sshKey?, bootScript?)",
            "POST /destroy": "销毁实例 (需要: id)",
            "POST /power": "电源操作 (需要: id, action)",
            "POST /rebuild": "重建实例 (需要: id, os, sshKey?, bootScript?)",
            "GET /plans": "列出所有方案",
            "POST /os": "根据方案获取 OS (需要: plan_id)",
            "POST /renew": "续订实例 (需要: id, time)",
            "POST /state": "获取实例状态 (需要: id)",
            "GET /sshkeys": "列出 SSH 密钥",
            "GET /permissions": "获取 EVO 权限",
            "GET /user": "获取用户信息",
            "GET|POST /api/<path>": "转发到上游 API, 例如 /api/Evo/Instance",
            "POST /api/proxy": "代理请求 (需要: endpoint, method?, body?, token?)"
        },
        "authentication": "在 Authorization 头中提供 Bearer Token 或使用 ?token= 查询参数"
    }))
}

/// Run one operation and wrap the whole upstream reply
async fn legacy(
    settings: &Settings,
    auth: Credential,
    token: Option<&str>,
    op: Operation,
) -> EdgeResult {
    let client = settings.api.proxy_client(auth.or(token))?;
    wrap(client.forward(op).await?)
}

fn wrap(rsp: RawResponse) -> EdgeResult {
    let data: Value = serde_json::from_str(&rsp.text).map_err(ClientError::from)?;
    let status = rsp.status.as_u16();
    if status >= 400 {
        Ok((
            Status::new(status),
            Json(json!({
                "success": false,
                "status": status,
                "error": format!("API 错误：状态码 {}", status),
                "data": data
            })),
        ))
    } else {
        Ok((
            Status::Ok,
            Json(json!({
                "success": true,
                "status": status,
                "data": data
            })),
        ))
    }
}

#[get("/instances?<token>")]
async fn legacy_instances(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
) -> EdgeResult {
    legacy(settings, auth, token, Operation::ListInstances).await
}

#[post("/deploy?<token>", data = "<req>")]
async fn legacy_deploy(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
    req: Json<DeployParams>,
) -> EdgeResult {
    legacy(settings, auth, token, Operation::Deploy(req.into_inner())).await
}

#[post("/destroy?<token>", data = "<req>")]
async fn legacy_destroy(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
    req: Json<LegacyIdRequest>,
) -> EdgeResult {
    let id = req.into_inner().id;
    legacy(settings, auth, token, Operation::Destroy { id }).await
}

#[post("/power?<token>", data = "<req>")]
async fn legacy_power(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
    req: Json<LegacyPowerRequest>,
) -> EdgeResult {
    let LegacyPowerRequest { id, action } = req.into_inner();
    legacy(settings, auth, token, Operation::Power { id, action }).await
}

#[post("/rebuild?<token>", data = "<req>")]
async fn legacy_rebuild(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
    req: Json<RebuildParams>,
) -> EdgeResult {
    legacy(settings, auth, token, Operation::Rebuild(req.into_inner())).await
}

#[get("/plans?<token>")]
async fn legacy_plans(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
) -> EdgeResult {
    legacy(settings, auth, token, Operation::ListPlans).await
}

#[post("/os?<token>", data = "<req>")]
async fn legacy_os(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
    req: Json<LegacyOsRequest>,
) -> EdgeResult {
    let plan_id = req.into_inner().plan_id;
    legacy(settings, auth, token, Operation::OsByPlan { plan_id }).await
}

#[post("/renew?<token>", data = "<req>")]
async fn legacy_renew(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
    req: Json<RenewalParams>,
) -> EdgeResult {
    legacy(settings, auth, token, Operation::Renew(req.into_inner())).await
}

#[post("/state?<token>", data = "<req>")]
async fn legacy_state(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
    req: Json<LegacyIdRequest>,
) -> EdgeResult {
    let id = req.into_inner().id;
    legacy(settings, auth, token, Operation::State { id }).await
}

#[get("/sshkeys?<token>")]
async fn legacy_ssh_keys(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
) -> EdgeResult {
    legacy(settings, auth, token, Operation::ListSshKeys).await
}

#[get("/permissions?<token>")]
async fn legacy_permissions(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
) -> EdgeResult {
    legacy(settings, auth, token, Operation::EvoPermissions).await
}

#[get("/user?<token>")]
async fn legacy_user(
    auth: Credential,
    settings: &State<Settings>,
    token: Option<&str>,
) -> EdgeResult {
    legacy(settings, auth, token, Operation::UserInfo).await
}

/// GET on one of the POST-only legacy routes
#[get("/<route>", rank = 50)]
fn legacy_wrong_method(route: &str) -> ApiError {
    match route {
        "deploy" | "destroy" | "power" | "rebuild" | "os" | "renew" | "state" => {
            ApiError::new(Status::MethodNotAllowed, "方法不允许")
        }
        _ => ApiError::new(Status::NotFound, "未找到端点"),
    }
}

/// Upstream path from the segments after `/api`
fn upstream_path(path: &Path) -> String {
    let segments: Vec<&str> = path.iter().filter_map(|s| s.to_str()).collect();
    format!("/{}", segments.join("/"))
}

/// Relay the upstream status and JSON body untouched
async fn forward(
    settings: &Settings,
    auth: Credential,
    method: Method,
    path: &Path,
    body: RequestBody,
) -> EdgeResult {
    let client = settings.api.proxy_client(auth)?;
    let rsp = client.forward_raw(method, &upstream_path(path), body).await?;
    let data: Value = serde_json::from_str(&rsp.text).map_err(ClientError::from)?;
    Ok((Status::new(rsp.status.as_u16()), Json(data)))
}

#[get("/api/<path..>", rank = 20)]
async fn forward_get(auth: Credential, settings: &State<Settings>, path: PathBuf) -> EdgeResult {
    forward(settings, auth, Method::GET, &path, RequestBody::Empty).await
}

#[post("/api/<path..>", rank = 20, format = "json", data = "<body>")]
async fn forward_post_json(
    auth: Credential,
    settings: &State<Settings>,
    path: PathBuf,
    body: Json<Value>,
) -> EdgeResult {
    forward(settings, auth, Method::POST, &path, RequestBody::Json(body.into_inner())).await
}

/// Form and multipart bodies are re-sent as multipart
#[post("/api/<path..>", rank = 21, data = "<body>")]
async fn forward_post_form(
    auth: Credential,
    settings: &State<Settings>,
    path: PathBuf,
    body: Form<HashMap<String, String>>,
) -> EdgeResult {
    let form = FormFields::from_pairs(body.iter().map(|(k, v)| (k.as_str(), v.as_str())));
    forward(settings, auth, Method::POST, &path, RequestBody::Form(form)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::tests::{client_for, settings_for};
    use rocket::http::{ContentType, Header};
    use std::time::Duration;
    use wiremock::matchers::{body_json, body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const AUTH: &str = "Bearer cid:secret";

    #[test]
    fn test_upstream_path() {
        assert_eq!(upstream_path(Path::new("Evo/Instance")), "/Evo/Instance");
        assert_eq!(upstream_path(Path::new("User")), "/User");
    }

    #[tokio::test]
    async fn test_dashboard_and_index() {
        let server = MockServer::start().await;
        let client = client_for(settings_for(&server)).await;
        let rsp = client.get("/").dispatch().await;
        assert_eq!(rsp.status(), Status::Ok);
        assert_eq!(rsp.content_type(), Some(ContentType::HTML));
        assert!(rsp.into_string().await.unwrap().contains("alice_api_token"));

        let rsp = client.get("/api").dispatch().await;
        let body: Value = rsp.into_json().await.unwrap();
        assert!(body["endpoints"]["POST /power"].is_string());
    }

    #[tokio::test]
    async fn test_legacy_wraps_whole_reply() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cli/v1/Evo/Plan"))
            .and(header("Authorization", "Bearer query-token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "message": "ok",
                "data": [{"id": 3, "name": "SLC.Evo.Micro", "stock": 2}]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(settings_for(&server)).await;
        let rsp = client.get("/plans?token=query-token").dispatch().await;
        assert_eq!(rsp.status(), Status::Ok);
        let body: Value = rsp.into_json().await.unwrap();
        assert_eq!(body["success"], true);
        assert_eq!(body["status"], 200);
        assert_eq!(body["data"]["message"], "ok");
        assert_eq!(body["data"]["data"][0]["name"], "SLC.Evo.Micro");
    }

    #[tokio::test]
    async fn test_legacy_power_with_numeric_id() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cli/v1/Evo/Power"))
            .and(header("Authorization", AUTH))
            .and(body_string_contains("name=\"id\"\r\n\r\n42"))
            .and(body_string_contains("name=\"action\"\r\n\r\nshutdown"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "message": "Shutting down"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(settings_for(&server)).await;
        let rsp = client
            .post("/power")
            .header(ContentType::JSON)
            .header(Header::new("Authorization", AUTH))
            .body(r#"{"id":42,"action":"shutdown"}"#)
            .dispatch()
            .await;
        assert_eq!(rsp.status(), Status::Ok);
        let body: Value = rsp.into_json().await.unwrap();
        assert_eq!(body["data"]["message"], "Shutting down");
    }

    #[tokio::test]
    async fn test_legacy_upstream_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cli/v1/Evo/Destroy"))
            .respond_with(
                ResponseTemplate::new(403).set_body_json(json!({"status": 403, "message": "denied"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(settings_for(&server)).await;
        let rsp = client
            .post("/destroy")
            .header(ContentType::JSON)
            .header(Header::new("Authorization", AUTH))
            .body(r#"{"id":"42"}"#)
            .dispatch()
            .await;
        assert_eq!(rsp.status(), Status::Forbidden);
        let body: Value = rsp.into_json().await.unwrap();
        assert_eq!(
            body,
            json!({
                "success": false,
                "status": 403,
                "error": "API 错误：状态码 403",
                "data": {"status": 403, "message": "denied"}
            })
        );
    }

    #[tokio::test]
    async fn test_legacy_without_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = client_for(settings_for(&server)).await;
        let calls = [
            ("/renew", r#"{"id":"42","time":"24"}"#),
            ("/deploy", r#"{"product_id":"3","os_id":"1","time":"24"}"#),
            ("/destroy", r#"{"id":"42"}"#),
            ("/power", r#"{"id":"42","action":"shutdown"}"#),
            ("/rebuild", r#"{"id":"42","os":"1"}"#),
        ];
        for (uri, body) in calls {
            let rsp = client
                .post(uri)
                .header(ContentType::JSON)
                .body(body)
                .dispatch()
                .await;
            assert_eq!(rsp.status(), Status::Unauthorized, "{}", uri);
            let body: Value = rsp.into_json().await.unwrap();
            assert_eq!(body["success"], false, "{}", uri);
            assert_eq!(body["error"], "API Token 未提供", "{}", uri);
        }
    }

    #[tokio::test]
    async fn test_get_on_post_route() {
        let server = MockServer::start().await;
        let client = client_for(settings_for(&server)).await;
        let rsp = client.get("/deploy?token=t").dispatch().await;
        assert_eq!(rsp.status(), Status::MethodNotAllowed);
        let body: Value = rsp.into_json().await.unwrap();
        assert_eq!(body["error"], "方法不允许");

        let rsp = client.get("/nothing").dispatch().await;
        assert_eq!(rsp.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn test_legacy_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(3)),
            )
            .mount(&server)
            .await;

        let mut settings = settings_for(&server);
        settings.api.proxy_timeout = 1;
        let client = client_for(settings).await;
        let rsp = client
            .get("/instances")
            .header(Header::new("Authorization", AUTH))
            .dispatch()
            .await;
        assert_eq!(rsp.status(), Status::InternalServerError);
        let body: Value = rsp.into_json().await.unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "请求超时，请检查网络连接");
    }

    #[tokio::test]
    async fn test_forward_relays_status() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/cli/v1/Evo/Instance"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"message": "bad token"})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(settings_for(&server)).await;
        let rsp = client
            .get("/api/Evo/Instance")
            .header(Header::new("Authorization", AUTH))
            .dispatch()
            .await;
        assert_eq!(rsp.status(), Status::Unauthorized);
        let body: Value = rsp.into_json().await.unwrap();
        assert_eq!(body, json!({"message": "bad token"}));
    }

    #[tokio::test]
    async fn test_forward_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cli/v1/Evo/State"))
            .and(header("Content-Type", "application/json"))
            .and(body_json(json!({"id": "42"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(settings_for(&server)).await;
        let rsp = client
            .post("/api/Evo/State")
            .header(ContentType::JSON)
            .header(Header::new("Authorization", AUTH))
            .body(r#"{"id":"42"}"#)
            .dispatch()
            .await;
        assert_eq!(rsp.status(), Status::Ok);
    }

    #[tokio::test]
    async fn test_forward_form_body_as_multipart() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/cli/v1/Evo/getOSByPlan"))
            .and(body_string_contains("name=\"plan_id\"\r\n\r\n3"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": 200, "data": []})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(settings_for(&server)).await;
        let rsp = client
            .post("/api/Evo/getOSByPlan")
            .header(ContentType::Form)
            .header(Header::new("Authorization", AUTH))
            .body("plan_id=3")
            .dispatch()
            .await;
        assert_eq!(rsp.status(), Status::Ok);
        let requests = server.received_requests().await.unwrap();
        let ct = requests[0]
            .headers
            .get("content-type")
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        assert!(ct.starts_with("multipart/form-data"));
    }
}
