use crate::alice::PowerAction;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PowerRequest {
    pub action: PowerAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RebuildRequest {
    #[serde(deserialize_with = "id_string")]
    pub os: String,
    #[serde(rename = "sshKey", default, deserialize_with = "opt_id_string")]
    pub ssh_key: Option<String>,
    #[serde(rename = "bootScript", default)]
    pub boot_script: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenewRequest {
    #[serde(deserialize_with = "id_string")]
    pub time: String,
}

/// Body of `POST /api/proxy`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyRequest {
    /// Upstream path, e.g. `/Evo/Instance`
    pub endpoint: String,
    #[serde(default)]
    pub method: Option<String>,
    /// Sent as form fields when the method is POST
    #[serde(default)]
    pub body: Option<Map<String, Value>>,
    #[serde(default)]
    pub token: Option<String>,
}

/// Body of the legacy routes that only need an instance id
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyIdRequest {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyPowerRequest {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    pub action: PowerAction,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyOsRequest {
    #[serde(deserialize_with = "id_string")]
    pub plan_id: String,
}

fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    opt_id_string(d)?.ok_or_else(|| serde::de::Error::custom("value is required"))
}

fn opt_id_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(d)? {
        Some(Value::String(s)) if !s.is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
