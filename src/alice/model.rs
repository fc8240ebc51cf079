use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt::{Display, Formatter};

/// Ids and durations coming from a browser may be JSON numbers
fn string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    match Value::deserialize(d)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    match Option::<Value>::deserialize(d)? {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s)),
        Some(Value::Number(n)) => Ok(Some(n.to_string())),
        Some(other) => Err(serde::de::Error::custom(format!(
            "expected string or number, got {}",
            other
        ))),
    }
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

/// Decode an upstream record, `null` members read as if they were absent.
///
/// Records only declare the fields something here reads, the rest lands in
/// their `extra` map and is serialized back out unchanged.
pub fn decode_record<T: DeserializeOwned>(mut value: Value) -> Result<T, serde_json::Error> {
    drop_null_members(&mut value);
    serde_json::from_value(value)
}

fn drop_null_members(value: &mut Value) {
    match value {
        Value::Object(m) => {
            m.retain(|_, v| !v.is_null());
            m.values_mut().for_each(drop_null_members);
        }
        Value::Array(a) => a.iter_mut().for_each(drop_null_members),
        _ => {}
    }
}

/// Raw reply shape of every upstream endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    #[serde(default, deserialize_with = "null_as_default")]
    pub status: i64,
    #[serde(default, deserialize_with = "null_as_default")]
    pub message: String,
    pub data: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum InstanceStatus {
    Running,
    Stopped,
    Other(String),
}

impl Default for InstanceStatus {
    fn default() -> Self {
        InstanceStatus::Other(String::new())
    }
}

impl From<String> for InstanceStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "running" => InstanceStatus::Running,
            "stopped" => InstanceStatus::Stopped,
            _ => InstanceStatus::Other(value),
        }
    }
}

impl From<InstanceStatus> for String {
    fn from(value: InstanceStatus) -> Self {
        value.to_string()
    }
}

impl Display for InstanceStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            InstanceStatus::Running => write!(f, "running"),
            InstanceStatus::Stopped => write!(f, "stopped"),
            InstanceStatus::Other(s) => write!(f, "{}", s),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Instance {
    pub id: u64,
    pub uid: String,
    pub ipv4: String,
    pub ipv6: String,
    pub hostname: String,
    pub cpu: u32,
    pub cpu_name: String,
    /// Memory in MB
    pub memory: u64,
    /// Disk size in GB
    pub disk: String,
    pub disk_type: String,
    pub user: String,
    pub password: String,
    pub status: InstanceStatus,
    pub creation_at: String,
    pub expiration_at: String,
    pub plan: String,
    pub region: String,
    pub os: String,
    pub show_speed: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Os {
    pub id: u64,
    pub name: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OsGroup {
    pub group_name: String,
    pub os_list: Vec<Os>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Plan {
    pub id: u64,
    pub name: String,
    pub stock: u64,
    pub cpu: u32,
    pub memory: u64,
    pub disk: u64,
    pub network_speed: String,
    pub os: Vec<OsGroup>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Plan {
    /// Deploys are only offered while stock remains
    pub fn in_stock(&self) -> bool {
        self.stock > 0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeployParams {
    #[serde(deserialize_with = "string_or_number")]
    pub product_id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub os_id: String,
    /// Duration in hours
    #[serde(deserialize_with = "string_or_number")]
    pub time: String,
    #[serde(
        rename = "sshKey",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub ssh_key: Option<String>,
    /// Base64 encoded script, see [crate::boot_script]
    #[serde(rename = "bootScript", default, skip_serializing_if = "Option::is_none")]
    pub boot_script: Option<String>,
}

/// The password is only ever returned here
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DeployResponse {
    pub id: String,
    pub password: String,
    pub ipv4: String,
    pub ipv6: String,
    pub hostname: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum PowerAction {
    Boot,
    Shutdown,
    Restart,
    Poweroff,
}

impl Display for PowerAction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            PowerAction::Boot => write!(f, "boot"),
            PowerAction::Shutdown => write!(f, "shutdown"),
            PowerAction::Restart => write!(f, "restart"),
            PowerAction::Poweroff => write!(f, "poweroff"),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RebuildParams {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(deserialize_with = "string_or_number")]
    pub os: String,
    #[serde(
        rename = "sshKey",
        default,
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub ssh_key: Option<String>,
    #[serde(rename = "bootScript", default, skip_serializing_if = "Option::is_none")]
    pub boot_script: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RebuildResponse {
    pub ipv4: String,
    pub ipv6: String,
    pub hostname: String,
    pub password: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RenewalParams {
    #[serde(deserialize_with = "string_or_number")]
    pub id: String,
    /// Hours to add
    #[serde(deserialize_with = "string_or_number")]
    pub time: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RenewalResponse {
    pub expiration_at: String,
    pub added_hours: String,
    pub total_service_hours: u64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryState {
    /// KB
    pub memtotal: String,
    pub memfree: String,
    pub memavailable: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct TrafficState {
    /// Bytes
    pub r#in: u64,
    pub out: u64,
    pub total: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeState {
    pub memory: MemoryState,
    pub cpu: u64,
    pub state: String,
    pub traffic: TrafficState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemInfo {
    pub name: String,
    pub group_name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StateResponse {
    pub name: String,
    pub status: String,
    pub state: RuntimeState,
    pub system: SystemInfo,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemoryState {
    pub fn total_gb(&self) -> f64 {
        kb_to_gb(&self.memtotal)
    }

    pub fn available_gb(&self) -> f64 {
        kb_to_gb(&self.memavailable)
    }
}

fn kb_to_gb(kb: &str) -> f64 {
    kb.trim().parse::<f64>().unwrap_or_default() / 1024.0 / 1024.0
}

pub fn bytes_to_mb(b: u64) -> f64 {
    b as f64 / 1024.0 / 1024.0
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SshKey {
    pub id: u64,
    pub name: String,
    pub publickey: String,
    pub created_at: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SshKey {
    /// First 40 chars of the public key, for listings
    pub fn short_key(&self) -> &str {
        match self.publickey.char_indices().nth(40) {
            Some((i, _)) => &self.publickey[..i],
            None => &self.publickey,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvoPermissions {
    pub user_id: u64,
    pub plan: String,
    /// Max hours per deploy
    pub max_time: u64,
    pub allow_packages: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct UserInfo {
    pub id: u64,
    pub email: String,
    pub username: String,
    /// 1/10000 USD
    pub credit: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl UserInfo {
    pub fn credit_usd(&self) -> f64 {
        self.credit as f64 / 10_000.0
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteCommandParams {
    #[serde(deserialize_with = "string_or_number")]
    pub server_id: String,
    pub command: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GetCommandResultParams {
    pub command_uid: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_base64: Option<String>,
}

/// Only `command_uid` is read, the rest is passed through untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExecuteCommandResponse {
    #[serde(default)]
    pub command_uid: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub type CommandResult = Value;
