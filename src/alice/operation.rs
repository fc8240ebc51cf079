use crate::alice::model::{
    DeployParams, ExecuteCommandParams, GetCommandResultParams, PowerAction, RebuildParams,
    RenewalParams,
};
use crate::alice::FormFields;
use crate::json_api::RequestBody;
use reqwest::Method;

/// One logical upstream call.
///
/// Paths are the provider's, they must not change.
#[derive(Debug, Clone)]
pub enum Operation {
    ListInstances,
    Deploy(DeployParams),
    Destroy { id: String },
    Power { id: String, action: PowerAction },
    Rebuild(RebuildParams),
    ListPlans,
    OsByPlan { plan_id: String },
    Renew(RenewalParams),
    State { id: String },
    ListSshKeys,
    EvoPermissions,
    UserInfo,
    ExecuteCommand(ExecuteCommandParams),
    GetCommandResult(GetCommandResultParams),
}

impl Operation {
    pub fn path(&self) -> &'static str {
        match self {
            Operation::ListInstances => "/Evo/Instance",
            Operation::Deploy(_) => "/Evo/Deploy",
            Operation::Destroy { .. } => "/Evo/Destroy",
            Operation::Power { .. } => "/Evo/Power",
            Operation::Rebuild(_) => "/Evo/Rebuild",
            Operation::ListPlans => "/Evo/Plan",
            Operation::OsByPlan { .. } => "/Evo/getOSByPlan",
            Operation::Renew(_) => "/Evo/Renewal",
            Operation::State { .. } => "/Evo/State",
            Operation::ListSshKeys => "/User/SSHKey",
            Operation::EvoPermissions => "/User/EVOPermissions",
            Operation::UserInfo => "/User/Info",
            Operation::ExecuteCommand(_) => "/Command/executeAsync",
            Operation::GetCommandResult(_) => "/Command/getResult",
        }
    }

    pub fn method(&self) -> Method {
        match self.form() {
            Some(_) => Method::POST,
            None => Method::GET,
        }
    }

    /// Form body for POST operations, `None` for GET
    pub fn form(&self) -> Option<FormFields> {
        let f = FormFields::new();
        let form = match self {
            Operation::ListInstances
            | Operation::ListPlans
            | Operation::ListSshKeys
            | Operation::EvoPermissions
            | Operation::UserInfo => return None,
            Operation::Deploy(p) => f
                .field("product_id", p.product_id.as_str())
                .field("os_id", p.os_id.as_str())
                .field("time", p.time.as_str())
                .opt_field("sshKey", p.ssh_key.as_deref())
                .opt_field("bootScript", p.boot_script.as_deref()),
            Operation::Destroy { id } => f.field("id", id.as_str()),
            Operation::Power { id, action } => f
                .field("id", id.as_str())
                .field("action", action.to_string()),
            Operation::Rebuild(p) => f
                .field("id", p.id.as_str())
                .field("os", p.os.as_str())
                .opt_field("sshKey", p.ssh_key.as_deref())
                .opt_field("bootScript", p.boot_script.as_deref()),
            Operation::OsByPlan { plan_id } => f.field("plan_id", plan_id.as_str()),
            Operation::Renew(p) => f.field("id", p.id.as_str()).field("time", p.time.as_str()),
            Operation::State { id } => f.field("id", id.as_str()),
            Operation::ExecuteCommand(p) => f
                .field("server_id", p.server_id.as_str())
                .field("command", p.command.as_str()),
            Operation::GetCommandResult(p) => f
                .field("command_uid", p.command_uid.as_str())
                .opt_field("output_base64", p.output_base64.as_deref()),
        };
        Some(form)
    }

    /// Writes change instance state upstream
    pub fn is_write(&self) -> bool {
        matches!(
            self,
            Operation::Deploy(_)
                | Operation::Destroy { .. }
                | Operation::Power { .. }
                | Operation::Rebuild(_)
                | Operation::Renew(_)
        )
    }

    pub fn body(&self) -> RequestBody {
        match self.form() {
            Some(f) => RequestBody::Form(f),
            None => RequestBody::Empty,
        }
    }
}
