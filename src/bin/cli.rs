use alice_eph::alice::{
    bytes_to_mb, AliceClient, DeployParams, DeployResponse, EvoPermissions, ExecuteCommandParams,
    GetCommandResultParams, Instance, OsGroup, Plan, PowerAction, RebuildParams, RebuildResponse,
    RenewalParams, RenewalResponse, SshKey, StateResponse, UserInfo,
};
use alice_eph::boot_script;
use alice_eph::credential::Credential;
use alice_eph::settings::Settings;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fmt::Write;
use std::path::PathBuf;
use std::time::Duration;

const RULE: &str = "--------------------";

#[derive(Parser)]
#[clap(about, version, author)]
struct Args {
    /// Path to the config file
    #[clap(short, long)]
    config: Option<PathBuf>,

    /// API token (client_id:secret), overrides ALICE_API_TOKEN
    #[clap(short, long)]
    token: Option<String>,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all instances
    Instances,
    /// Deploy a new instance
    Deploy {
        #[clap(long)]
        product_id: String,
        #[clap(long)]
        os_id: String,
        /// Duration in hours
        #[clap(long)]
        time: String,
        #[clap(long)]
        ssh_key: Option<String>,
        /// Script file run on first boot
        #[clap(long)]
        boot_script: Option<PathBuf>,
    },
    /// Destroy an instance
    Destroy { id: String },
    /// Run a power action
    Power {
        id: String,
        #[clap(value_enum)]
        action: PowerAction,
    },
    /// Reinstall an instance
    Rebuild {
        id: String,
        #[clap(long)]
        os: String,
        #[clap(long)]
        ssh_key: Option<String>,
        #[clap(long)]
        boot_script: Option<PathBuf>,
    },
    /// List plans and their operating systems
    Plans,
    /// List operating systems available for a plan
    Os { plan_id: String },
    /// Add hours to an instance
    Renew { id: String, time: String },
    /// Show runtime state of an instance
    State { id: String },
    /// List SSH keys
    SshKeys,
    /// Show EVO permissions
    Permissions,
    /// Show account info
    User,
    /// Run a command on an instance
    Exec { server_id: String, command: String },
    /// Fetch the output of a command started with `exec`
    #[clap(name = "result")]
    CommandResult {
        command_uid: String,
        #[clap(long)]
        output_base64: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args = Args::parse();
    let settings = Settings::load(args.config)?;
    let token = Credential::new(args.token.as_deref()).resolve(settings.api.token.as_deref())?;
    let client = AliceClient::new(
        &settings.api.base_url,
        &token,
        settings.api.timeout.map(Duration::from_secs),
    )?;

    let out = match args.command {
        Command::Instances => render_instances(&client.list_instances().await?),
        Command::Deploy {
            product_id,
            os_id,
            time,
            ssh_key,
            boot_script,
        } => {
            let params = DeployParams {
                product_id,
                os_id,
                time,
                ssh_key,
                boot_script: read_boot_script(boot_script)?,
            };
            render_deploy(&client.deploy_instance(params).await?)
        }
        Command::Destroy { id } => render_message(&client.destroy_instance(&id).await?),
        Command::Power { id, action } => {
            render_message(&client.power_instance(&id, action).await?)
        }
        Command::Rebuild {
            id,
            os,
            ssh_key,
            boot_script,
        } => {
            let params = RebuildParams {
                id,
                os,
                ssh_key,
                boot_script: read_boot_script(boot_script)?,
            };
            render_rebuild(&client.rebuild_instance(params).await?)
        }
        Command::Plans => render_plans(&client.list_plans().await?),
        Command::Os { plan_id } => render_os(&client.get_os_by_plan(&plan_id).await?),
        Command::Renew { id, time } => {
            render_renewal(&client.renew_instance(RenewalParams { id, time }).await?)
        }
        Command::State { id } => render_state(&client.get_instance_state(&id).await?),
        Command::SshKeys => render_ssh_keys(&client.list_ssh_keys().await?),
        Command::Permissions => render_permissions(&client.get_evo_permissions().await?),
        Command::User => render_user(&client.get_user_info().await?),
        Command::Exec { server_id, command } => {
            let rsp = client
                .execute_command(ExecuteCommandParams { server_id, command })
                .await?;
            format!("命令已提交, command_uid: {}\n", rsp.command_uid)
        }
        Command::CommandResult {
            command_uid,
            output_base64,
        } => {
            let rsp = client
                .get_command_result(GetCommandResultParams {
                    command_uid,
                    output_base64,
                })
                .await?;
            format!("{}\n", serde_json::to_string_pretty(&rsp)?)
        }
    };
    print!("{}", out);
    Ok(())
}

fn read_boot_script(path: Option<PathBuf>) -> Result<Option<String>> {
    let Some(path) = path else {
        return Ok(None);
    };
    let script = std::fs::read_to_string(&path)
        .with_context(|| format!("读取启动脚本失败: {}", path.display()))?;
    Ok(Some(boot_script::encode(&script)))
}

fn render_instances(list: &[Instance]) -> String {
    if list.is_empty() {
        return "未找到任何实例。\n".to_string();
    }
    let mut s = String::new();
    let _ = writeln!(s, "--- 实例列表 ---");
    for i in list {
        let _ = writeln!(
            s,
            "ID: {} | 主机名: {} | IPv4: {} | 状态: {}",
            i.id, i.hostname, i.ipv4, i.status
        );
        let _ = writeln!(
            s,
            "  配置: {} CPU / {}MB RAM / {}GB {}",
            i.cpu, i.memory, i.disk, i.disk_type
        );
        let _ = writeln!(s, "  系统: {} | 位置: {}", i.os, i.region);
        let _ = writeln!(s, "  密码: {}", i.password);
        let _ = writeln!(s, "  到期时间: {}", i.expiration_at);
        let _ = writeln!(s, "{}", RULE);
    }
    s
}

fn render_deploy(rsp: &DeployResponse) -> String {
    format!(
        "--- 实例部署成功 ---\nID: {}\n主机名: {}\nIPv4: {}\nIPv6: {}\n密码: {}\n{}\n",
        rsp.id, rsp.hostname, rsp.ipv4, rsp.ipv6, rsp.password, RULE
    )
}

fn render_message(msg: &str) -> String {
    format!("操作成功: {}\n", msg)
}

fn render_rebuild(rsp: &RebuildResponse) -> String {
    format!(
        "--- 实例重建成功 ---\n主机名: {}\nIPv4: {}\nIPv6: {}\n新密码: {}\n{}\n",
        rsp.hostname, rsp.ipv4, rsp.ipv6, rsp.password, RULE
    )
}

fn render_os_groups(s: &mut String, groups: &[OsGroup], indent: &str) {
    for g in groups {
        let _ = writeln!(s, "{}- {}:", indent, g.group_name);
        for os in &g.os_list {
            let _ = writeln!(s, "{}  ID: {}, 名称: {}", indent, os.id, os.name);
        }
    }
}

fn render_plans(plans: &[Plan]) -> String {
    if plans.is_empty() {
        return "未找到任何可用方案。\n".to_string();
    }
    let mut s = String::new();
    let _ = writeln!(s, "--- 可用方案列表 ---");
    for p in plans {
        let stock = if p.in_stock() {
            p.stock.to_string()
        } else {
            "缺货".to_string()
        };
        let _ = writeln!(s, "ID: {} | 名称: {} | 库存: {}", p.id, p.name, stock);
        let _ = writeln!(
            s,
            "  配置: {} CPU / {}MB RAM / {}GB Disk",
            p.cpu, p.memory, p.disk
        );
        let _ = writeln!(s, "  网络: {}", p.network_speed);
        let _ = writeln!(s, "  可用操作系统:");
        render_os_groups(&mut s, &p.os, "    ");
        let _ = writeln!(s, "{}", RULE);
    }
    s
}

fn render_os(groups: &[OsGroup]) -> String {
    if groups.is_empty() {
        return "未找到任何可用操作系统。\n".to_string();
    }
    let mut s = String::from("--- 可用操作系统 ---\n");
    render_os_groups(&mut s, groups, "");
    let _ = writeln!(s, "{}", RULE);
    s
}

fn render_renewal(rsp: &RenewalResponse) -> String {
    format!(
        "--- 实例续订成功 ---\n新到期时间: {}\n增加时长: {} 小时\n总服务时长: {} 小时\n{}\n",
        rsp.expiration_at, rsp.added_hours, rsp.total_service_hours, RULE
    )
}

fn render_state(rsp: &StateResponse) -> String {
    let mem = &rsp.state.memory;
    let traffic = &rsp.state.traffic;
    format!(
        "--- 实例状态信息 ---\n\
         名称: {} | 状态: {} | 运行状态: {}\n\
         操作系统: {} ({})\n\
         内存: {:.2} / {:.2} GB 可用\n\
         流量 (入/出/总): {:.2} / {:.2} / {:.2} MB\n\
         {}\n",
        rsp.name,
        rsp.status,
        rsp.state.state,
        rsp.system.name,
        rsp.system.group_name,
        mem.available_gb(),
        mem.total_gb(),
        bytes_to_mb(traffic.r#in),
        bytes_to_mb(traffic.out),
        bytes_to_mb(traffic.total),
        RULE
    )
}

fn render_ssh_keys(keys: &[SshKey]) -> String {
    if keys.is_empty() {
        return "未找到任何 SSH 密钥。\n".to_string();
    }
    let mut s = String::from("--- SSH 密钥列表 ---\n");
    for k in keys {
        let _ = writeln!(s, "ID: {} | 名称: {} | 创建于: {}", k.id, k.name, k.created_at);
        let _ = writeln!(s, "  公钥: {}...", k.short_key());
        let _ = writeln!(s, "{}", RULE);
    }
    s
}

fn render_permissions(p: &EvoPermissions) -> String {
    format!(
        "--- EVO 权限信息 ---\n用户 ID: {}\n当前方案: {}\n最大时长: {} 小时\n允许的套餐: {}\n{}\n",
        p.user_id, p.plan, p.max_time, p.allow_packages, RULE
    )
}

fn render_user(u: &UserInfo) -> String {
    format!(
        "--- 用户信息 ---\nID: {}\n用户名: {}\n邮箱: {}\n余额: ${:.2}\n{}\n",
        u.id,
        u.username,
        u.email,
        u.credit_usd(),
        RULE
    )
}
