use clap::{Parser, Subcommand};
use pvfs_client::CoreContext;
use pvfs_types::{Credential, FsId};

#[derive(Parser)]
pub struct MgmtCmd {
    #[command(subcommand)]
    pub op: MgmtOp,
}

#[derive(Subcommand)]
pub enum MgmtOp {
    /// Fetches this client's signed user certificate from `server`.
    GetUserCert {
        #[arg(long)]
        server: String,
    },
    /// Reports per-server space and handle usage.
    Statfs {
        #[arg(long)]
        server: String,
    },
    /// Reports recent I/O throughput samples for `target_server`.
    PerfMon {
        #[arg(long)]
        server: String,
        #[arg(long)]
        target_server: String,
        #[arg(long, default_value_t = 8)]
        history_count: u32,
    },
    /// Lists handles held by `target_server`, starting from `position`.
    IterateHandles {
        #[arg(long)]
        server: String,
        #[arg(long)]
        target_server: String,
        #[arg(long, default_value_t = 0)]
        position: u64,
        #[arg(long, default_value_t = 256)]
        count: u32,
    },
    /// Sets a runtime parameter on one or more servers.
    SetparamList {
        #[arg(long)]
        server: String,
        #[arg(long, value_delimiter = ',')]
        target_servers: Vec<String>,
        #[arg(long)]
        param_name: String,
        #[arg(long)]
        param_value: i64,
    },
}

pub fn run(ctx: &CoreContext, cred: &Credential, fs_id: FsId, cmd: &MgmtCmd) -> Result<(), Box<dyn std::error::Error>> {
    match &cmd.op {
        MgmtOp::GetUserCert { server } => {
            let handle = pvfs_client::sysint::mgmt::get_user_cert(ctx, cred.dup(), server.clone(), fs_id);
            let (status, result) = handle.wait(ctx);
            if !status.is_success() {
                return Err(format!("mgmt_get_user_cert failed: {status:?}").into());
            }
            let cert = result.expect("success implies a populated result");
            println!("{} byte certificate", cert.len());
        }
        MgmtOp::Statfs { server } => {
            let handle = pvfs_client::sysint::mgmt::statfs(ctx, cred.dup(), server.clone(), fs_id);
            let (status, result) = handle.wait(ctx);
            if !status.is_success() {
                return Err(format!("mgmt_statfs failed: {status:?}").into());
            }
            let reply = result.expect("success implies a populated result");
            for s in reply.per_server.0.iter() {
                println!(
                    "{}: {}/{} bytes free, {}/{} handles free",
                    s.server.as_str(),
                    s.bytes_available,
                    s.bytes_total,
                    s.handles_available,
                    s.handles_total
                );
            }
        }
        MgmtOp::PerfMon { server, target_server, history_count } => {
            let handle = pvfs_client::sysint::mgmt::perf_mon(ctx, cred.dup(), server.clone(), fs_id, target_server.clone(), *history_count);
            let (status, result) = handle.wait(ctx);
            if !status.is_success() {
                return Err(format!("mgmt_perf_mon failed: {status:?}").into());
            }
            let reply = result.expect("success implies a populated result");
            for sample in reply.samples.0.iter() {
                println!("t={} read={} write={}", sample.timestamp_unix, sample.read_bytes, sample.write_bytes);
            }
        }
        MgmtOp::IterateHandles { server, target_server, position, count } => {
            let handle =
                pvfs_client::sysint::mgmt::iterate_handles(ctx, cred.dup(), server.clone(), fs_id, target_server.clone(), *position, *count);
            let (status, result) = handle.wait(ctx);
            if !status.is_success() {
                return Err(format!("mgmt_iterate_handles failed: {status:?}").into());
            }
            let reply = result.expect("success implies a populated result");
            for h in reply.handles.0.iter() {
                println!("{h}");
            }
            println!("next_position={}", reply.next_position);
        }
        MgmtOp::SetparamList { server, target_servers, param_name, param_value } => {
            let handle = pvfs_client::sysint::mgmt::setparam_list(
                ctx,
                cred.dup(),
                server.clone(),
                fs_id,
                target_servers.clone(),
                param_name.clone(),
                *param_value,
            );
            let (status, result) = handle.wait(ctx);
            if !status.is_success() {
                return Err(format!("mgmt_setparam_list failed: {status:?}").into());
            }
            let reply = result.expect("success implies a populated result");
            println!("old values: {:?}", reply.old_values.0);
        }
    }
    Ok(())
}
