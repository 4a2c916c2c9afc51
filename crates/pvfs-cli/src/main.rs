//! Command-line front end for `pvfs-client`. Not part of the distributed
//! I/O and metadata engine itself — a thin driver that bootstraps a
//! [`CoreContext`], resolves a path argument to an [`ObjectRef`], and runs
//! one sysint operation per invocation.

mod cli;
mod create;
mod io;
mod lookup;
mod mgmt;
mod readdir;
mod rm;
mod stat;

use std::process::ExitCode;
use std::time::{SystemTime, UNIX_EPOCH};

use clap::Parser;
use pvfs_client::transport_pool::TcpConnector;
use pvfs_client::CoreContext;
use pvfs_types::{Credential, FsId, ObjectRef};

use cli::{Cli, Commands};

/// Client-minted signing key for this invocation's credential. A real
/// deployment fetches a credential from `mgmt_get_user_cert`
/// (`pvfs_client::sysint::mgmt::get_user_cert`) signed by the server's
/// key; this CLI self-signs instead since it has no certificate store to
/// read one from (spec.md §6 "Persisted client state" is out of scope
/// here).
fn now_unix() -> u64 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_secs()
}

fn main() -> ExitCode {
    env_logger::init();
    let cli = Cli::parse();

    let ctx = CoreContext::init(Box::new(TcpConnector), b"pvfs-cli-session-key".to_vec());

    let bootstrap_cred = Credential { fs_id: FsId(0), serial: 0, uid: cli.uid, gids: cli.gids.clone(), issuer: cli.bootstrap_server.clone(), timeout: now_unix() + 300, sig: Vec::new() };
    let get_config = pvfs_client::sysint::mgmt::get_config(&ctx, bootstrap_cred, cli.bootstrap_server.clone(), cli.fs_name.clone());
    let (status, result) = get_config.wait(&ctx);
    let Some(config_result) = result.filter(|_| status.is_success()) else {
        eprintln!("mgmt_get_config against {} failed: {status:?}", cli.bootstrap_server);
        return ExitCode::FAILURE;
    };
    let fs_id = config_result.fs_id;

    let cred = pvfs_client::cred::new_credential(&ctx, fs_id, 1, cli.uid, cli.gids.clone(), cli.bootstrap_server.clone(), 3600, now_unix());

    let root = ObjectRef::new(match ctx.config_cache.get_root_handle(fs_id) {
        Ok(h) => h,
        Err(e) => {
            eprintln!("no root handle for fs {fs_id}: {e}");
            return ExitCode::FAILURE;
        }
    }, fs_id);

    let result = match &cli.command {
        Commands::Lookup(cmd) => lookup::run(&ctx, &cred, root, cmd),
        Commands::Create(cmd) => create::run_create(&ctx, &cred, root, cmd),
        Commands::Mkdir(cmd) => create::run_mkdir(&ctx, &cred, root, cmd),
        Commands::Symlink(cmd) => create::run_symlink(&ctx, &cred, root, cmd),
        Commands::Stat(cmd) => stat::run_stat(&ctx, &cred, root, cmd),
        Commands::Setattr(cmd) => stat::run_setattr(&ctx, &cred, root, cmd),
        Commands::Read(cmd) => io::run_read(&ctx, &cred, root, cmd),
        Commands::Write(cmd) => io::run_write(&ctx, &cred, root, cmd),
        Commands::Readdir(cmd) => readdir::run(&ctx, &cred, root, cmd),
        Commands::Rm(cmd) => rm::run_rm(&ctx, &cred, root, cmd),
        Commands::Rename(cmd) => rm::run_rename(&ctx, &cred, root, cmd),
        Commands::Mgmt(cmd) => mgmt::run(&ctx, &cred, fs_id, cmd),
    };

    ctx.finalize();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Splits `path` into its parent directory's path and the final segment,
/// the shape every create/rm/rename subcommand needs (resolve the parent
/// via lookup, then operate on the entry by name within it).
fn split_parent(path: &str) -> (String, String) {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rsplit_once('/') {
        Some((parent, name)) if !parent.is_empty() => (parent.to_string(), name.to_string()),
        Some((_, name)) => ("/".to_string(), name.to_string()),
        None => ("/".to_string(), trimmed.to_string()),
    }
}

/// Resolves `path`'s parent directory (or `root` itself if `path` names a
/// top-level entry) to an [`ObjectRef`].
pub(crate) fn resolve_parent(ctx: &CoreContext, cred: &Credential, root: ObjectRef, path: &str) -> Result<(ObjectRef, String), Box<dyn std::error::Error>> {
    let (parent_path, name) = split_parent(path);
    if parent_path == "/" {
        return Ok((root, name));
    }
    let handle = pvfs_client::sysint::lookup::lookup(ctx, cred.dup(), root, parent_path, pvfs_types::AttrMask::OBJTYPE)?;
    let (status, result) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("lookup of parent failed: {status:?}").into());
    }
    Ok((result.expect("success implies a populated result").resolved, name))
}

/// Resolves `path` itself (not its parent) to an [`ObjectRef`].
pub(crate) fn resolve_path(ctx: &CoreContext, cred: &Credential, root: ObjectRef, path: &str) -> Result<ObjectRef, Box<dyn std::error::Error>> {
    let handle = pvfs_client::sysint::lookup::lookup(ctx, cred.dup(), root, path.to_string(), pvfs_types::AttrMask::empty())?;
    let (status, result) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("lookup failed: {status:?}").into());
    }
    Ok(result.expect("success implies a populated result").resolved)
}
