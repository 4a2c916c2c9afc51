use clap::Parser;
use pvfs_client::sysint::create::{NewDirParams, NewFileParams, NewSymlinkParams};
use pvfs_client::CoreContext;
use pvfs_types::{Credential, ObjectRef};

#[derive(Parser)]
pub struct CreateCmd {
    /// Absolute path of the file to create.
    pub path: String,
    /// Number of datafiles to stripe across; `0` uses the fs default.
    #[arg(long, default_value_t = 0)]
    pub num_dfiles: u32,
    #[arg(long, default_value = "simple_stripe")]
    pub dist: String,
    #[arg(long, default_value_t = 65536)]
    pub strip_size: u64,
    #[arg(long, default_value_t = 0o644)]
    pub perms: u32,
}

pub fn run_create(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &CreateCmd) -> Result<(), Box<dyn std::error::Error>> {
    let (parent, name) = crate::resolve_parent(ctx, cred, root, &cmd.path)?;
    let handle = pvfs_client::sysint::create::create_file(
        ctx,
        cred.dup(),
        parent,
        name,
        NewFileParams {
            requested_num_dfiles: cmd.num_dfiles,
            dist_name: cmd.dist.clone(),
            dist_strip_size: cmd.strip_size,
            owner: cred.uid,
            group: cred.gids.first().copied().unwrap_or(0),
            perms: cmd.perms,
        },
    );
    let (status, result) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("create failed: {status:?}").into());
    }
    let created = result.expect("success implies a populated result");
    println!("{} -> handle={} fs_id={}", cmd.path, created.handle, created.fs_id);
    Ok(())
}

#[derive(Parser)]
pub struct MkdirCmd {
    pub path: String,
    #[arg(long, default_value_t = 0)]
    pub dirdata_shards: u32,
    #[arg(long, default_value_t = 0o755)]
    pub perms: u32,
}

pub fn run_mkdir(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &MkdirCmd) -> Result<(), Box<dyn std::error::Error>> {
    let (parent, name) = crate::resolve_parent(ctx, cred, root, &cmd.path)?;
    let handle = pvfs_client::sysint::create::mkdir(
        ctx,
        cred.dup(),
        parent,
        name,
        NewDirParams { owner: cred.uid, group: cred.gids.first().copied().unwrap_or(0), perms: cmd.perms, dirdata_shards: cmd.dirdata_shards },
    );
    let (status, result) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("mkdir failed: {status:?}").into());
    }
    let created = result.expect("success implies a populated result");
    println!("{} -> handle={} fs_id={}", cmd.path, created.handle, created.fs_id);
    Ok(())
}

#[derive(Parser)]
pub struct SymlinkCmd {
    /// Absolute path of the symlink to create.
    pub path: String,
    /// Target the symlink points at.
    pub target: String,
    #[arg(long, default_value_t = 0o777)]
    pub perms: u32,
}

pub fn run_symlink(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &SymlinkCmd) -> Result<(), Box<dyn std::error::Error>> {
    let (parent, name) = crate::resolve_parent(ctx, cred, root, &cmd.path)?;
    let handle = pvfs_client::sysint::create::symlink(
        ctx,
        cred.dup(),
        parent,
        name,
        NewSymlinkParams { target: cmd.target.clone(), owner: cred.uid, group: cred.gids.first().copied().unwrap_or(0), perms: cmd.perms },
    );
    let (status, result) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("symlink failed: {status:?}").into());
    }
    let created = result.expect("success implies a populated result");
    println!("{} -> handle={} fs_id={}", cmd.path, created.handle, created.fs_id);
    Ok(())
}
