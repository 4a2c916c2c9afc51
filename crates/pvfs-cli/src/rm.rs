use clap::Parser;
use pvfs_client::CoreContext;
use pvfs_types::{Credential, ObjectRef};

#[derive(Parser)]
pub struct RmCmd {
    pub path: String,
}

pub fn run_rm(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &RmCmd) -> Result<(), Box<dyn std::error::Error>> {
    let (parent, name) = crate::resolve_parent(ctx, cred, root, &cmd.path)?;
    let handle = pvfs_client::sysint::rename_remove::remove(ctx, cred.dup(), parent, name);
    let (status, _) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("remove failed: {status:?}").into());
    }
    Ok(())
}

#[derive(Parser)]
pub struct RenameCmd {
    pub from: String,
    pub to: String,
}

pub fn run_rename(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &RenameCmd) -> Result<(), Box<dyn std::error::Error>> {
    let (old_parent, old_name) = crate::resolve_parent(ctx, cred, root, &cmd.from)?;
    let (new_parent, new_name) = crate::resolve_parent(ctx, cred, root, &cmd.to)?;
    let handle = pvfs_client::sysint::rename_remove::rename(ctx, cred.dup(), old_parent, old_name, new_parent, new_name);
    let (status, _) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("rename failed: {status:?}").into());
    }
    Ok(())
}
