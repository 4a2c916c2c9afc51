use clap::Parser;
use pvfs_client::sysint::lookup::FollowLink;
use pvfs_client::CoreContext;
use pvfs_types::{AttrMask, Credential, ObjectRef};

#[derive(Parser)]
pub struct LookupCmd {
    /// Absolute path to resolve, e.g. `/dir/file`.
    pub path: String,
    /// Don't follow a symlink named by the final path segment.
    #[arg(long)]
    pub no_follow: bool,
}

pub fn run(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &LookupCmd) -> Result<(), Box<dyn std::error::Error>> {
    let follow = if cmd.no_follow { FollowLink::NoFollow } else { FollowLink::Follow };
    let handle = pvfs_client::sysint::lookup::lookup_with_link_policy(ctx, cred.dup(), root, cmd.path.clone(), AttrMask::COMMON, follow)?;
    let (status, result) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("lookup failed: {status:?}").into());
    }
    let r = result.expect("success implies a populated result");
    println!("{} -> handle={} fs_id={}", cmd.path, r.resolved.handle, r.resolved.fs_id);
    Ok(())
}
