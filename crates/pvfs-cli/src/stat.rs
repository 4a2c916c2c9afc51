use clap::Parser;
use pvfs_client::CoreContext;
use pvfs_types::{AttrMask, Credential, ObjectAttributes, ObjectRef};

#[derive(Parser)]
pub struct StatCmd {
    pub path: String,
}

pub fn run_stat(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &StatCmd) -> Result<(), Box<dyn std::error::Error>> {
    let handle = pvfs_client::sysint::lookup::lookup(ctx, cred.dup(), root, cmd.path.clone(), AttrMask::COMMON)?;
    let (status, result) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("lookup failed: {status:?}").into());
    }
    let resolved = result.expect("success implies a populated result").resolved;

    let handle = pvfs_client::sysint::attr::getattr(ctx, cred.dup(), resolved, AttrMask::COMMON);
    let (status, attrs) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("getattr failed: {status:?}").into());
    }
    let attrs = attrs.expect("success implies a populated result");
    print_attrs(&cmd.path, &attrs);
    Ok(())
}

fn print_attrs(path: &str, attrs: &ObjectAttributes) {
    println!("{path}:");
    if let Some(objtype) = attrs.objtype {
        println!("  type: {objtype:?}");
    }
    if attrs.mask.contains(AttrMask::OWNER) {
        println!("  owner: {}", attrs.owner);
    }
    if attrs.mask.contains(AttrMask::GROUP) {
        println!("  group: {}", attrs.group);
    }
    if attrs.mask.contains(AttrMask::PERMS) {
        println!("  perms: {:o}", attrs.perms);
    }
    if attrs.mask.contains(AttrMask::SIZE) {
        println!("  size: {}", attrs.size);
    }
}

#[derive(Parser)]
pub struct SetattrCmd {
    pub path: String,
    #[arg(long)]
    pub owner: Option<u32>,
    #[arg(long)]
    pub group: Option<u32>,
    #[arg(long)]
    pub perms: Option<u32>,
}

pub fn run_setattr(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &SetattrCmd) -> Result<(), Box<dyn std::error::Error>> {
    let handle = pvfs_client::sysint::lookup::lookup(ctx, cred.dup(), root, cmd.path.clone(), AttrMask::empty())?;
    let (status, result) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("lookup failed: {status:?}").into());
    }
    let resolved = result.expect("success implies a populated result").resolved;

    let mut attrs = ObjectAttributes::empty();
    if let Some(owner) = cmd.owner {
        attrs.mask |= AttrMask::OWNER;
        attrs.owner = owner;
    }
    if let Some(group) = cmd.group {
        attrs.mask |= AttrMask::GROUP;
        attrs.group = group;
    }
    if let Some(perms) = cmd.perms {
        attrs.mask |= AttrMask::PERMS;
        attrs.perms = perms;
    }

    let handle = pvfs_client::sysint::attr::setattr(ctx, cred.dup(), resolved, attrs);
    let (status, _) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("setattr failed: {status:?}").into());
    }
    Ok(())
}
