use std::fs;

use clap::Parser;
use pvfs_client::CoreContext;
use pvfs_types::{Credential, ObjectRef};

#[derive(Parser)]
pub struct ReadCmd {
    pub path: String,
    #[arg(long, default_value_t = 0)]
    pub offset: u64,
    #[arg(long)]
    pub len: u64,
    /// Write the bytes read here instead of stdout.
    #[arg(long)]
    pub out: Option<std::path::PathBuf>,
}

pub fn run_read(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &ReadCmd) -> Result<(), Box<dyn std::error::Error>> {
    let target = crate::resolve_path(ctx, cred, root, &cmd.path)?;
    let handle = pvfs_client::sysint::io::read(ctx, cred.dup(), target, cmd.offset, cmd.len);
    let (status, result) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("read failed: {status:?}").into());
    }
    let io = result.expect("success implies a populated result");
    match &cmd.out {
        Some(path) => fs::write(path, &io.data)?,
        None => {
            use std::io::Write;
            std::io::stdout().write_all(&io.data)?;
        }
    }
    eprintln!("read {} bytes", io.bytes_completed);
    Ok(())
}

#[derive(Parser)]
pub struct WriteCmd {
    pub path: String,
    #[arg(long, default_value_t = 0)]
    pub offset: u64,
    /// File to read the payload from.
    #[arg(long)]
    pub input: std::path::PathBuf,
}

pub fn run_write(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &WriteCmd) -> Result<(), Box<dyn std::error::Error>> {
    let target = crate::resolve_path(ctx, cred, root, &cmd.path)?;
    let data = fs::read(&cmd.input)?;
    let handle = pvfs_client::sysint::io::write(ctx, cred.dup(), target, cmd.offset, data);
    let (status, result) = handle.wait(ctx);
    if !status.is_success() {
        return Err(format!("write failed: {status:?}").into());
    }
    let io = result.expect("success implies a populated result");
    eprintln!("wrote {} bytes", io.bytes_completed);
    Ok(())
}
