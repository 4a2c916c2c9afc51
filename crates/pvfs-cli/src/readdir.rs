use clap::Parser;
use pvfs_client::CoreContext;
use pvfs_types::{Credential, ObjectRef};

#[derive(Parser)]
pub struct ReaddirCmd {
    pub path: String,
    #[arg(long, default_value_t = 64)]
    pub count: u32,
}

pub fn run(ctx: &CoreContext, cred: &Credential, root: ObjectRef, cmd: &ReaddirCmd) -> Result<(), Box<dyn std::error::Error>> {
    let directory = crate::resolve_path(ctx, cred, root, &cmd.path)?;
    let mut token = Vec::new();
    loop {
        let handle = pvfs_client::sysint::readdir::readdir(ctx, cred.dup(), directory, token.clone(), cmd.count);
        let (status, result) = handle.wait(ctx);
        if !status.is_success() {
            return Err(format!("readdir failed: {status:?}").into());
        }
        let page = result.expect("success implies a populated result");
        for entry in &page.entries {
            println!("{}\t{}", entry.name, entry.handle);
        }
        if page.next_token.is_empty() {
            break;
        }
        token = page.next_token;
    }
    Ok(())
}
