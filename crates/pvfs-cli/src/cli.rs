use clap::{Parser, Subcommand};

/// Drives a `pvfs-client` sysint operation end to end against a configured
/// set of servers: bootstraps the named filesystem via `mgmt_get_config`,
/// mints a credential, runs the requested operation, and prints the
/// result.
#[derive(Parser)]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// `<transport>://<host>:<port>` of any server advertising the fs's
    /// `mgmt_get_config` op — analogous to a tab file's first server entry.
    #[arg(long, env = "PVFS_BOOTSTRAP_SERVER")]
    pub bootstrap_server: String,

    /// Name of the mounted volume to resolve paths against.
    #[arg(long, env = "PVFS_FS_NAME")]
    pub fs_name: String,

    /// Numeric uid carried in the minted credential.
    #[arg(long, default_value_t = 0)]
    pub uid: u32,

    /// Comma-separated numeric gids carried in the minted credential.
    #[arg(long, value_delimiter = ',', default_value = "0")]
    pub gids: Vec<u32>,

    /// Per-RPC job timeout, in seconds.
    #[arg(long, default_value_t = 30)]
    pub timeout: u64,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Resolves a path to an object reference.
    Lookup(crate::lookup::LookupCmd),
    /// Creates a regular file.
    Create(crate::create::CreateCmd),
    /// Creates a directory.
    Mkdir(crate::create::MkdirCmd),
    /// Creates a symlink.
    Symlink(crate::create::SymlinkCmd),
    /// Prints an object's attributes.
    Stat(crate::stat::StatCmd),
    /// Changes an object's owner/group/perms.
    Setattr(crate::stat::SetattrCmd),
    /// Reads a byte range from a file, striped across its datafiles.
    Read(crate::io::ReadCmd),
    /// Writes bytes at an offset, striped across a file's datafiles.
    Write(crate::io::WriteCmd),
    /// Lists a directory's entries.
    Readdir(crate::readdir::ReaddirCmd),
    /// Removes a directory entry (and the object it names, if unlinked).
    Rm(crate::rm::RmCmd),
    /// Renames/moves an entry.
    Rename(crate::rm::RenameCmd),
    /// Management queries against a single server.
    Mgmt(crate::mgmt::MgmtCmd),
}
