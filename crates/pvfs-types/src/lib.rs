//! Core data model for the PVFS-style client core.
//!
//! This crate has no network or threading concerns of its own — it is the
//! shared vocabulary that `pvfs-msg` encodes on the wire and `pvfs-client`
//! operates on.

#![forbid(unsafe_code)]

pub mod attr;
pub mod cap;
pub mod config;
pub mod cred;
pub mod dirent;
pub mod distribution;
pub mod error;
pub mod handle;
pub mod layout;
pub mod path;
pub mod server;

pub use attr::{AttrMask, ObjectAttributes, ObjectType};
pub use cap::{Capability, OpMask};
pub use config::{FsConfig, TabFileEntry};
pub use cred::Credential;
pub use dirent::DirEntry;
pub use distribution::{Distribution, SimpleStripe};
pub use error::PvfsTypeError;
pub use handle::{Extent, FsId, Gid, Handle, ObjectRef, Uid};
pub use layout::Layout;
pub use server::{ServerDescriptor, ServerRole};

/// Result alias used throughout this crate.
pub type Result<T> = std::result::Result<T, PvfsTypeError>;
