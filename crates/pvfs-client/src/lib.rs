//! Client-side distributed I/O and metadata engine core.
//!
//! Five cooperating pieces, leaves first (spec.md §2):
//! [`config_cache`] (C1), [`cap`]/[`cred`] (C2), [`rpc`] (C3), [`sm`] (C4),
//! and [`sysint`] (C5) — the concrete lookup/create/io/readdir/getattr/
//! setattr/rename/remove operations expressed as state machines over the
//! first four.
//!
//! Every public entry point takes a [`context::CoreContext`] rather than
//! reaching for global state (spec.md §9).

#![forbid(unsafe_code)]

pub mod cache;
pub mod cap;
pub mod config_cache;
pub mod context;
pub mod cred;
pub mod error;
pub mod id_table;
pub mod rpc;
pub mod signing;
pub mod sm;
pub mod sysint;
pub mod transport_pool;

pub use context::CoreContext;
pub use error::{Error, Result};
pub use id_table::OpId;
pub use sm::Scheduler;
