//! SSH deployment helper.
//!
//! Opens one authenticated transport to a remote host and multiplexes
//! short-lived sessions over it: remote command batches with live stderr
//! forwarding, SCP-wire-format file copies, and environment file
//! materialization with explicit `${NAME}` substitution. A registry of
//! named deployment routines replaces dynamic plugin loading.

pub mod errors;
mod local;
pub mod registry;
pub mod runner;
pub mod services;
pub mod ssh;
pub mod utils;

pub use errors::DeployError;
pub use registry::DeployRegistry;
pub use runner::{DeployRunner, Runner};
pub use ssh::{Connection, ConnectionBuilder, HostKeyPolicy};
pub use utils::subst::Substitutions;
