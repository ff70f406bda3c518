//! CLI module for continuity
//!
//! Provides command-line interface for:
//! - plan: Build and print a failover plan
//! - quorum: Compute quorum from declared node status
//! - failover: Plan, execute, verify and audit
//! - simulate: Seeded failure scenarios
//! - verify-audit: Check a saved audit pack's manifest hash

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, ScenarioKind};
pub use commands::{
    failover, plan, quorum, run, run_command, simulate, verify_audit, ClusterConfig, Config,
};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{error_envelope, ok_envelope, write_error, write_response};
