//! CLI argument definitions using clap
//!
//! Commands:
//! - continuity plan --config <path> [--reason <text>]
//! - continuity quorum --config <path>
//! - continuity failover --config <path> [--reason] [--dry-run] [--audit-dir <dir>]
//! - continuity simulate --config <path> --scenario <kind> [--count] [--region] [--seed]
//! - continuity verify-audit --pack <dir>

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// Deterministic failover planning, execution, verification and audit
#[derive(Parser, Debug)]
#[command(name = "continuity")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Emit TRACE-level logs (heartbeats, quorum) to stderr
    #[arg(long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a failover plan and print it
    Plan {
        /// Path to configuration file
        #[arg(long, default_value = "./continuity.json")]
        config: PathBuf,

        /// Why the failover is being considered
        #[arg(long, default_value = "manual request")]
        reason: String,
    },

    /// Compute quorum from the declared node statuses
    Quorum {
        /// Path to configuration file
        #[arg(long, default_value = "./continuity.json")]
        config: PathBuf,
    },

    /// Plan, execute, verify and audit a failover
    Failover {
        /// Path to configuration file
        #[arg(long, default_value = "./continuity.json")]
        config: PathBuf,

        #[arg(long, default_value = "manual request")]
        reason: String,

        /// Skip mutating actions; verification still runs
        #[arg(long)]
        dry_run: bool,

        /// Overrides `audit_dir` from the configuration
        #[arg(long)]
        audit_dir: Option<PathBuf>,
    },

    /// Run a seeded failure scenario
    Simulate {
        /// Path to configuration file
        #[arg(long, default_value = "./continuity.json")]
        config: PathBuf,

        #[arg(long, value_enum)]
        scenario: ScenarioKind,

        /// Nodes to fail (random scenario)
        #[arg(long, default_value_t = 1)]
        count: usize,

        /// Region to fail (region scenario)
        #[arg(long)]
        region: Option<String>,

        #[arg(long, default_value_t = 0)]
        seed: u64,
    },

    /// Recompute the manifest hash of a saved audit pack
    VerifyAudit {
        /// Audit pack directory
        #[arg(long)]
        pack: PathBuf,
    },
}

/// Scenario selector for `simulate`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ScenarioKind {
    Primary,
    Random,
    Region,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
