//! CLI command implementations
//!
//! Each command loads the configuration once, runs against a snapshot of
//! it, and prints exactly one JSON envelope. Logs go to stderr.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::clock::{SharedClock, SystemClock};
use crate::continuity::auditor::MANIFEST_FILE;
use crate::continuity::{
    load_audit_pack, load_manifest, Cluster, ContinuityCoordinator, ContinuityPlanner, FailoverPolicy,
    FailoverSimulator, HeartbeatMonitor, Node, DEFAULT_AUDIT_DIR,
};
use crate::observability::{
    log_event_with_fields, AuditTrail, Event, FileAuditTrail, Logger, MemoryAuditTrail, Severity,
};

use super::args::{Command, ScenarioKind};
use super::errors::{CliError, CliResult};
use super::io::{write_error, write_response};

/// Cluster as written in the configuration file.
///
/// Quorum size and regions are always derived, never read.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClusterConfig {
    pub cluster_id: String,
    pub name: String,
    pub nodes: Vec<Node>,
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub cluster: ClusterConfig,

    pub policy: FailoverPolicy,

    /// Parent directory for saved audit packs (default "audit_packs")
    #[serde(default = "default_audit_dir")]
    pub audit_dir: PathBuf,

    /// Latency stamped on heartbeats seeded from node status (default 5.0)
    #[serde(default = "default_heartbeat_latency_ms")]
    pub heartbeat_latency_ms: f64,

    /// Append-only trail file; in-memory when absent
    #[serde(default)]
    pub trail_path: Option<PathBuf>,

    #[serde(default)]
    pub dry_run: bool,
}

fn default_audit_dir() -> PathBuf {
    PathBuf::from(DEFAULT_AUDIT_DIR)
}

fn default_heartbeat_latency_ms() -> f64 {
    5.0
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config = Self::parse(&content)?;

        let location = path.display().to_string();
        let nodes = config.cluster.nodes.len().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("cluster_id", config.cluster.cluster_id.as_str()),
                ("nodes", nodes.as_str()),
                ("path", location.as_str()),
            ],
        );
        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn parse(content: &str) -> CliResult<Self> {
        let config: Config = serde_json::from_str(content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        self.cluster()?;

        self.policy
            .validate()
            .map_err(|e| CliError::config_error(e.to_string()))?;

        if !self.heartbeat_latency_ms.is_finite() || self.heartbeat_latency_ms < 0.0 {
            return Err(CliError::config_error(format!(
                "heartbeat_latency_ms must be a finite value >= 0, got {}",
                self.heartbeat_latency_ms
            )));
        }

        Ok(())
    }

    /// Validated cluster snapshot
    pub fn cluster(&self) -> CliResult<Cluster> {
        Cluster::new(
            self.cluster.cluster_id.clone(),
            self.cluster.name.clone(),
            self.cluster.nodes.clone(),
        )
        .map_err(|e| CliError::config_error(e.to_string()))
    }

    fn trail(&self) -> CliResult<Arc<dyn AuditTrail>> {
        Ok(match &self.trail_path {
            Some(path) => Arc::new(FileAuditTrail::open(path)?),
            None => Arc::new(MemoryAuditTrail::new()),
        })
    }
}

/// Parse arguments, run, print the envelope
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    if cli.verbose {
        Logger::set_min_severity(Severity::Trace);
    }

    let result = run_command(cli.command);
    if let Err(ref e) = result {
        let _ = write_error(e.code_str(), e.message());
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command(cmd: Command) -> CliResult<()> {
    let clock = SystemClock::shared();
    let data = match cmd {
        Command::Plan { config, reason } => plan(&Config::load(&config)?, &reason, clock)?,
        Command::Quorum { config } => quorum(&Config::load(&config)?, clock)?,
        Command::Failover {
            config,
            reason,
            dry_run,
            audit_dir,
        } => {
            let config = Config::load(&config)?;
            failover(&config, &reason, dry_run, audit_dir, clock)?
        }
        Command::Simulate {
            config,
            scenario,
            count,
            region,
            seed,
        } => {
            let config = Config::load(&config)?;
            simulate(&config, scenario, count, region.as_deref(), seed, clock)?
        }
        Command::VerifyAudit { pack } => verify_audit(&pack)?,
    };
    write_response(data)
}

/// Build a plan without executing it
pub fn plan(config: &Config, reason: &str, clock: SharedClock) -> CliResult<Value> {
    let cluster = config.cluster()?;
    let plan = ContinuityPlanner::new(clock).build_plan(&cluster, &config.policy, reason)?;
    Ok(serde_json::to_value(plan)?)
}

/// Quorum over heartbeats seeded from declared node status
pub fn quorum(config: &Config, clock: SharedClock) -> CliResult<Value> {
    let cluster = config.cluster()?;
    let mut monitor = HeartbeatMonitor::new(clock);
    monitor.simulate_heartbeats(&cluster.nodes, config.heartbeat_latency_ms)?;
    Ok(serde_json::to_value(monitor.calculate_quorum(&cluster))?)
}

/// Full pipeline; the audit pack is always saved
pub fn failover(
    config: &Config,
    reason: &str,
    dry_run: bool,
    audit_dir: Option<PathBuf>,
    clock: SharedClock,
) -> CliResult<Value> {
    let cluster = config.cluster()?;
    let audit_dir = audit_dir.unwrap_or_else(|| config.audit_dir.clone());

    let mut coordinator = ContinuityCoordinator::recording(clock)
        .with_trail(config.trail()?)
        .with_audit_dir(audit_dir)
        .with_dry_run(dry_run || config.dry_run)
        .with_heartbeat_latency_ms(config.heartbeat_latency_ms);

    let run = coordinator.run(&cluster, &config.policy, reason)?;

    Ok(json!({
        "plan_id": run.plan.plan_id,
        "primary_node_id": run.plan.primary_node_id,
        "failover_target_id": run.plan.failover_target_id,
        "execution_id": run.result.execution_id,
        "success": run.result.success,
        "actions_executed": run.result.actions_executed,
        "actions_failed": run.result.actions_failed,
        "errors": run.result.errors,
        "verification_passed": run.verification.passed,
        "verification_errors": run.verification.errors,
        "verification_warnings": run.verification.warnings,
        "audit_id": run.audit_pack.audit_id,
        "audit_path": run.audit_path.as_ref().map(|p| p.display().to_string()),
        "confidence": run.audit_pack.confidence,
        "manifest_hash": run.audit_pack.manifest_hash,
        "metrics": coordinator.metrics().snapshot(),
    }))
}

/// Seeded failure scenario
pub fn simulate(
    config: &Config,
    scenario: ScenarioKind,
    count: usize,
    region: Option<&str>,
    seed: u64,
    clock: SharedClock,
) -> CliResult<Value> {
    let cluster = config.cluster()?;
    let mut simulator = FailoverSimulator::with_seed(cluster, config.policy.clone(), clock, seed);

    let result = match scenario {
        ScenarioKind::Primary => simulator.simulate_primary_failure(),
        ScenarioKind::Random => simulator.simulate_random_failures(count),
        ScenarioKind::Region => {
            let region = region
                .ok_or_else(|| CliError::config_error("--region is required for the region scenario"))?;
            simulator.simulate_region_failure(region)
        }
    };
    Ok(serde_json::to_value(result)?)
}

/// Recompute and compare a saved pack's manifest hash
pub fn verify_audit(pack_dir: &Path) -> CliResult<Value> {
    let pack = load_audit_pack(pack_dir)?;
    let recomputed = pack.manifest.compute_hash()?;

    if recomputed != pack.manifest_hash {
        return Err(CliError::audit_mismatch(format!(
            "audit {}: stored hash {} does not match recomputed {}",
            pack.audit_id, pack.manifest_hash, recomputed
        )));
    }

    let standalone = load_manifest(pack_dir)?;
    let standalone_hash = standalone.compute_hash()?;
    if standalone_hash != pack.manifest_hash {
        return Err(CliError::audit_mismatch(format!(
            "audit {}: {} hashes to {}, expected {}",
            pack.audit_id, MANIFEST_FILE, standalone_hash, pack.manifest_hash
        )));
    }
    if standalone != pack.manifest {
        return Err(CliError::audit_mismatch(format!(
            "audit {}: {} differs from the embedded manifest",
            pack.audit_id, MANIFEST_FILE
        )));
    }

    Ok(json!({
        "audit_id": pack.audit_id,
        "manifest_hash": recomputed,
        "valid": true,
    }))
}
