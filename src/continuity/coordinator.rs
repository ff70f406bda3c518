//! Continuity Coordinator
//!
//! Runs plan → execute → verify → audit as one operation from the caller's
//! point of view. Each stage is appended to the audit trail and counted in
//! the failover metrics.
//!
//! Only a plan refusal or a persistence failure returns `Err`. A failed
//! execution or verification is a normal outcome carried by `CoordinatedRun`.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;

use super::auditor::{AuditPack, ContinuityAuditor};
use super::errors::ContinuityResult;
use super::executor::{ActionHandler, FailoverExecutor, RecordingHandler};
use super::heartbeat::HeartbeatMonitor;
use super::model::{
    ActionStatus, Cluster, ContinuityPlan, FailoverPolicy, FailoverResult, VerificationReport,
};
use super::planner::ContinuityPlanner;
use super::verifier::FailoverVerifier;
use crate::clock::SharedClock;
use crate::observability::{
    AuditTrail, FailoverMetrics, MemoryAuditTrail, ObservationScope, TrailAction, TrailOutcome,
    TrailRecord,
};

/// Latency stamped on heartbeats seeded from declared node status.
pub const DEFAULT_HEARTBEAT_LATENCY_MS: f64 = 5.0;

/// Everything one coordinated failover produced.
#[derive(Debug, Clone, Serialize)]
pub struct CoordinatedRun {
    pub plan: ContinuityPlan,
    pub result: FailoverResult,
    /// Cluster after applied role changes
    pub post_cluster: Cluster,
    pub verification: VerificationReport,
    pub audit_pack: AuditPack,
    /// Where the pack was saved, if an audit directory is configured
    pub audit_path: Option<PathBuf>,
}

/// Single entry point for a failover decision.
pub struct ContinuityCoordinator<H: ActionHandler = RecordingHandler> {
    clock: SharedClock,
    executor: FailoverExecutor<H>,
    trail: Arc<dyn AuditTrail>,
    metrics: Arc<FailoverMetrics>,
    audit_dir: Option<PathBuf>,
    heartbeat_latency_ms: f64,
}

impl ContinuityCoordinator<RecordingHandler> {
    /// Coordinator whose actions are recorded as intents.
    pub fn recording(clock: SharedClock) -> Self {
        Self::new(clock, RecordingHandler::new())
    }
}

impl<H: ActionHandler> ContinuityCoordinator<H> {
    /// In-memory trail, fresh metrics, nothing saved to disk.
    pub fn new(clock: SharedClock, handler: H) -> Self {
        Self {
            executor: FailoverExecutor::new(clock.clone(), handler),
            clock,
            trail: Arc::new(MemoryAuditTrail::new()),
            metrics: Arc::new(FailoverMetrics::new()),
            audit_dir: None,
            heartbeat_latency_ms: DEFAULT_HEARTBEAT_LATENCY_MS,
        }
    }

    pub fn with_trail(mut self, trail: Arc<dyn AuditTrail>) -> Self {
        self.trail = trail;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<FailoverMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Save every audit pack under `dir`.
    pub fn with_audit_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.audit_dir = Some(dir.into());
        self
    }

    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.executor = self.executor.with_dry_run(dry_run);
        self
    }

    pub fn with_heartbeat_latency_ms(mut self, latency_ms: f64) -> Self {
        self.heartbeat_latency_ms = latency_ms;
        self
    }

    pub fn metrics(&self) -> &FailoverMetrics {
        &self.metrics
    }

    pub fn handler(&self) -> &H {
        self.executor.handler()
    }

    pub fn audit_dir(&self) -> Option<&Path> {
        self.audit_dir.as_deref()
    }

    /// Run the pipeline with heartbeats seeded from declared node status.
    pub fn run(
        &mut self,
        cluster: &Cluster,
        policy: &FailoverPolicy,
        reason: &str,
    ) -> ContinuityResult<CoordinatedRun> {
        let mut monitor = HeartbeatMonitor::new(self.clock.clone());
        monitor.simulate_heartbeats(&cluster.nodes, self.heartbeat_latency_ms)?;
        self.run_with_monitor(&monitor, cluster, policy, reason)
    }

    /// Run the pipeline against heartbeats the caller already collected.
    pub fn run_with_monitor(
        &mut self,
        monitor: &HeartbeatMonitor,
        cluster: &Cluster,
        policy: &FailoverPolicy,
        reason: &str,
    ) -> ContinuityResult<CoordinatedRun> {
        let scope = ObservationScope::open(
            "FAILOVER",
            self.clock.clone(),
            &[("cluster_id", cluster.cluster_id.as_str()), ("reason", reason)],
        );

        let planner = ContinuityPlanner::new(self.clock.clone());
        let plan = match planner.build_plan(cluster, policy, reason) {
            Ok(plan) => plan,
            Err(err) => {
                scope.fail(&err.to_string());
                self.metrics.increment_plans_rejected();
                self.record(
                    TrailRecord::new(TrailAction::PlanRejected, TrailOutcome::Rejected, self.clock.now())
                        .with_detail(err.to_string()),
                )?;
                return Err(err);
            }
        };
        self.metrics.increment_plans_built();
        self.record(
            TrailRecord::new(TrailAction::PlanBuilt, TrailOutcome::Success, self.clock.now())
                .with_plan(&plan.plan_id)
                .with_detail(format!("{} -> {}", plan.primary_node_id, plan.failover_target_id)),
        )?;

        let result = self.executor.execute_plan(&plan);
        self.count_execution(&result);
        let mut executed = TrailRecord::new(
            TrailAction::ExecutionCompleted,
            TrailOutcome::from_success(result.success),
            self.clock.now(),
        )
        .with_plan(&plan.plan_id)
        .with_execution(&result.execution_id);
        if !result.errors.is_empty() {
            executed = executed.with_detail(result.errors.join("; "));
        }
        self.record(executed)?;

        let post_cluster = cluster.after_failover(&result);
        let verification = FailoverVerifier::new(self.clock.clone(), monitor)
            .verify_failover(&result, &post_cluster, policy);
        self.metrics.record_verification(verification.passed);
        let mut verified = TrailRecord::new(
            TrailAction::VerificationCompleted,
            TrailOutcome::from_success(verification.passed),
            self.clock.now(),
        )
        .with_plan(&plan.plan_id)
        .with_execution(&result.execution_id);
        if !verification.errors.is_empty() {
            verified = verified.with_detail(verification.errors.join("; "));
        }
        self.record(verified)?;

        let auditor = ContinuityAuditor::new(self.clock.clone());
        let audit_pack = auditor.generate_audit_pack(&plan, &result, &verification)?;
        self.record(
            TrailRecord::new(TrailAction::AuditPackGenerated, TrailOutcome::Success, self.clock.now())
                .with_plan(&plan.plan_id)
                .with_execution(&result.execution_id)
                .with_audit(&audit_pack.audit_id)
                .with_detail(format!(
                    "confidence {} ({})",
                    audit_pack.confidence.score, audit_pack.confidence.band
                )),
        )?;

        let audit_path = match &self.audit_dir {
            Some(dir) => {
                let saved = auditor.save_audit_pack(&audit_pack, dir)?;
                self.metrics.increment_audit_packs_written();
                self.record(
                    TrailRecord::new(TrailAction::AuditPackSaved, TrailOutcome::Success, self.clock.now())
                        .with_audit(&audit_pack.audit_id)
                        .with_detail(saved.display().to_string()),
                )?;
                Some(saved)
            }
            None => None,
        };

        scope.complete(&[
            ("plan_id", plan.plan_id.as_str()),
            ("target", plan.failover_target_id.as_str()),
            ("verified", if verification.passed { "true" } else { "false" }),
        ]);

        Ok(CoordinatedRun {
            plan,
            result,
            post_cluster,
            verification,
            audit_pack,
            audit_path,
        })
    }

    fn count_execution(&self, result: &FailoverResult) {
        self.metrics.increment_executions();
        let count = |status: ActionStatus| {
            result
                .action_outcomes
                .iter()
                .filter(|o| o.status == status)
                .count() as u64
        };
        self.metrics.add_actions(
            count(ActionStatus::Applied),
            count(ActionStatus::Failed),
            count(ActionStatus::Skipped),
        );
    }

    fn record(&self, record: TrailRecord) -> ContinuityResult<()> {
        self.trail.append(&record)?;
        Ok(())
    }
}
