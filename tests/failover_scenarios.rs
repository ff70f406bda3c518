//! End-to-end Failover Scenarios
//!
//! Drives heartbeat → plan → execute → verify → audit against small
//! clusters and checks the decisions and verdicts at each step.

use continuity::clock::ManualClock;
use continuity::continuity::{
    ActionHandler, ActionStatus, ActionType, Cluster, ConfidenceBand, ContinuityCoordinator,
    ContinuityError, ContinuityPlanner, ContinuityResult, FailoverAction, FailoverExecutor,
    FailoverPolicy, FailoverSimulator, Node, NodeRole, NodeStatus,
};

fn three_node_cluster() -> Cluster {
    Cluster::new(
        "c-1",
        "prod",
        vec![
            Node::new("node-1", NodeRole::Primary, "region-1", "site-a").with_priority(100),
            Node::new("node-2", NodeRole::Secondary, "region-1", "site-b").with_priority(90),
            Node::new("node-3", NodeRole::Secondary, "region-2", "site-c").with_priority(80),
        ],
    )
    .unwrap()
}

fn policy() -> FailoverPolicy {
    FailoverPolicy::new("p-1", "default").with_region_priority(["region-1", "region-2"])
}

/// Handler that fails one kind of action and records every attempt.
struct FailingHandler {
    fail_on: ActionType,
    attempted: Vec<ActionType>,
}

impl FailingHandler {
    fn new(fail_on: ActionType) -> Self {
        Self {
            fail_on,
            attempted: Vec::new(),
        }
    }

    fn handle(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.attempted.push(action.action_type);
        if action.action_type == self.fail_on {
            return Err(ContinuityError::action_failed(
                action.action_type.as_str(),
                &action.target_node_id,
                "provider unavailable",
            ));
        }
        Ok(())
    }
}

impl ActionHandler for FailingHandler {
    fn demote(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.handle(action)
    }

    fn promote(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.handle(action)
    }

    fn dns_flip(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.handle(action)
    }

    fn notify(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.handle(action)
    }

    fn verify(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.handle(action)
    }

    fn restart(&mut self, action: &FailoverAction) -> ContinuityResult<()> {
        self.handle(action)
    }
}

// =============================================================================
// Target Selection
// =============================================================================

/// All healthy: same-region secondary takes over, verification passes,
/// confidence is high.
#[test]
fn test_healthy_cluster_fails_over_to_preferred_region() {
    let mut coordinator = ContinuityCoordinator::recording(ManualClock::shared());
    let run = coordinator
        .run(&three_node_cluster(), &policy(), "primary unresponsive")
        .unwrap();

    assert_eq!(run.plan.primary_node_id, "node-1");
    assert_eq!(run.plan.failover_target_id, "node-2");
    assert!(run.result.success);
    assert!(run.verification.passed);
    assert!(matches!(
        run.audit_pack.confidence.band,
        ConfidenceBand::High | ConfidenceBand::VeryHigh
    ));

    assert_eq!(run.post_cluster.primary().unwrap().node_id, "node-2");
    assert_eq!(run.post_cluster.node("node-1").unwrap().role, NodeRole::Secondary);
}

/// Failed secondary is skipped; the next candidate wins.
#[test]
fn test_failed_secondary_is_not_a_candidate() {
    let cluster = three_node_cluster().with_node_status("node-2", NodeStatus::Failed);
    let plan = ContinuityPlanner::new(ManualClock::shared())
        .build_plan(&cluster, &policy(), "primary unresponsive")
        .unwrap();

    assert_eq!(plan.failover_target_id, "node-3");
}

/// A lone primary has nowhere to go.
#[test]
fn test_lone_primary_has_no_target() {
    let cluster = Cluster::new(
        "c-1",
        "prod",
        vec![Node::new("node-1", NodeRole::Primary, "region-1", "site-a").with_priority(100)],
    )
    .unwrap();

    let err = ContinuityPlanner::new(ManualClock::shared())
        .build_plan(&cluster, &policy(), "primary unresponsive")
        .unwrap_err();

    assert!(matches!(err, ContinuityError::NoSuitableTarget));
    assert!(err.to_string().to_lowercase().contains("no suitable failover target"));
    assert!(err.is_fatal());
}

/// Witnesses are never promoted even when they are the only other node.
#[test]
fn test_witness_is_never_promoted() {
    let cluster = Cluster::new(
        "c-1",
        "prod",
        vec![
            Node::new("node-1", NodeRole::Primary, "region-1", "site-a"),
            Node::new("node-2", NodeRole::Witness, "region-1", "site-b").with_priority(1000),
        ],
    )
    .unwrap();

    let err = ContinuityPlanner::new(ManualClock::shared())
        .build_plan(&cluster, &policy(), "t")
        .unwrap_err();
    assert!(matches!(err, ContinuityError::NoSuitableTarget));
}

/// Region preference outweighs a small raw-priority advantage.
#[test]
fn test_region_weight_dominates_priority() {
    let reversed = FailoverPolicy::new("p-2", "prefer region-2")
        .with_region_priority(["region-2", "region-1"]);

    let plan = ContinuityPlanner::new(ManualClock::shared())
        .build_plan(&three_node_cluster(), &reversed, "t")
        .unwrap();

    // node-2 has 10 more priority points; one region rank is worth 1000
    assert_eq!(plan.failover_target_id, "node-3");

    let scores = ContinuityPlanner::score_candidates(&three_node_cluster(), &reversed);
    assert_eq!(scores[0].node_id, "node-3");
    assert!(scores[0].score - scores[1].score >= 900.0);
}

/// Equal scores resolve to the earlier node in cluster order.
#[test]
fn test_ties_go_to_cluster_order() {
    let cluster = Cluster::new(
        "c-1",
        "prod",
        vec![
            Node::new("node-1", NodeRole::Primary, "region-1", "site-a"),
            Node::new("node-b", NodeRole::Secondary, "region-1", "site-b").with_priority(50),
            Node::new("node-a", NodeRole::Secondary, "region-1", "site-b").with_priority(50),
        ],
    )
    .unwrap();

    let plan = ContinuityPlanner::new(ManualClock::shared())
        .build_plan(&cluster, &policy(), "t")
        .unwrap();
    assert_eq!(plan.failover_target_id, "node-b");
}

// =============================================================================
// Failure Isolation
// =============================================================================

/// One failing action does not abort the rest; verification still runs on
/// the post-execution cluster.
#[test]
fn test_failing_action_does_not_abort_execution() {
    let mut coordinator =
        ContinuityCoordinator::new(ManualClock::shared(), FailingHandler::new(ActionType::DnsFlip));
    let run = coordinator
        .run(&three_node_cluster(), &policy(), "primary unresponsive")
        .unwrap();

    assert!(!run.result.success);
    assert_eq!(run.result.actions_failed, 1);
    assert_eq!(run.result.actions_executed, 4);
    assert_eq!(run.result.actions_attempted(), 5);
    assert_eq!(run.result.action_outcomes.len(), 5);
    assert_eq!(run.result.errors.len(), 1);

    assert_eq!(
        coordinator.handler().attempted,
        vec![
            ActionType::Demote,
            ActionType::Promote,
            ActionType::DnsFlip,
            ActionType::Notify,
            ActionType::Verify,
        ]
    );

    let failed: Vec<_> = run
        .result
        .action_outcomes
        .iter()
        .filter(|o| o.status == ActionStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].action_type, ActionType::DnsFlip);

    // demote and promote were applied before the failure
    assert_eq!(run.post_cluster.primary().unwrap().node_id, "node-2");
    assert_eq!(run.verification.execution_id, run.result.execution_id);
    assert!(run.verification.consistency_ok);
    assert!(!run.verification.policy_ok);
    assert!(!run.verification.passed);

    assert_eq!(run.audit_pack.manifest.actions_failed, 1);
    assert!(run.audit_pack.confidence.score < 90);
}

/// A failed promotion leaves the cluster without a primary and verification
/// reports it.
#[test]
fn test_failed_promotion_breaks_consistency() {
    let mut executor =
        FailoverExecutor::new(ManualClock::shared(), FailingHandler::new(ActionType::Promote));
    let cluster = three_node_cluster();
    let plan = ContinuityPlanner::new(ManualClock::shared())
        .build_plan(&cluster, &policy(), "t")
        .unwrap();

    let result = executor.execute_plan(&plan);
    assert_eq!(result.actions_failed, 1);
    assert_eq!(executor.handler().attempted.len(), 5);

    let after = cluster.after_failover(&result);
    assert!(after.primary().is_none());

    let mut coordinator =
        ContinuityCoordinator::new(ManualClock::shared(), FailingHandler::new(ActionType::Promote));
    let run = coordinator.run(&cluster, &policy(), "t").unwrap();
    assert!(!run.verification.consistency_ok);
    assert!(!run.verification.freshness_ok);
    assert_eq!(run.audit_pack.confidence.band, ConfidenceBand::Low);
}

/// Dry run skips every mutating action and leaves roles untouched.
#[test]
fn test_dry_run_changes_nothing() {
    let mut coordinator =
        ContinuityCoordinator::recording(ManualClock::shared()).with_dry_run(true);
    let run = coordinator.run(&three_node_cluster(), &policy(), "drill").unwrap();

    assert!(run.result.success);
    let statuses: Vec<_> = run.result.action_outcomes.iter().map(|o| o.status).collect();
    assert_eq!(
        statuses,
        vec![
            ActionStatus::Skipped,
            ActionStatus::Skipped,
            ActionStatus::Skipped,
            ActionStatus::Skipped,
            ActionStatus::Applied,
        ]
    );
    assert_eq!(run.post_cluster, three_node_cluster());
    assert_eq!(coordinator.handler().intents().len(), 1);
}

// =============================================================================
// Simulated Failures
// =============================================================================

/// Losing the primary alone is survivable.
#[test]
fn test_simulated_primary_failure_recovers() {
    let mut sim =
        FailoverSimulator::with_seed(three_node_cluster(), policy(), ManualClock::shared(), 7);
    let outcome = sim.simulate_primary_failure();

    assert!(outcome.success, "errors: {:?}", outcome.verification_report);
    assert!(outcome.error.is_none());
    let result = outcome.failover_result.unwrap();
    assert_eq!(result.metadata["failover_target_id"], "node-2");
}

/// Losing a whole region leaves a primary but no quorum.
#[test]
fn test_simulated_region_failure_loses_quorum() {
    let mut sim =
        FailoverSimulator::with_seed(three_node_cluster(), policy(), ManualClock::shared(), 7);
    let outcome = sim.simulate_region_failure("region-1");

    assert!(!outcome.success);
    let report = outcome.verification_report.unwrap();
    assert!(report.consistency_ok);
    assert!(!report.quorum_ok);
    assert_eq!(
        outcome.failover_result.unwrap().metadata["failover_target_id"],
        "node-3"
    );
}

/// When every secondary is down the simulation ends at planning.
#[test]
fn test_simulated_total_loss_reports_planning_error() {
    let mut sim =
        FailoverSimulator::with_seed(three_node_cluster(), policy(), ManualClock::shared(), 7);
    let outcome = sim.simulate_random_failures(3);

    assert!(!outcome.success);
    assert!(outcome.failover_result.is_none());
    assert!(outcome.verification_report.is_none());
    assert!(outcome.error.is_some());
}
