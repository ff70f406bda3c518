//! Failover Verifier
//!
//! Checks a finished execution against the post-failover cluster and the
//! policy. Four independent checks run every time:
//!
//! - consistency: exactly one primary, and it is healthy
//! - policy: execution succeeded; slow execution is only a warning
//! - quorum: re-derived from the heartbeat monitor
//! - freshness: the primary exists; an unhealthy primary is a warning
//!
//! Verification never raises. The verdict is always a `VerificationReport`.

use super::heartbeat::HeartbeatMonitor;
use super::model::{new_id, Cluster, FailoverPolicy, FailoverResult, VerificationReport};
use crate::clock::SharedClock;
use crate::observability::{log_event_with_fields, Event};

/// Diagnostics collected while verifying.
#[derive(Debug, Default)]
struct Findings {
    errors: Vec<String>,
    warnings: Vec<String>,
}

impl Findings {
    fn error(&mut self, message: impl Into<String>) {
        self.errors.push(message.into());
    }

    fn warn(&mut self, message: impl Into<String>) {
        self.warnings.push(message.into());
    }
}

/// Verifies executed failovers.
pub struct FailoverVerifier<'a> {
    clock: SharedClock,
    monitor: &'a HeartbeatMonitor,
}

impl<'a> FailoverVerifier<'a> {
    pub fn new(clock: SharedClock, monitor: &'a HeartbeatMonitor) -> Self {
        Self { clock, monitor }
    }

    /// Run all four checks and combine them.
    pub fn verify_failover(
        &self,
        result: &FailoverResult,
        cluster: &Cluster,
        policy: &FailoverPolicy,
    ) -> VerificationReport {
        let mut findings = Findings::default();

        let consistency_ok = Self::check_consistency(cluster, &mut findings);
        let policy_ok = Self::check_policy(result, policy, &mut findings);
        let quorum_ok = self.check_quorum(cluster, policy, &mut findings);
        let freshness_ok = Self::check_freshness(cluster, &mut findings);

        let passed = consistency_ok && policy_ok && quorum_ok && freshness_ok;
        let report = VerificationReport {
            report_id: new_id(),
            execution_id: result.execution_id.clone(),
            verified_at: self.clock.now(),
            consistency_ok,
            policy_ok,
            quorum_ok,
            freshness_ok,
            passed,
            errors: findings.errors,
            warnings: findings.warnings,
        };

        let errors = report.errors.len().to_string();
        let warnings = report.warnings.len().to_string();
        log_event_with_fields(
            if passed {
                Event::VerificationComplete
            } else {
                Event::VerificationFailed
            },
            &[
                ("errors", errors.as_str()),
                ("execution_id", report.execution_id.as_str()),
                ("warnings", warnings.as_str()),
            ],
        );
        report
    }

    fn check_consistency(cluster: &Cluster, findings: &mut Findings) -> bool {
        let primaries: Vec<_> = cluster.primaries().collect();
        match primaries.as_slice() {
            [] => {
                findings.error("Consistency: no primary node after failover");
                false
            }
            [primary] => {
                if primary.is_healthy() {
                    true
                } else {
                    findings.error(format!(
                        "Consistency: primary {} is {}",
                        primary.node_id, primary.status
                    ));
                    false
                }
            }
            many => {
                let ids: Vec<&str> = many.iter().map(|n| n.node_id.as_str()).collect();
                findings.error(format!(
                    "Consistency: {} primary nodes ({})",
                    many.len(),
                    ids.join(", ")
                ));
                false
            }
        }
    }

    fn check_policy(
        result: &FailoverResult,
        policy: &FailoverPolicy,
        findings: &mut Findings,
    ) -> bool {
        let budget_ms = policy.max_failover_time_ms();
        if result.total_duration_ms > budget_ms {
            findings.warn(format!(
                "Policy: failover took {}ms, exceeding the {}ms budget",
                result.total_duration_ms, budget_ms
            ));
        }

        if result.success {
            true
        } else {
            findings.error(format!(
                "Policy: execution failed with {} failed action(s)",
                result.actions_failed
            ));
            false
        }
    }

    fn check_quorum(
        &self,
        cluster: &Cluster,
        policy: &FailoverPolicy,
        findings: &mut Findings,
    ) -> bool {
        let quorum = self.monitor.calculate_quorum(cluster);
        let mut ok = true;

        if policy.require_quorum && !quorum.has_quorum {
            findings.error(format!(
                "Quorum: {} healthy of {} nodes, {} required",
                quorum.healthy_nodes, quorum.total_nodes, quorum.quorum_size
            ));
            ok = false;
        }
        if quorum.healthy_nodes < policy.min_healthy_nodes {
            findings.error(format!(
                "Quorum: {} healthy nodes, policy requires at least {}",
                quorum.healthy_nodes, policy.min_healthy_nodes
            ));
            ok = false;
        }
        ok
    }

    // Weak proxy: real freshness would compare replication lag.
    fn check_freshness(cluster: &Cluster, findings: &mut Findings) -> bool {
        match cluster.primary() {
            None => {
                findings.error("Freshness: no primary node to check");
                false
            }
            Some(primary) => {
                if !primary.is_healthy() {
                    findings.warn(format!(
                        "Freshness: primary {} is {}, data may be stale",
                        primary.node_id, primary.status
                    ));
                }
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::continuity::model::{Metadata, Node, NodeRole, NodeStatus};
    use chrono::Utc;
    use std::sync::Arc;

    fn post_cluster() -> Cluster {
        Cluster::new(
            "c-1",
            "prod",
            vec![
                Node::new("node-1", NodeRole::Secondary, "region-1", "site-a"),
                Node::new("node-2", NodeRole::Primary, "region-1", "site-b"),
                Node::new("node-3", NodeRole::Secondary, "region-2", "site-c"),
            ],
        )
        .unwrap()
    }

    fn result(success: bool, duration_ms: u64) -> FailoverResult {
        FailoverResult {
            execution_id: new_id(),
            plan_id: new_id(),
            started_at: Utc::now(),
            completed_at: Utc::now(),
            success,
            actions_executed: if success { 5 } else { 4 },
            actions_failed: if success { 0 } else { 1 },
            total_duration_ms: duration_ms,
            errors: vec![],
            action_outcomes: vec![],
            metadata: Metadata::new(),
        }
    }

    fn seeded(cluster: &Cluster) -> (Arc<ManualClock>, HeartbeatMonitor) {
        let clock = ManualClock::shared();
        let mut monitor = HeartbeatMonitor::new(clock.clone());
        monitor.simulate_heartbeats(&cluster.nodes, 1.0).unwrap();
        (clock, monitor)
    }

    #[test]
    fn test_healthy_failover_passes() {
        let cluster = post_cluster();
        let (clock, monitor) = seeded(&cluster);
        let verifier = FailoverVerifier::new(clock, &monitor);
        let policy = FailoverPolicy::new("p", "n").with_min_healthy_nodes(2);

        let report = verifier.verify_failover(&result(true, 1_000), &cluster, &policy);

        assert!(report.passed);
        assert!(report.errors.is_empty());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_two_primaries_fail_consistency() {
        let cluster = Cluster::new(
            "c-1",
            "prod",
            vec![
                Node::new("node-1", NodeRole::Primary, "r", "a"),
                Node::new("node-2", NodeRole::Primary, "r", "b"),
            ],
        )
        .unwrap();
        let (clock, monitor) = seeded(&cluster);
        let verifier = FailoverVerifier::new(clock, &monitor);

        let report =
            verifier.verify_failover(&result(true, 0), &cluster, &FailoverPolicy::new("p", "n"));

        assert!(!report.consistency_ok);
        assert!(report.freshness_ok);
        assert!(!report.passed);
        assert!(report.errors[0].contains("2 primary nodes"));
    }

    #[test]
    fn test_no_primary_fails_consistency_and_freshness() {
        let cluster = Cluster::new(
            "c-1",
            "prod",
            vec![
                Node::new("node-1", NodeRole::Secondary, "r", "a"),
                Node::new("node-2", NodeRole::Witness, "r", "b"),
            ],
        )
        .unwrap();
        let (clock, monitor) = seeded(&cluster);
        let verifier = FailoverVerifier::new(clock, &monitor);

        let report =
            verifier.verify_failover(&result(true, 0), &cluster, &FailoverPolicy::new("p", "n"));

        assert!(!report.consistency_ok);
        assert!(!report.freshness_ok);
        assert_eq!(report.errors.len(), 2);
    }

    #[test]
    fn test_unhealthy_primary() {
        let cluster = post_cluster().with_node_status("node-2", NodeStatus::Degraded);
        let (clock, monitor) = seeded(&cluster);
        let verifier = FailoverVerifier::new(clock, &monitor);

        let report =
            verifier.verify_failover(&result(true, 0), &cluster, &FailoverPolicy::new("p", "n"));

        assert!(!report.consistency_ok);
        // freshness only warns
        assert!(report.freshness_ok);
        assert_eq!(report.warnings.len(), 1);
    }

    #[test]
    fn test_slow_failover_is_a_warning() {
        let cluster = post_cluster();
        let (clock, monitor) = seeded(&cluster);
        let verifier = FailoverVerifier::new(clock, &monitor);
        let policy = FailoverPolicy::new("p", "n").with_max_failover_time_s(10);

        let report = verifier.verify_failover(&result(true, 10_001), &cluster, &policy);

        assert!(report.policy_ok);
        assert!(report.passed);
        assert_eq!(report.warnings.len(), 1);
        assert!(report.warnings[0].contains("10001ms"));
    }

    #[test]
    fn test_failed_execution_fails_policy() {
        let cluster = post_cluster();
        let (clock, monitor) = seeded(&cluster);
        let verifier = FailoverVerifier::new(clock, &monitor);

        let report =
            verifier.verify_failover(&result(false, 0), &cluster, &FailoverPolicy::new("p", "n"));

        assert!(!report.policy_ok);
        assert!(report.consistency_ok);
        assert!(!report.passed);
    }

    #[test]
    fn test_quorum_loss() {
        let cluster = post_cluster().with_nodes_failed(&["node-1", "node-3"]);
        let (clock, monitor) = seeded(&cluster);
        let verifier = FailoverVerifier::new(clock, &monitor);

        let strict = FailoverPolicy::new("p", "n");
        let report = verifier.verify_failover(&result(true, 0), &cluster, &strict);
        assert!(!report.quorum_ok);

        let relaxed = FailoverPolicy::new("p", "n").with_require_quorum(false);
        let report = verifier.verify_failover(&result(true, 0), &cluster, &relaxed);
        assert!(report.quorum_ok);
        assert!(report.passed);
    }

    #[test]
    fn test_min_healthy_nodes() {
        let cluster = post_cluster().with_nodes_failed(&["node-3"]);
        let (clock, monitor) = seeded(&cluster);
        let verifier = FailoverVerifier::new(clock, &monitor);
        let policy = FailoverPolicy::new("p", "n").with_min_healthy_nodes(3);

        let report = verifier.verify_failover(&result(true, 0), &cluster, &policy);

        assert!(!report.quorum_ok);
        assert!(report.errors[0].contains("at least 3"));
    }

    #[test]
    fn test_missing_heartbeats_count_as_unhealthy() {
        let cluster = post_cluster();
        let clock = ManualClock::shared();
        let monitor = HeartbeatMonitor::new(clock.clone());
        let verifier = FailoverVerifier::new(clock, &monitor);

        let report =
            verifier.verify_failover(&result(true, 0), &cluster, &FailoverPolicy::new("p", "n"));

        assert!(!report.quorum_ok);
        assert_eq!(report.errors.len(), 2);
    }
}
