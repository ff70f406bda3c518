//! Continuity Planner
//!
//! Chooses a failover target and lays out the fixed remediation sequence:
//! demote → promote → dns_flip → notify → verify.
//!
//! Planning is a pure function of the cluster snapshot, the policy and the
//! clock. Only the generated ids differ between two runs on equal inputs.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::errors::{ContinuityError, ContinuityResult};
use super::model::{
    new_id, ActionType, Cluster, ContinuityPlan, FailoverAction, FailoverPolicy,
    FailoverStrategy, Metadata, Node, NodeRole,
};
use crate::clock::SharedClock;
use crate::observability::{log_event_with_fields, Event};

/// Points per rank step in `region_priority`.
pub const REGION_WEIGHT: f64 = 1000.0;

/// Points per rank step in `site_priority`.
pub const SITE_WEIGHT: f64 = 500.0;

// Estimated action durations. Illustrative defaults, tune per deployment.
pub const DEMOTE_DURATION_MS: u64 = 5_000;
pub const PROMOTE_DURATION_MS: u64 = 10_000;
pub const DNS_FLIP_DURATION_MS: u64 = 15_000;
pub const NOTIFY_DURATION_MS: u64 = 2_000;
pub const VERIFY_DURATION_MS: u64 = 8_000;

/// TTL written into the `dns_flip` parameters.
pub const DNS_TTL_S: u64 = 60;

/// A failover candidate and its computed score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateScore {
    pub node_id: String,
    pub score: f64,
}

/// Builds continuity plans.
pub struct ContinuityPlanner {
    clock: SharedClock,
}

impl ContinuityPlanner {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// Build a failover plan away from the cluster's primary.
    ///
    /// Fails with `NoPrimary` when no node holds the primary role and with
    /// `NoSuitableTarget` when no healthy secondary exists. Nothing is
    /// executed either way.
    pub fn build_plan(
        &self,
        cluster: &Cluster,
        policy: &FailoverPolicy,
        trigger_reason: &str,
    ) -> ContinuityResult<ContinuityPlan> {
        log_event_with_fields(
            Event::PlanBuildBegin,
            &[
                ("cluster_id", cluster.cluster_id.as_str()),
                ("policy_id", policy.policy_id.as_str()),
                ("reason", trigger_reason),
            ],
        );

        let primary = match cluster.primary() {
            Some(primary) => primary,
            None => return Err(Self::reject(cluster, ContinuityError::NoPrimary)),
        };

        let ranked = Self::score_candidates(cluster, policy);
        let best = match ranked.first() {
            Some(best) => best,
            None => return Err(Self::reject(cluster, ContinuityError::NoSuitableTarget)),
        };
        let target = match cluster.node(&best.node_id) {
            Some(target) => target,
            None => return Err(Self::reject(cluster, ContinuityError::NoSuitableTarget)),
        };

        let actions = Self::build_actions(primary, target, trigger_reason);
        let estimated_total_ms: u64 = actions.iter().map(|a| a.estimated_duration_ms).sum();

        let mut metadata = Metadata::new();
        metadata.insert("trigger_reason".into(), json!(trigger_reason));
        metadata.insert("strategy".into(), json!(policy.strategy.as_str()));
        metadata.insert("cluster_name".into(), json!(cluster.name));
        metadata.insert("target_score".into(), json!(best.score));
        metadata.insert("candidate_count".into(), json!(ranked.len()));
        metadata.insert(
            "requires_approval".into(),
            json!(policy.strategy == FailoverStrategy::Manual),
        );

        let plan = ContinuityPlan {
            plan_id: new_id(),
            cluster_id: cluster.cluster_id.clone(),
            policy_id: policy.policy_id.clone(),
            created_at: self.clock.now(),
            actions,
            estimated_total_ms,
            primary_node_id: primary.node_id.clone(),
            failover_target_id: target.node_id.clone(),
            metadata,
        };

        log_event_with_fields(
            Event::PlanBuilt,
            &[
                ("cluster_id", plan.cluster_id.as_str()),
                ("plan_id", plan.plan_id.as_str()),
                ("primary", plan.primary_node_id.as_str()),
                ("target", plan.failover_target_id.as_str()),
            ],
        );
        Ok(plan)
    }

    /// Rank eligible candidates, best first.
    ///
    /// Eligible: secondary, healthy and not the primary. Ties keep cluster
    /// order because the sort is stable.
    pub fn score_candidates(cluster: &Cluster, policy: &FailoverPolicy) -> Vec<CandidateScore> {
        let primary_id = cluster.primary().map(|p| p.node_id.as_str());

        let mut ranked: Vec<CandidateScore> = cluster
            .nodes
            .iter()
            .filter(|n| {
                n.role == NodeRole::Secondary && n.is_healthy() && Some(n.node_id.as_str()) != primary_id
            })
            .map(|n| CandidateScore {
                node_id: n.node_id.clone(),
                score: Self::score_node(n, policy),
            })
            .collect();

        ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        ranked
    }

    /// Region rank, site rank, raw priority and capacity, summed.
    pub fn score_node(node: &Node, policy: &FailoverPolicy) -> f64 {
        let region = rank_points(&policy.region_priority, &node.region, REGION_WEIGHT);
        let site = rank_points(&policy.site_priority, &node.site, SITE_WEIGHT);
        region + site + f64::from(node.priority) + node.capacity
    }

    fn build_actions(primary: &Node, target: &Node, trigger_reason: &str) -> Vec<FailoverAction> {
        let message = format!(
            "Failover from {} to {}: {}",
            primary.node_id, target.node_id, trigger_reason
        );

        vec![
            FailoverAction::new(ActionType::Demote, &primary.node_id, 1, DEMOTE_DURATION_MS),
            FailoverAction::new(ActionType::Promote, &target.node_id, 2, PROMOTE_DURATION_MS),
            FailoverAction::new(ActionType::DnsFlip, &target.node_id, 3, DNS_FLIP_DURATION_MS)
                .with_param("old_host", primary.host())
                .with_param("new_host", target.host())
                .with_param("ttl", DNS_TTL_S),
            FailoverAction::new(ActionType::Notify, &target.node_id, 4, NOTIFY_DURATION_MS)
                .with_param("message", message)
                .with_param("channels", json!(["ops", "audit"])),
            FailoverAction::new(ActionType::Verify, &target.node_id, 5, VERIFY_DURATION_MS)
                .with_param("checks", json!(["quorum", "consistency", "policy"])),
        ]
    }

    fn reject(cluster: &Cluster, err: ContinuityError) -> ContinuityError {
        let reason = err.to_string();
        log_event_with_fields(
            Event::PlanRejected,
            &[
                ("cluster_id", cluster.cluster_id.as_str()),
                ("reason", reason.as_str()),
            ],
        );
        err
    }
}

/// `weight × (len − index)` when listed, 0 otherwise.
fn rank_points(ranking: &[String], value: &str, weight: f64) -> f64 {
    match ranking.iter().position(|r| r == value) {
        Some(index) => weight * (ranking.len() - index) as f64,
        None => 0.0,
    }
}
