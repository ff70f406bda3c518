//! Failover Simulator
//!
//! Drives heartbeat → plan → execute → verify end-to-end for scripted
//! failure scenarios. Randomness comes from the `StdRng` handed to the
//! simulator, so the same seed selects the same failed nodes and yields the
//! same outcome (generated ids aside).

use std::fmt;

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};

use super::executor::FailoverExecutor;
use super::heartbeat::HeartbeatMonitor;
use super::model::{Cluster, FailoverPolicy, FailoverResult, VerificationReport};
use super::planner::ContinuityPlanner;
use super::verifier::FailoverVerifier;
use crate::clock::SharedClock;
use crate::observability::{log_event_with_fields, Event};

/// Latency stamped on simulated heartbeats.
pub const SIMULATED_LATENCY_MS: f64 = 5.0;

/// A scripted failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scenario {
    /// The declared primary fails
    PrimaryFailure,
    /// `count` nodes chosen at random fail
    RandomFailures { count: usize, failed: Vec<String> },
    /// Every node in `region` fails
    RegionFailure { region: String },
}

impl Scenario {
    pub fn name(&self) -> &'static str {
        match self {
            Scenario::PrimaryFailure => "primary_failure",
            Scenario::RandomFailures { .. } => "random_failures",
            Scenario::RegionFailure { .. } => "region_failure",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::PrimaryFailure => write!(f, "primary_failure"),
            Scenario::RandomFailures { count, .. } => write!(f, "random_failures({})", count),
            Scenario::RegionFailure { region } => write!(f, "region_failure({})", region),
        }
    }
}

/// Outcome of one simulated scenario.
///
/// `failover_result` and `verification_report` are absent when planning
/// refused to proceed; `error` then carries the refusal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    pub scenario: Scenario,
    /// Plan built, every action succeeded and verification passed
    pub success: bool,
    pub failover_result: Option<FailoverResult>,
    pub verification_report: Option<VerificationReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Deterministic failure-scenario harness.
pub struct FailoverSimulator {
    cluster: Cluster,
    policy: FailoverPolicy,
    clock: SharedClock,
    rng: StdRng,
}

impl FailoverSimulator {
    pub fn new(cluster: Cluster, policy: FailoverPolicy, clock: SharedClock, rng: StdRng) -> Self {
        Self {
            cluster,
            policy,
            clock,
            rng,
        }
    }

    /// Simulator driven by `StdRng::seed_from_u64(seed)`.
    pub fn with_seed(cluster: Cluster, policy: FailoverPolicy, clock: SharedClock, seed: u64) -> Self {
        Self::new(cluster, policy, clock, StdRng::seed_from_u64(seed))
    }

    pub fn cluster(&self) -> &Cluster {
        &self.cluster
    }

    /// Fail the declared primary and fail over away from it.
    pub fn simulate_primary_failure(&mut self) -> SimulationResult {
        let failed: Vec<String> = self.cluster.primary().map(|p| p.node_id.clone()).into_iter().collect();
        self.run(Scenario::PrimaryFailure, &failed)
    }

    /// Fail `count` distinct nodes picked by the seeded generator.
    ///
    /// May legitimately end without a plan when every healthy secondary is
    /// among the picked nodes.
    pub fn simulate_random_failures(&mut self, count: usize) -> SimulationResult {
        let ids: Vec<String> = self.cluster.nodes.iter().map(|n| n.node_id.clone()).collect();
        let failed: Vec<String> = ids
            .choose_multiple(&mut self.rng, count.min(ids.len()))
            .cloned()
            .collect();
        self.run(
            Scenario::RandomFailures {
                count,
                failed: failed.clone(),
            },
            &failed,
        )
    }

    /// Fail every node located in `region`.
    pub fn simulate_region_failure(&mut self, region: &str) -> SimulationResult {
        let failed: Vec<String> = self
            .cluster
            .nodes_in_region(region)
            .map(|n| n.node_id.clone())
            .collect();
        self.run(
            Scenario::RegionFailure {
                region: region.to_string(),
            },
            &failed,
        )
    }

    fn run(&self, scenario: Scenario, failed: &[String]) -> SimulationResult {
        let failed_list = failed.join(",");
        let label = scenario.to_string();
        log_event_with_fields(
            Event::SimulationBegin,
            &[("failed", failed_list.as_str()), ("scenario", label.as_str())],
        );

        let degraded = self.cluster.with_nodes_failed(failed);
        let result = self.pipeline(scenario, &degraded);

        log_event_with_fields(
            Event::SimulationComplete,
            &[
                ("scenario", label.as_str()),
                ("success", if result.success { "true" } else { "false" }),
            ],
        );
        result
    }

    fn pipeline(&self, scenario: Scenario, degraded: &Cluster) -> SimulationResult {
        let mut monitor = HeartbeatMonitor::new(self.clock.clone());
        if let Err(err) = monitor.simulate_heartbeats(&degraded.nodes, SIMULATED_LATENCY_MS) {
            return Self::aborted(scenario, err.to_string());
        }

        let reason = format!("simulated {}", scenario.name());
        let plan = match ContinuityPlanner::new(self.clock.clone()).build_plan(degraded, &self.policy, &reason) {
            Ok(plan) => plan,
            Err(err) => return Self::aborted(scenario, err.to_string()),
        };

        let failover = FailoverExecutor::recording(self.clock.clone()).execute_plan(&plan);
        let post_cluster = degraded.after_failover(&failover);
        let report = FailoverVerifier::new(self.clock.clone(), &monitor)
            .verify_failover(&failover, &post_cluster, &self.policy);

        SimulationResult {
            scenario,
            success: failover.success && report.passed,
            failover_result: Some(failover),
            verification_report: Some(report),
            error: None,
        }
    }

    fn aborted(scenario: Scenario, error: String) -> SimulationResult {
        SimulationResult {
            scenario,
            success: false,
            failover_result: None,
            verification_report: None,
            error: Some(error),
        }
    }
}
