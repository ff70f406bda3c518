//! Continuity Data Model
//!
//! All entities are value objects. Nothing here is mutated in place:
//! an "update" builds a new value (`Node::with_status`,
//! `Cluster::with_node_status`, `Cluster::after_failover`).
//! Cross-references between entities are by id only.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use super::errors::{ContinuityError, ContinuityResult};
use super::heartbeat::quorum_size;

/// Opaque key/value parameters attached to an action.
///
/// Ordered so that canonical serialization is stable.
pub type Params = BTreeMap<String, Value>;

/// Free-form metadata on plans and results.
pub type Metadata = BTreeMap<String, Value>;

/// Highest allowed node priority.
pub const MAX_PRIORITY: u32 = 1000;

/// Highest allowed node capacity.
pub const MAX_CAPACITY: f64 = 100.0;

/// Generate a fresh globally unique identifier.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Nodes
// =============================================================================

/// Node role within a cluster.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeRole {
    /// Serves writes
    Primary,
    /// Can be promoted
    Secondary,
    /// Counts towards quorum only
    Witness,
}

impl NodeRole {
    /// Returns the role name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Primary => "primary",
            NodeRole::Secondary => "secondary",
            NodeRole::Witness => "witness",
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Declared node health.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeStatus {
    Healthy,
    Degraded,
    Failed,
}

impl NodeStatus {
    /// Returns the status name.
    pub fn as_str(&self) -> &'static str {
        match self {
            NodeStatus::Healthy => "healthy",
            NodeStatus::Degraded => "degraded",
            NodeStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for NodeStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

fn default_status() -> NodeStatus {
    NodeStatus::Healthy
}

fn default_capacity() -> f64 {
    MAX_CAPACITY
}

/// A cluster member as reported by the topology source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Node {
    pub node_id: String,
    #[serde(default)]
    pub hostname: String,
    pub role: NodeRole,
    pub region: String,
    #[serde(default)]
    pub site: String,
    #[serde(default = "default_status")]
    pub status: NodeStatus,
    /// 0..=1000
    #[serde(default)]
    pub priority: u32,
    /// 0..=100, finite
    #[serde(default = "default_capacity")]
    pub capacity: f64,
}

impl Node {
    /// Create a healthy node with zero priority and full capacity.
    ///
    /// The hostname defaults to the node id.
    pub fn new(
        node_id: impl Into<String>,
        role: NodeRole,
        region: impl Into<String>,
        site: impl Into<String>,
    ) -> Self {
        let node_id = node_id.into();
        Self {
            hostname: node_id.clone(),
            node_id,
            role,
            region: region.into(),
            site: site.into(),
            status: NodeStatus::Healthy,
            priority: 0,
            capacity: MAX_CAPACITY,
        }
    }

    /// Set hostname.
    pub fn with_hostname(mut self, hostname: impl Into<String>) -> Self {
        self.hostname = hostname.into();
        self
    }

    /// Copy with a different status.
    pub fn with_status(mut self, status: NodeStatus) -> Self {
        self.status = status;
        self
    }

    /// Copy with a different role.
    pub fn with_role(mut self, role: NodeRole) -> Self {
        self.role = role;
        self
    }

    /// Set priority.
    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    /// Set capacity.
    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = capacity;
        self
    }

    /// Address used for DNS; falls back to the node id when no hostname is set.
    pub fn host(&self) -> &str {
        if self.hostname.is_empty() {
            &self.node_id
        } else {
            &self.hostname
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.status == NodeStatus::Healthy
    }

    pub fn is_primary(&self) -> bool {
        self.role == NodeRole::Primary
    }

    /// Check field ranges.
    pub fn validate(&self) -> ContinuityResult<()> {
        if self.node_id.trim().is_empty() {
            return Err(ContinuityError::invalid_node(&self.node_id, "node_id is empty"));
        }
        if self.priority > MAX_PRIORITY {
            return Err(ContinuityError::invalid_node(
                &self.node_id,
                format!("priority {} exceeds {}", self.priority, MAX_PRIORITY),
            ));
        }
        if !self.capacity.is_finite() {
            return Err(ContinuityError::invalid_node(
                &self.node_id,
                "capacity must be finite",
            ));
        }
        if !(0.0..=MAX_CAPACITY).contains(&self.capacity) {
            return Err(ContinuityError::invalid_node(
                &self.node_id,
                format!("capacity {} outside 0..={}", self.capacity, MAX_CAPACITY),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Cluster
// =============================================================================

/// Point-in-time snapshot of a cluster's topology.
///
/// Deserialization goes through [`Cluster::new`]: serialized `quorum_size`
/// and `regions` are ignored and re-derived.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ClusterSnapshot")]
pub struct Cluster {
    pub cluster_id: String,
    pub name: String,
    pub nodes: Vec<Node>,
    /// Strict majority of `nodes`
    pub quorum_size: usize,
    /// Distinct regions in first-appearance order
    pub regions: Vec<String>,
}

/// Wire form of a cluster; only the declared fields.
#[derive(Deserialize)]
struct ClusterSnapshot {
    cluster_id: String,
    name: String,
    nodes: Vec<Node>,
}

impl TryFrom<ClusterSnapshot> for Cluster {
    type Error = ContinuityError;

    fn try_from(raw: ClusterSnapshot) -> ContinuityResult<Self> {
        Cluster::new(raw.cluster_id, raw.name, raw.nodes)
    }
}

impl Cluster {
    /// Build a validated snapshot. Quorum size and regions are derived.
    pub fn new(
        cluster_id: impl Into<String>,
        name: impl Into<String>,
        nodes: Vec<Node>,
    ) -> ContinuityResult<Self> {
        let mut seen = HashSet::new();
        for node in &nodes {
            node.validate()?;
            if !seen.insert(node.node_id.as_str()) {
                return Err(ContinuityError::DuplicateNode(node.node_id.clone()));
            }
        }

        let quorum_size = quorum_size(nodes.len())?;

        let mut regions: Vec<String> = Vec::new();
        for node in &nodes {
            if !regions.contains(&node.region) {
                regions.push(node.region.clone());
            }
        }

        Ok(Self {
            cluster_id: cluster_id.into(),
            name: name.into(),
            nodes,
            quorum_size,
            regions,
        })
    }

    /// Look up a node by id.
    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.node_id == node_id)
    }

    /// All nodes in the primary role, in cluster order.
    pub fn primaries(&self) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(|n| n.is_primary())
    }

    /// First node in the primary role.
    pub fn primary(&self) -> Option<&Node> {
        self.primaries().next()
    }

    /// Nodes located in `region`.
    pub fn nodes_in_region<'a>(&'a self, region: &'a str) -> impl Iterator<Item = &'a Node> {
        self.nodes.iter().filter(move |n| n.region == region)
    }

    /// New snapshot with one node's status replaced.
    pub fn with_node_status(&self, node_id: &str, status: NodeStatus) -> Cluster {
        self.map_nodes(|node| {
            if node.node_id == node_id {
                node.clone().with_status(status)
            } else {
                node.clone()
            }
        })
    }

    /// New snapshot with every listed node marked failed.
    pub fn with_nodes_failed<S: AsRef<str>>(&self, node_ids: &[S]) -> Cluster {
        self.map_nodes(|node| {
            if node_ids.iter().any(|id| id.as_ref() == node.node_id) {
                node.clone().with_status(NodeStatus::Failed)
            } else {
                node.clone()
            }
        })
    }

    /// Snapshot after the applied role changes of an execution.
    ///
    /// Applied `demote` actions turn their target into a secondary, applied
    /// `promote` actions turn their target into the primary. Skipped and
    /// failed actions leave the topology untouched.
    pub fn after_failover(&self, result: &FailoverResult) -> Cluster {
        let mut outcomes: Vec<&ActionOutcome> = result
            .action_outcomes
            .iter()
            .filter(|o| o.status == ActionStatus::Applied)
            .collect();
        outcomes.sort_by_key(|o| o.sequence);

        let mut nodes = self.nodes.clone();
        for outcome in outcomes {
            let role = match outcome.action_type {
                ActionType::Demote => NodeRole::Secondary,
                ActionType::Promote => NodeRole::Primary,
                _ => continue,
            };
            if let Some(node) = nodes.iter_mut().find(|n| n.node_id == outcome.target_node_id) {
                *node = node.clone().with_role(role);
            }
        }

        Cluster {
            nodes,
            ..self.clone()
        }
    }

    fn map_nodes<F: FnMut(&Node) -> Node>(&self, f: F) -> Cluster {
        Cluster {
            nodes: self.nodes.iter().map(f).collect(),
            ..self.clone()
        }
    }
}

// =============================================================================
// Policy
// =============================================================================

/// How a failover decision is enacted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailoverStrategy {
    #[default]
    Automatic,
    /// Plan is produced but an operator must approve execution
    Manual,
}

impl FailoverStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailoverStrategy::Automatic => "automatic",
            FailoverStrategy::Manual => "manual",
        }
    }
}

fn default_max_failover_time_s() -> u64 {
    300
}

fn default_require_quorum() -> bool {
    true
}

fn default_min_healthy_nodes() -> usize {
    1
}

/// Failover configuration in effect for one decision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailoverPolicy {
    pub policy_id: String,
    pub name: String,
    #[serde(default)]
    pub strategy: FailoverStrategy,
    #[serde(default = "default_max_failover_time_s")]
    pub max_failover_time_s: u64,
    #[serde(default = "default_require_quorum")]
    pub require_quorum: bool,
    /// Most preferred first
    #[serde(default)]
    pub region_priority: Vec<String>,
    /// Most preferred first
    #[serde(default)]
    pub site_priority: Vec<String>,
    #[serde(default = "default_min_healthy_nodes")]
    pub min_healthy_nodes: usize,
}

impl FailoverPolicy {
    /// Automatic policy with quorum required, a 300s budget and no
    /// region or site preferences.
    pub fn new(policy_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            policy_id: policy_id.into(),
            name: name.into(),
            strategy: FailoverStrategy::Automatic,
            max_failover_time_s: default_max_failover_time_s(),
            require_quorum: default_require_quorum(),
            region_priority: Vec::new(),
            site_priority: Vec::new(),
            min_healthy_nodes: default_min_healthy_nodes(),
        }
    }

    pub fn with_strategy(mut self, strategy: FailoverStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    pub fn with_max_failover_time_s(mut self, seconds: u64) -> Self {
        self.max_failover_time_s = seconds;
        self
    }

    pub fn with_require_quorum(mut self, require: bool) -> Self {
        self.require_quorum = require;
        self
    }

    pub fn with_region_priority<S: Into<String>>(mut self, regions: impl IntoIterator<Item = S>) -> Self {
        self.region_priority = regions.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_site_priority<S: Into<String>>(mut self, sites: impl IntoIterator<Item = S>) -> Self {
        self.site_priority = sites.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_min_healthy_nodes(mut self, count: usize) -> Self {
        self.min_healthy_nodes = count;
        self
    }

    /// Failover budget in milliseconds.
    pub fn max_failover_time_ms(&self) -> u64 {
        self.max_failover_time_s.saturating_mul(1000)
    }

    /// Reject budgets and preference lists that cannot be honored.
    pub fn validate(&self) -> ContinuityResult<()> {
        if self.max_failover_time_s == 0 {
            return Err(ContinuityError::InvalidPolicy(
                "max_failover_time_s must be > 0".to_string(),
            ));
        }
        if self.min_healthy_nodes == 0 {
            return Err(ContinuityError::InvalidPolicy(
                "min_healthy_nodes must be >= 1".to_string(),
            ));
        }
        if let Some(dup) = first_duplicate(&self.region_priority) {
            return Err(ContinuityError::InvalidPolicy(format!(
                "region '{}' listed twice in region_priority",
                dup
            )));
        }
        if let Some(dup) = first_duplicate(&self.site_priority) {
            return Err(ContinuityError::InvalidPolicy(format!(
                "site '{}' listed twice in site_priority",
                dup
            )));
        }
        Ok(())
    }
}

fn first_duplicate(items: &[String]) -> Option<&str> {
    let mut seen = HashSet::new();
    items
        .iter()
        .find(|item| !seen.insert(item.as_str()))
        .map(String::as_str)
}

// =============================================================================
// Actions and plans
// =============================================================================

/// Kind of remediation step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionType {
    Demote,
    Promote,
    DnsFlip,
    Notify,
    Verify,
    Restart,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionType::Demote => "demote",
            ActionType::Promote => "promote",
            ActionType::DnsFlip => "dns_flip",
            ActionType::Notify => "notify",
            ActionType::Verify => "verify",
            ActionType::Restart => "restart",
        }
    }

    /// Everything except `verify` changes the outside world.
    pub fn is_mutating(&self) -> bool {
        !matches!(self, ActionType::Verify)
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One step of a continuity plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailoverAction {
    pub action_id: String,
    pub action_type: ActionType,
    pub target_node_id: String,
    #[serde(default)]
    pub params: Params,
    pub sequence: u32,
    pub estimated_duration_ms: u64,
}

impl FailoverAction {
    pub fn new(
        action_type: ActionType,
        target_node_id: impl Into<String>,
        sequence: u32,
        estimated_duration_ms: u64,
    ) -> Self {
        Self {
            action_id: new_id(),
            action_type,
            target_node_id: target_node_id.into(),
            params: Params::new(),
            sequence,
            estimated_duration_ms,
        }
    }

    /// Add a parameter.
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }
}

/// Ordered failover plan produced by the planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContinuityPlan {
    pub plan_id: String,
    pub cluster_id: String,
    pub policy_id: String,
    pub created_at: DateTime<Utc>,
    pub actions: Vec<FailoverAction>,
    /// Sum of action estimates
    pub estimated_total_ms: u64,
    pub primary_node_id: String,
    pub failover_target_id: String,
    #[serde(default)]
    pub metadata: Metadata,
}

impl ContinuityPlan {
    /// Actions in ascending sequence order.
    pub fn ordered_actions(&self) -> Vec<&FailoverAction> {
        let mut actions: Vec<&FailoverAction> = self.actions.iter().collect();
        actions.sort_by_key(|a| a.sequence);
        actions
    }

    /// Action kinds in execution order.
    pub fn action_types(&self) -> Vec<ActionType> {
        self.ordered_actions().iter().map(|a| a.action_type).collect()
    }
}

// =============================================================================
// Health
// =============================================================================

/// Most recent health signal from a node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Heartbeat {
    pub node_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: NodeStatus,
    /// Non-negative
    pub latency_ms: f64,
}

/// Derived quorum computation. Never stored as a source of truth.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuorumStatus {
    pub cluster_id: String,
    pub timestamp: DateTime<Utc>,
    pub total_nodes: usize,
    pub healthy_nodes: usize,
    pub quorum_size: usize,
    pub has_quorum: bool,
    pub healthy_node_ids: Vec<String>,
}

// =============================================================================
// Execution and verification results
// =============================================================================

/// What happened to a single action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionStatus {
    /// Handler ran and its effect was recorded
    Applied,
    /// Dry run; handler not invoked
    Skipped,
    /// Handler raised
    Failed,
}

/// Per-action record within a `FailoverResult`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionOutcome {
    pub action_id: String,
    pub action_type: ActionType,
    pub target_node_id: String,
    pub sequence: u32,
    pub status: ActionStatus,
    pub duration_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Outcome of executing a plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailoverResult {
    pub execution_id: String,
    pub plan_id: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: DateTime<Utc>,
    /// `actions_failed == 0`
    pub success: bool,
    pub actions_executed: usize,
    pub actions_failed: usize,
    /// Measured, not estimated
    pub total_duration_ms: u64,
    pub errors: Vec<String>,
    #[serde(default)]
    pub action_outcomes: Vec<ActionOutcome>,
    #[serde(default)]
    pub metadata: Metadata,
}

impl FailoverResult {
    /// Number of actions attempted, successful or not.
    pub fn actions_attempted(&self) -> usize {
        self.actions_executed + self.actions_failed
    }
}

/// Post-failover verification verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationReport {
    pub report_id: String,
    pub execution_id: String,
    pub verified_at: DateTime<Utc>,
    pub consistency_ok: bool,
    pub policy_ok: bool,
    pub quorum_ok: bool,
    pub freshness_ok: bool,
    /// AND of the four checks
    pub passed: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}
