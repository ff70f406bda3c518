//! Heartbeat Monitor
//!
//! Keeps the most recent heartbeat per node (last write wins) and derives
//! quorum from it.
//!
//! Single-writer: recording takes `&mut self`, reads take `&self`, so the
//! borrow checker enforces the discipline within one owner. Callers sharing
//! a monitor across threads must serialize access themselves.

use std::collections::HashMap;

use super::errors::{ContinuityError, ContinuityResult};
use super::model::{Cluster, Heartbeat, Node, NodeStatus, QuorumStatus};
use crate::clock::SharedClock;
use crate::observability::{log_event_with_fields, Event};

/// Strict majority of `total_nodes`: `⌊n/2⌋ + 1`.
pub fn quorum_size(total_nodes: usize) -> ContinuityResult<usize> {
    if total_nodes < 1 {
        return Err(ContinuityError::InvalidClusterSize(total_nodes));
    }
    Ok(total_nodes / 2 + 1)
}

/// Heartbeat store and quorum calculator.
pub struct HeartbeatMonitor {
    clock: SharedClock,
    heartbeats: HashMap<String, Heartbeat>,
}

impl HeartbeatMonitor {
    /// Create an empty monitor.
    pub fn new(clock: SharedClock) -> Self {
        Self {
            clock,
            heartbeats: HashMap::new(),
        }
    }

    /// Record a heartbeat, replacing any earlier one for the node.
    pub fn record_heartbeat(
        &mut self,
        node_id: &str,
        status: NodeStatus,
        latency_ms: f64,
    ) -> ContinuityResult<Heartbeat> {
        if !latency_ms.is_finite() || latency_ms < 0.0 {
            return Err(ContinuityError::invalid_heartbeat(
                node_id,
                format!("latency_ms must be a finite value >= 0, got {}", latency_ms),
            ));
        }

        let heartbeat = Heartbeat {
            node_id: node_id.to_string(),
            timestamp: self.clock.now(),
            status,
            latency_ms,
        };
        self.heartbeats
            .insert(node_id.to_string(), heartbeat.clone());

        log_event_with_fields(
            Event::HeartbeatRecorded,
            &[("node_id", node_id), ("status", status.as_str())],
        );
        Ok(heartbeat)
    }

    /// Most recent heartbeat for a node.
    pub fn get_heartbeat(&self, node_id: &str) -> Option<&Heartbeat> {
        self.heartbeats.get(node_id)
    }

    /// Number of nodes with a recorded heartbeat.
    pub fn len(&self) -> usize {
        self.heartbeats.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heartbeats.is_empty()
    }

    /// Owned copy of the heartbeat map.
    pub fn snapshot(&self) -> HashMap<String, Heartbeat> {
        self.heartbeats.clone()
    }

    /// Quorum over `cluster.nodes`.
    ///
    /// A node is healthy iff it has a heartbeat whose status is healthy.
    /// Nodes with no heartbeat count as unhealthy.
    pub fn calculate_quorum(&self, cluster: &Cluster) -> QuorumStatus {
        let healthy_node_ids: Vec<String> = cluster
            .nodes
            .iter()
            .filter(|node| {
                self.heartbeats
                    .get(&node.node_id)
                    .map(|hb| hb.status == NodeStatus::Healthy)
                    .unwrap_or(false)
            })
            .map(|node| node.node_id.clone())
            .collect();

        let healthy_nodes = healthy_node_ids.len();
        let status = QuorumStatus {
            cluster_id: cluster.cluster_id.clone(),
            timestamp: self.clock.now(),
            total_nodes: cluster.nodes.len(),
            healthy_nodes,
            quorum_size: cluster.quorum_size,
            has_quorum: healthy_nodes >= cluster.quorum_size,
            healthy_node_ids,
        };

        let healthy = status.healthy_nodes.to_string();
        let quorum = status.quorum_size.to_string();
        log_event_with_fields(
            Event::QuorumCalculated,
            &[
                ("cluster_id", status.cluster_id.as_str()),
                ("has_quorum", if status.has_quorum { "true" } else { "false" }),
                ("healthy_nodes", healthy.as_str()),
                ("quorum_size", quorum.as_str()),
            ],
        );
        status
    }

    /// Record one heartbeat per node carrying the node's declared status.
    ///
    /// Seeds the monitor for tests and simulation.
    pub fn simulate_heartbeats(
        &mut self,
        nodes: &[Node],
        latency_ms: f64,
    ) -> ContinuityResult<Vec<Heartbeat>> {
        nodes
            .iter()
            .map(|node| self.record_heartbeat(&node.node_id, node.status, latency_ms))
            .collect()
    }

    /// True iff the node's last heartbeat reported healthy.
    ///
    /// `max_age_s` is accepted for callers that will enforce staleness;
    /// the last recorded status is trusted regardless of age. Use
    /// [`HeartbeatMonitor::stale_nodes`] to find old heartbeats.
    pub fn check_node_health(&self, node_id: &str, _max_age_s: f64) -> bool {
        self.heartbeats
            .get(node_id)
            .map(|hb| hb.status == NodeStatus::Healthy)
            .unwrap_or(false)
    }

    /// Age in seconds of a node's last heartbeat, by the monitor's clock.
    pub fn heartbeat_age_s(&self, node_id: &str) -> Option<f64> {
        let hb = self.heartbeats.get(node_id)?;
        let age = self.clock.now() - hb.timestamp;
        Some(age.num_milliseconds() as f64 / 1000.0)
    }

    /// Nodes whose last heartbeat is older than `max_age_s`, sorted by id.
    pub fn stale_nodes(&self, max_age_s: f64) -> Vec<String> {
        let mut stale: Vec<String> = self
            .heartbeats
            .keys()
            .filter(|id| {
                self.heartbeat_age_s(id)
                    .map(|age| age > max_age_s)
                    .unwrap_or(false)
            })
            .cloned()
            .collect();
        stale.sort();
        stale
    }
}
