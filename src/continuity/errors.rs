//! Continuity Error Types
//!
//! Only planning refusals and persistence failures surface as errors.
//! Per-action failures are folded into `FailoverResult`, and verification
//! always produces a `VerificationReport`.

use thiserror::Error;

/// Result type for continuity operations
pub type ContinuityResult<T> = Result<T, ContinuityError>;

/// Continuity subsystem errors
#[derive(Debug, Error)]
pub enum ContinuityError {
    // ==================
    // Planning Errors
    // ==================

    /// Cluster has no node in the primary role
    #[error("No primary node found")]
    NoPrimary,

    /// No healthy secondary can take over
    #[error("No suitable failover target found")]
    NoSuitableTarget,

    // ==================
    // Topology Errors
    // ==================

    /// Quorum is undefined for fewer than one node
    #[error("Invalid cluster size: {0} (at least one node required)")]
    InvalidClusterSize(usize),

    /// Node failed validation
    #[error("Invalid node '{node_id}': {reason}")]
    InvalidNode { node_id: String, reason: String },

    /// Node id appears more than once in a cluster
    #[error("Duplicate node id: {0}")]
    DuplicateNode(String),

    /// Heartbeat failed validation
    #[error("Invalid heartbeat for '{node_id}': {reason}")]
    InvalidHeartbeat { node_id: String, reason: String },

    /// Policy failed validation
    #[error("Invalid failover policy: {0}")]
    InvalidPolicy(String),

    // ==================
    // Execution Errors
    // ==================

    /// An action handler refused or failed to apply an action
    #[error("{action_type} on '{target}' failed: {reason}")]
    ActionFailed {
        action_type: String,
        target: String,
        reason: String,
    },

    // ==================
    // Persistence Errors
    // ==================

    /// Filesystem failure while writing or reading audit artifacts
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization failure
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ContinuityError {
    /// Create an action failure.
    pub fn action_failed(
        action_type: impl Into<String>,
        target: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ActionFailed {
            action_type: action_type.into(),
            target: target.into(),
            reason: reason.into(),
        }
    }

    /// Create a node validation failure.
    pub fn invalid_node(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidNode {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Create a heartbeat validation failure.
    pub fn invalid_heartbeat(node_id: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidHeartbeat {
            node_id: node_id.into(),
            reason: reason.into(),
        }
    }

    /// Pre-execution refusals block the whole failover; nothing was run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::NoPrimary | Self::NoSuitableTarget)
    }

    /// Stable code for logs and CLI output.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoPrimary => "CONTINUITY_NO_PRIMARY",
            Self::NoSuitableTarget => "CONTINUITY_NO_TARGET",
            Self::InvalidClusterSize(_) => "CONTINUITY_INVALID_CLUSTER_SIZE",
            Self::InvalidNode { .. } => "CONTINUITY_INVALID_NODE",
            Self::DuplicateNode(_) => "CONTINUITY_DUPLICATE_NODE",
            Self::InvalidHeartbeat { .. } => "CONTINUITY_INVALID_HEARTBEAT",
            Self::InvalidPolicy(_) => "CONTINUITY_INVALID_POLICY",
            Self::ActionFailed { .. } => "CONTINUITY_ACTION_FAILED",
            Self::Io(_) => "CONTINUITY_IO",
            Self::Serialization(_) => "CONTINUITY_SERIALIZATION",
        }
    }
}
