//! Continuity and failover orchestration
//!
//! Decides which node becomes primary when the current primary is
//! unhealthy, runs that decision as ordered actions, verifies the
//! resulting cluster and produces a tamper-evident audit pack.
//!
//! Leaf-first:
//! - `heartbeat`: health signals and quorum
//! - `planner`: target selection and the fixed action sequence
//! - `executor`: ordered execution with per-action failure isolation
//! - `verifier`: four independent post-failover checks
//! - `auditor`: confidence scoring, manifest hashing, persistence
//! - `simulator`: seeded failure scenarios
//! - `coordinator`: the whole pipeline as one call
//!
//! Everything is synchronous and single-threaded per decision. Time comes
//! from an injected [`Clock`](crate::clock::Clock).

pub mod auditor;
pub mod coordinator;
pub mod errors;
pub mod executor;
pub mod heartbeat;
pub mod model;
pub mod planner;
pub mod simulator;
pub mod verifier;

pub use auditor::{
    load_audit_pack, load_manifest, AuditPack, Citation, CitationKind, Confidence, ConfidenceBand,
    ContinuityAuditor, Manifest, ManifestAction, DEFAULT_AUDIT_DIR,
};
pub use coordinator::{CoordinatedRun, ContinuityCoordinator};
pub use errors::{ContinuityError, ContinuityResult};
pub use executor::{ActionHandler, ActionIntent, FailoverExecutor, RecordingHandler};
pub use heartbeat::{quorum_size, HeartbeatMonitor};
pub use model::{
    ActionOutcome, ActionStatus, ActionType, Cluster, ContinuityPlan, FailoverAction,
    FailoverPolicy, FailoverResult, FailoverStrategy, Heartbeat, Node, NodeRole, NodeStatus,
    QuorumStatus, VerificationReport,
};
pub use planner::{CandidateScore, ContinuityPlanner};
pub use simulator::{FailoverSimulator, Scenario, SimulationResult};
pub use verifier::FailoverVerifier;
