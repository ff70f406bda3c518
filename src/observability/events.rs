//! Observable events of the continuity pipeline
//!
//! Events are explicit and typed. Stage boundaries (`FAILOVER_BEGIN`,
//! `EXECUTION_COMPLETE` and so on) are emitted by `ObservationScope`.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Configuration
    ConfigLoaded,

    // Health
    /// Heartbeat stored for a node
    HeartbeatRecorded,
    /// Quorum derived from stored heartbeats
    QuorumCalculated,

    // Planning
    PlanBuildBegin,
    PlanBuilt,
    /// No primary or no eligible target
    PlanRejected,

    // Execution
    ActionExecuted,
    /// Dry run
    ActionSkipped,
    ActionFailed,

    // Verification
    VerificationComplete,
    VerificationFailed,

    // Audit
    AuditPackGenerated,
    AuditPackSaved,

    // Simulation
    SimulationBegin,
    SimulationComplete,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "CONFIG_LOADED",

            Event::HeartbeatRecorded => "HEARTBEAT_RECORDED",
            Event::QuorumCalculated => "QUORUM_CALCULATED",

            Event::PlanBuildBegin => "PLAN_BUILD_BEGIN",
            Event::PlanBuilt => "PLAN_BUILT",
            Event::PlanRejected => "PLAN_REJECTED",

            Event::ActionExecuted => "ACTION_EXECUTED",
            Event::ActionSkipped => "ACTION_SKIPPED",
            Event::ActionFailed => "ACTION_FAILED",

            Event::VerificationComplete => "VERIFICATION_COMPLETE",
            Event::VerificationFailed => "VERIFICATION_FAILED",

            Event::AuditPackGenerated => "AUDIT_PACK_GENERATED",
            Event::AuditPackSaved => "AUDIT_PACK_SAVED",

            Event::SimulationBegin => "SIMULATION_BEGIN",
            Event::SimulationComplete => "SIMULATION_COMPLETE",
        }
    }

    /// Returns true if this event reports a degraded outcome
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            Event::PlanRejected | Event::ActionFailed | Event::VerificationFailed
        )
    }

    /// High-volume events are TRACE.
    pub fn severity(&self) -> Severity {
        match self {
            Event::HeartbeatRecorded | Event::QuorumCalculated => Severity::Trace,
            e if e.is_failure() => Severity::Warn,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
