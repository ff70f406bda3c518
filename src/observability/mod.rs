//! Observability for the continuity pipeline
//!
//! - Structured logging (JSON, one line per event)
//! - Failover counters
//! - Lifecycle event tracing
//! - Append-only audit trail
//!
//! # Principles
//!
//! 1. Observability is read-only: it never changes a decision
//! 2. No async or background threads
//! 3. Deterministic output
//!
//! ```ignore
//! use continuity::observability::{log_event_with_fields, Event, ObservationScope};
//!
//! log_event_with_fields(Event::PlanBuilt, &[("target", "node-2")]);
//!
//! let scope = ObservationScope::open("EXECUTION", clock.clone(), &[("plan_id", id)]);
//! // ... run actions ...
//! scope.complete(&[]);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;
pub mod trail;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{FailoverMetrics, MetricsSnapshot};
pub use scope::ObservationScope;
pub use trail::{
    AuditTrail, FileAuditTrail, MemoryAuditTrail, TrailAction, TrailOutcome, TrailRecord,
};

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
