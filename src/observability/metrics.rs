//! Failover counters
//!
//! - Counters only, monotonic
//! - Reset only on process start
//! - Thread-safe, lock-free

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Operational counters for the failover pipeline
///
/// Relaxed ordering: each counter is exact, cross-counter reads are not a
/// consistent cut.
#[derive(Debug, Default)]
pub struct FailoverMetrics {
    plans_built: AtomicU64,
    plans_rejected: AtomicU64,
    executions: AtomicU64,
    actions_executed: AtomicU64,
    actions_failed: AtomicU64,
    actions_skipped: AtomicU64,
    verifications_passed: AtomicU64,
    verifications_failed: AtomicU64,
    audit_packs_written: AtomicU64,
}

impl FailoverMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    // Planning

    pub fn increment_plans_built(&self) {
        self.plans_built.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_plans_rejected(&self) {
        self.plans_rejected.fetch_add(1, Ordering::Relaxed);
    }

    // Execution

    pub fn increment_executions(&self) {
        self.executions.fetch_add(1, Ordering::Relaxed);
    }

    /// Add per-action tallies of one execution.
    pub fn add_actions(&self, executed: u64, failed: u64, skipped: u64) {
        self.actions_executed.fetch_add(executed, Ordering::Relaxed);
        self.actions_failed.fetch_add(failed, Ordering::Relaxed);
        self.actions_skipped.fetch_add(skipped, Ordering::Relaxed);
    }

    // Verification

    pub fn record_verification(&self, passed: bool) {
        let counter = if passed {
            &self.verifications_passed
        } else {
            &self.verifications_failed
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    // Audit

    pub fn increment_audit_packs_written(&self) {
        self.audit_packs_written.fetch_add(1, Ordering::Relaxed);
    }

    /// Get all metrics as a snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            plans_built: self.plans_built.load(Ordering::Relaxed),
            plans_rejected: self.plans_rejected.load(Ordering::Relaxed),
            executions: self.executions.load(Ordering::Relaxed),
            actions_executed: self.actions_executed.load(Ordering::Relaxed),
            actions_failed: self.actions_failed.load(Ordering::Relaxed),
            actions_skipped: self.actions_skipped.load(Ordering::Relaxed),
            verifications_passed: self.verifications_passed.load(Ordering::Relaxed),
            verifications_failed: self.verifications_failed.load(Ordering::Relaxed),
            audit_packs_written: self.audit_packs_written.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub plans_built: u64,
    pub plans_rejected: u64,
    pub executions: u64,
    pub actions_executed: u64,
    pub actions_failed: u64,
    pub actions_skipped: u64,
    pub verifications_passed: u64,
    pub verifications_failed: u64,
    pub audit_packs_written: u64,
}
