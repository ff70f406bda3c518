//! continuity - deterministic failover orchestration
//!
//! Decides which node becomes primary when a cluster's primary is
//! unhealthy, executes that decision as ordered actions, verifies the
//! result and writes a tamper-evident audit pack.

pub mod cli;
pub mod clock;
pub mod continuity;
pub mod observability;
