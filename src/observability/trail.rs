//! Append-only audit trail of pipeline runs
//!
//! - Every stage outcome of a failover run is recorded
//! - Append-only and durable: a record is synced before `append` returns
//! - One JSON record per line
//!
//! The trail is the running history across runs. Per-run evidence lives in
//! the audit pack.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Pipeline stage being recorded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrailAction {
    PlanBuilt,
    PlanRejected,
    ExecutionCompleted,
    VerificationCompleted,
    AuditPackGenerated,
    AuditPackSaved,
}

impl TrailAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrailAction::PlanBuilt => "PLAN_BUILT",
            TrailAction::PlanRejected => "PLAN_REJECTED",
            TrailAction::ExecutionCompleted => "EXECUTION_COMPLETED",
            TrailAction::VerificationCompleted => "VERIFICATION_COMPLETED",
            TrailAction::AuditPackGenerated => "AUDIT_PACK_GENERATED",
            TrailAction::AuditPackSaved => "AUDIT_PACK_SAVED",
        }
    }
}

impl fmt::Display for TrailAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Result of a recorded stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TrailOutcome {
    Success,
    /// Refused before anything ran
    Rejected,
    /// Ran, with failures
    Failed,
}

impl TrailOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrailOutcome::Success => "SUCCESS",
            TrailOutcome::Rejected => "REJECTED",
            TrailOutcome::Failed => "FAILED",
        }
    }

    pub fn from_success(success: bool) -> Self {
        if success {
            TrailOutcome::Success
        } else {
            TrailOutcome::Failed
        }
    }
}

impl fmt::Display for TrailOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single trail record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrailRecord {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub action: TrailAction,
    pub outcome: TrailOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub execution_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl TrailRecord {
    pub fn new(action: TrailAction, outcome: TrailOutcome, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp,
            action,
            outcome,
            plan_id: None,
            execution_id: None,
            audit_id: None,
            detail: None,
        }
    }

    pub fn with_plan(mut self, plan_id: impl Into<String>) -> Self {
        self.plan_id = Some(plan_id.into());
        self
    }

    pub fn with_execution(mut self, execution_id: impl Into<String>) -> Self {
        self.execution_id = Some(execution_id.into());
        self
    }

    pub fn with_audit(mut self, audit_id: impl Into<String>) -> Self {
        self.audit_id = Some(audit_id.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    /// One JSON line, no trailing newline.
    pub fn to_json(&self) -> io::Result<String> {
        serde_json::to_string(self).map_err(io::Error::from)
    }
}

/// Append-only, durable record sink.
pub trait AuditTrail: Send + Sync {
    /// Append a record. It MUST be durable when this returns.
    fn append(&self, record: &TrailRecord) -> io::Result<()>;

    fn sync(&self) -> io::Result<()>;
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// JSON-lines file trail, fsync after every append.
pub struct FileAuditTrail {
    path: PathBuf,
    writer: Mutex<BufWriter<File>>,
}

impl FileAuditTrail {
    /// Open or create a trail file. Existing records are kept.
    pub fn open(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new().create(true).append(true).open(&path)?;

        Ok(Self {
            path,
            writer: Mutex::new(BufWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every record back, oldest first.
    pub fn read_all(path: impl AsRef<Path>) -> io::Result<Vec<TrailRecord>> {
        let content = std::fs::read_to_string(path)?;
        content
            .lines()
            .filter(|line| !line.trim().is_empty())
            .map(|line| serde_json::from_str(line).map_err(io::Error::from))
            .collect()
    }
}

impl AuditTrail for FileAuditTrail {
    fn append(&self, record: &TrailRecord) -> io::Result<()> {
        let json = record.to_json()?;
        let mut writer = lock(&self.writer);
        writeln!(writer, "{}", json)?;
        writer.flush()?;
        writer.get_ref().sync_all()
    }

    fn sync(&self) -> io::Result<()> {
        let writer = lock(&self.writer);
        writer.get_ref().sync_all()
    }
}

/// In-memory trail for tests and one-shot CLI runs.
#[derive(Debug, Default)]
pub struct MemoryAuditTrail {
    records: Mutex<Vec<TrailRecord>>,
}

impl MemoryAuditTrail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> Vec<TrailRecord> {
        lock(&self.records).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.records).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.records).is_empty()
    }
}

impl AuditTrail for MemoryAuditTrail {
    fn append(&self, record: &TrailRecord) -> io::Result<()> {
        lock(&self.records).push(record.clone());
        Ok(())
    }

    fn sync(&self) -> io::Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_record_builders() {
        let record = TrailRecord::new(TrailAction::PlanBuilt, TrailOutcome::Success, Utc::now())
            .with_plan("plan-1")
            .with_detail("node-1 -> node-2");

        assert_eq!(record.action, TrailAction::PlanBuilt);
        assert_eq!(record.plan_id.as_deref(), Some("plan-1"));
        assert!(record.execution_id.is_none());
    }

    #[test]
    fn test_record_json_omits_missing_fields() {
        let record =
            TrailRecord::new(TrailAction::PlanRejected, TrailOutcome::Rejected, Utc::now())
                .with_detail("No primary node found");

        let json = record.to_json().unwrap();
        assert!(json.contains("\"PLAN_REJECTED\""));
        assert!(json.contains("\"REJECTED\""));
        assert!(!json.contains("plan_id"));
        assert!(!json.contains('\n'));
    }

    #[test]
    fn test_memory_trail() {
        let trail = MemoryAuditTrail::new();
        assert!(trail.is_empty());

        trail
            .append(&TrailRecord::new(TrailAction::PlanBuilt, TrailOutcome::Success, Utc::now()))
            .unwrap();
        trail
            .append(&TrailRecord::new(
                TrailAction::ExecutionCompleted,
                TrailOutcome::Failed,
                Utc::now(),
            ))
            .unwrap();

        assert_eq!(trail.len(), 2);
        let records = trail.records();
        assert_eq!(records[0].action, TrailAction::PlanBuilt);
        assert_eq!(records[1].outcome, TrailOutcome::Failed);
    }

    #[test]
    fn test_file_trail_appends_across_reopen() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("trail").join("continuity.log");

        let first = TrailRecord::new(TrailAction::PlanBuilt, TrailOutcome::Success, Utc::now())
            .with_plan("plan-1");
        FileAuditTrail::open(&path).unwrap().append(&first).unwrap();

        let second =
            TrailRecord::new(TrailAction::AuditPackSaved, TrailOutcome::Success, Utc::now())
                .with_audit("audit-1");
        let trail = FileAuditTrail::open(&path).unwrap();
        trail.append(&second).unwrap();
        trail.sync().unwrap();

        let records = FileAuditTrail::read_all(&path).unwrap();
        assert_eq!(records, vec![first, second]);
        assert_eq!(fs::read_to_string(&path).unwrap().lines().count(), 2);
    }

    #[test]
    fn test_outcome_from_success() {
        assert_eq!(TrailOutcome::from_success(true), TrailOutcome::Success);
        assert_eq!(TrailOutcome::from_success(false), TrailOutcome::Failed);
    }
}
