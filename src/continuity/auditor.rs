//! Continuity Auditor
//!
//! Packages plan, execution and verification into an `AuditPack`:
//! citations of the configuration in effect, a confidence score, and a
//! manifest of the actions whose SHA-256 hash anchors tamper evidence.
//!
//! Persisted layout, one directory per pack:
//!
//! ```text
//! {base_dir}/{audit_id}/audit.json
//! {base_dir}/{audit_id}/manifest.json
//! {base_dir}/{audit_id}/verification.json
//! {base_dir}/{audit_id}/README.md
//! ```
//!
//! Persistence errors propagate. A pack that cannot be written is an error,
//! never a silent skip.

use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sha2::{Digest, Sha256};

use super::errors::ContinuityResult;
use super::model::{
    new_id, ActionType, ContinuityPlan, FailoverResult, Params, VerificationReport,
};
use crate::clock::SharedClock;
use crate::observability::{log_event_with_fields, Event};

/// Default parent directory for saved packs.
pub const DEFAULT_AUDIT_DIR: &str = "audit_packs";

pub const AUDIT_FILE: &str = "audit.json";
pub const MANIFEST_FILE: &str = "manifest.json";
pub const VERIFICATION_FILE: &str = "verification.json";
pub const README_FILE: &str = "README.md";

// Confidence deductions
const FAILED_ACTION_PENALTY: i32 = 20;
const CONSISTENCY_PENALTY: i32 = 25;
const POLICY_PENALTY: i32 = 15;
const QUORUM_PENALTY: i32 = 25;
const FRESHNESS_PENALTY: i32 = 10;
const WARNING_PENALTY: i32 = 5;

// =============================================================================
// Confidence
// =============================================================================

/// Coarse classification of the confidence score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBand {
    Low,
    Med,
    High,
    VeryHigh,
}

impl ConfidenceBand {
    /// `≥90` very_high, `≥70` high, `≥50` med, else low.
    pub fn from_score(score: u8) -> Self {
        match score {
            90.. => ConfidenceBand::VeryHigh,
            70..=89 => ConfidenceBand::High,
            50..=69 => ConfidenceBand::Med,
            _ => ConfidenceBand::Low,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceBand::VeryHigh => "very_high",
            ConfidenceBand::High => "high",
            ConfidenceBand::Med => "med",
            ConfidenceBand::Low => "low",
        }
    }
}

impl fmt::Display for ConfidenceBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Confidence in the failover outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Confidence {
    /// 0..=100
    pub score: u8,
    pub band: ConfidenceBand,
    /// Starting value and each deduction, by name
    pub components: BTreeMap<String, i32>,
}

impl Confidence {
    /// Start at 100 and deduct per failed action, failed check and warning.
    pub fn assess(result: &FailoverResult, verification: &VerificationReport) -> Self {
        let mut components = BTreeMap::new();
        components.insert("base".to_string(), 100);

        let failed = i32::try_from(result.actions_failed).unwrap_or(i32::MAX / FAILED_ACTION_PENALTY);
        components.insert(
            "failed_actions".to_string(),
            -FAILED_ACTION_PENALTY.saturating_mul(failed),
        );
        components.insert(
            "consistency".to_string(),
            if verification.consistency_ok { 0 } else { -CONSISTENCY_PENALTY },
        );
        components.insert(
            "policy".to_string(),
            if verification.policy_ok { 0 } else { -POLICY_PENALTY },
        );
        components.insert(
            "quorum".to_string(),
            if verification.quorum_ok { 0 } else { -QUORUM_PENALTY },
        );
        components.insert(
            "freshness".to_string(),
            if verification.freshness_ok { 0 } else { -FRESHNESS_PENALTY },
        );
        let warnings = i32::try_from(verification.warnings.len()).unwrap_or(i32::MAX / WARNING_PENALTY);
        components.insert(
            "warnings".to_string(),
            -WARNING_PENALTY.saturating_mul(warnings),
        );

        let raw = components
            .values()
            .fold(0i32, |acc, v| acc.saturating_add(*v));
        let score = raw.clamp(0, 100) as u8;

        Self {
            score,
            band: ConfidenceBand::from_score(score),
            components,
        }
    }
}

// =============================================================================
// Manifest
// =============================================================================

/// One action as recorded in the manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestAction {
    pub action_id: String,
    pub action_type: ActionType,
    pub target_node_id: String,
    pub sequence: u32,
    pub estimated_duration_ms: u64,
    pub params: Params,
}

/// Canonical, hashable record of the planned and executed actions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub plan_id: String,
    pub execution_id: String,
    /// Ascending sequence order
    pub actions: Vec<ManifestAction>,
    pub total_actions: usize,
    pub actions_executed: usize,
    pub actions_failed: usize,
}

impl Manifest {
    pub fn build(plan: &ContinuityPlan, result: &FailoverResult) -> Self {
        let actions: Vec<ManifestAction> = plan
            .ordered_actions()
            .into_iter()
            .map(|a| ManifestAction {
                action_id: a.action_id.clone(),
                action_type: a.action_type,
                target_node_id: a.target_node_id.clone(),
                sequence: a.sequence,
                estimated_duration_ms: a.estimated_duration_ms,
                params: a.params.clone(),
            })
            .collect();

        Self {
            plan_id: plan.plan_id.clone(),
            execution_id: result.execution_id.clone(),
            total_actions: actions.len(),
            actions,
            actions_executed: result.actions_executed,
            actions_failed: result.actions_failed,
        }
    }

    /// Compact JSON with object keys sorted at every level.
    pub fn canonical_json(&self) -> ContinuityResult<String> {
        let value = serde_json::to_value(self)?;
        let mut out = String::new();
        write_canonical(&value, &mut out)?;
        Ok(out)
    }

    /// SHA-256 hex digest of the canonical serialization.
    pub fn compute_hash(&self) -> ContinuityResult<String> {
        let canonical = self.canonical_json()?;
        let mut hasher = Sha256::new();
        hasher.update(canonical.as_bytes());
        Ok(format!("{:x}", hasher.finalize()))
    }
}

fn write_canonical(value: &Value, out: &mut String) -> ContinuityResult<()> {
    match value {
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();
            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&serde_json::to_string(key)?);
                out.push(':');
                write_canonical(&map[key.as_str()], out)?;
            }
            out.push('}');
        }
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out)?;
            }
            out.push(']');
        }
        scalar => out.push_str(&serde_json::to_string(scalar)?),
    }
    Ok(())
}

// =============================================================================
// Audit pack
// =============================================================================

/// Which configuration object a citation points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationKind {
    Policy,
    Cluster,
    Plan,
}

/// Reference to a configuration object that was in effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub kind: CitationKind,
    pub reference_id: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanSummary {
    pub plan_id: String,
    pub cluster_id: String,
    pub policy_id: String,
    pub created_at: DateTime<Utc>,
    pub primary_node_id: String,
    pub failover_target_id: String,
    pub action_count: usize,
    pub estimated_total_ms: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionSummary {
    pub execution_id: String,
    pub success: bool,
    pub actions_executed: usize,
    pub actions_failed: usize,
    pub total_duration_ms: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationSummary {
    pub report_id: String,
    pub passed: bool,
    pub consistency_ok: bool,
    pub policy_ok: bool,
    pub quorum_ok: bool,
    pub freshness_ok: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

/// Signed record of one failover.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditPack {
    pub audit_id: String,
    pub timestamp: DateTime<Utc>,
    pub plan: PlanSummary,
    pub execution: ExecutionSummary,
    pub verification: VerificationSummary,
    pub citations: Vec<Citation>,
    pub confidence: Confidence,
    pub manifest: Manifest,
    pub manifest_hash: String,
}

impl AuditPack {
    /// True iff the stored hash matches a fresh hash of the manifest.
    pub fn verify_integrity(&self) -> ContinuityResult<bool> {
        Ok(self.manifest.compute_hash()? == self.manifest_hash)
    }
}

/// Builds and persists audit packs.
pub struct ContinuityAuditor {
    clock: SharedClock,
}

impl ContinuityAuditor {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    pub fn generate_audit_pack(
        &self,
        plan: &ContinuityPlan,
        result: &FailoverResult,
        verification: &VerificationReport,
    ) -> ContinuityResult<AuditPack> {
        let manifest = Manifest::build(plan, result);
        let manifest_hash = manifest.compute_hash()?;
        let confidence = Confidence::assess(result, verification);

        let pack = AuditPack {
            audit_id: new_id(),
            timestamp: self.clock.now(),
            plan: PlanSummary {
                plan_id: plan.plan_id.clone(),
                cluster_id: plan.cluster_id.clone(),
                policy_id: plan.policy_id.clone(),
                created_at: plan.created_at,
                primary_node_id: plan.primary_node_id.clone(),
                failover_target_id: plan.failover_target_id.clone(),
                action_count: plan.actions.len(),
                estimated_total_ms: plan.estimated_total_ms,
            },
            execution: ExecutionSummary {
                execution_id: result.execution_id.clone(),
                success: result.success,
                actions_executed: result.actions_executed,
                actions_failed: result.actions_failed,
                total_duration_ms: result.total_duration_ms,
                errors: result.errors.clone(),
            },
            verification: VerificationSummary {
                report_id: verification.report_id.clone(),
                passed: verification.passed,
                consistency_ok: verification.consistency_ok,
                policy_ok: verification.policy_ok,
                quorum_ok: verification.quorum_ok,
                freshness_ok: verification.freshness_ok,
                errors: verification.errors.clone(),
                warnings: verification.warnings.clone(),
            },
            citations: Self::citations(plan),
            confidence,
            manifest,
            manifest_hash,
        };

        let score = pack.confidence.score.to_string();
        log_event_with_fields(
            Event::AuditPackGenerated,
            &[
                ("audit_id", pack.audit_id.as_str()),
                ("band", pack.confidence.band.as_str()),
                ("manifest_hash", pack.manifest_hash.as_str()),
                ("score", score.as_str()),
            ],
        );
        Ok(pack)
    }

    fn citations(plan: &ContinuityPlan) -> Vec<Citation> {
        vec![
            Citation {
                kind: CitationKind::Policy,
                reference_id: plan.policy_id.clone(),
                description: "Failover policy in effect".to_string(),
            },
            Citation {
                kind: CitationKind::Cluster,
                reference_id: plan.cluster_id.clone(),
                description: "Cluster snapshot the plan was built from".to_string(),
            },
            Citation {
                kind: CitationKind::Plan,
                reference_id: plan.plan_id.clone(),
                description: format!(
                    "Continuity plan {} → {}",
                    plan.primary_node_id, plan.failover_target_id
                ),
            },
        ]
    }

    /// Write the pack under `{base_dir}/{audit_id}/` and return that path.
    pub fn save_audit_pack(&self, pack: &AuditPack, base_dir: &Path) -> ContinuityResult<PathBuf> {
        let dir = base_dir.join(&pack.audit_id);
        fs::create_dir_all(&dir)?;

        write_atomic(&dir.join(AUDIT_FILE), &serde_json::to_string_pretty(pack)?)?;
        write_atomic(
            &dir.join(MANIFEST_FILE),
            &serde_json::to_string_pretty(&pack.manifest)?,
        )?;
        write_atomic(
            &dir.join(VERIFICATION_FILE),
            &serde_json::to_string_pretty(&pack.verification)?,
        )?;
        write_atomic(&dir.join(README_FILE), &render_readme(pack))?;

        if let Ok(handle) = File::open(&dir) {
            let _ = handle.sync_all();
        }

        let path = dir.display().to_string();
        log_event_with_fields(
            Event::AuditPackSaved,
            &[("audit_id", pack.audit_id.as_str()), ("path", path.as_str())],
        );
        Ok(dir)
    }
}

/// Read a saved pack back from its directory.
pub fn load_audit_pack(dir: &Path) -> ContinuityResult<AuditPack> {
    let content = fs::read_to_string(dir.join(AUDIT_FILE))?;
    Ok(serde_json::from_str(&content)?)
}

/// Read the standalone manifest saved next to the pack.
///
/// This is the copy external consumers hash, so it must be checked against
/// the pack's `manifest_hash` independently of the embedded manifest.
pub fn load_manifest(dir: &Path) -> ContinuityResult<Manifest> {
    let content = fs::read_to_string(dir.join(MANIFEST_FILE))?;
    Ok(serde_json::from_str(&content)?)
}

/// Temp file, fsync, rename.
fn write_atomic(path: &Path, content: &str) -> ContinuityResult<()> {
    let temp_path = path.with_extension("tmp");
    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(&temp_path)?;
    file.write_all(content.as_bytes())?;
    file.sync_all()?;
    fs::rename(&temp_path, path)?;
    Ok(())
}

fn render_readme(pack: &AuditPack) -> String {
    let mut out = String::new();
    out.push_str(&format!("# Failover Audit {}\n\n", pack.audit_id));
    out.push_str(&format!("Generated: {}\n\n", pack.timestamp.to_rfc3339()));

    out.push_str("## Plan\n\n");
    out.push_str(&format!("- Plan: `{}`\n", pack.plan.plan_id));
    out.push_str(&format!("- Cluster: `{}`\n", pack.plan.cluster_id));
    out.push_str(&format!("- Policy: `{}`\n", pack.plan.policy_id));
    out.push_str(&format!(
        "- Failover: `{}` → `{}`\n",
        pack.plan.primary_node_id, pack.plan.failover_target_id
    ));
    out.push_str(&format!(
        "- Estimated duration: {} ms\n\n",
        pack.plan.estimated_total_ms
    ));

    out.push_str("## Execution\n\n");
    out.push_str(&format!(
        "- Result: {}\n",
        if pack.execution.success { "SUCCESS" } else { "FAILED" }
    ));
    out.push_str(&format!(
        "- Actions executed: {}, failed: {}\n",
        pack.execution.actions_executed, pack.execution.actions_failed
    ));
    out.push_str(&format!(
        "- Duration: {} ms\n",
        pack.execution.total_duration_ms
    ));
    for error in &pack.execution.errors {
        out.push_str(&format!("- Error: {}\n", error));
    }
    out.push('\n');

    out.push_str("## Verification\n\n");
    out.push_str(&format!(
        "- Passed: {}\n",
        if pack.verification.passed { "yes" } else { "no" }
    ));
    for (name, ok) in [
        ("consistency", pack.verification.consistency_ok),
        ("policy", pack.verification.policy_ok),
        ("quorum", pack.verification.quorum_ok),
        ("freshness", pack.verification.freshness_ok),
    ] {
        out.push_str(&format!("- {}: {}\n", name, if ok { "ok" } else { "FAILED" }));
    }
    for error in &pack.verification.errors {
        out.push_str(&format!("- Error: {}\n", error));
    }
    for warning in &pack.verification.warnings {
        out.push_str(&format!("- Warning: {}\n", warning));
    }
    out.push('\n');

    out.push_str("## Confidence\n\n");
    out.push_str(&format!(
        "- Score: {}/100 ({})\n\n",
        pack.confidence.score, pack.confidence.band
    ));

    out.push_str("## Actions\n\n");
    out.push_str("| # | Type | Target | Est. ms |\n|---|------|--------|---------|\n");
    for action in &pack.manifest.actions {
        out.push_str(&format!(
            "| {} | {} | {} | {} |\n",
            action.sequence, action.action_type, action.target_node_id, action.estimated_duration_ms
        ));
    }
    out.push('\n');

    out.push_str("## Integrity\n\n");
    out.push_str(&format!("Manifest SHA-256: `{}`\n", pack.manifest_hash));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::continuity::executor::FailoverExecutor;
    use crate::continuity::model::{Cluster, FailoverPolicy, Node, NodeRole};
    use crate::continuity::planner::ContinuityPlanner;
    use serde_json::json;
    use tempfile::tempdir;

    fn run() -> (ContinuityPlan, FailoverResult) {
        let clock = ManualClock::shared();
        let cluster = Cluster::new(
            "c-1",
            "prod",
            vec![
                Node::new("node-1", NodeRole::Primary, "region-1", "site-a"),
                Node::new("node-2", NodeRole::Secondary, "region-1", "site-b"),
            ],
        )
        .unwrap();
        let plan = ContinuityPlanner::new(clock.clone())
            .build_plan(&cluster, &FailoverPolicy::new("p-1", "n"), "test")
            .unwrap();
        let result = FailoverExecutor::recording(clock).execute_plan(&plan);
        (plan, result)
    }

    fn report(checks: [bool; 4], warnings: usize) -> VerificationReport {
        let [consistency_ok, policy_ok, quorum_ok, freshness_ok] = checks;
        VerificationReport {
            report_id: new_id(),
            execution_id: new_id(),
            verified_at: Utc::now(),
            consistency_ok,
            policy_ok,
            quorum_ok,
            freshness_ok,
            passed: checks.iter().all(|c| *c),
            errors: vec![],
            warnings: (0..warnings).map(|i| format!("w{}", i)).collect(),
        }
    }

    #[test]
    fn test_band_thresholds() {
        assert_eq!(ConfidenceBand::from_score(100), ConfidenceBand::VeryHigh);
        assert_eq!(ConfidenceBand::from_score(90), ConfidenceBand::VeryHigh);
        assert_eq!(ConfidenceBand::from_score(89), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(70), ConfidenceBand::High);
        assert_eq!(ConfidenceBand::from_score(69), ConfidenceBand::Med);
        assert_eq!(ConfidenceBand::from_score(50), ConfidenceBand::Med);
        assert_eq!(ConfidenceBand::from_score(49), ConfidenceBand::Low);
        assert_eq!(ConfidenceBand::from_score(0), ConfidenceBand::Low);
    }

    #[test]
    fn test_band_is_monotonic() {
        let bands: Vec<ConfidenceBand> = (0..=100).map(ConfidenceBand::from_score).collect();
        assert!(bands.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_confidence_deductions() {
        let (_, mut result) = run();
        assert_eq!(Confidence::assess(&result, &report([true; 4], 0)).score, 100);
        assert_eq!(Confidence::assess(&result, &report([true; 4], 2)).score, 90);

        result.actions_failed = 1;
        let c = Confidence::assess(&result, &report([true, false, true, true], 1));
        // 100 - 20 - 15 - 5
        assert_eq!(c.score, 60);
        assert_eq!(c.band, ConfidenceBand::Med);
        assert_eq!(c.components["policy"], -15);
    }

    #[test]
    fn test_confidence_clamps_to_zero() {
        let (_, mut result) = run();
        result.actions_failed = 5;
        let c = Confidence::assess(&result, &report([false; 4], 10));
        assert_eq!(c.score, 0);
        assert_eq!(c.band, ConfidenceBand::Low);
    }

    #[test]
    fn test_manifest_hash_round_trip() {
        let (plan, result) = run();
        let auditor = ContinuityAuditor::new(ManualClock::shared());
        let pack = auditor
            .generate_audit_pack(&plan, &result, &report([true; 4], 0))
            .unwrap();

        assert_eq!(pack.manifest_hash.len(), 64);
        assert!(pack.verify_integrity().unwrap());
        assert_eq!(pack.manifest.total_actions, 5);
    }

    #[test]
    fn test_param_change_changes_hash() {
        let (plan, result) = run();
        let auditor = ContinuityAuditor::new(ManualClock::shared());
        let mut pack = auditor
            .generate_audit_pack(&plan, &result, &report([true; 4], 0))
            .unwrap();

        pack.manifest.actions[2]
            .params
            .insert("ttl".to_string(), json!(3600));
        assert!(!pack.verify_integrity().unwrap());
    }

    #[test]
    fn test_canonical_json_sorts_keys() {
        let (plan, result) = run();
        let canonical = Manifest::build(&plan, &result).canonical_json().unwrap();

        let actions = canonical.find("\"actions\"").unwrap();
        let execution = canonical.find("\"execution_id\"").unwrap();
        let plan_id = canonical.find("\"plan_id\"").unwrap();
        assert!(actions < execution && execution < plan_id);
        assert!(!canonical.contains("\n"));
        assert!(!canonical.contains("\": "));
    }

    #[test]
    fn test_citations() {
        let (plan, result) = run();
        let auditor = ContinuityAuditor::new(ManualClock::shared());
        let pack = auditor
            .generate_audit_pack(&plan, &result, &report([true; 4], 0))
            .unwrap();

        let kinds: Vec<CitationKind> = pack.citations.iter().map(|c| c.kind).collect();
        assert_eq!(
            kinds,
            vec![CitationKind::Policy, CitationKind::Cluster, CitationKind::Plan]
        );
        assert_eq!(pack.citations[0].reference_id, "p-1");
        assert_eq!(pack.citations[1].reference_id, "c-1");
        assert_eq!(pack.citations[2].reference_id, plan.plan_id);
    }

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let (plan, result) = run();
        let auditor = ContinuityAuditor::new(ManualClock::shared());
        let pack = auditor
            .generate_audit_pack(&plan, &result, &report([true; 4], 1))
            .unwrap();

        let saved = auditor.save_audit_pack(&pack, dir.path()).unwrap();

        assert_eq!(saved, dir.path().join(&pack.audit_id));
        for file in [AUDIT_FILE, MANIFEST_FILE, VERIFICATION_FILE, README_FILE] {
            assert!(saved.join(file).exists(), "missing {}", file);
        }
        assert!(!saved.join("audit.tmp").exists());

        let loaded = load_audit_pack(&saved).unwrap();
        assert_eq!(loaded, pack);
        assert!(loaded.verify_integrity().unwrap());

        let manifest: Manifest =
            serde_json::from_str(&fs::read_to_string(saved.join(MANIFEST_FILE)).unwrap()).unwrap();
        assert_eq!(manifest.compute_hash().unwrap(), pack.manifest_hash);

        let readme = fs::read_to_string(saved.join(README_FILE)).unwrap();
        assert!(readme.contains(&pack.manifest_hash));
        assert!(readme.contains("Warning: w0"));
    }

    #[test]
    fn test_save_into_unwritable_location_fails() {
        let dir = tempdir().unwrap();
        let blocker = dir.path().join("not-a-dir");
        fs::write(&blocker, b"x").unwrap();

        let (plan, result) = run();
        let auditor = ContinuityAuditor::new(ManualClock::shared());
        let pack = auditor
            .generate_audit_pack(&plan, &result, &report([true; 4], 0))
            .unwrap();

        assert!(auditor.save_audit_pack(&pack, &blocker).is_err());
    }
}
