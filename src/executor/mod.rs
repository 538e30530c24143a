//! Executor: turns a `ScanReport`'s candidates into an actual cleanup,
//! gated by policy, live-process holders, and cloud-sync state.
//!
//! Generalizes the old `Cleaner` (`cleaner/mod.rs`, one high-risk-confirmation
//! branch plus a flat delete loop) into the staged re-classify/gate/check/delete
//! pipeline; the dry-run short-circuit and the `trash` crate integration both
//! carry over directly from there. Tool invocation (step 5) generalizes
//! `rules/docker.rs`'s `DockerRule::clean`, which shells to
//! `docker system prune -f` and has no timeout — this version adds one.

use std::collections::HashSet;
use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use chrono::Utc;
use rayon::prelude::*;
use serde::Serialize;

use crate::audit::{AuditAction, AuditEntry, AuditLog};
use crate::probe;
use crate::process::ProcessInspector;
use crate::safety::{classify, CleanupHint, CleanupLevel, SafetyRule, SafetyTier};
use crate::scanner::{PathRecord, ScanReport};
use crate::{cloud, safety};

const SCHEMA_VERSION: u32 = 1;
const TOOL_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Clone)]
pub struct CleanPolicy {
    pub level: CleanupLevel,
    pub dry_run: bool,
    pub exclude_categories: HashSet<String>,
    pub older_than_days: Option<u32>,
    /// Lets a held-by-process candidate proceed anyway (never lets `Danger`
    /// or an over-level tier through; see step 2 of `clean`).
    pub force: bool,
    pub use_trash: bool,
}

impl Default for CleanPolicy {
    fn default() -> Self {
        Self {
            level: CleanupLevel::Normal,
            dry_run: false,
            exclude_categories: HashSet::new(),
            older_than_days: None,
            force: false,
            use_trash: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SkipReason {
    AppRunning,
    CloudSyncing,
    PolicyDenied,
    Excluded,
    AgeFiltered,
    /// The path was already gone by the time the executor re-probed it —
    /// a prior run (or a crash mid-run) already deleted it. Not an error:
    /// re-running `clean` on the same report must be idempotent.
    NotFound,
}

impl std::fmt::Display for SkipReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SkipReason::AppRunning => "app-running",
            SkipReason::CloudSyncing => "cloud-syncing",
            SkipReason::PolicyDenied => "policy-denied",
            SkipReason::Excluded => "excluded",
            SkipReason::AgeFiltered => "age-filtered",
            SkipReason::NotFound => "not-found",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanError {
    pub path: std::path::PathBuf,
    pub error_kind: String,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryFreed {
    pub category_name: String,
    pub bytes: u64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct CleanReport {
    pub bytes_freed: u64,
    pub files_removed: u64,
    pub directories_removed: u64,
    pub by_category: Vec<CategoryFreed>,
    pub errors: Vec<CleanError>,
    pub skipped: Vec<(std::path::PathBuf, SkipReason)>,
    pub started_at: chrono::DateTime<Utc>,
    pub finished_at: chrono::DateTime<Utc>,
    pub dry_run: bool,
    pub schema_version: u32,
}

/// Runs the cleanup pipeline over every candidate in `report`. `home` is
/// needed to re-run the classifier (see step 1). `audit`, if given, receives
/// one entry per candidate outcome; a missing audit log is not an error —
/// callers embedding this as a library may not want one.
pub fn clean(
    report: &ScanReport,
    policy: &CleanPolicy,
    home: &Path,
    custom_rules: &[Box<dyn SafetyRule>],
    audit: Option<&AuditLog>,
) -> CleanReport {
    let started_at = Utc::now();
    let inspector = ProcessInspector::refresh();

    let outcomes: Vec<Outcome> = report
        .candidates
        .par_iter()
        .map(|candidate| process_candidate(candidate, policy, home, custom_rules, &inspector))
        .collect();

    let mut result = CleanReport {
        bytes_freed: 0,
        files_removed: 0,
        directories_removed: 0,
        by_category: Vec::new(),
        errors: Vec::new(),
        skipped: Vec::new(),
        started_at,
        finished_at: started_at,
        dry_run: policy.dry_run,
        schema_version: SCHEMA_VERSION,
    };

    let mut by_category: std::collections::HashMap<String, CategoryFreed> = std::collections::HashMap::new();

    for outcome in outcomes {
        if let Some(log) = audit {
            let _ = log.append(outcome.audit_entry());
        }
        match outcome {
            Outcome::Deleted { path, bytes, is_dir, category, .. } => {
                result.bytes_freed += bytes;
                if is_dir {
                    result.directories_removed += 1;
                } else {
                    result.files_removed += 1;
                }
                let entry = by_category.entry(category.clone()).or_insert_with(|| CategoryFreed {
                    category_name: category,
                    bytes: 0,
                    count: 0,
                });
                entry.bytes += bytes;
                entry.count += 1;
                let _ = path;
            }
            Outcome::Skipped { path, reason, .. } => result.skipped.push((path, reason)),
            Outcome::Error { path, kind, detail, .. } => result.errors.push(CleanError {
                path,
                error_kind: kind,
                detail,
            }),
        }
    }

    result.by_category = by_category.into_values().collect();
    result.finished_at = Utc::now();
    result
}

enum Outcome {
    Deleted {
        path: std::path::PathBuf,
        bytes: u64,
        is_dir: bool,
        category: String,
        tier: SafetyTier,
    },
    Skipped {
        path: std::path::PathBuf,
        reason: SkipReason,
        category: String,
        tier: SafetyTier,
    },
    Error {
        path: std::path::PathBuf,
        kind: String,
        detail: String,
        category: String,
        tier: SafetyTier,
    },
}

impl Outcome {
    fn audit_entry(&self) -> AuditEntry {
        match self {
            Outcome::Deleted { path, bytes, category, tier, .. } => AuditEntry::new(
                AuditAction::Delete,
                path.clone(),
                *bytes,
                *tier,
                category.clone(),
                "deleted".to_string(),
                String::new(),
            ),
            Outcome::Skipped { path, reason, category, tier } => AuditEntry::new(
                AuditAction::Skip,
                path.clone(),
                0,
                *tier,
                category.clone(),
                "skipped".to_string(),
                reason.to_string(),
            ),
            Outcome::Error { path, detail, category, tier, .. } => AuditEntry::new(
                AuditAction::Error,
                path.clone(),
                0,
                *tier,
                category.clone(),
                "error".to_string(),
                detail.clone(),
            ),
        }
    }
}

fn process_candidate(
    candidate: &PathRecord,
    policy: &CleanPolicy,
    home: &Path,
    custom_rules: &[Box<dyn SafetyRule>],
    inspector: &ProcessInspector,
) -> Outcome {
    let category_name = candidate.category.to_string();
    let tier = candidate.tier;

    // Step 1: re-classify, defense in depth against a stale scan report.
    let reclassified = match probe::probe(&candidate.path) {
        Ok(p) => {
            let input = p.to_classifier_input(home);
            classify(&input, custom_rules)
        }
        Err(probe::UnreachableReason::NotFound) => {
            // Already gone — a prior (possibly crashed) run beat us to it.
            // Idempotency requires this be a skip, never an error.
            return Outcome::Skipped {
                path: candidate.path.clone(),
                reason: SkipReason::NotFound,
                category: category_name,
                tier,
            };
        }
        Err(reason) => {
            return Outcome::Error {
                path: candidate.path.clone(),
                kind: "not-found".to_string(),
                detail: reason.to_string(),
                category: category_name,
                tier,
            };
        }
    };

    if policy.exclude_categories.contains(&category_name) {
        return Outcome::Skipped {
            path: candidate.path.clone(),
            reason: SkipReason::Excluded,
            category: category_name,
            tier: reclassified.tier,
        };
    }

    if let Some(days) = policy.older_than_days {
        let cutoff = Duration::from_secs(days as u64 * 24 * 60 * 60);
        let age_ok = candidate
            .modified
            .map(|m| {
                let now = Utc::now().timestamp();
                now - m >= cutoff.as_secs() as i64
            })
            .unwrap_or(false);
        if !age_ok {
            return Outcome::Skipped {
                path: candidate.path.clone(),
                reason: SkipReason::AgeFiltered,
                category: category_name,
                tier: reclassified.tier,
            };
        }
    }

    // Step 2: gate by policy. Danger never proceeds, force or not.
    if !policy.level.can_delete(reclassified.tier) {
        return Outcome::Skipped {
            path: candidate.path.clone(),
            reason: SkipReason::PolicyDenied,
            category: category_name,
            tier: reclassified.tier,
        };
    }

    // Step 3: live holders.
    let holders = inspector.processes_holding(&candidate.path);
    if !holders.is_empty() {
        if policy.level == CleanupLevel::Light {
            return Outcome::Skipped {
                path: candidate.path.clone(),
                reason: SkipReason::AppRunning,
                category: category_name,
                tier: reclassified.tier,
            };
        }
        if !policy.force {
            return Outcome::Skipped {
                path: candidate.path.clone(),
                reason: SkipReason::AppRunning,
                category: category_name,
                tier: reclassified.tier,
            };
        }
    }

    // Step 4: cloud sync.
    if let Some(sync) = cloud::cloud_sync_status(&candidate.path, home) {
        if sync.is_actively_syncing && policy.level != CleanupLevel::System {
            return Outcome::Skipped {
                path: candidate.path.clone(),
                reason: SkipReason::CloudSyncing,
                category: category_name,
                tier: reclassified.tier,
            };
        }
    }

    if policy.dry_run {
        return Outcome::Deleted {
            path: candidate.path.clone(),
            bytes: candidate.size,
            is_dir: candidate.is_dir,
            category: category_name,
            tier: reclassified.tier,
        };
    }

    let hint = safety::rules::match_category(&home_relative(&candidate.path, home))
        .map(|rule| rule.cleanup_hint)
        .unwrap_or(CleanupHint::DirectOnly);

    let delete_result = match hint {
        CleanupHint::DirectOnly => direct_delete(&candidate.path, candidate.is_dir, policy.use_trash),
        other => run_tool(other, TOOL_TIMEOUT),
    };

    match delete_result {
        Ok(()) => Outcome::Deleted {
            path: candidate.path.clone(),
            bytes: candidate.size,
            is_dir: candidate.is_dir,
            category: category_name,
            tier: reclassified.tier,
        },
        Err(err) => Outcome::Error {
            path: candidate.path.clone(),
            kind: err.kind,
            detail: err.detail,
            category: category_name,
            tier: reclassified.tier,
        },
    }
}

/// Error-kind tag kept distinct from the human-readable detail string so the
/// CLI layer can map it to an exit code without re-parsing prose.
struct DeleteError {
    kind: String,
    detail: String,
}

impl DeleteError {
    fn from_io(detail: impl Into<String>, e: &std::io::Error) -> Self {
        let kind = match e.raw_os_error() {
            Some(28) => "disk-full", // ENOSPC
            _ if e.kind() == std::io::ErrorKind::PermissionDenied => "permission-denied",
            _ => "io",
        };
        DeleteError {
            kind: kind.to_string(),
            detail: detail.into(),
        }
    }

    fn tool_failed(detail: impl Into<String>) -> Self {
        DeleteError {
            kind: "tool-failed".to_string(),
            detail: detail.into(),
        }
    }
}

fn home_relative(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.to_string_lossy()),
        Err(_) => path.to_string_lossy().to_string(),
    }
}

fn direct_delete(path: &Path, is_dir: bool, use_trash: bool) -> Result<(), DeleteError> {
    if use_trash {
        return trash::delete(path).map_err(|e| DeleteError {
            kind: "io".to_string(),
            detail: e.to_string(),
        });
    }
    let result = if is_dir { remove_dir_post_order(path) } else { std::fs::remove_file(path) };
    result.map_err(|e| DeleteError::from_io(e.to_string(), &e))
}

/// Children before parent, matching the post-order requirement so that a
/// cancelled or crashed run never leaves a directory whose contents are gone
/// but whose own entry still exists in an inconsistent half-deleted state.
fn remove_dir_post_order(path: &Path) -> std::io::Result<()> {
    for entry in walkdir::WalkDir::new(path).contents_first(true) {
        let entry = entry.map_err(std::io::Error::other)?;
        let p = entry.path();
        if entry.file_type().is_dir() {
            std::fs::remove_dir(p)?;
        } else {
            std::fs::remove_file(p)?;
        }
    }
    Ok(())
}

fn run_tool(hint: CleanupHint, timeout: Duration) -> Result<(), DeleteError> {
    let owned;
    let argv: Vec<&str> = match hint {
        CleanupHint::DirectOnly => return Ok(()),
        CleanupHint::DockerPrune => vec!["docker", "system", "prune", "-f"],
        CleanupHint::SimulatorControl => vec!["xcrun", "simctl", "delete", "unavailable"],
        CleanupHint::SnapshotControl => vec!["tmutil", "thinlocalsnapshots", "/", "10000000000", "4"],
        CleanupHint::PackageManagerClean(cmd) => {
            owned = cmd.split_whitespace().collect::<Vec<_>>();
            owned
        }
    };
    let (program, args) = argv.split_first().ok_or_else(|| DeleteError::tool_failed("empty tool command"))?;
    let mut command = Command::new(program);
    command.args(args);

    let output = run_with_timeout(command, timeout).map_err(|e| DeleteError::tool_failed(e.to_string()))?;
    if output.status.success() {
        Ok(())
    } else {
        Err(DeleteError::tool_failed(String::from_utf8_lossy(&output.stderr).into_owned()))
    }
}

/// `Command` has no built-in timeout; this polls `try_wait` while reader
/// threads drain stdout/stderr so a chatty tool can't deadlock on a full pipe.
fn run_with_timeout(mut command: Command, timeout: Duration) -> std::io::Result<std::process::Output> {
    let mut child = command.stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;
    let mut stdout_pipe = child.stdout.take().expect("stdout was piped");
    let mut stderr_pipe = child.stderr.take().expect("stderr was piped");

    let stdout_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stdout_pipe.read_to_end(&mut buf);
        buf
    });
    let stderr_handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = stderr_pipe.read_to_end(&mut buf);
        buf
    });

    let start = Instant::now();
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if start.elapsed() > timeout {
            let _ = child.kill();
            child.wait()?;
            return Err(std::io::Error::new(std::io::ErrorKind::TimedOut, "tool timed out"));
        }
        std::thread::sleep(Duration::from_millis(25));
    };

    let stdout = stdout_handle.join().unwrap_or_default();
    let stderr = stderr_handle.join().unwrap_or_default();
    Ok(std::process::Output { status, stdout, stderr })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::Category;

    /// `process_candidate` re-probes the path on disk (step 1, defense in
    /// depth against a stale scan report), so these tests need a real file
    /// under a real home directory rather than a literal string path.
    fn trash_fixture() -> (tempfile::TempDir, PathRecord) {
        let home = tempfile::tempdir().unwrap();
        let trash = home.path().join(".Trash");
        std::fs::create_dir_all(&trash).unwrap();
        let file = trash.join("old");
        std::fs::write(&file, vec![0u8; 1024]).unwrap();
        let record = PathRecord {
            path: file,
            is_dir: false,
            size: 1024,
            modified: None,
            tier: SafetyTier::Safe,
            category: Category::Trash,
            reason: "test".to_string(),
        };
        (home, record)
    }

    fn report_with(candidate: PathRecord) -> ScanReport {
        ScanReport {
            root: candidate.path.clone(),
            total_bytes: candidate.size,
            file_count: 1,
            dir_count: 0,
            by_category: Vec::new(),
            top_by_size: Vec::new(),
            top_by_age: Vec::new(),
            candidates: vec![candidate],
            unreachable: Vec::new(),
            cancelled: false,
            schema_version: 1,
        }
    }

    #[test]
    fn dry_run_never_deletes_but_counts_bytes() {
        let (home, candidate) = trash_fixture();
        let report = report_with(candidate);
        let policy = CleanPolicy {
            dry_run: true,
            ..CleanPolicy::default()
        };
        let result = clean(&report, &policy, home.path(), &[], None);
        assert_eq!(result.bytes_freed, 1024);
        assert!(result.errors.is_empty());
        assert!(report.candidates[0].path.exists(), "dry run must not delete");
    }

    #[test]
    fn excluded_category_is_skipped() {
        let (home, candidate) = trash_fixture();
        let report = report_with(candidate);
        let mut exclude = HashSet::new();
        exclude.insert(Category::Trash.to_string());
        let policy = CleanPolicy {
            dry_run: true,
            exclude_categories: exclude,
            ..CleanPolicy::default()
        };
        let result = clean(&report, &policy, home.path(), &[], None);
        assert_eq!(result.bytes_freed, 0);
        assert_eq!(result.skipped.len(), 1);
    }

    #[test]
    fn live_run_actually_removes_the_file() {
        let (home, candidate) = trash_fixture();
        let path = candidate.path.clone();
        let report = report_with(candidate);
        let policy = CleanPolicy {
            dry_run: false,
            use_trash: false,
            ..CleanPolicy::default()
        };
        let result = clean(&report, &policy, home.path(), &[], None);
        assert_eq!(result.bytes_freed, 1024);
        assert_eq!(result.files_removed, 1);
        assert!(!path.exists());
    }
}
