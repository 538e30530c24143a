//! Bounded, work-stealing directory scanner.
//!
//! Generalizes the old `par_iter`-over-flat-rule-list pattern (`file_scanner.rs`,
//! one rayon task per `CleanRule`) into a recursive walk where every directory
//! is its own unit of parallel work, classified as it's discovered rather than
//! matched against a fixed rule list after the fact.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::probe::{self, UnreachableReason};
use crate::safety::{classify, Category, ProbeInput, SafetyRule, SafetyTier};

const SCHEMA_VERSION: u32 = 1;

#[derive(Clone)]
pub struct ScanOptions {
    pub max_depth: Option<usize>,
    pub follow_symlinks: bool,
    pub top_n: usize,
    /// Number of directories allowed "in flight" (queued as rayon tasks)
    /// before a worker falls back to walking its remaining siblings
    /// serially. Approximates the watermark-based backpressure rayon
    /// doesn't expose a queue-depth hook for.
    pub max_in_flight: usize,
    pub cancel: std::sync::Arc<AtomicBool>,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            max_depth: None,
            follow_symlinks: false,
            top_n: 10,
            max_in_flight: rayon::current_num_threads().max(1) * 4,
            cancel: std::sync::Arc::new(AtomicBool::new(false)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathRecord {
    pub path: PathBuf,
    pub is_dir: bool,
    pub size: u64,
    pub modified: Option<i64>,
    pub tier: SafetyTier,
    pub category: Category,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CategoryAggregate {
    pub category_name: String,
    pub bytes: u64,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnreachableEntry {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanReport {
    pub root: PathBuf,
    pub total_bytes: u64,
    pub file_count: u64,
    pub dir_count: u64,
    pub by_category: Vec<CategoryAggregate>,
    pub top_by_size: Vec<PathRecord>,
    pub top_by_age: Vec<PathRecord>,
    /// Every classified candidate found, below `Danger`. Not part of the
    /// externally-visible summary shape; this is what `executor::clean`
    /// actually iterates. Kept alongside the top-N summaries rather than
    /// making the executor re-derive candidates from them.
    pub candidates: Vec<PathRecord>,
    pub unreachable: Vec<UnreachableEntry>,
    pub cancelled: bool,
    pub schema_version: u32,
}

#[derive(Default)]
struct Accumulator {
    total_bytes: u64,
    file_count: u64,
    dir_count: u64,
    by_category: HashMap<String, (u64, u64)>,
    top_size: BinaryHeap<Reverse<(u64, PathBuf)>>,
    top_age: BinaryHeap<Reverse<(std::cmp::Reverse<i64>, PathBuf)>>,
    candidates: Vec<PathRecord>,
    unreachable: Vec<UnreachableEntry>,
}

impl Accumulator {
    fn merge(mut self, other: Accumulator) -> Self {
        self.total_bytes += other.total_bytes;
        self.file_count += other.file_count;
        self.dir_count += other.dir_count;
        for (k, (bytes, count)) in other.by_category {
            let entry = self.by_category.entry(k).or_insert((0, 0));
            entry.0 += bytes;
            entry.1 += count;
        }
        self.top_size.extend(other.top_size);
        self.top_age.extend(other.top_age);
        self.candidates.extend(other.candidates);
        self.unreachable.extend(other.unreachable);
        self
    }

    fn record_candidate(&mut self, record: PathRecord, top_n: usize) {
        self.by_category
            .entry(record.category.to_string())
            .or_insert((0, 0));
        let entry = self.by_category.get_mut(&record.category.to_string()).unwrap();
        entry.0 += record.size;
        entry.1 += 1;

        self.top_size.push(Reverse((record.size, record.path.clone())));
        if self.top_size.len() > top_n {
            self.top_size.pop();
        }
        if let Some(modified) = record.modified {
            self.top_age
                .push(Reverse((std::cmp::Reverse(modified), record.path.clone())));
            if self.top_age.len() > top_n {
                self.top_age.pop();
            }
        }
        self.candidates.push(record);
    }
}

/// Walks `root`, classifying every matched cache/artifact unit it finds.
/// `home` is the user's home directory, used to resolve `~`-relative rule
/// patterns and to detect protected prefixes.
pub fn scan(
    root: &Path,
    home: &Path,
    opts: &ScanOptions,
    custom_rules: &[Box<dyn SafetyRule>],
) -> ScanReport {
    let visited = Mutex::new(HashSet::new());
    let in_flight = AtomicUsize::new(0);

    let root_dev = probe::probe(root).map(|p| p.dev).ok();

    let acc = walk(root, home, opts, custom_rules, 0, &visited, &in_flight, root_dev);

    let cancelled = opts.cancel.load(Ordering::Relaxed);

    let mut top_by_size: Vec<PathRecord> = acc
        .top_size
        .into_sorted_vec()
        .into_iter()
        .rev()
        .filter_map(|Reverse((_, path))| acc.candidates.iter().find(|r| r.path == path).cloned())
        .collect();
    top_by_size.sort_by(|a, b| b.size.cmp(&a.size).then_with(|| a.path.cmp(&b.path)));

    let mut top_by_age: Vec<PathRecord> = acc
        .top_age
        .into_sorted_vec()
        .into_iter()
        .rev()
        .filter_map(|Reverse((_, path))| acc.candidates.iter().find(|r| r.path == path).cloned())
        .collect();
    top_by_age.sort_by(|a, b| a.modified.cmp(&b.modified).then_with(|| a.path.cmp(&b.path)));

    let by_category = acc
        .by_category
        .into_iter()
        .map(|(category_name, (bytes, count))| CategoryAggregate {
            category_name,
            bytes,
            count,
        })
        .collect();

    ScanReport {
        root: root.to_path_buf(),
        total_bytes: acc.total_bytes,
        file_count: acc.file_count,
        dir_count: acc.dir_count,
        by_category,
        top_by_size,
        top_by_age,
        candidates: acc.candidates,
        unreachable: acc.unreachable,
        cancelled,
        schema_version: SCHEMA_VERSION,
    }
}

fn walk(
    path: &Path,
    home: &Path,
    opts: &ScanOptions,
    custom_rules: &[Box<dyn SafetyRule>],
    depth: usize,
    visited: &Mutex<HashSet<(u64, u64)>>,
    in_flight: &AtomicUsize,
    root_dev: Option<u64>,
) -> Accumulator {
    if opts.cancel.load(Ordering::Relaxed) {
        return Accumulator::default();
    }

    let path_probe = match probe::probe(path) {
        Ok(p) => p,
        Err(reason) => {
            let mut acc = Accumulator::default();
            acc.unreachable.push(UnreachableEntry {
                path: path.to_path_buf(),
                reason: reason.to_string(),
            });
            return acc;
        }
    };

    if path_probe.is_symlink && !opts.follow_symlinks {
        return Accumulator::default();
    }
    if path_probe.is_symlink {
        let mut seen = visited.lock().unwrap();
        if !seen.insert((path_probe.dev, path_probe.ino)) {
            return Accumulator::default();
        }
    }

    // Never cross onto another filesystem (a bind mount, an external drive
    // mounted under the scan root): counting a different device's contents
    // toward this scan's totals would make bytes-freed estimates lie.
    if let Some(root_dev) = root_dev {
        if path_probe.dev != root_dev {
            let mut acc = Accumulator::default();
            acc.unreachable.push(UnreachableEntry {
                path: path.to_path_buf(),
                reason: "crosses a filesystem device boundary".to_string(),
            });
            return acc;
        }
    }

    let input = path_probe.to_classifier_input(home);
    let classification = classify(&input, custom_rules);

    let modified_secs = path_probe
        .modified
        .and_then(|m| m.duration_since(UNIX_EPOCH).ok())
        .map(|d| d.as_secs() as i64);

    let is_matched_unit = classification.category != Category::Unknown;
    let is_danger = classification.tier == SafetyTier::Danger;

    if path_probe.is_dir && !is_matched_unit && !is_danger {
        return recurse_children(path, home, opts, custom_rules, depth, visited, in_flight, root_dev);
    }

    let size = if path_probe.is_dir {
        dir_size(path)
    } else {
        path_probe.size
    };

    let mut acc = Accumulator::default();
    if path_probe.is_dir {
        acc.dir_count += 1;
    } else {
        acc.file_count += 1;
    }
    acc.total_bytes += size;

    if !is_danger {
        acc.record_candidate(
            PathRecord {
                path: path_probe.canonical,
                is_dir: path_probe.is_dir,
                size,
                modified: modified_secs,
                tier: classification.tier,
                category: classification.category,
                reason: classification.reason,
            },
            opts.top_n,
        );
    } else {
        // Danger paths are tagged but never enter the candidate list; they
        // still count toward the totals so ScanReport sizes reconcile.
        acc.by_category
            .entry(Category::Unknown.to_string())
            .or_insert((0, 0));
    }

    acc
}

fn recurse_children(
    path: &Path,
    home: &Path,
    opts: &ScanOptions,
    custom_rules: &[Box<dyn SafetyRule>],
    depth: usize,
    visited: &Mutex<HashSet<(u64, u64)>>,
    in_flight: &AtomicUsize,
    root_dev: Option<u64>,
) -> Accumulator {
    if opts.max_depth.is_some_and(|max| depth >= max) {
        return Accumulator::default();
    }

    let entries: Vec<PathBuf> = match std::fs::read_dir(path) {
        Ok(rd) => rd.filter_map(|e| e.ok()).map(|e| e.path()).collect(),
        Err(e) => {
            let mut acc = Accumulator::default();
            acc.unreachable.push(UnreachableEntry {
                path: path.to_path_buf(),
                reason: e.to_string(),
            });
            return acc;
        }
    };

    let current = in_flight.fetch_add(1, Ordering::Relaxed);
    let acc = if current < opts.max_in_flight {
        entries
            .par_iter()
            .map(|child| walk(child, home, opts, custom_rules, depth + 1, visited, in_flight, root_dev))
            .reduce(Accumulator::default, Accumulator::merge)
    } else {
        entries
            .iter()
            .map(|child| walk(child, home, opts, custom_rules, depth + 1, visited, in_flight, root_dev))
            .fold(Accumulator::default(), Accumulator::merge)
    };
    in_flight.fetch_sub(1, Ordering::Relaxed);
    acc
}

fn dir_size(path: &Path) -> u64 {
    walkdir::WalkDir::new(path)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .filter_map(|e| e.metadata().ok())
        .map(|m| m.len())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn scans_empty_directory() {
        let dir = tempfile::tempdir().unwrap();
        let opts = ScanOptions::default();
        let report = scan(dir.path(), dir.path(), &opts, &[]);
        assert_eq!(report.total_bytes, 0);
        assert!(report.candidates.is_empty());
    }

    #[test]
    fn finds_trash_like_unit() {
        let home = tempfile::tempdir().unwrap();
        let trash = home.path().join(".Trash");
        fs::create_dir_all(&trash).unwrap();
        fs::write(trash.join("old.zip"), b"0123456789").unwrap();

        let opts = ScanOptions::default();
        let report = scan(home.path(), home.path(), &opts, &[]);

        assert!(report
            .candidates
            .iter()
            .any(|r| r.category == Category::Trash));
    }

    #[test]
    fn cancellation_short_circuits() {
        let home = tempfile::tempdir().unwrap();
        fs::create_dir_all(home.path().join("sub")).unwrap();
        let mut opts = ScanOptions::default();
        opts.cancel.store(true, Ordering::Relaxed);
        let report = scan(home.path(), home.path(), &opts, &[]);
        assert!(report.cancelled);
    }
}
