//! Audit Log: an append-only, rotating record of every classify/scan/delete
//! decision, one JSON line per entry.
//!
//! Keeps the same `tracing` event records this crate already emits, plus a
//! durable counterpart written alongside (not instead of) them, so a
//! completed run's exact per-path decisions survive after the process exits.

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::safety::SafetyTier;
use crate::{Error, Result};

const DEFAULT_ROTATE_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_KEEP_GENERATIONS: u32 = 5;
const DEFAULT_FSYNC_EVERY: u64 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditAction {
    Classify,
    Scan,
    Delete,
    Skip,
    Error,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub action: AuditAction,
    pub path: PathBuf,
    pub bytes: u64,
    pub tier: SafetyTier,
    pub category: String,
    pub outcome: String,
    pub reason: String,
}

impl AuditEntry {
    /// `seq` is assigned by `AuditLog::append`, not here; a freestanding
    /// entry (e.g. built for a test, or before a log exists) gets `0`.
    pub fn new(
        action: AuditAction,
        path: PathBuf,
        bytes: u64,
        tier: SafetyTier,
        category: String,
        outcome: String,
        reason: String,
    ) -> Self {
        Self {
            seq: 0,
            timestamp: Utc::now(),
            action,
            path,
            bytes,
            tier,
            category,
            outcome,
            reason,
        }
    }
}

struct AuditLogState {
    file: File,
    path: PathBuf,
    bytes_written: u64,
    since_fsync: u64,
}

/// Single-writer append log, guarded by a mutex so `executor::clean`'s
/// parallel per-candidate outcomes can all call `append` without racing.
pub struct AuditLog {
    state: Mutex<AuditLogState>,
    seq: AtomicU64,
    rotate_bytes: u64,
    keep_generations: u32,
    fsync_every: u64,
}

impl AuditLog {
    pub fn open(path: &Path) -> Result<Self> {
        Self::open_with(path, DEFAULT_ROTATE_BYTES, DEFAULT_KEEP_GENERATIONS, DEFAULT_FSYNC_EVERY)
    }

    pub fn open_with(
        path: &Path,
        rotate_bytes: u64,
        keep_generations: u32,
        fsync_every: u64,
    ) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| Error::Audit(e.to_string()))?;
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| Error::Audit(e.to_string()))?;
        let bytes_written = file.metadata().map(|m| m.len()).unwrap_or(0);

        Ok(Self {
            state: Mutex::new(AuditLogState {
                file,
                path: path.to_path_buf(),
                bytes_written,
                since_fsync: 0,
            }),
            seq: AtomicU64::new(0),
            rotate_bytes,
            keep_generations,
            fsync_every,
        })
    }

    /// Appends one JSON line, assigning it the next monotonic sequence
    /// number. Rotates first if the file has grown past the configured size.
    pub fn append(&self, mut entry: AuditEntry) -> Result<()> {
        entry.seq = self.seq.fetch_add(1, Ordering::SeqCst);
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');

        let mut state = self.state.lock().unwrap();
        if state.bytes_written > 0 && state.bytes_written + line.len() as u64 > self.rotate_bytes {
            self.rotate(&mut state)?;
        }

        state
            .file
            .write_all(line.as_bytes())
            .map_err(|e| Error::Audit(e.to_string()))?;
        state.bytes_written += line.len() as u64;
        state.since_fsync += 1;

        if state.since_fsync >= self.fsync_every {
            state.file.sync_data().map_err(|e| Error::Audit(e.to_string()))?;
            state.since_fsync = 0;
        }
        Ok(())
    }

    fn rotate(&self, state: &mut AuditLogState) -> Result<()> {
        state.file.sync_data().map_err(|e| Error::Audit(e.to_string()))?;

        let oldest = state.path.with_extension(format!("{}", self.keep_generations));
        if oldest.exists() {
            let _ = std::fs::remove_file(&oldest);
        }
        for gen in (1..self.keep_generations).rev() {
            let from = state.path.with_extension(format!("{gen}"));
            let to = state.path.with_extension(format!("{}", gen + 1));
            if from.exists() {
                let _ = std::fs::rename(&from, &to);
            }
        }
        let first_rotated = state.path.with_extension("1");
        std::fs::rename(&state.path, &first_rotated).map_err(|e| Error::Audit(e.to_string()))?;

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&state.path)
            .map_err(|e| Error::Audit(e.to_string()))?;
        state.file = file;
        state.bytes_written = 0;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::safety::Category;

    fn entry() -> AuditEntry {
        AuditEntry::new(
            AuditAction::Delete,
            PathBuf::from("/home/u/.Trash/old"),
            1024,
            SafetyTier::Safe,
            Category::Trash.to_string(),
            "deleted".to_string(),
            String::new(),
        )
    }

    #[test]
    fn append_writes_one_json_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");
        let log = AuditLog::open(&log_path).unwrap();
        log.append(entry()).unwrap();
        log.append(entry()).unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        assert_eq!(content.lines().count(), 2);
    }

    #[test]
    fn sequence_numbers_are_monotonic() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");
        let log = AuditLog::open(&log_path).unwrap();
        log.append(entry()).unwrap();
        log.append(entry()).unwrap();

        let content = std::fs::read_to_string(&log_path).unwrap();
        let seqs: Vec<u64> = content
            .lines()
            .map(|l| serde_json::from_str::<AuditEntry>(l).unwrap().seq)
            .collect();
        assert_eq!(seqs, vec![0, 1]);
    }

    #[test]
    fn rotation_preserves_previous_generation() {
        let dir = tempfile::tempdir().unwrap();
        let log_path = dir.path().join("audit.jsonl");
        let log = AuditLog::open_with(&log_path, 10, 3, 1).unwrap();
        for _ in 0..5 {
            log.append(entry()).unwrap();
        }
        assert!(log_path.with_extension("1").exists());
    }
}
