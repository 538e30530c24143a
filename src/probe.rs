//! Metadata Probe: turns a raw path into the facts the classifier and
//! scanner need, or a reason it couldn't.
//!
//! Generalizes the inline `std::fs::metadata`/`path.exists()` checks that
//! used to be scattered across the old `rules/*.rs` files into a single
//! canonicalize-then-stat step shared by the scanner and the executor.

use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::safety::ProbeInput;

/// Why a path couldn't be probed. Distinct from `crate::Error` because these
/// are expected outcomes during a scan (a file can vanish mid-walk), not
/// exceptional failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnreachableReason {
    NotFound,
    PermissionDenied,
    SymlinkLoop,
    Other(String),
}

impl std::fmt::Display for UnreachableReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UnreachableReason::NotFound => write!(f, "not found"),
            UnreachableReason::PermissionDenied => write!(f, "permission denied"),
            UnreachableReason::SymlinkLoop => write!(f, "symlink loop"),
            UnreachableReason::Other(msg) => write!(f, "{msg}"),
        }
    }
}

/// Canonicalized identity and stat facts for one filesystem entry.
#[derive(Debug, Clone)]
pub struct PathProbe {
    pub canonical: PathBuf,
    pub is_dir: bool,
    pub is_symlink: bool,
    pub size: u64,
    pub modified: Option<SystemTime>,
    pub dev: u64,
    pub ino: u64,
    /// Whether an immediate child is itself a directory. Feeds the
    /// classifier's type modifier: a directory holding subdirectories is
    /// riskier to delete in bulk than a flat cache of loose files.
    pub has_subdirectories: bool,
}

impl PathProbe {
    /// Lowers this probe into the classifier's I/O-free input type.
    pub fn to_classifier_input(&self, home: &Path) -> ProbeInput {
        ProbeInput {
            path: self.canonical.clone(),
            home: home.to_path_buf(),
            is_dir: self.is_dir,
            is_symlink: self.is_symlink,
            modified: self.modified,
            has_subdirectories: self.has_subdirectories,
        }
    }
}

/// Canonicalizes `path` and stats it. Symlinks are reported as symlinks
/// using `symlink_metadata` first; `metadata` (which follows the link) is
/// only consulted for size/dir-ness once we know it isn't a loop.
pub fn probe(path: &Path) -> Result<PathProbe, UnreachableReason> {
    let symlink_meta = std::fs::symlink_metadata(path).map_err(map_io_err)?;
    let is_symlink = symlink_meta.file_type().is_symlink();

    let canonical = std::fs::canonicalize(path).map_err(map_io_err)?;
    let meta = std::fs::metadata(path).map_err(map_io_err)?;
    let is_dir = meta.is_dir();

    Ok(PathProbe {
        canonical,
        is_dir,
        is_symlink,
        size: meta.len(),
        modified: meta.modified().ok(),
        dev: meta.dev(),
        ino: meta.ino(),
        has_subdirectories: is_dir && has_subdirectory_child(path),
    })
}

/// Immediate-children-only check, not a recursive walk: the classifier
/// needs to know "is this a directory of directories" without the cost of
/// a full subtree scan (the scanner computes actual size separately).
fn has_subdirectory_child(path: &Path) -> bool {
    std::fs::read_dir(path)
        .map(|entries| {
            entries
                .filter_map(|e| e.ok())
                .any(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        })
        .unwrap_or(false)
}

fn map_io_err(e: std::io::Error) -> UnreachableReason {
    match e.kind() {
        std::io::ErrorKind::NotFound => UnreachableReason::NotFound,
        std::io::ErrorKind::PermissionDenied => UnreachableReason::PermissionDenied,
        _ if e.raw_os_error() == Some(libc_eloop()) => UnreachableReason::SymlinkLoop,
        _ => UnreachableReason::Other(e.to_string()),
    }
}

/// `ELOOP`'s numeric value is platform-specific: 40 on Linux, 62 on Darwin.
/// A platform not covered here falls back to a value that will never match a
/// real errno, which just means the loop gets reported via `Other` instead.
fn libc_eloop() -> i32 {
    #[cfg(target_os = "linux")]
    {
        40
    }
    #[cfg(target_os = "macos")]
    {
        62
    }
    #[cfg(not(any(target_os = "linux", target_os = "macos")))]
    {
        -1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_path_is_not_found() {
        let err = probe(Path::new("/nonexistent/definitely/not/here")).unwrap_err();
        assert_eq!(err, UnreachableReason::NotFound);
    }

    #[test]
    fn probes_a_real_directory() {
        let dir = tempfile::tempdir().unwrap();
        let p = probe(dir.path()).unwrap();
        assert!(p.is_dir);
        assert!(!p.is_symlink);
    }
}
