//! Error types for the cleanup engine

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our custom Error
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the cleanup engine.
///
/// Variants map onto the kinds a caller needs to branch on (see `ErrorKind`);
/// the struct/enum split keeps per-path failures distinguishable from
/// whole-operation aborts without forcing every call site to match on strings.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed path, out-of-range level, conflicting options.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Filesystem refused access.
    #[error("permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path disappeared between scan and delete. Callers that see this during
    /// `clean()` must record it as a skip, not an error (see `executor`).
    #[error("not found: {path}")]
    NotFound { path: PathBuf },

    /// A live process holds the file, or cloud sync is in progress.
    #[error("in use: {path}: {reason}")]
    InUse { path: PathBuf, reason: String },

    /// Attempted deletion of a `Danger` tier path. Security event: this should
    /// be unreachable if the scanner classified correctly.
    #[error("protected path: {path}")]
    ProtectedPath { path: PathBuf },

    /// Tool-assisted cleanup returned non-zero or timed out.
    #[error("tool failed for {path}: {detail}")]
    ToolFailed { path: PathBuf, detail: String },

    /// Generic filesystem error.
    #[error("io error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Cooperative cancellation fired.
    #[error("operation cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// Audit log could not be opened or written.
    #[error("audit log error: {0}")]
    Audit(String),

    /// Generic IO error without a specific path (e.g. audit log, config file).
    #[error("io error: {0}")]
    GenericIo(#[from] std::io::Error),

    /// TOML deserialization error.
    #[error("config parse error: {0}")]
    TomlDe(#[from] toml::de::Error),

    /// TOML serialization error.
    #[error("config serialize error: {0}")]
    TomlSer(#[from] toml::ser::Error),

    /// Directory walk error.
    #[error("walk error: {0}")]
    WalkDir(#[from] walkdir::Error),

    /// JSON (de)serialization error, surfaced at the FFI/audit-log boundary.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn permission_denied(path: impl Into<PathBuf>) -> Self {
        Self::PermissionDenied { path: path.into() }
    }

    pub fn not_found(path: impl Into<PathBuf>) -> Self {
        Self::NotFound { path: path.into() }
    }

    pub fn in_use(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::InUse {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub fn protected_path(path: impl Into<PathBuf>) -> Self {
        Self::ProtectedPath { path: path.into() }
    }

    pub fn tool_failed(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self {
        Self::ToolFailed {
            path: path.into(),
            detail: detail.into(),
        }
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// The stable error-kind tag used in user-visible messages and audit entries.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::PermissionDenied { .. } => ErrorKind::PermissionDenied,
            Error::NotFound { .. } => ErrorKind::NotFound,
            Error::InUse { .. } => ErrorKind::InUse,
            Error::ProtectedPath { .. } => ErrorKind::ProtectedPath,
            Error::ToolFailed { .. } => ErrorKind::ToolFailed,
            Error::Cancelled => ErrorKind::Cancelled,
            Error::Io { .. } | Error::GenericIo(_) | Error::WalkDir(_) => ErrorKind::Io,
            Error::Config(_) | Error::TomlDe(_) | Error::TomlSer(_) => ErrorKind::InvalidInput,
            Error::Audit(_) | Error::Json(_) => ErrorKind::Io,
        }
    }
}

/// Stable, matchable error taxonomy. Distinct from `Error` itself so that
/// audit entries and FFI results can carry a kind tag without cloning sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorKind {
    InvalidInput,
    PermissionDenied,
    NotFound,
    InUse,
    ProtectedPath,
    ToolFailed,
    Io,
    Cancelled,
}
