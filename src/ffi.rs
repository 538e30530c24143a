//! C-ABI surface for embedding this engine in a host written in another
//! language: an `FFIResult{success, error_message, data}` shape, a
//! reject-null-and-invalid-UTF8-as-an-error convention rather than a panic,
//! and an explicit `free_result`/`free_string` deallocator pair.
//!
//! Every entry point here is a thin JSON-in/JSON-out wrapper around the
//! library's plain-Rust operations in `scanner`, `safety`, `executor`,
//! `process`, and `cloud` — none of this module's own logic is
//! safety-relevant, so it carries no tests of its own beyond the
//! `FFIResult` helpers.

use std::ffi::{CStr, CString};
use std::os::raw::c_char;
use std::path::{Path, PathBuf};
use std::ptr;

use serde::Deserialize;

use crate::executor::{self, CleanPolicy};
use crate::process::ProcessInspector;
use crate::safety;
use crate::scanner::{self, ScanOptions, ScanReport};
use crate::{cloud, probe};

const MAX_INPUT_BYTES: usize = 4096;

#[repr(C)]
pub struct FFIResult {
    pub success: bool,
    pub error_message: *mut c_char,
    pub data: *mut c_char,
}

impl FFIResult {
    fn ok(data: String) -> Self {
        FFIResult {
            success: true,
            error_message: ptr::null_mut(),
            data: CString::new(data).unwrap_or_default().into_raw(),
        }
    }

    fn err(message: impl Into<String>) -> Self {
        FFIResult {
            success: false,
            error_message: CString::new(message.into()).unwrap_or_default().into_raw(),
            data: ptr::null_mut(),
        }
    }
}

/// Reads and validates a C string: non-null, UTF-8, at most
/// `MAX_INPUT_BYTES`. Anything else is an invalid-input condition, never a
/// panic across the FFI boundary.
unsafe fn read_str<'a>(ptr: *const c_char) -> Result<&'a str, String> {
    if ptr.is_null() {
        return Err("input is null".to_string());
    }
    let cstr = CStr::from_ptr(ptr);
    if cstr.to_bytes().len() > MAX_INPUT_BYTES {
        return Err(format!("input exceeds {MAX_INPUT_BYTES} bytes"));
    }
    cstr.to_str().map_err(|_| "input is not valid UTF-8".to_string())
}

fn home_dir() -> Result<PathBuf, String> {
    dirs::home_dir().ok_or_else(|| "could not determine home directory".to_string())
}

/// Scans `root` (JSON body: `{"root": "...", "max_depth": null, "top_n": 10}`).
///
/// # Safety
/// `request_json` must be a valid null-terminated C string; the returned
/// `FFIResult` must be freed with [`cleanup_free_result`].
#[no_mangle]
pub unsafe extern "C" fn cleanup_scan(request_json: *const c_char) -> FFIResult {
    #[derive(Deserialize)]
    struct ScanRequest {
        root: String,
        max_depth: Option<usize>,
        top_n: Option<usize>,
        follow_symlinks: Option<bool>,
    }

    let body = match read_str(request_json) {
        Ok(s) => s,
        Err(e) => return FFIResult::err(e),
    };
    let req: ScanRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return FFIResult::err(format!("invalid request: {e}")),
    };
    let home = match home_dir() {
        Ok(h) => h,
        Err(e) => return FFIResult::err(e),
    };

    let mut opts = ScanOptions::default();
    if let Some(d) = req.max_depth {
        opts.max_depth = Some(d);
    }
    if let Some(n) = req.top_n {
        opts.top_n = n;
    }
    if let Some(f) = req.follow_symlinks {
        opts.follow_symlinks = f;
    }

    let report: ScanReport = scanner::scan(Path::new(&req.root), &home, &opts, &[]);
    match serde_json::to_string(&report) {
        Ok(json) => FFIResult::ok(json),
        Err(e) => FFIResult::err(e.to_string()),
    }
}

/// Classifies a single path. Returns JSON `{"tier": "...", "category": "...", "reason": "..."}`.
///
/// # Safety
/// `path` must be a valid null-terminated C string; the returned
/// `FFIResult` must be freed with [`cleanup_free_result`].
#[no_mangle]
pub unsafe extern "C" fn cleanup_classify(path: *const c_char) -> FFIResult {
    let path_str = match read_str(path) {
        Ok(s) => s,
        Err(e) => return FFIResult::err(e),
    };
    let home = match home_dir() {
        Ok(h) => h,
        Err(e) => return FFIResult::err(e),
    };

    let probed = match probe::probe(Path::new(path_str)) {
        Ok(p) => p,
        Err(reason) => return FFIResult::err(reason.to_string()),
    };
    let input = probed.to_classifier_input(&home);
    let classification = safety::classify(&input, &[]);
    match serde_json::to_string(&classification) {
        Ok(json) => FFIResult::ok(json),
        Err(e) => FFIResult::err(e.to_string()),
    }
}

/// Runs the executor over a previously produced scan report (JSON body:
/// `{"report": ScanReport, "policy": CleanPolicy}`). No audit log is written
/// across this boundary; the host is expected to persist the returned
/// `CleanReport` itself if it wants a durable record.
///
/// # Safety
/// `request_json` must be a valid null-terminated C string; the returned
/// `FFIResult` must be freed with [`cleanup_free_result`].
#[no_mangle]
pub unsafe extern "C" fn cleanup_clean(request_json: *const c_char) -> FFIResult {
    #[derive(Deserialize)]
    struct CleanRequest {
        report: ScanReport,
        policy: CleanPolicyRequest,
    }
    #[derive(Deserialize)]
    struct CleanPolicyRequest {
        level: safety::CleanupLevel,
        dry_run: bool,
        exclude_categories: Vec<String>,
        older_than_days: Option<u32>,
        force: bool,
        use_trash: bool,
    }

    let body = match read_str(request_json) {
        Ok(s) => s,
        Err(e) => return FFIResult::err(e),
    };
    let req: CleanRequest = match serde_json::from_str(body) {
        Ok(r) => r,
        Err(e) => return FFIResult::err(format!("invalid request: {e}")),
    };
    let home = match home_dir() {
        Ok(h) => h,
        Err(e) => return FFIResult::err(e),
    };

    let policy = CleanPolicy {
        level: req.policy.level,
        dry_run: req.policy.dry_run,
        exclude_categories: req.policy.exclude_categories.into_iter().collect(),
        older_than_days: req.policy.older_than_days,
        force: req.policy.force,
        use_trash: req.policy.use_trash,
    };

    let result = executor::clean(&req.report, &policy, &home, &[], None);
    match serde_json::to_string(&result) {
        Ok(json) => FFIResult::ok(json),
        Err(e) => FFIResult::err(e.to_string()),
    }
}

/// Lists processes currently holding a path (by cache-directory ownership
/// heuristic; see `process::ProcessInspector`).
///
/// # Safety
/// `path` must be a valid null-terminated C string; the returned
/// `FFIResult` must be freed with [`cleanup_free_result`].
#[no_mangle]
pub unsafe extern "C" fn cleanup_processes_holding(path: *const c_char) -> FFIResult {
    let path_str = match read_str(path) {
        Ok(s) => s,
        Err(e) => return FFIResult::err(e),
    };
    let inspector = ProcessInspector::refresh();
    let holders = inspector.processes_holding(Path::new(path_str));
    match serde_json::to_string(&holders) {
        Ok(json) => FFIResult::ok(json),
        Err(e) => FFIResult::err(e.to_string()),
    }
}

/// Reports whether a path falls under a recognized cloud-sync root.
///
/// # Safety
/// `path` must be a valid null-terminated C string; the returned
/// `FFIResult` must be freed with [`cleanup_free_result`].
#[no_mangle]
pub unsafe extern "C" fn cleanup_cloud_sync_status(path: *const c_char) -> FFIResult {
    let path_str = match read_str(path) {
        Ok(s) => s,
        Err(e) => return FFIResult::err(e),
    };
    let home = match home_dir() {
        Ok(h) => h,
        Err(e) => return FFIResult::err(e),
    };
    let status = cloud::cloud_sync_status(Path::new(path_str), &home);
    match serde_json::to_string(&status) {
        Ok(json) => FFIResult::ok(json),
        Err(e) => FFIResult::err(e.to_string()),
    }
}

/// Frees a string previously returned inside an `FFIResult`.
///
/// # Safety
/// `s` must be a pointer obtained from this module's own allocations, and
/// must not be used after this call.
#[no_mangle]
pub unsafe extern "C" fn cleanup_free_string(s: *mut c_char) {
    if !s.is_null() {
        drop(CString::from_raw(s));
    }
}

/// Frees an `FFIResult` returned by any `cleanup_*` entry point.
///
/// # Safety
/// `result` must be a valid `FFIResult` by value (not a pointer the caller
/// still holds elsewhere).
#[no_mangle]
pub unsafe extern "C" fn cleanup_free_result(result: FFIResult) {
    cleanup_free_string(result.error_message);
    cleanup_free_string(result.data);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ffi_result_ok_carries_data() {
        let result = FFIResult::ok("{}".to_string());
        assert!(result.success);
        assert!(result.error_message.is_null());
        unsafe { cleanup_free_result(result) };
    }

    #[test]
    fn ffi_result_err_carries_message() {
        let result = FFIResult::err("boom");
        assert!(!result.success);
        assert!(result.data.is_null());
        unsafe { cleanup_free_result(result) };
    }

    #[test]
    fn read_str_rejects_null() {
        let err = unsafe { read_str(std::ptr::null()) }.unwrap_err();
        assert!(err.contains("null"));
    }
}
