//! Process Inspector: is anything running that would be disrupted by
//! deleting a given path?
//!
//! `sysinfo` was already in the dependency table but unused; this module is
//! what that dependency was waiting for.

use std::path::Path;

use serde::Serialize;
use sysinfo::{ProcessRefreshKind, RefreshKind, System};

#[derive(Debug, Clone, Serialize)]
pub struct ProcessInfo {
    pub pid: u32,
    pub name: String,
}

/// Maps a cache/support directory name fragment to the process name that
/// owns it, so `processes_holding` can catch "Xcode is using its own
/// DerivedData" even though the path itself carries no PID.
const APP_CACHE_MAPPING: &[(&str, &str)] = &[
    ("DerivedData", "Xcode"),
    ("com.apple.dt.Xcode", "Xcode"),
    ("com.google.Chrome", "Google Chrome"),
    ("com.docker.docker", "Docker"),
    ("Code", "Code"),
    ("JetBrains", "idea"),
];

pub struct ProcessInspector {
    system: System,
}

impl ProcessInspector {
    pub fn refresh() -> Self {
        let mut system = System::new_with_specifics(
            RefreshKind::nothing().with_processes(ProcessRefreshKind::nothing()),
        );
        system.refresh_processes(sysinfo::ProcessesToUpdate::All, true);
        Self { system }
    }

    /// Live processes whose name matches the app mapped to `path`'s cache
    /// directory name, if any. Empty means either no mapping exists or the
    /// mapped app isn't currently running.
    pub fn processes_holding(&self, path: &Path) -> Vec<ProcessInfo> {
        let Some(owner) = owning_app_name(path) else {
            return Vec::new();
        };
        self.is_running(owner)
    }

    pub fn is_running(&self, name: &str) -> Vec<ProcessInfo> {
        self.system
            .processes()
            .values()
            .filter(|p| p.name().to_string_lossy().eq_ignore_ascii_case(name))
            .map(|p| ProcessInfo {
                pid: p.pid().as_u32(),
                name: p.name().to_string_lossy().into_owned(),
            })
            .collect()
    }
}

fn owning_app_name(path: &Path) -> Option<&'static str> {
    let path_str = path.to_string_lossy();
    APP_CACHE_MAPPING
        .iter()
        .find(|(fragment, _)| path_str.contains(fragment))
        .map(|(_, app)| *app)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unmapped_path_holds_nothing() {
        let inspector = ProcessInspector::refresh();
        let holders = inspector.processes_holding(Path::new("/home/u/.cache/random-tool"));
        assert!(holders.is_empty());
    }

    #[test]
    fn derived_data_maps_to_xcode() {
        assert_eq!(
            owning_app_name(Path::new("/home/u/Library/Developer/Xcode/DerivedData/App-abc")),
            Some("Xcode")
        );
    }
}
