//! The closed artifact-category model.
//!
//! Generalizes the old one-struct-per-tool rule architecture (`rules::Category`,
//! an open enum with an `Other(String)` escape hatch) into the closed set the
//! engine promises callers: extensibility now comes from adding rows to the
//! category rule table (`safety::rules`), not from new enum variants or new
//! trait impls.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PackageManager {
    Npm,
    Yarn,
    Pnpm,
    Pip,
    Uv,
    Conda,
    Cargo,
    Go,
    Gradle,
    Maven,
    Homebrew,
    CocoaPods,
    Android,
    Apt,
    Dnf,
    Pacman,
    Snap,
    Flatpak,
}

impl std::fmt::Display for PackageManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            PackageManager::Npm => "npm",
            PackageManager::Yarn => "Yarn",
            PackageManager::Pnpm => "pnpm",
            PackageManager::Pip => "pip",
            PackageManager::Uv => "uv",
            PackageManager::Conda => "Conda",
            PackageManager::Cargo => "Cargo",
            PackageManager::Go => "Go",
            PackageManager::Gradle => "Gradle",
            PackageManager::Maven => "Maven",
            PackageManager::Homebrew => "Homebrew",
            PackageManager::CocoaPods => "CocoaPods",
            PackageManager::Android => "Android SDK",
            PackageManager::Apt => "APT",
            PackageManager::Dnf => "DNF/YUM",
            PackageManager::Pacman => "Pacman",
            PackageManager::Snap => "Snap",
            PackageManager::Flatpak => "Flatpak",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DockerKind {
    Image,
    Container,
    BuildCache,
    Volume,
}

impl std::fmt::Display for DockerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            DockerKind::Image => "image",
            DockerKind::Container => "container",
            DockerKind::BuildCache => "build-cache",
            DockerKind::Volume => "volume",
        };
        write!(f, "{s}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Ide {
    Xcode,
    VsCode,
    JetBrains,
    AndroidStudio,
}

impl std::fmt::Display for Ide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Ide::Xcode => "Xcode",
            Ide::VsCode => "VS Code",
            Ide::JetBrains => "JetBrains",
            Ide::AndroidStudio => "Android Studio",
        };
        write!(f, "{s}")
    }
}

/// Closed set of artifact categories. Each category carries a default
/// tier in the rule table (`safety::rules::TABLE`); rules may override the
/// tier per matched path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Category {
    Trash,
    BrowserCache,
    UserCache,
    XcodeDerivedData,
    XcodeArchive,
    DeviceSupport,
    Simulator,
    PackageCache(PackageManager),
    DockerResource(DockerKind),
    NodeModules,
    IdeCache(Ide),
    UserLog,
    CrashReport,
    Snapshot,
    SystemCache,
    Download,
    Screenshot,
    Unknown,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Trash => write!(f, "Trash"),
            Category::BrowserCache => write!(f, "Browser Cache"),
            Category::UserCache => write!(f, "User Cache"),
            Category::XcodeDerivedData => write!(f, "Xcode DerivedData"),
            Category::XcodeArchive => write!(f, "Xcode Archive"),
            Category::DeviceSupport => write!(f, "Device Support"),
            Category::Simulator => write!(f, "Simulator"),
            Category::PackageCache(pm) => write!(f, "{pm} Cache"),
            Category::DockerResource(kind) => write!(f, "Docker {kind}"),
            Category::NodeModules => write!(f, "node_modules"),
            Category::IdeCache(ide) => write!(f, "{ide} Cache"),
            Category::UserLog => write!(f, "User Log"),
            Category::CrashReport => write!(f, "Crash Report"),
            Category::Snapshot => write!(f, "Snapshot"),
            Category::SystemCache => write!(f, "System Cache"),
            Category::Download => write!(f, "Download"),
            Category::Screenshot => write!(f, "Screenshot"),
            Category::Unknown => write!(f, "Unknown"),
        }
    }
}

/// Whether a category declares a first-class management tool the executor
/// should prefer over raw deletion.
#[derive(Debug, Clone, Copy)]
pub enum CleanupHint {
    /// No tool; always use direct deletion.
    DirectOnly,
    /// `xcrun simctl delete unavailable` / `xcrun simctl runtime delete`.
    SimulatorControl,
    /// `docker system prune -f` / `docker image prune -f` / `docker container prune -f`.
    DockerPrune,
    /// Package-manager-native cache-clean command, e.g. `npm cache clean --force`.
    PackageManagerClean(&'static str),
    /// Platform snapshot-management utility (e.g. `tmutil thinlocalsnapshots`).
    SnapshotControl,
}
