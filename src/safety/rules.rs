//! Declarative category rule table.
//!
//! Generalizes the old per-tool `CleanRule` structs (`rules/macos.rs`,
//! `rules/devtools.rs`, `rules/linux.rs`, `rules/macos_apps.rs`,
//! `rules/docker.rs`, `rules/trash.rs`, `rules/misc.rs`) into rows of one
//! table. New categories are added here; no other module needs to change.

use crate::safety::category::{Category, CleanupHint, DockerKind, Ide, PackageManager};
use crate::safety::tier::SafetyTier;
use once_cell::sync::Lazy;

/// How a rule's `pattern` is matched against a candidate path.
#[derive(Debug, Clone, Copy)]
pub enum Matcher {
    /// Exact-prefix match, with a leading `~` expanded to the user's home
    /// directory before comparison.
    Prefix(&'static str),
    /// Glob with a single `*` per path segment, or `**` to match any number
    /// of trailing segments.
    Glob(&'static str),
    /// Substring match against a macOS-style reverse-DNS bundle identifier.
    BundleIdContains(&'static str),
}

pub struct CategoryRule {
    pub matcher: Matcher,
    pub category: Category,
    pub default_tier: SafetyTier,
    pub cleanup_hint: CleanupHint,
}

/// First match wins. Longer/more specific prefixes are listed before shorter
/// ones within the same category family so the "more specific wins" tie-break
/// falls out of declaration order.
pub static TABLE: Lazy<Vec<CategoryRule>> = Lazy::new(|| {
    vec![
        // Trash
        CategoryRule {
            matcher: Matcher::Prefix("~/.Trash"),
            category: Category::Trash,
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.local/share/Trash"),
            category: Category::Trash,
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        // Xcode
        CategoryRule {
            matcher: Matcher::Glob("~/Library/Developer/Xcode/DerivedData/**"),
            category: Category::XcodeDerivedData,
            default_tier: SafetyTier::Warning,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Glob("~/Library/Developer/Xcode/Archives/**"),
            category: Category::XcodeArchive,
            default_tier: SafetyTier::Warning,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Glob("~/Library/Developer/Xcode/iOS DeviceSupport/**"),
            category: Category::DeviceSupport,
            default_tier: SafetyTier::Warning,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/Library/Developer/CoreSimulator/Caches"),
            category: Category::Simulator,
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::SimulatorControl,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/Library/Developer/CoreSimulator/Devices"),
            category: Category::Simulator,
            default_tier: SafetyTier::Warning,
            cleanup_hint: CleanupHint::SimulatorControl,
        },
        // Browser caches (allow-listed bundle ids; anything under Caches not
        // matched here falls through to UserCache/Unknown below)
        CategoryRule {
            matcher: Matcher::BundleIdContains("com.apple.Safari"),
            category: Category::BrowserCache,
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::BundleIdContains("com.google.Chrome"),
            category: Category::BrowserCache,
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::BundleIdContains("org.mozilla.firefox"),
            category: Category::BrowserCache,
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::BundleIdContains("com.brave.Browser"),
            category: Category::BrowserCache,
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        // Package manager caches
        CategoryRule {
            matcher: Matcher::Prefix("~/.npm/_cacache"),
            category: Category::PackageCache(PackageManager::Npm),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::PackageManagerClean("npm cache clean --force"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.yarn/cache"),
            category: Category::PackageCache(PackageManager::Yarn),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::PackageManagerClean("yarn cache clean"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.cache/yarn"),
            category: Category::PackageCache(PackageManager::Yarn),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::PackageManagerClean("yarn cache clean"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.pnpm-store"),
            category: Category::PackageCache(PackageManager::Pnpm),
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::PackageManagerClean("pnpm store prune"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/Library/Caches/pip"),
            category: Category::PackageCache(PackageManager::Pip),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::PackageManagerClean("pip cache purge"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.cache/pip"),
            category: Category::PackageCache(PackageManager::Pip),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::PackageManagerClean("pip cache purge"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.cache/uv"),
            category: Category::PackageCache(PackageManager::Uv),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::PackageManagerClean("uv cache clean"),
        },
        CategoryRule {
            matcher: Matcher::Glob("~/*conda3/pkgs"),
            category: Category::PackageCache(PackageManager::Conda),
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::PackageManagerClean("conda clean --packages"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.cargo/registry/cache"),
            category: Category::PackageCache(PackageManager::Cargo),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.cargo/git/checkouts"),
            category: Category::PackageCache(PackageManager::Cargo),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/go/pkg/mod/cache"),
            category: Category::PackageCache(PackageManager::Go),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::PackageManagerClean("go clean -modcache"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.gradle/caches"),
            category: Category::PackageCache(PackageManager::Gradle),
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.m2/repository"),
            category: Category::PackageCache(PackageManager::Maven),
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/Library/Caches/Homebrew"),
            category: Category::PackageCache(PackageManager::Homebrew),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::PackageManagerClean("brew cleanup"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/Library/Caches/CocoaPods"),
            category: Category::PackageCache(PackageManager::CocoaPods),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::PackageManagerClean("pod cache clean --all"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.android/cache"),
            category: Category::PackageCache(PackageManager::Android),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("/var/cache/apt/archives"),
            category: Category::PackageCache(PackageManager::Apt),
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::PackageManagerClean("apt-get clean"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("/var/cache/dnf"),
            category: Category::PackageCache(PackageManager::Dnf),
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::PackageManagerClean("dnf clean all"),
        },
        CategoryRule {
            matcher: Matcher::Prefix("/var/cache/pacman/pkg"),
            category: Category::PackageCache(PackageManager::Pacman),
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::PackageManagerClean("pacman -Sc"),
        },
        // node_modules (heuristically large, deep, nested project artifact)
        CategoryRule {
            matcher: Matcher::Glob("**/node_modules"),
            category: Category::NodeModules,
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        // Docker (no filesystem path; Category Rules still declares the tool)
        CategoryRule {
            matcher: Matcher::Prefix("/var/lib/docker"),
            category: Category::DockerResource(DockerKind::BuildCache),
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::DockerPrune,
        },
        // IDE caches
        CategoryRule {
            matcher: Matcher::Prefix("~/Library/Caches/com.apple.dt.Xcode"),
            category: Category::IdeCache(Ide::Xcode),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/Library/Application Support/Code/Cache"),
            category: Category::IdeCache(Ide::VsCode),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Glob("~/Library/Caches/JetBrains/**"),
            category: Category::IdeCache(Ide::JetBrains),
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        // Logs and crash reports
        CategoryRule {
            matcher: Matcher::Prefix("~/Library/Logs/DiagnosticReports"),
            category: Category::CrashReport,
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/Library/Logs"),
            category: Category::UserLog,
            default_tier: SafetyTier::Safe,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("/var/log/journal"),
            category: Category::UserLog,
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::PackageManagerClean("journalctl --vacuum-size"),
        },
        // Snapshots (platform snapshot-management utility, e.g. local Time Machine snapshots)
        CategoryRule {
            matcher: Matcher::Prefix("/.vol"),
            category: Category::Snapshot,
            default_tier: SafetyTier::Warning,
            cleanup_hint: CleanupHint::SnapshotControl,
        },
        // Generic fallbacks
        CategoryRule {
            matcher: Matcher::Prefix("~/Downloads"),
            category: Category::Download,
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Glob("~/Desktop/Screen Shot *"),
            category: Category::Screenshot,
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/Library/Caches"),
            category: Category::UserCache,
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("~/.cache"),
            category: Category::UserCache,
            default_tier: SafetyTier::Caution,
            cleanup_hint: CleanupHint::DirectOnly,
        },
        CategoryRule {
            matcher: Matcher::Prefix("/Library/Caches"),
            category: Category::SystemCache,
            default_tier: SafetyTier::Warning,
            cleanup_hint: CleanupHint::DirectOnly,
        },
    ]
});

/// Matches `home_relative` against the table, returning the first matching
/// row's category/tier/hint. `None` means `Category::Unknown` at `Caution`
/// with no tool — callers apply that default themselves so the table can
/// stay free of an explicit catch-all row.
pub fn match_category(home_relative: &str) -> Option<&'static CategoryRule> {
    TABLE.iter().find(|rule| matches(&rule.matcher, home_relative))
}

fn matches(matcher: &Matcher, path: &str) -> bool {
    match matcher {
        Matcher::Prefix(prefix) => path.starts_with(prefix),
        Matcher::Glob(pattern) => glob_match(pattern, path),
        Matcher::BundleIdContains(needle) => path.contains(needle),
    }
}

/// Minimal glob matcher: `*` matches within one path segment, a trailing
/// `/**` matches any number of trailing segments, and a leading `**/` matches
/// any number of leading segments (the path's last N segments must equal the
/// pattern's tail, where N is the tail's segment count). Sufficient for the
/// table above; no back-tracking regex engine needed.
fn glob_match(pattern: &str, path: &str) -> bool {
    if let Some(tail) = pattern.strip_prefix("**/") {
        let tail_segs: Vec<&str> = tail.split('/').collect();
        let path_segs: Vec<&str> = path.split('/').collect();
        if path_segs.len() < tail_segs.len() {
            return false;
        }
        let start = path_segs.len() - tail_segs.len();
        return tail_segs
            .iter()
            .zip(&path_segs[start..])
            .all(|(p, s)| segment_match(p, s));
    }
    if let Some(prefix) = pattern.strip_suffix("/**") {
        return path == prefix || path.starts_with(&format!("{prefix}/"));
    }
    let pattern_segs: Vec<&str> = pattern.split('/').collect();
    let path_segs: Vec<&str> = path.split('/').collect();
    if pattern_segs.len() != path_segs.len() {
        return false;
    }
    pattern_segs
        .iter()
        .zip(path_segs.iter())
        .all(|(p, s)| segment_match(p, s))
}

fn segment_match(pattern_seg: &str, path_seg: &str) -> bool {
    if pattern_seg == "*" {
        return true;
    }
    if let Some(prefix) = pattern_seg.strip_suffix('*') {
        return path_seg.starts_with(prefix);
    }
    pattern_seg == path_seg
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn glob_star_matches_one_segment() {
        assert!(glob_match("~/Desktop/Screen Shot *", "~/Desktop/Screen Shot 2026.png"));
        assert!(!glob_match("~/Desktop/Screen Shot *", "~/Desktop/sub/Screen Shot 2026.png"));
    }

    #[test]
    fn double_star_matches_trailing_segments() {
        assert!(glob_match(
            "~/Library/Developer/Xcode/DerivedData/**",
            "~/Library/Developer/Xcode/DerivedData/MyApp-abc/Build"
        ));
    }

    #[test]
    fn first_match_wins_order() {
        let rule = match_category("~/.Trash/old-file.txt").expect("trash should match");
        assert_eq!(rule.default_tier, SafetyTier::Safe);
    }

    #[test]
    fn leading_double_star_matches_node_modules_at_any_depth() {
        assert!(glob_match("**/node_modules", "~/code/my-project/node_modules"));
        assert!(glob_match("**/node_modules", "~/node_modules"));
        assert!(!glob_match("**/node_modules", "~/code/node_modules_backup"));

        let rule = match_category("~/code/my-project/packages/app/node_modules")
            .expect("node_modules should match at any depth");
        assert_eq!(rule.category, Category::NodeModules);
    }
}
