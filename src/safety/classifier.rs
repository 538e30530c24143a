//! Path classification: the pure function at the center of the engine.
//!
//! Folds what used to be a `calculate_safety_level`/`is_safe_to_delete` pair
//! (one function computing a level, a second gating on it) into a single
//! `classify` call that returns both the tier and the reason together, so
//! callers can't observe one without the other.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::safety::category::Category;
use crate::safety::rules;
use crate::safety::tier::SafetyTier;

/// Paths under any of these are always `Danger`, regardless of category
/// match, age, or type. Checked before the category table, so nothing below
/// can ever downgrade a protected path.
///
/// `~` is expanded against the probing user's home directory at match time;
/// entries without a leading `~` are absolute.
const PROTECTED_PREFIXES: &[&str] = &[
    "/System",
    "/usr/bin",
    "/usr/sbin",
    "/bin",
    "/sbin",
    "/private/var/db",
    "/private/var/folders",
    "~/Library/Keychains",
    "~/Library/Mail",
    "~/Library/Messages",
    "~/Library/Accounts",
    "~/Documents",
    "~/Desktop",
    "~/Pictures",
    "~/Movies",
    "~/Music",
];

/// `~/Library/Application Support` itself is protected; only the specific
/// cache-directory names below are ever let through to the category table
/// (decision recorded in the design ledger: no blanket allow-list here).
const APP_SUPPORT_CACHE_NAMES: &[&str] = &["Cache", "Caches", "cache", "CachedData", "GPUCache", "ShaderCache"];

const APP_SUPPORT_ROOT: &str = "~/Library/Application Support";

/// Minimal filesystem facts needed to classify a path, independent of how
/// they were gathered (kept separate from `probe::PathProbe` so this module
/// has no I/O dependency and stays unit-testable without a filesystem).
#[derive(Debug, Clone)]
pub struct ProbeInput {
    pub path: PathBuf,
    pub home: PathBuf,
    pub is_dir: bool,
    pub is_symlink: bool,
    pub modified: Option<SystemTime>,
    pub has_subdirectories: bool,
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct Classification {
    pub tier: SafetyTier,
    pub category: Category,
    pub reason: String,
}

/// A caller-supplied override evaluated before the built-in table. Lets a
/// config file or a downstream embedder recognize a local tool's artifacts
/// without forking the table in `safety::rules`.
pub trait SafetyRule: Send + Sync {
    fn evaluate(&self, input: &ProbeInput, home_relative: &str) -> Option<Classification>;
}

/// Evaluation order: invalid input, protected prefixes, custom rules, the
/// category table, then an age-based relaxation for stale cache-like
/// directories. Each step can only raise or hold the tier already found by
/// an earlier step — `Danger` from a protected prefix is never revisited.
pub fn classify(input: &ProbeInput, custom_rules: &[Box<dyn SafetyRule>]) -> Classification {
    if let Some(bad) = invalid_input_reason(&input.path) {
        return Classification {
            tier: SafetyTier::Danger,
            category: Category::Unknown,
            reason: bad,
        };
    }

    let home_relative = to_home_relative(&input.path, &input.home);

    if let Some(prefix) = matched_protected_prefix(&home_relative) {
        return Classification {
            tier: SafetyTier::Danger,
            category: Category::Unknown,
            reason: format!("protected:{prefix}"),
        };
    }

    if is_unlisted_application_support(&home_relative) {
        return Classification {
            tier: SafetyTier::Danger,
            category: Category::Unknown,
            reason: "Application Support subtree not on the cache-directory allow list".into(),
        };
    }

    for rule in custom_rules {
        if let Some(classification) = rule.evaluate(input, &home_relative) {
            return classification;
        }
    }

    let (tier, category, reason) = match rules::match_category(&home_relative) {
        Some(rule) => (
            rule.default_tier,
            rule.category,
            format!("matched {} rule", rule.category),
        ),
        None => (SafetyTier::Caution, Category::Unknown, "no matching rule, defaulted to Caution".into()),
    };

    let tier = apply_age_modifier(tier, input.modified);
    let tier = apply_type_modifier(tier, input.is_dir, input.has_subdirectories);

    Classification { tier, category, reason }
}

fn invalid_input_reason(path: &Path) -> Option<String> {
    let s = path.to_string_lossy();
    if s.is_empty() {
        return Some("invalid-input".into());
    }
    if s.contains('\0') {
        return Some("invalid-input".into());
    }
    if s.len() > 4096 {
        return Some("invalid-input".into());
    }
    None
}

/// Returns the specific entry from `PROTECTED_PREFIXES` that `home_relative`
/// falls under, if any, so the caller can report which prefix matched.
fn matched_protected_prefix(home_relative: &str) -> Option<&'static str> {
    PROTECTED_PREFIXES.iter().copied().find(|prefix| {
        if let Some(rest) = prefix.strip_prefix('~') {
            home_relative.starts_with(&format!("~{rest}"))
        } else {
            home_relative.starts_with(prefix)
        }
    })
}

fn is_unlisted_application_support(home_relative: &str) -> bool {
    let Some(rest) = home_relative.strip_prefix(APP_SUPPORT_ROOT) else {
        return false;
    };
    if rest.is_empty() {
        // the root itself, never a deletion target
        return true;
    }
    let rest = rest.trim_start_matches('/');
    let app_segment_end = rest.find('/').unwrap_or(rest.len());
    let after_app = &rest[app_segment_end..].trim_start_matches('/');
    if after_app.is_empty() {
        // an app's top-level Application Support directory, not a cache subtree
        return true;
    }
    let cache_segment_end = after_app.find('/').unwrap_or(after_app.len());
    let cache_name = &after_app[..cache_segment_end];
    !APP_SUPPORT_CACHE_NAMES.contains(&cache_name)
}

/// Rewrites an absolute path under `home` to a `~`-relative form so the rule
/// table only needs to declare home-relative patterns once.
fn to_home_relative(path: &Path, home: &Path) -> String {
    match path.strip_prefix(home) {
        Ok(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Ok(rest) => format!("~/{}", rest.to_string_lossy()),
        Err(_) => path.to_string_lossy().to_string(),
    }
}

const STALE_AFTER: std::time::Duration = std::time::Duration::from_secs(90 * 24 * 60 * 60);
const FRESH_WITHIN: std::time::Duration = std::time::Duration::from_secs(7 * 24 * 60 * 60);

/// Entering this step the tier is always `Safe`/`Caution`/`Warning` (the
/// protected-prefix and invalid-input checks above both return early with
/// `Danger`, and the category table never assigns `Danger` directly), so
/// the "never cross from Danger" rule is upheld by construction rather than
/// by a runtime check here.
fn apply_age_modifier(tier: SafetyTier, modified: Option<SystemTime>) -> SafetyTier {
    let Some(age) = modified.and_then(|m| SystemTime::now().duration_since(m).ok()) else {
        return tier;
    };
    if age > STALE_AFTER {
        tier.step_toward_safe()
    } else if age < FRESH_WITHIN {
        std::cmp::min(tier.step_toward_danger(), SafetyTier::Warning)
    } else {
        tier
    }
}

/// A directory holding subdirectories is riskier to delete in bulk than a
/// flat cache of loose files.
fn apply_type_modifier(tier: SafetyTier, is_dir: bool, has_subdirectories: bool) -> SafetyTier {
    if is_dir && has_subdirectories {
        tier.step_toward_danger()
    } else {
        tier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(path: &str, home: &str) -> ProbeInput {
        ProbeInput {
            path: PathBuf::from(path),
            home: PathBuf::from(home),
            is_dir: true,
            is_symlink: false,
            modified: None,
            has_subdirectories: false,
        }
    }

    #[test]
    fn protected_prefix_is_always_danger() {
        let c = classify(&input("/System/Library/Fonts", "/home/u"), &[]);
        assert_eq!(c.tier, SafetyTier::Danger);
    }

    #[test]
    fn empty_path_is_danger() {
        let c = classify(&input("", "/home/u"), &[]);
        assert_eq!(c.tier, SafetyTier::Danger);
    }

    #[test]
    fn unlisted_application_support_subtree_is_danger() {
        let c = classify(&input("/home/u/Library/Application Support/SomeApp/Data", "/home/u"), &[]);
        assert_eq!(c.tier, SafetyTier::Danger);
    }

    #[test]
    fn listed_application_support_cache_is_not_danger() {
        let c = classify(&input("/home/u/Library/Application Support/SomeApp/Cache", "/home/u"), &[]);
        assert_ne!(c.tier, SafetyTier::Danger);
    }

    #[test]
    fn known_category_matches_trash() {
        let c = classify(&input("/home/u/.Trash/old.zip", "/home/u"), &[]);
        assert_eq!(c.tier, SafetyTier::Safe);
        assert_eq!(c.category, Category::Trash);
    }

    #[test]
    fn unmatched_path_defaults_to_caution() {
        let c = classify(&input("/home/u/some/random/project/file.txt", "/home/u"), &[]);
        assert_eq!(c.tier, SafetyTier::Caution);
        assert_eq!(c.category, Category::Unknown);
    }

    #[test]
    fn stale_caution_relaxes_to_safe() {
        let old = SystemTime::now() - std::time::Duration::from_secs(200 * 24 * 60 * 60);
        let mut i = input("/home/u/some/random/project/file.txt", "/home/u");
        i.modified = Some(old);
        let c = classify(&i, &[]);
        assert_eq!(c.tier, SafetyTier::Safe);
    }

    #[test]
    fn freshly_modified_caution_rises_toward_warning() {
        let recent = SystemTime::now() - std::time::Duration::from_secs(60 * 60);
        let mut i = input("/home/u/some/random/project/file.txt", "/home/u");
        i.modified = Some(recent);
        let c = classify(&i, &[]);
        assert_eq!(c.tier, SafetyTier::Warning);
    }

    #[test]
    fn directory_of_directories_rises_one_tier() {
        let mut i = input("/home/u/some/random/project", "/home/u");
        i.has_subdirectories = true;
        let c = classify(&i, &[]);
        assert_eq!(c.tier, SafetyTier::Warning);
    }

    #[test]
    fn documents_is_always_protected() {
        let c = classify(&input("/home/u/Documents/report.docx", "/home/u"), &[]);
        assert_eq!(c.tier, SafetyTier::Danger);
    }
}
