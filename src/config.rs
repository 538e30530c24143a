//! Persisted configuration.
//!
//! `Config` is a default source the CLI layers CLI flags on top of when
//! building a `CleanPolicy` (see `config::Config::to_clean_policy`); the core
//! `executor::clean` call never reads `Config` itself, only the `CleanPolicy`
//! it's asked to run with.

use std::collections::HashSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::executor::CleanPolicy;
use crate::safety::CleanupLevel;

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,
    pub categories: CategoryConfig,
    pub heuristic: HeuristicConfig,
    pub risk: RiskConfig,
    pub ignore: IgnoreConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub use_trash: bool,
    pub scan_hidden: bool,
    /// Number of scan worker threads, 0 = let rayon pick from hardware concurrency.
    pub parallel_threads: usize,
    pub default_level: CleanupLevel,
    pub confirm_high_risk: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            use_trash: true,
            scan_hidden: true,
            parallel_threads: 0,
            default_level: CleanupLevel::Normal,
            confirm_high_risk: true,
        }
    }
}

/// Category names the user has opted out of, matched against
/// `Category::to_string()`. Empty means every category the rule table
/// produces is eligible.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CategoryConfig {
    pub excluded: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HeuristicConfig {
    pub enabled: bool,
    pub size_threshold_mb: u64,
    pub stale_days: u32,
}

impl Default for HeuristicConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            size_threshold_mb: 100,
            stale_days: 30,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RiskConfig {
    pub confirm_warning: bool,
    pub confirm_caution: bool,
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            confirm_warning: true,
            confirm_caution: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct IgnoreConfig {
    pub paths: Vec<PathBuf>,
}

/// CLI-flag overrides layered on top of `Config` defaults. `None` fields
/// fall back to the config value; `Some` always wins.
#[derive(Debug, Clone, Default)]
pub struct PolicyOverrides {
    pub level: Option<CleanupLevel>,
    pub dry_run: Option<bool>,
    pub force: Option<bool>,
    pub use_trash: Option<bool>,
    pub older_than_days: Option<u32>,
}

impl Config {
    pub fn load(path: &std::path::Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| crate::Error::Config(e.to_string()))?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn load_from(path: &str) -> crate::Result<Self> {
        Self::load(std::path::Path::new(path))
    }

    pub fn load_or_default() -> Self {
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("cleanup-engine").join("config.toml");
            if config_path.exists() {
                if let Ok(config) = Self::load(&config_path) {
                    return config;
                }
            }
        }
        Self::default()
    }

    pub fn default_path() -> crate::Result<PathBuf> {
        dirs::config_dir()
            .map(|p| p.join("cleanup-engine").join("config.toml"))
            .ok_or_else(|| crate::Error::Config("could not determine config directory".to_string()))
    }

    pub fn save(&self, path: &std::path::Path) -> crate::Result<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| crate::Error::Config(e.to_string()))?;
        }
        std::fs::write(path, content).map_err(|e| crate::Error::Config(e.to_string()))?;
        Ok(())
    }

    pub fn save_to(&self, path: &std::path::Path) -> crate::Result<()> {
        self.save(path)
    }

    /// Builds a `CleanPolicy` from this config plus whatever the CLI passed
    /// on the command line. This is the one seam where `Config` feeds the
    /// executor; `executor::clean` itself stays config-unaware.
    pub fn to_clean_policy(&self, overrides: &PolicyOverrides) -> CleanPolicy {
        CleanPolicy {
            level: overrides.level.unwrap_or(self.general.default_level),
            dry_run: overrides.dry_run.unwrap_or(false),
            exclude_categories: self.categories.excluded.iter().cloned().collect::<HashSet<_>>(),
            older_than_days: overrides.older_than_days,
            force: overrides.force.unwrap_or(false),
            use_trash: overrides.use_trash.unwrap_or(self.general.use_trash),
        }
    }
}
