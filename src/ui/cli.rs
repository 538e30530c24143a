//! CLI interface using clap

use clap::{Parser, Subcommand, ValueEnum};

use crate::safety::CleanupLevel;

/// A safety-classified filesystem cleanup engine
///
/// Scans your system for caches, temporary files, and development artifacts,
/// classifies each one by how safe it is to remove, and cleans them under an
/// explicit policy.
///
/// Tip: Run 'cleanup-engine <COMMAND> --help' for detailed usage options.
#[derive(Parser, Debug)]
#[command(name = "cleanup-engine")]
#[command(author, version = env!("GIT_VERSION"), about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Scan a directory tree and report what's classified
    ///
    /// Walks the tree starting at PATH (defaults to the home directory),
    /// classifying every cache or artifact it finds into a safety tier and
    /// category.
    #[command(visible_alias = "s")]
    Scan {
        /// Directory to scan (defaults to the home directory)
        path: Option<String>,

        /// Maximum recursion depth
        #[arg(short, long)]
        depth: Option<usize>,

        /// Number of largest/oldest items to report
        #[arg(short, long, default_value = "10")]
        top: usize,

        /// Follow symlinks while scanning
        #[arg(long)]
        follow_symlinks: bool,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Clean what a prior scan found
    ///
    /// Re-scans PATH and executes cleanup under the given policy. By
    /// default items are moved to the system trash and nothing above the
    /// Normal cleanup level is touched.
    #[command(visible_alias = "c")]
    Clean {
        /// Directory to scan and clean (defaults to the home directory)
        path: Option<String>,

        /// Cleanup level: how aggressive to be
        #[arg(short, long)]
        level: Option<CleanupLevelArg>,

        /// Show what would be deleted without deleting anything
        #[arg(short = 'n', long)]
        dry_run: bool,

        /// Skip confirmation prompts
        #[arg(short = 'y', long)]
        yes: bool,

        /// Permanently delete instead of moving to trash
        #[arg(long)]
        permanent: bool,

        /// Proceed even if a live process appears to hold the path
        #[arg(long)]
        force: bool,

        /// Categories to exclude from cleaning (comma-separated)
        #[arg(short = 'C', long, value_delimiter = ',')]
        exclude: Option<Vec<String>>,

        /// Only clean items untouched for at least this many days
        #[arg(long)]
        older_than_days: Option<u32>,
    },

    /// Classify a single path and print its tier, category, and reason
    Classify {
        /// Path to classify
        path: String,
    },

    /// Initialize or show configuration
    ///
    /// Creates a default configuration file or displays current settings.
    Config {
        /// Initialize default configuration
        #[arg(long)]
        init: bool,

        /// Show current configuration
        #[arg(long)]
        show: bool,

        /// Path for configuration file
        #[arg(long)]
        path: Option<String>,
    },
}

/// Output format options
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Display as formatted table
    #[default]
    Table,
    /// Output as JSON
    Json,
}

/// clap-facing mirror of `CleanupLevel`; kept distinct so the core type
/// doesn't need a `ValueEnum` derive for a CLI-only concern.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CleanupLevelArg {
    Light,
    Normal,
    Deep,
    System,
}

impl From<CleanupLevelArg> for CleanupLevel {
    fn from(arg: CleanupLevelArg) -> Self {
        match arg {
            CleanupLevelArg::Light => CleanupLevel::Light,
            CleanupLevelArg::Normal => CleanupLevel::Normal,
            CleanupLevelArg::Deep => CleanupLevel::Deep,
            CleanupLevelArg::System => CleanupLevel::System,
        }
    }
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }
}
