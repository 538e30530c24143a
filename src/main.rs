//! cleanup-engine - A safety-classified filesystem cleanup engine
//!
//! Scans caches, temporary files, and development artifacts on macOS and
//! Linux, classifies each by how safe it is to remove, and cleans them
//! under an explicit, policy-gated pipeline.

use std::path::PathBuf;
use std::process::ExitCode;

use cleanup_engine::audit::AuditLog;
use cleanup_engine::config::{Config, PolicyOverrides};
use cleanup_engine::error::ErrorKind;
use cleanup_engine::executor::{self, CleanReport, SkipReason};
use cleanup_engine::probe;
use cleanup_engine::safety::{self, CleanupLevel};
use cleanup_engine::scanner::{self, ScanOptions, ScanReport};
use cleanup_engine::ui::{Cli, Commands, OutputFormat};
use colored::*;
use dialoguer::Confirm;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

fn main() -> ExitCode {
    let cli = Cli::parse_args();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    if cli.no_color {
        colored::control::set_override(false);
    }

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{} {e}", "error:".red().bold());
            ExitCode::from(2)
        }
    }
}

/// Whole-operation setup (config load, home directory lookup) is fatal and
/// propagates via `?`, matching how failures before any deletion are meant
/// to abort the run. Per-path failures during scan/clean never reach here;
/// they're recorded in the report and surfaced via `exit_code_for`.
fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load_or_default(),
    };

    let home = dirs::home_dir().ok_or_else(|| anyhow::anyhow!("could not determine home directory"))?;

    let code = match cli.command {
        Commands::Scan {
            path,
            depth,
            top,
            follow_symlinks,
            format,
        } => run_scan(&home, path, depth, top, follow_symlinks, format),
        Commands::Clean {
            path,
            level,
            dry_run,
            yes,
            permanent,
            force,
            exclude,
            older_than_days,
        } => run_clean(
            &home, &config, path, level, dry_run, yes, permanent, force, exclude, older_than_days,
        ),
        Commands::Classify { path } => run_classify(&home, &path),
        Commands::Config { init, show, path } => run_config(init, show, path),
    };
    Ok(code)
}

fn target_path(home: &std::path::Path, path: Option<String>) -> PathBuf {
    path.map(PathBuf::from).unwrap_or_else(|| home.to_path_buf())
}

fn run_scan(
    home: &std::path::Path,
    path: Option<String>,
    depth: Option<usize>,
    top: usize,
    follow_symlinks: bool,
    format: OutputFormat,
) -> ExitCode {
    let root = target_path(home, path);
    println!("{}", format!("\nScanning {}...\n", root.display()).cyan().bold());

    let mut opts = ScanOptions {
        top_n: top,
        follow_symlinks,
        ..ScanOptions::default()
    };
    opts.max_depth = depth;

    let report = scanner::scan(&root, home, &opts, &[]);
    print_scan_report(&report, format);

    if report.cancelled {
        ExitCode::from(15)
    } else {
        ExitCode::SUCCESS
    }
}

fn print_scan_report(report: &ScanReport, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(report) {
                println!("{json}");
            }
        }
        OutputFormat::Table => {
            println!("{}", "Scan Results".bold());
            println!("{}", "=".repeat(60));
            println!(
                "Total: {} across {} files, {} directories",
                bytesize::ByteSize::b(report.total_bytes).to_string().green().bold(),
                report.file_count,
                report.dir_count,
            );
            println!("\n{}", "By category:".bold());
            for agg in &report.by_category {
                println!(
                    "  {} {} ({} items, {})",
                    "-".cyan(),
                    agg.category_name,
                    agg.count,
                    bytesize::ByteSize::b(agg.bytes)
                );
            }
            println!("\n{}", "Largest:".bold());
            for record in &report.top_by_size {
                println!(
                    "  {} {} ({}, {})",
                    "*".cyan(),
                    record.path.display(),
                    bytesize::ByteSize::b(record.size),
                    record.tier
                );
            }
            if !report.unreachable.is_empty() {
                println!(
                    "\n{} {} paths were unreachable during the scan",
                    "warning:".yellow().bold(),
                    report.unreachable.len()
                );
            }
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_clean(
    home: &std::path::Path,
    config: &Config,
    path: Option<String>,
    level: Option<cleanup_engine::ui::cli::CleanupLevelArg>,
    dry_run: bool,
    yes: bool,
    permanent: bool,
    force: bool,
    exclude: Option<Vec<String>>,
    older_than_days: Option<u32>,
) -> ExitCode {
    let root = target_path(home, path);
    println!("{}", "\nScanning before clean...\n".cyan().bold());

    let opts = ScanOptions::default();
    let report = scanner::scan(&root, home, &opts, &[]);

    if report.candidates.is_empty() {
        println!("{}", "\nNothing to clean.".green());
        return ExitCode::SUCCESS;
    }

    let mut overrides = PolicyOverrides {
        level: level.map(CleanupLevel::from),
        dry_run: Some(dry_run),
        force: Some(force),
        older_than_days,
        ..PolicyOverrides::default()
    };
    if permanent {
        overrides.use_trash = Some(false);
    }
    let mut policy = config.to_clean_policy(&overrides);
    if let Some(categories) = exclude {
        policy.exclude_categories.extend(categories);
    }

    let total_size = bytesize::ByteSize::b(report.candidates.iter().map(|c| c.size).sum());
    println!(
        "Found {} candidates ({}) at level {}",
        report.candidates.len(),
        total_size,
        policy.level
    );

    if !yes && !dry_run {
        let confirm = Confirm::new()
            .with_prompt(format!(
                "Proceed cleaning {} items? {}",
                report.candidates.len(),
                if policy.use_trash { "(to trash)" } else { "(PERMANENT)" }
            ))
            .default(false)
            .interact()
            .unwrap_or(false);
        if !confirm {
            println!("{}", "\nCancelled.".yellow());
            return ExitCode::from(15);
        }
    }

    let audit_log = audit_log_for_config(config);

    let result = executor::clean(&report, &policy, home, &[], audit_log.as_ref());
    print_clean_report(&result);
    exit_code_for(&result)
}

fn audit_log_for_config(_config: &Config) -> Option<AuditLog> {
    let path = dirs::data_local_dir()?.join("cleanup-engine").join("audit.jsonl");
    AuditLog::open(&path).ok()
}

fn print_clean_report(result: &CleanReport) {
    println!(
        "\n{} freed {}, removed {} files and {} directories{}",
        if result.dry_run { "Would have".yellow() } else { "Cleaned,".green() },
        bytesize::ByteSize::b(result.bytes_freed).to_string().green().bold(),
        result.files_removed,
        result.directories_removed,
        if result.dry_run { " (dry run)" } else { "" }
    );

    if !result.skipped.is_empty() {
        println!("\n{}", "Skipped:".yellow());
        for (path, reason) in &result.skipped {
            println!("  {} {}: {}", "-".dimmed(), path.display(), describe_skip(*reason));
        }
    }

    if !result.errors.is_empty() {
        println!("\n{}", "Errors:".red().bold());
        for error in &result.errors {
            println!("  {} {}: {}", "x".red(), error.path.display(), error.detail);
        }
    }
}

fn describe_skip(reason: SkipReason) -> &'static str {
    match reason {
        SkipReason::AppRunning => "a live process appears to hold this path",
        SkipReason::CloudSyncing => "still syncing to a cloud provider",
        SkipReason::PolicyDenied => "above the selected cleanup level",
        SkipReason::Excluded => "category excluded by policy",
        SkipReason::AgeFiltered => "too recently modified",
        SkipReason::NotFound => "already removed before cleanup ran",
    }
}

fn exit_code_for(result: &CleanReport) -> ExitCode {
    if result.errors.iter().any(|e| e.error_kind == "permission-denied") {
        return ExitCode::from(3);
    }
    if result.errors.iter().any(|e| e.error_kind == "disk-full") {
        return ExitCode::from(4);
    }
    if !result.errors.is_empty() {
        return ExitCode::from(1);
    }
    ExitCode::SUCCESS
}

fn run_classify(home: &std::path::Path, path: &str) -> ExitCode {
    let probed = match probe::probe(std::path::Path::new(path)) {
        Ok(p) => p,
        Err(reason) => {
            eprintln!("{} {reason}", "error:".red().bold());
            return exit_code_for_error_kind(ErrorKind::NotFound);
        }
    };
    let input = probed.to_classifier_input(home);
    let classification = safety::classify(&input, &[]);

    println!(
        "{} tier={} category={} reason=\"{}\"",
        path,
        classification.tier,
        classification.category,
        classification.reason
    );

    if classification.tier == safety::SafetyTier::Danger {
        return ExitCode::from(5);
    }
    ExitCode::SUCCESS
}

fn exit_code_for_error_kind(kind: ErrorKind) -> ExitCode {
    match kind {
        ErrorKind::InvalidInput => ExitCode::from(2),
        ErrorKind::PermissionDenied => ExitCode::from(3),
        ErrorKind::ProtectedPath => ExitCode::from(5),
        ErrorKind::Cancelled => ExitCode::from(15),
        _ => ExitCode::from(1),
    }
}

fn run_config(init: bool, show: bool, path: Option<String>) -> ExitCode {
    if init {
        let config_path = match path.map(PathBuf::from).map(Ok).unwrap_or_else(Config::default_path) {
            Ok(p) => p,
            Err(e) => {
                eprintln!("{} {e}", "error:".red().bold());
                return ExitCode::from(2);
            }
        };
        let config = Config::default();
        if let Err(e) = config.save_to(&config_path) {
            eprintln!("{} {e}", "error:".red().bold());
            return ExitCode::from(2);
        }
        println!("{} Configuration saved to: {}", "ok:".green(), config_path.display());
    } else if show {
        let config = match path {
            Some(p) => match Config::load_from(&p) {
                Ok(c) => c,
                Err(e) => {
                    eprintln!("{} {e}", "error:".red().bold());
                    return ExitCode::from(2);
                }
            },
            None => Config::load_or_default(),
        };
        match toml::to_string_pretty(&config) {
            Ok(toml_str) => {
                println!("{}", "Current Configuration:".bold());
                println!("{}", "=".repeat(60));
                println!("{toml_str}");
            }
            Err(e) => {
                eprintln!("{} {e}", "error:".red().bold());
                return ExitCode::from(2);
            }
        }
    } else {
        println!("{}", "Configuration Commands:".bold());
        println!("  {} Initialize default configuration", "cleanup-engine config --init".cyan());
        println!("  {} Show current configuration", "cleanup-engine config --show".cyan());
        println!("  {} Initialize at custom path", "cleanup-engine config --init --path <PATH>".cyan());
    }
    ExitCode::SUCCESS
}
