//! CLI command definitions and handlers

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

use patrol::detect::{detect_package_manager, detect_project_type, ProjectType};
use patrol::dispatch::{DispatchOptions, Dispatcher, Status};
use patrol::executor::ExperimentalExecutor;
use patrol::git;
use patrol::legacy::LegacyCheckers;
use patrol::notifier::{ConsoleNotifier, DesktopNotifier, JsonLinesNotifier, Notifier};
use patrol::plugin::{self, PluginSet};
use patrol::registry::{ToolLookup, ToolRegistry};
use patrol::result::{aggregate_by_file, CheckResult, Severity, Summary};
use patrol::template::FILE_PATH_PLACEHOLDER;
use patrol::validator::CommandValidator;
use patrol_core::format::duration_ms;
use patrol_core::{Paths, PatrolConfig};

/// patrol - Per-file quality checks
#[derive(Parser)]
#[command(name = "patrol")]
#[command(version)]
#[command(about = "Per-file quality checks - core plugins, validated experimental tools, legacy fallbacks")]
#[command(after_help = "\
TIERS:
    1. core          built-in plugins (ESLint, Ruff), no shell involved
    2. experimental  tools-database command templates, validated before running
    3. legacy        fixed per-language checks (JS/TS, Python, Go, Rust, C#, Java, PHP, Ruby)
    The first tier that handles a file wins.

EXAMPLES:
    patrol check src/app.ts        Check one file and report
    patrol check --staged          Check every staged file
    patrol review --changed        Review files changed against HEAD
    patrol review --json           Machine-readable review report
    patrol validate 'npx oxlint a.ts' a.ts
                                   Explain whether a command may run
    patrol tools --ext py          Tools registered for .py files
    patrol detect                  Project type and recommended tools
    patrol init                    Create .patrol/config.yaml")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Project root (default: current directory)
    #[arg(short = 'C', long, global = true)]
    pub dir: Option<PathBuf>,

    /// Config file (default: <root>/.patrol/config.yaml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Tools database (JSON) to use instead of the built-in one
    #[arg(long, global = true)]
    pub registry: Option<PathBuf>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Minimal output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check files and report each outcome as it happens
    Check {
        /// Files to check
        paths: Vec<PathBuf>,

        /// Check git staged files
        #[arg(long, conflicts_with = "changed")]
        staged: bool,

        /// Check files changed against HEAD
        #[arg(long)]
        changed: bool,

        /// Let core tools fix what they can
        #[arg(long)]
        fix: bool,

        /// Also send desktop notifications for failures
        #[arg(long)]
        desktop: bool,
    },

    /// Check files and print a review report
    Review {
        /// Files to review
        paths: Vec<PathBuf>,

        /// Review git staged files
        #[arg(long, conflicts_with = "changed")]
        staged: bool,

        /// Review files changed against HEAD
        #[arg(long)]
        changed: bool,
    },

    /// Explain whether a command may run for a file
    Validate {
        /// Command line, optionally containing {filePath}
        command: String,

        /// File the command is meant to check
        file: String,
    },

    /// List registered tools
    Tools {
        /// Only tools for this extension
        #[arg(long)]
        ext: Option<String>,
    },

    /// Show the detected project type and recommended tools
    Detect,

    /// Create .patrol/config.yaml
    Init {
        /// Overwrite an existing config
        #[arg(long)]
        force: bool,
    },
}

/// Everything a command needs about the project
struct Project {
    root: PathBuf,
    config: PatrolConfig,
    registry: ToolRegistry,
}

impl Project {
    fn load(cli: &Cli) -> Result<Self> {
        let cwd = std::env::current_dir().context("Failed to read current directory")?;
        let root = match &cli.dir {
            Some(dir) => absolute(&cwd, dir),
            None => cwd,
        };

        let config = match &cli.config {
            Some(path) => PatrolConfig::load(path)?,
            None => PatrolConfig::load_for_project(&root)?,
        };
        let registry = load_registry(cli, &root, &config)?;

        debug!(root = %root.display(), registry = registry.version(), "project loaded");
        Ok(Self {
            root,
            config,
            registry,
        })
    }

    fn check_timeout(&self) -> Duration {
        Duration::from_secs(self.config.check_timeout_secs)
    }

    fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.config.probe_timeout_secs)
    }

    fn executor(&self) -> ExperimentalExecutor {
        ExperimentalExecutor::default().with_timeouts(self.check_timeout(), self.probe_timeout())
    }

    fn dispatcher(self, notifier: Arc<dyn Notifier>, fix: bool) -> Dispatcher {
        let options = DispatchOptions::from_config(&self.config, fix);
        let executor = self.executor();
        let timeout = self.check_timeout();

        Dispatcher::new(Arc::new(self.registry), notifier)
            .with_plugins(PluginSet::builtin(timeout))
            .with_executor(executor)
            .with_fallback(Arc::new(LegacyCheckers::new(timeout)))
            .with_options(options)
    }
}

/// `--registry`, then the config's `registry`, then the user database, then
/// the built-in one
fn load_registry(cli: &Cli, root: &Path, config: &PatrolConfig) -> Result<ToolRegistry> {
    let explicit = cli
        .registry
        .clone()
        .or_else(|| config.registry.as_ref().map(|p| absolute(root, p)));

    if let Some(path) = explicit {
        return Ok(ToolRegistry::load(&path)?);
    }

    let user = Paths::new().user_registry();
    if user.exists() {
        return Ok(ToolRegistry::load(&user)?);
    }

    Ok(ToolRegistry::builtin())
}

fn absolute(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Run the CLI
pub async fn run(cli: Cli) -> Result<()> {
    let project = Project::load(&cli)?;

    match &cli.command {
        Commands::Check {
            paths,
            staged,
            changed,
            fix,
            desktop,
        } => {
            let files = resolve_files(&project.root, paths, *staged, *changed).await?;
            cmd_check(&cli, project, files, *fix, *desktop).await
        }
        Commands::Review {
            paths,
            staged,
            changed,
        } => {
            let files = resolve_files(&project.root, paths, *staged, *changed).await?;
            cmd_review(&cli, project, files).await
        }
        Commands::Validate { command, file } => cmd_validate(&cli, command, file),
        Commands::Tools { ext } => cmd_tools(&cli, &project, ext.as_deref()),
        Commands::Detect => cmd_detect(&cli, &project).await,
        Commands::Init { force } => cmd_init(&project, *force),
    }
}

/// Explicit paths, or the files git reports
async fn resolve_files(
    root: &Path,
    paths: &[PathBuf],
    staged: bool,
    changed: bool,
) -> Result<Vec<PathBuf>> {
    if staged {
        return git::staged_files(root).await;
    }
    if changed {
        return git::changed_files(root).await;
    }
    if paths.is_empty() {
        bail!("No files given. Pass paths, --staged or --changed.");
    }

    let mut files = Vec::with_capacity(paths.len());
    for path in paths {
        let path = absolute(root, path);
        if path.is_file() {
            files.push(path);
        } else {
            warn!(path = %path.display(), "not a file, skipping");
        }
    }
    Ok(files)
}

/// Live checks
async fn cmd_check(cli: &Cli, project: Project, files: Vec<PathBuf>, fix: bool, desktop: bool) -> Result<()> {
    let notifier: Arc<dyn Notifier> = if cli.json {
        Arc::new(JsonLinesNotifier)
    } else if desktop || project.config.desktop_notifications {
        Arc::new(DesktopNotifier::new(ConsoleNotifier::new(cli.quiet)))
    } else {
        Arc::new(ConsoleNotifier::new(cli.quiet))
    };

    let dispatcher = project.dispatcher(notifier, fix);
    let start = Instant::now();
    let mut handled = 0;
    let mut failed = 0;

    for file in &files {
        if let Some(dispatched) = dispatcher.check_file(file).await? {
            handled += 1;
            if dispatched.status == Status::Fail {
                failed += 1;
            }
        }
    }

    if !cli.json && !cli.quiet {
        println!("----------------------------");
        let elapsed = duration_ms(start.elapsed().as_millis() as u64);
        if failed == 0 {
            println!("Total: {} {} file(s) checked, all passed", elapsed, handled);
        } else {
            println!("Total: {} {} of {} file(s) failed", elapsed, failed, handled);
        }
    }

    if failed > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// Batch review
async fn cmd_review(cli: &Cli, project: Project, files: Vec<PathBuf>) -> Result<()> {
    let tiers = project.config.review_tiers;
    let dispatcher = project.dispatcher(Arc::new(ConsoleNotifier::new(true)), false);

    let results = dispatcher.check_files(&files).await?;
    let summary = Summary::from_results(files.len(), &results);

    let report = serde_json::json!({
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "tiers": tiers.as_str(),
        "summary": &summary,
        "results": &results,
    });
    save_report(&report);

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_review(&results, &summary, cli.quiet);
    }

    if summary.errors > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn save_report(report: &serde_json::Value) {
    let path = Paths::new().last_review();
    let write = || -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&path, serde_json::to_string_pretty(report)?)?;
        Ok(())
    };
    if let Err(e) = write() {
        warn!(path = %path.display(), error = %e, "failed to save review report");
    }
}

fn severity_label(severity: Severity) -> colored::ColoredString {
    match severity {
        Severity::Error => "error".red().bold(),
        Severity::Warning => "warning".yellow(),
        Severity::Info => "info".blue(),
    }
}

fn print_review(results: &[CheckResult], summary: &Summary, quiet: bool) {
    if !quiet {
        for result in results {
            println!(
                "{} {} {}",
                severity_label(result.severity),
                result.file.display(),
                format!("({})", result.tool).dimmed()
            );
            for issue in &result.issues {
                println!("     {}", issue);
            }
            for fix in result.suggested_fixes.iter().flatten() {
                println!("     {} {}", "fix:".dimmed(), fix);
            }
        }
        if !results.is_empty() {
            println!();
        }
    }

    println!("----------------------------");
    for (file, severity) in aggregate_by_file(results) {
        println!("  {:<8} {}", severity_label(severity), file.display());
    }
    println!(
        "Files: {} checked, {} with issues",
        summary.files_checked, summary.files_with_issues
    );
    println!(
        "Results: {} error(s), {} warning(s), {} info",
        summary.errors, summary.warnings, summary.infos
    );
}

/// Explain the validator's verdict
fn cmd_validate(cli: &Cli, command: &str, file: &str) -> Result<()> {
    let command = command.replace(FILE_PATH_PLACEHOLDER, file);
    let verdict = CommandValidator::default().check(&command, file);

    if cli.json {
        println!(
            "{}",
            serde_json::json!({
                "command": command,
                "file": file,
                "valid": verdict.is_ok(),
                "reason": verdict.as_ref().err().map(|v| v.to_string()),
            })
        );
    } else {
        match &verdict {
            Ok(()) => println!("{} {}", "allowed".green(), command),
            Err(violation) => println!("{} {} ({})", "rejected".red(), command, violation),
        }
    }

    if verdict.is_err() {
        std::process::exit(1);
    }
    Ok(())
}

/// List registry tools
fn cmd_tools(cli: &Cli, project: &Project, ext: Option<&str>) -> Result<()> {
    let registry = &project.registry;
    let (core, experimental) = match ext {
        Some(ext) => {
            let ext = ext.trim_start_matches('.').to_ascii_lowercase();
            (
                registry.core_tools_for_extension(&ext)?,
                registry.experimental_tools_for_extension(&ext)?,
            )
        }
        None => (
            registry.core_tools().to_vec(),
            registry.experimental_tools().to_vec(),
        ),
    };

    if cli.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "version": registry.version(),
                "core": core,
                "experimental": experimental,
            }))?
        );
        return Ok(());
    }

    println!("Tools database {}", registry.version());
    println!("----------------------------");
    println!("Core:");
    for tool in &core {
        println!(
            "  {:<14} {:<8} {}",
            tool.name,
            tool.plugin.id(),
            tool.extensions.join(", ")
        );
    }
    println!("Experimental:");
    for tool in &experimental {
        println!("  {:<14} {}", tool.name, tool.command_template.dimmed());
    }
    Ok(())
}

/// Project type plus recommended tools and whether they answer a probe
async fn cmd_detect(cli: &Cli, project: &Project) -> Result<()> {
    let project_type = detect_project_type(&project.root);
    let package_manager = match project_type {
        ProjectType::JavaScript | ProjectType::TypeScript => Some(detect_package_manager(&project.root)),
        _ => None,
    };

    let plugins = PluginSet::builtin(project.check_timeout());
    let executor = project.executor();
    let mut recommendations: Vec<(String, &str, bool)> = Vec::new();

    for ext in project_type.extensions() {
        for tool in project.registry.core_tools_for_extension(ext)? {
            if recommendations.iter().any(|(name, _, _)| *name == tool.name) {
                continue;
            }
            let installed = match plugins.get(tool.plugin) {
                Some(core) => plugin::is_installed(core, &project.root, project.probe_timeout()).await,
                None => false,
            };
            recommendations.push((tool.name, "core", installed));
        }
        for tool in project.registry.experimental_tools_for_extension(ext)? {
            if recommendations.iter().any(|(name, _, _)| *name == tool.name) {
                continue;
            }
            let installed = executor.is_installed_in(&tool, &project.root).await;
            recommendations.push((tool.name, "experimental", installed));
        }
    }

    if cli.json {
        let tools: Vec<_> = recommendations
            .iter()
            .map(|(name, tier, installed)| {
                serde_json::json!({ "name": name, "tier": tier, "installed": installed })
            })
            .collect();
        println!(
            "{}",
            serde_json::json!({
                "project_type": project_type.name(),
                "package_manager": package_manager,
                "tools": tools,
            })
        );
        return Ok(());
    }

    println!("Project: {}", project.root.display());
    println!("Type: {}", project_type.name());
    if let Some(pm) = package_manager {
        println!("Package manager: {}", pm);
    }
    if recommendations.is_empty() {
        println!("No registered tools for this project type; legacy checks apply.");
        return Ok(());
    }
    println!();
    println!("Recommended tools:");
    for (name, tier, installed) in &recommendations {
        let mark = if *installed {
            "installed".green()
        } else {
            "missing".yellow()
        };
        println!("  {:<14} {:<13} {}", name, tier, mark);
    }
    Ok(())
}

/// Create project config
fn cmd_init(project: &Project, force: bool) -> Result<()> {
    let config_file = Paths::project_config(&project.root);

    if config_file.exists() && !force {
        eprintln!("Config already exists: {}", config_file.display());
        std::process::exit(1);
    }

    PatrolConfig::default()
        .save(&config_file)
        .context("Failed to write config file")?;

    println!("Created {}", config_file.display());
    println!("Edit this file to customize checks for your project.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_check() {
        let cli = Cli::try_parse_from(["patrol", "--json", "check", "--staged", "--fix"]).unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Check {
                staged, fix, paths, ..
            } => {
                assert!(staged && fix);
                assert!(paths.is_empty());
            }
            _ => panic!("expected check"),
        }
    }

    #[test]
    fn test_staged_and_changed_conflict() {
        assert!(Cli::try_parse_from(["patrol", "review", "--staged", "--changed"]).is_err());
    }

    #[test]
    fn test_absolute() {
        assert_eq!(absolute(Path::new("/p"), Path::new("a.js")), PathBuf::from("/p/a.js"));
        assert_eq!(absolute(Path::new("/p"), Path::new("/q/a.js")), PathBuf::from("/q/a.js"));
    }

    #[tokio::test]
    async fn test_resolve_files_requires_input() {
        assert!(resolve_files(Path::new("/"), &[], false, false).await.is_err());
    }

    #[tokio::test]
    async fn test_resolve_files_skips_missing() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.py"), "").unwrap();
        let files = resolve_files(
            dir.path(),
            &[PathBuf::from("a.py"), PathBuf::from("gone.rb")],
            false,
            false,
        )
        .await
        .unwrap();
        assert_eq!(files, vec![dir.path().join("a.py")]);
    }
}
