use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use std::path::{Path, PathBuf};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use propimport::cleaner::CleanMode;
use propimport::cli::args::{Cli, Commands, CompletionShell, ConfigAction, OutputFormat};
use propimport::cli::output;
use propimport::common::workspace;
use propimport::vendor::CopyOptions;
use propimport::{ImportConfig, Importer, RunOptions, Settings};

fn main() -> Result<()> {
    let cli = Cli::parse();

    if cli.no_color {
        colored::control::set_override(false);
    }

    let _log_guard = init_logging(&cli)?;

    match cli.command {
        Some(Commands::Completions { ref shell }) => cmd_completions(shell),
        Some(Commands::Config { ref action }) => cmd_config(&cli, action),
        Some(Commands::Status) => cmd_status(&cli),
        Some(Commands::Clean { dry_run }) => cmd_clean(&cli, dry_run),
        Some(Commands::Fetch) => cmd_fetch(&cli),
        Some(Commands::Copy { dry_run, filtered }) => cmd_copy(&cli, dry_run, filtered),
        Some(Commands::Run { dry_run, filtered }) => cmd_run(&cli, dry_run, filtered),
        None => cmd_run(&cli, false, false),
    }
}

/// Install a subscriber when --verbose or --log-file asks for one
fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    if !cli.verbose && cli.log_file.is_none() {
        return Ok(None);
    }

    let stderr_layer = cli
        .verbose
        .then(|| fmt::layer().with_writer(std::io::stderr));

    let (file_layer, guard) = match cli.log_file {
        Some(ref path) => {
            let file_name = path
                .file_name()
                .with_context(|| format!("Invalid log file path: {}", path.display()))?;
            let dir = path
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .unwrap_or(Path::new("."));
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory: {}", dir.display()))?;
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            (
                Some(fmt::layer().with_ansi(false).with_writer(writer)),
                Some(guard),
            )
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(EnvFilter::new("propimport=debug"))
        .with(stderr_layer)
        .with(file_layer)
        .init();

    Ok(guard)
}

/// Everything a command needs once the project is located
struct Project {
    root: PathBuf,
    settings: Settings,
    config: ImportConfig,
}

/// Project root and settings file location, without reading the settings
fn locate_project(cli: &Cli) -> Result<(PathBuf, PathBuf)> {
    let cwd = std::env::current_dir().context("Failed to read the current directory")?;
    let root = workspace::resolve_project_root(cli.root.as_deref(), &cwd)?;
    let settings_path = cli
        .config
        .clone()
        .unwrap_or_else(|| Settings::default_path(&root));
    Ok((root, settings_path))
}

fn load_project(cli: &Cli) -> Result<Project> {
    let (root, settings_path) = locate_project(cli)?;
    let settings = if cli.config.is_some() {
        Settings::load(&settings_path)?
    } else {
        Settings::load_or_default(&settings_path)?
    };
    let config = ImportConfig::new(&root, &settings)?;

    Ok(Project {
        root,
        settings,
        config,
    })
}

fn effective_format(cli: &Cli) -> OutputFormat {
    if cli.quiet && cli.format == OutputFormat::Human {
        OutputFormat::Quiet
    } else {
        cli.format
    }
}

fn show_progress(cli: &Cli) -> bool {
    effective_format(cli) == OutputFormat::Human
}

// ─── Run ──────────────────────────────────────────────────────────────────────

fn cmd_run(cli: &Cli, dry_run: bool, filtered: bool) -> Result<()> {
    let project = load_project(cli)?;
    let importer = Importer::new(&project.config);

    let report = importer.run(RunOptions {
        dry_run,
        filtered,
        show_progress: show_progress(cli),
    })?;

    output::print_upstream_diagnostics(&report.upstream);

    match effective_format(cli) {
        OutputFormat::Human => output::print_import_report(&report, &project.root),
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Quiet => println!(
            "{}  {}  {}",
            output::quiet_clean(&report.clean),
            output::quiet_upstream(&report.upstream),
            output::quiet_copy(&report.copy)
        ),
    }

    Ok(())
}

// ─── Clean ────────────────────────────────────────────────────────────────────

fn cmd_clean(cli: &Cli, dry_run: bool) -> Result<()> {
    let project = load_project(cli)?;
    let mode = if dry_run {
        CleanMode::DryRun
    } else {
        CleanMode::Delete
    };

    let report = Importer::new(&project.config).clean(mode)?;

    match effective_format(cli) {
        OutputFormat::Human => {
            println!();
            output::print_clean_report(&report, &project.root);
            println!();
        }
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Quiet => println!("{}", output::quiet_clean(&report)),
    }

    Ok(())
}

// ─── Fetch ────────────────────────────────────────────────────────────────────

fn cmd_fetch(cli: &Cli) -> Result<()> {
    let project = load_project(cli)?;
    let outcome = Importer::new(&project.config).fetch()?;

    output::print_upstream_diagnostics(&outcome);

    match effective_format(cli) {
        OutputFormat::Human => {
            println!();
            output::print_upstream_outcome(&outcome, &project.root);
            println!();
        }
        OutputFormat::Json => output::print_json(&outcome)?,
        OutputFormat::Quiet => println!("{}", output::quiet_upstream(&outcome)),
    }

    Ok(())
}

// ─── Copy ─────────────────────────────────────────────────────────────────────

fn cmd_copy(cli: &Cli, dry_run: bool, filtered: bool) -> Result<()> {
    let project = load_project(cli)?;
    let report = Importer::new(&project.config).copy(CopyOptions {
        filtered,
        dry_run,
        show_progress: show_progress(cli),
    })?;

    match effective_format(cli) {
        OutputFormat::Human => {
            println!();
            output::print_copy_report(&report, &project.root);
            println!();
        }
        OutputFormat::Json => output::print_json(&report)?,
        OutputFormat::Quiet => println!("{}", output::quiet_copy(&report)),
    }

    Ok(())
}

// ─── Status ───────────────────────────────────────────────────────────────────

fn cmd_status(cli: &Cli) -> Result<()> {
    let project = load_project(cli)?;
    let status = Importer::new(&project.config).status();

    match effective_format(cli) {
        OutputFormat::Human => output::print_status(&status),
        OutputFormat::Json => output::print_json(&status)?,
        OutputFormat::Quiet => println!(
            "{}  {}",
            status.clone_exists,
            status.git.is_some()
        ),
    }

    Ok(())
}

// ─── Config ───────────────────────────────────────────────────────────────────

fn cmd_config(cli: &Cli, action: &ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let project = load_project(cli)?;
            match effective_format(cli) {
                OutputFormat::Json => output::print_json(&project.settings)?,
                _ => print!("{}", project.settings.to_toml()?),
            }
            Ok(())
        }
        ConfigAction::Init { force } => {
            let (_, path) = locate_project(cli)?;
            if path.exists() && !force {
                anyhow::bail!(
                    "Settings file already exists: {} (use --force to overwrite)",
                    path.display()
                );
            }
            Settings::default().save(&path)?;
            println!("  {} Wrote {}", "✓".green(), path.display());
            Ok(())
        }
    }
}

// ─── Completions ──────────────────────────────────────────────────────────────

fn cmd_completions(shell: &CompletionShell) -> Result<()> {
    use clap::CommandFactory;

    let mut cmd = Cli::command();
    let shell = match shell {
        CompletionShell::Bash => clap_complete::Shell::Bash,
        CompletionShell::Zsh => clap_complete::Shell::Zsh,
        CompletionShell::Fish => clap_complete::Shell::Fish,
    };
    clap_complete::generate(shell, &mut cmd, "propimport", &mut std::io::stdout());
    Ok(())
}
