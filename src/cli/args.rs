use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// propimport: vendor libpropeller into a PropWare tree
#[derive(Parser, Debug)]
#[command(
    name = "propimport",
    version,
    about = "Vendor the libpropeller sources into a PropWare project",
    long_about = "propimport cleans the libpropeller destination folder, clones or pulls\n\
                  the upstream repository, and copies the library sources into place.\n\
                  Run it from <project root>/util, or point it at a project with --root.",
    after_help = "EXAMPLES:\n  \
        propimport                             Full import (clean, fetch, copy)\n  \
        propimport run --dry-run               Show what a full import would do\n  \
        propimport clean                       Clean the destination only\n  \
        propimport fetch                       Clone or pull the upstream only\n  \
        propimport copy --filtered             Copy only assembly and whitelisted files\n  \
        propimport --root ~/PropWare status    Inspect a project from anywhere\n  \
        propimport config init                 Write a default .propimport.toml"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Project root (skips the working-directory check)
    #[arg(long, global = true, value_name = "DIR", env = "PROPIMPORT_ROOT")]
    pub root: Option<PathBuf>,

    /// Settings file (default: <root>/.propimport.toml)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "human")]
    pub format: OutputFormat,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Verbose output
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Quiet mode, minimal output
    #[arg(long, short, global = true)]
    pub quiet: bool,

    /// Also write debug logs to this file
    #[arg(long, global = true, value_name = "FILE")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Clean, fetch and copy (the default)
    Run {
        /// Show what would happen without touching anything
        #[arg(long)]
        dry_run: bool,

        /// Only copy assembly sources and whitelisted files
        #[arg(long)]
        filtered: bool,
    },

    /// Remove stale files from the destination
    Clean {
        /// Show what would be removed
        #[arg(long)]
        dry_run: bool,
    },

    /// Clone or update the upstream repository
    Fetch,

    /// Copy the upstream library into the destination
    Copy {
        /// Show what would be copied
        #[arg(long)]
        dry_run: bool,

        /// Only copy assembly sources and whitelisted files
        #[arg(long)]
        filtered: bool,
    },

    /// Show project paths, clone state and git availability
    Status,

    /// Manage the settings file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Target shell
        shell: CompletionShell,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Print the effective settings
    Show,

    /// Write default settings to the settings file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Human,
    Json,
    Quiet,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum CompletionShell {
    Bash,
    Zsh,
    Fish,
}
