use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Command;
use tracing::{debug, info, warn};

use super::which::which;
use crate::common::config::ImportConfig;

/// Which git operation was attempted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GitAction {
    Clone,
    Pull,
}

impl std::fmt::Display for GitAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GitAction::Clone => write!(f, "git clone"),
            GitAction::Pull => write!(f, "git pull"),
        }
    }
}

/// Result of bringing the local upstream clone up to date.
///
/// Failures here are recoverable: the orchestrator reports them and carries
/// on with whatever clone is already on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SyncOutcome {
    /// No clone existed and a fresh one was created
    Cloned { path: PathBuf },
    /// An existing clone was pulled
    Updated { path: PathBuf },
    /// Git could not be found, nothing was attempted
    ToolMissing { program: String },
    /// Git ran (or failed to start) and did not succeed
    Failed {
        action: GitAction,
        exit_code: Option<i32>,
        output: String,
    },
    /// Dry run, git was not invoked
    Skipped,
}

impl SyncOutcome {
    /// True for the outcomes that deserve a warning on stderr
    pub fn is_failure(&self) -> bool {
        matches!(
            self,
            SyncOutcome::ToolMissing { .. } | SyncOutcome::Failed { .. }
        )
    }

    /// Lines for the error stream, empty on success
    pub fn diagnostics(&self) -> Vec<String> {
        match self {
            SyncOutcome::ToolMissing { program } => vec![
                "Looks like I can't update the git repository for libpropeller. Sorry!".to_string(),
                format!("Caused by: '{}' is not in the PATH", program),
            ],
            SyncOutcome::Failed {
                action,
                exit_code,
                output,
            } => {
                let status = match exit_code {
                    Some(code) => format!("'{}' returned non-zero exit status {}", action, code),
                    None => format!("'{}' did not run to completion", action),
                };
                let mut lines = vec![
                    "Looks like I can't clone or update the git repository for libpropeller. Sorry!"
                        .to_string(),
                    format!("Caused by: {}", status),
                ];
                if !output.is_empty() {
                    lines.push(output.clone());
                }
                lines
            }
            _ => Vec::new(),
        }
    }
}

/// Thin wrapper over the git executable
#[derive(Debug, Clone)]
pub struct GitClient {
    program: PathBuf,
}

impl GitClient {
    /// Find git on the PATH (or at an explicit location)
    pub fn locate(program: &str) -> Option<Self> {
        which(program).map(|program| Self { program })
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    /// `git clone <url> <name>` run inside `parent`
    pub fn clone_repo(&self, url: &str, parent: &Path, name: &str) -> SyncOutcome {
        match self.run(&["clone", url, name], parent) {
            Ok(()) => SyncOutcome::Cloned {
                path: parent.join(name),
            },
            Err((exit_code, output)) => SyncOutcome::Failed {
                action: GitAction::Clone,
                exit_code,
                output,
            },
        }
    }

    /// `git pull` run inside `repo`
    pub fn pull(&self, repo: &Path) -> SyncOutcome {
        match self.run(&["pull"], repo) {
            Ok(()) => SyncOutcome::Updated {
                path: repo.to_path_buf(),
            },
            Err((exit_code, output)) => SyncOutcome::Failed {
                action: GitAction::Pull,
                exit_code,
                output,
            },
        }
    }

    /// Run git to completion, capturing stdout and stderr together
    fn run(&self, args: &[&str], cwd: &Path) -> std::result::Result<(), (Option<i32>, String)> {
        debug!(program = %self.program.display(), ?args, cwd = %cwd.display(), "running git");

        let output = Command::new(&self.program)
            .args(args)
            .current_dir(cwd)
            .output()
            .map_err(|e| (None, format!("failed to start '{}': {}", self.program.display(), e)))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        let combined = combined.trim().to_string();

        if output.status.success() {
            debug!(output = %combined, "git succeeded");
            Ok(())
        } else {
            Err((output.status.code(), combined))
        }
    }
}

/// Make sure a local clone of the upstream repository exists and is current.
///
/// Clones when the clone path is missing, pulls otherwise. Never returns an
/// error: a missing git or a failing subprocess comes back as an outcome.
/// The downloads folder must already exist.
pub fn ensure_upstream(config: &ImportConfig) -> SyncOutcome {
    let Some(git) = GitClient::locate(&config.git_program) else {
        warn!(program = %config.git_program, "git not found, skipping upstream update");
        return SyncOutcome::ToolMissing {
            program: config.git_program.clone(),
        };
    };

    let outcome = if config.clone_path.exists() {
        info!(path = %config.clone_path.display(), "updating upstream clone");
        git.pull(&config.clone_path)
    } else {
        info!(url = %config.upstream_url, "cloning upstream repository");
        git.clone_repo(
            &config.upstream_url,
            &config.downloads_dir,
            &config.upstream_name,
        )
    };

    if outcome.is_failure() {
        warn!(?outcome, "upstream update failed");
    }
    outcome
}
