//! Orchestration of a full vendoring run: clean, fetch, copy.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::PathBuf;
use std::time::Instant;
use tracing::{info, warn};

use crate::cleaner::{self, CleanMode, CleanReport};
use crate::common::config::ImportConfig;
use crate::common::errors::{ImportError, Result};
use crate::common::workspace;
use crate::upstream::{self, GitClient, SyncOutcome};
use crate::vendor::{self, CopyOptions, CopyReport};

/// Options for a full run
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions {
    /// Report what would happen; no files are touched and git is not run
    pub dry_run: bool,
    /// Apply the file eligibility filter to the copy
    pub filtered: bool,
    pub show_progress: bool,
}

/// Everything a full run did
#[derive(Debug, Clone, Serialize)]
pub struct ImportReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub duration_secs: f64,
    pub clean: CleanReport,
    pub upstream: SyncOutcome,
    pub copy: CopyReport,
}

/// Read-only snapshot of the project layout
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    pub project_root: PathBuf,
    pub destination: PathBuf,
    pub destination_exists: bool,
    pub upstream_url: String,
    pub clone_path: PathBuf,
    pub clone_exists: bool,
    pub library_exists: bool,
    /// First location where the source-object manifest was found
    pub object_list: Option<PathBuf>,
    /// Resolved git executable, if any
    pub git: Option<PathBuf>,
}

/// Runs the vendoring steps against one immutable configuration
#[derive(Debug, Clone, Copy)]
pub struct Importer<'a> {
    config: &'a ImportConfig,
}

impl<'a> Importer<'a> {
    pub fn new(config: &'a ImportConfig) -> Self {
        Self { config }
    }

    /// Clean, bring the upstream clone up to date, then copy it in.
    ///
    /// Upstream failures are recorded in the report and do not stop the copy.
    /// Filesystem failures abort the run. When a failed sync leaves nothing to
    /// copy, the error is [`ImportError::UpstreamUnavailable`] and still carries
    /// the sync outcome.
    pub fn run(&self, options: RunOptions) -> Result<ImportReport> {
        let started_at = Utc::now();
        let timer = Instant::now();

        let mode = if options.dry_run {
            CleanMode::DryRun
        } else {
            CleanMode::Delete
        };
        let clean = self.clean(mode)?;

        let upstream = if options.dry_run {
            SyncOutcome::Skipped
        } else {
            self.fetch()?
        };

        let copy_options = CopyOptions {
            filtered: options.filtered,
            dry_run: options.dry_run,
            show_progress: options.show_progress,
        };
        let copy = if options.dry_run && !self.config.library_path().is_dir() {
            // first import: nothing to preview until the clone exists
            CopyReport {
                source: self.config.library_path(),
                destination: self.config.destination.clone(),
                files_copied: 0,
                bytes_copied: 0,
                dirs_created: 0,
                skipped: 0,
                filtered: options.filtered,
                dry_run: true,
            }
        } else {
            match self.copy(copy_options) {
                Ok(copy) => copy,
                Err(err @ ImportError::MissingUpstream { .. }) if upstream.is_failure() => {
                    return Err(ImportError::UpstreamUnavailable {
                        outcome: upstream,
                        source: Box::new(err),
                    });
                }
                Err(err) => return Err(err),
            }
        };

        let report = ImportReport {
            started_at,
            finished_at: Utc::now(),
            duration_secs: timer.elapsed().as_secs_f64(),
            clean,
            upstream,
            copy,
        };

        info!(
            files = report.copy.files_copied,
            upstream_ok = !report.upstream.is_failure(),
            "import finished"
        );

        Ok(report)
    }

    /// Remove stale entries from the destination
    pub fn clean(&self, mode: CleanMode) -> Result<CleanReport> {
        cleaner::clean(self.config, mode)
    }

    /// Create the downloads folder, then clone or pull the upstream repository
    pub fn fetch(&self) -> Result<SyncOutcome> {
        workspace::init_downloads_folder(self.config)?;
        let outcome = upstream::ensure_upstream(self.config);
        if outcome.is_failure() {
            warn!("continuing with the existing clone, if any");
        }
        Ok(outcome)
    }

    /// Copy the upstream library folder into the destination
    pub fn copy(&self, options: CopyOptions) -> Result<CopyReport> {
        vendor::copy_library(self.config, options)
    }

    pub fn status(&self) -> StatusReport {
        let config = self.config;
        StatusReport {
            project_root: config.project_root.clone(),
            destination: config.destination.clone(),
            destination_exists: config.destination.is_dir(),
            upstream_url: config.upstream_url.clone(),
            clone_path: config.clone_path.clone(),
            clone_exists: config.clone_path.is_dir(),
            library_exists: config.library_path().is_dir(),
            object_list: config
                .object_list_candidates()
                .into_iter()
                .find(|p| p.is_file()),
            git: GitClient::locate(&config.git_program).map(|g| g.program().to_path_buf()),
        }
    }
}
