use colored::*;
use serde::Serialize;
use std::path::Path;

use crate::cleaner::{CleanMode, CleanReport};
use crate::common::format::{self, format_count, format_flag, format_path, format_size, print_kv};
use crate::importer::{ImportReport, StatusReport};
use crate::upstream::SyncOutcome;
use crate::vendor::CopyReport;

/// Print any serializable report as pretty JSON
pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Write upstream warnings to stderr. Shown in every output format.
pub fn print_upstream_diagnostics(outcome: &SyncOutcome) {
    for line in outcome.diagnostics() {
        eprintln!("{}", line);
    }
}

/// Print a full import in human-readable format
pub fn print_import_report(report: &ImportReport, root: &Path) {
    println!();
    println!("  {} libpropeller import", "📦");
    println!("{}", "─".repeat(60).dimmed());

    print_clean_report(&report.clean, root);
    print_upstream_outcome(&report.upstream, root);
    print_copy_report(&report.copy, root);

    println!("{}", "─".repeat(60).dimmed());
    println!(
        "  Finished in {}",
        format::format_duration(report.duration_secs).cyan()
    );
    println!();
}

/// Print a clean report in human-readable format
pub fn print_clean_report(report: &CleanReport, root: &Path) {
    let label = match report.mode {
        CleanMode::DryRun => "Would remove",
        CleanMode::Delete => "Removed",
    };

    if report.removed.is_empty() {
        println!(
            "  {} Clean: {} already clean",
            "✓".green(),
            format_path(&report.destination, Some(root)).cyan()
        );
    } else {
        println!(
            "  {} Clean: {} {} ({})",
            "✓".green(),
            label,
            format_count(report.removed.len(), "entry", "entries"),
            format_size(report.bytes_freed)
        );
        if report.mode == CleanMode::DryRun {
            for entry in &report.removed {
                let marker = if entry.is_dir { "/" } else { "" };
                println!(
                    "      {}{}",
                    format_path(&entry.path, Some(root)).dimmed(),
                    marker
                );
            }
        }
    }

    if !report.kept.is_empty() {
        let names: Vec<String> = report
            .kept
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        println!("      kept: {}", names.join(", ").dimmed());
    }
}

/// Print the upstream step in human-readable format (diagnostics go to stderr separately)
pub fn print_upstream_outcome(outcome: &SyncOutcome, root: &Path) {
    match outcome {
        SyncOutcome::Cloned { path } => println!(
            "  {} Upstream: cloned into {}",
            "✓".green(),
            format_path(path, Some(root)).cyan()
        ),
        SyncOutcome::Updated { path } => println!(
            "  {} Upstream: pulled {}",
            "✓".green(),
            format_path(path, Some(root)).cyan()
        ),
        SyncOutcome::ToolMissing { program } => println!(
            "  {} Upstream: '{}' not found, using existing clone",
            "⚠".yellow(),
            program
        ),
        SyncOutcome::Failed { action, .. } => println!(
            "  {} Upstream: {} failed, using existing clone",
            "⚠".yellow(),
            action
        ),
        SyncOutcome::Skipped => println!("  {} Upstream: skipped (dry run)", "ℹ️"),
    }
}

/// Print a copy report in human-readable format
pub fn print_copy_report(report: &CopyReport, root: &Path) {
    let label = if report.dry_run { "Would copy" } else { "Copied" };
    println!(
        "  {} Copy: {} {} ({}) into {}",
        "✓".green(),
        label,
        format_count(report.files_copied, "file", "files"),
        format_size(report.bytes_copied),
        format_path(&report.destination, Some(root)).cyan()
    );
    if report.dirs_created > 0 {
        println!(
            "      {} created",
            format_count(report.dirs_created, "directory", "directories").dimmed()
        );
    }
    if report.filtered {
        println!(
            "      {} skipped by filter",
            format_count(report.skipped, "file", "files").dimmed()
        );
    }
}

/// Print project status in human-readable format
pub fn print_status(status: &StatusReport) {
    println!();
    println!("  {} propimport status", "📊");
    println!("{}", "─".repeat(60).dimmed());
    print_kv("Project root", &status.project_root.display().to_string());
    print_kv(
        "Destination",
        &format!(
            "{} (exists: {})",
            format_path(&status.destination, Some(&status.project_root)),
            format_flag(status.destination_exists)
        ),
    );
    print_kv("Upstream", &status.upstream_url);
    print_kv(
        "Local clone",
        &format!(
            "{} (exists: {})",
            format_path(&status.clone_path, Some(&status.project_root)),
            format_flag(status.clone_exists)
        ),
    );
    print_kv("Library folder", &format_flag(status.library_exists).to_string());
    print_kv(
        "Object list",
        &match status.object_list {
            Some(ref p) => format_path(p, Some(&status.project_root)),
            None => "not found".yellow().to_string(),
        },
    );
    print_kv(
        "git",
        &match status.git {
            Some(ref p) => p.display().to_string(),
            None => "not in PATH".yellow().to_string(),
        },
    );
    println!();
}

/// One-line summaries for --format quiet
pub fn quiet_clean(report: &CleanReport) -> String {
    format!("{}  {}", report.removed.len(), report.bytes_freed)
}

pub fn quiet_upstream(outcome: &SyncOutcome) -> String {
    match outcome {
        SyncOutcome::Cloned { .. } => "cloned".to_string(),
        SyncOutcome::Updated { .. } => "updated".to_string(),
        SyncOutcome::ToolMissing { .. } => "tool_missing".to_string(),
        SyncOutcome::Failed { .. } => "failed".to_string(),
        SyncOutcome::Skipped => "skipped".to_string(),
    }
}

pub fn quiet_copy(report: &CopyReport) -> String {
    format!("{}  {}", report.files_copied, report.bytes_copied)
}
