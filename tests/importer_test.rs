use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

use propimport::upstream::{GitAction, SyncOutcome};
use propimport::{ImportConfig, ImportError, Importer, RunOptions, Settings};

const UPSTREAM_URL: &str = "https://example.invalid/libpropeller/libpropeller.git";

fn touch(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

fn project_root(dir: &TempDir) -> PathBuf {
    fs::canonicalize(dir.path()).unwrap()
}

fn config_with_git(root: &Path, git_program: &str) -> ImportConfig {
    let settings = Settings {
        git_program: git_program.to_string(),
        upstream_url: UPSTREAM_URL.to_string(),
        ..Settings::default()
    };
    ImportConfig::new(root, &settings).unwrap()
}

/// Populate what `git clone` would have produced
fn seed_clone(config: &ImportConfig) {
    let lib = config.library_path();
    touch(&lib.join("serial/serial.S"), "serial asm v1");
    touch(&lib.join("serial/serial.h"), "serial header");
    touch(&lib.join("pwm32/pwm32.S"), "pwm asm v1");
    touch(&lib.join("numbers/numbers.cpp"), "numbers");
    touch(&lib.join("numbers/numbers.h"), "numbers header");
}

#[test]
fn test_missing_git_keeps_existing_clone_and_copies() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir);
    let config = config_with_git(&root, "propimport-missing-git-xyz");
    seed_clone(&config);
    let before = fs::read_to_string(config.library_path().join("serial/serial.S")).unwrap();

    let report = Importer::new(&config).run(RunOptions::default()).unwrap();

    assert!(matches!(report.upstream, SyncOutcome::ToolMissing { .. }));
    assert!(!report.upstream.diagnostics().is_empty());
    let after = fs::read_to_string(config.library_path().join("serial/serial.S")).unwrap();
    assert_eq!(before, after);
    assert!(config.destination.join("serial/serial.S").is_file());
    assert_eq!(report.copy.files_copied, 5);
}

#[test]
fn test_missing_git_without_clone_is_fatal() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir);
    let config = config_with_git(&root, "propimport-missing-git-xyz");

    let err = Importer::new(&config).run(RunOptions::default()).unwrap_err();
    match &err {
        ImportError::UpstreamUnavailable { outcome, source } => {
            assert!(matches!(outcome, SyncOutcome::ToolMissing { .. }));
            assert!(matches!(**source, ImportError::MissingUpstream { .. }));
        }
        other => panic!("expected upstream error, got {:?}", other),
    }
    assert!(err.to_string().contains("is not in the PATH"));
    // downloads folder is still initialized before the fetch
    assert!(config.downloads_dir.is_dir());
}

#[test]
fn test_asm_and_whitelisted_files_land_at_same_relative_paths() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir);
    let config = config_with_git(&root, "propimport-missing-git-xyz");
    seed_clone(&config);

    Importer::new(&config).run(RunOptions::default()).unwrap();

    for entry in walkdir::WalkDir::new(config.library_path()) {
        let entry = entry.unwrap();
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name();
        if config.is_asm_file(name) || config.is_whitelisted(name) {
            let relative = entry.path().strip_prefix(config.library_path()).unwrap();
            let copied = config.destination.join(relative);
            assert_eq!(
                fs::read(entry.path()).unwrap(),
                fs::read(&copied).unwrap(),
                "{} not vendored",
                relative.display()
            );
        }
    }
}

#[test]
fn test_rerun_replaces_stale_vendored_files() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir);
    let config = config_with_git(&root, "propimport-missing-git-xyz");
    seed_clone(&config);
    touch(&config.destination.join("removed_upstream/old.S"), "gone");
    touch(&config.destination.join("CMakeLists.txt"), "local build");

    Importer::new(&config).run(RunOptions::default()).unwrap();

    assert!(!config.destination.join("removed_upstream").exists());
    assert_eq!(
        fs::read_to_string(config.destination.join("CMakeLists.txt")).unwrap(),
        "local build"
    );
}

#[test]
fn test_filtered_run_copies_only_eligible_files() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir);
    let config = config_with_git(&root, "propimport-missing-git-xyz");
    seed_clone(&config);

    touch(&config.library_path().join("headers/board.h"), "header only");

    let report = Importer::new(&config)
        .run(RunOptions {
            filtered: true,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(report.copy.files_copied, 3);
    assert_eq!(report.copy.skipped, 3);
    assert!(config.destination.join("numbers/numbers.cpp").is_file());
    assert!(!config.destination.join("numbers/numbers.h").exists());
    assert!(!config.destination.join("headers").exists());
}

#[test]
fn test_dry_run_changes_nothing() {
    let dir = TempDir::new().unwrap();
    let root = project_root(&dir);
    let config = config_with_git(&root, "propimport-missing-git-xyz");
    seed_clone(&config);
    touch(&config.destination.join("stale.h"), "stale");

    let report = Importer::new(&config)
        .run(RunOptions {
            dry_run: true,
            ..Default::default()
        })
        .unwrap();

    assert_eq!(report.upstream, SyncOutcome::Skipped);
    assert_eq!(report.clean.removed.len(), 1);
    assert_eq!(report.copy.files_copied, 5);
    assert!(config.destination.join("stale.h").exists());
    assert!(!config.destination.join("serial").exists());
}

#[cfg(unix)]
mod fake_git {
    use super::*;
    use serial_test::serial;
    use std::os::unix::fs::PermissionsExt;

    /// Write an executable shell script standing in for git.
    /// Every invocation appends "<cwd>|<args>" to `log`.
    fn install_fake_git(dir: &Path, log: &Path, fail: bool) -> PathBuf {
        let body = if fail {
            "echo 'fatal: unable to access remote' >&2\nexit 128\n".to_string()
        } else {
            "case \"$1\" in\n\
             clone)\n\
               mkdir -p \"$3/libpropeller/serial\" \"$3/libpropeller/numbers\"\n\
               echo 'serial asm' > \"$3/libpropeller/serial/serial.S\"\n\
               echo 'numbers' > \"$3/libpropeller/numbers/numbers.cpp\"\n\
               ;;\n\
             pull)\n\
               echo 'Already up to date.'\n\
               ;;\n\
             esac\n"
                .to_string()
        };
        let script = format!(
            "#!/bin/sh\necho \"$(pwd)|$*\" >> '{}'\n{}",
            log.display(),
            body
        );

        let path = dir.join("fake-git");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn read_log(log: &Path) -> Vec<String> {
        fs::read_to_string(log)
            .unwrap_or_default()
            .lines()
            .map(|l| l.to_string())
            .collect()
    }

    #[test]
    #[serial]
    fn test_clones_when_no_local_clone() {
        let dir = TempDir::new().unwrap();
        let root = project_root(&dir);
        let tools = TempDir::new().unwrap();
        let log = tools.path().join("git.log");
        let git = install_fake_git(tools.path(), &log, false);
        let config = config_with_git(&root, git.to_str().unwrap());

        let report = Importer::new(&config).run(RunOptions::default()).unwrap();

        assert_eq!(
            report.upstream,
            SyncOutcome::Cloned {
                path: config.clone_path.clone()
            }
        );
        assert!(config.clone_path.is_dir());
        let calls = read_log(&log);
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0],
            format!(
                "{}|clone {} libpropeller",
                config.downloads_dir.display(),
                UPSTREAM_URL
            )
        );
        assert!(config.destination.join("serial/serial.S").is_file());
        assert!(config.destination.join("numbers/numbers.cpp").is_file());
    }

    #[test]
    #[serial]
    fn test_pulls_when_clone_exists() {
        let dir = TempDir::new().unwrap();
        let root = project_root(&dir);
        let tools = TempDir::new().unwrap();
        let log = tools.path().join("git.log");
        let git = install_fake_git(tools.path(), &log, false);
        let config = config_with_git(&root, git.to_str().unwrap());
        seed_clone(&config);

        let report = Importer::new(&config).run(RunOptions::default()).unwrap();

        assert!(matches!(report.upstream, SyncOutcome::Updated { .. }));
        let calls = read_log(&log);
        assert_eq!(calls, vec![format!("{}|pull", config.clone_path.display())]);
    }

    #[test]
    #[serial]
    fn test_failed_pull_reported_and_copy_continues() {
        let dir = TempDir::new().unwrap();
        let root = project_root(&dir);
        let tools = TempDir::new().unwrap();
        let log = tools.path().join("git.log");
        let git = install_fake_git(tools.path(), &log, true);
        let config = config_with_git(&root, git.to_str().unwrap());
        seed_clone(&config);

        let report = Importer::new(&config).run(RunOptions::default()).unwrap();

        match &report.upstream {
            SyncOutcome::Failed {
                action,
                exit_code,
                output,
            } => {
                assert_eq!(*action, GitAction::Pull);
                assert_eq!(*exit_code, Some(128));
                assert!(output.contains("unable to access remote"));
            }
            other => panic!("expected failure, got {:?}", other),
        }
        let diagnostics = report.upstream.diagnostics().join("\n");
        assert!(diagnostics.contains("can't clone or update"));
        assert!(diagnostics.contains("unable to access remote"));
        assert!(config.destination.join("pwm32/pwm32.S").is_file());
    }

    #[test]
    #[serial]
    fn test_failed_clone_leaves_run_fatal_only_at_copy() {
        let dir = TempDir::new().unwrap();
        let root = project_root(&dir);
        let tools = TempDir::new().unwrap();
        let log = tools.path().join("git.log");
        let git = install_fake_git(tools.path(), &log, true);
        let config = config_with_git(&root, git.to_str().unwrap());

        let outcome = Importer::new(&config).fetch().unwrap();
        assert!(matches!(
            outcome,
            SyncOutcome::Failed {
                action: GitAction::Clone,
                ..
            }
        ));

        let err = Importer::new(&config).run(RunOptions::default()).unwrap_err();
        assert!(matches!(err, ImportError::UpstreamUnavailable { .. }));
        let message = err.to_string();
        assert!(message.contains("returned non-zero exit status 128"));
        assert!(message.contains("unable to access remote"));
        assert_eq!(read_log(&log).len(), 2);
    }
}
