//! End-to-end tests for the ingestion pipeline.
//!
//! Runner-level tests use an in-process fake. On unix a generated shell
//! script stands in for the parser executable so the real process path,
//! argument order and environment can be checked without the parser itself.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use journal_core::{FailurePolicy, IngestConfig, InvocationMode, ParserConfig};
use journal_ingest::{ingest, FileStatus, IngestError, InvokeError, ParserInvocation, ParserRunner};

const GOOD: &str = r#"<?xml version="1.0"?>
<NXroot>
  <NXentry name="ENGINX00000101"><run_number>101</run_number></NXentry>
</NXroot>
"#;

/// Records whether the notification config was visible at each call.
struct CheckingRunner {
    config_file: PathBuf,
    fail: bool,
    config_seen: Mutex<Vec<bool>>,
}

#[async_trait]
impl ParserRunner for CheckingRunner {
    async fn run(&self, _invocation: &ParserInvocation) -> Result<(), InvokeError> {
        self.config_seen
            .lock()
            .unwrap()
            .push(self.config_file.exists());
        if self.fail {
            Err(InvokeError::NonZeroExit { code: Some(1) })
        } else {
            Ok(())
        }
    }
}

struct Layout {
    _root: tempfile::TempDir,
    data: PathBuf,
    bin: PathBuf,
}

fn layout() -> Layout {
    let root = tempfile::tempdir().unwrap();
    let data = root.path().join("data");
    let bin = root.path().join("bin");
    std::fs::create_dir_all(&data).unwrap();
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::write(bin.join("JournalParser.conf"), "token\nurl\n").unwrap();
    Layout {
        _root: root,
        data,
        bin,
    }
}

fn config(layout: &Layout, parser: ParserConfig) -> IngestConfig {
    IngestConfig::new(
        Some("ENGINX".into()),
        Some("NDXENGINX".into()),
        layout.data.clone(),
        parser,
    )
    .unwrap()
}

fn config_file(layout: &Layout) -> PathBuf {
    layout.bin.join("JournalParser.conf")
}

#[tokio::test]
async fn test_config_hidden_during_batch_and_restored_after() {
    let layout = layout();
    std::fs::write(layout.data.join("journal_21_1.xml"), GOOD).unwrap();
    std::fs::write(layout.data.join("journal_21_2.xml"), GOOD).unwrap();
    let runner = CheckingRunner {
        config_file: config_file(&layout),
        fail: false,
        config_seen: Mutex::new(Vec::new()),
    };

    let report = ingest(&config(&layout, ParserConfig::in_dir(&layout.bin)), &runner)
        .await
        .unwrap();

    assert_eq!(report.succeeded(), 2);
    assert_eq!(*runner.config_seen.lock().unwrap(), vec![false, false]);
    assert!(config_file(&layout).exists());
    assert!(!layout.bin.join("JournalParser.conf.temp").exists());
}

#[tokio::test]
async fn test_strict_abort_still_restores_config() {
    let layout = layout();
    std::fs::write(layout.data.join("journal_21_1.xml"), GOOD).unwrap();
    std::fs::write(layout.data.join("journal_21_2.xml"), GOOD).unwrap();
    let runner = CheckingRunner {
        config_file: config_file(&layout),
        fail: true,
        config_seen: Mutex::new(Vec::new()),
    };
    let cfg = config(&layout, ParserConfig::in_dir(&layout.bin)).with_policy(FailurePolicy::Strict);

    let err = ingest(&cfg, &runner).await.unwrap_err();

    assert!(matches!(err, IngestError::Aborted { .. }));
    assert_eq!(runner.config_seen.lock().unwrap().len(), 1);
    assert!(config_file(&layout).exists());
}

#[tokio::test]
async fn test_best_effort_reports_every_file() {
    let layout = layout();
    std::fs::write(layout.data.join("journal_21_1.xml"), "<NXroot>").unwrap();
    std::fs::write(layout.data.join("journal_21_2.xml"), GOOD).unwrap();
    let runner = CheckingRunner {
        config_file: config_file(&layout),
        fail: false,
        config_seen: Mutex::new(Vec::new()),
    };
    let cfg = config(&layout, ParserConfig::in_dir(&layout.bin)).with_files(Some(vec![
        "journal_21_1.xml".into(),
        "journal_21_2.xml".into(),
        "notes.xml".into(),
    ]));

    let report = ingest(&cfg, &runner).await.unwrap();

    let statuses: Vec<&FileStatus> = report.outcomes.iter().map(|o| &o.status).collect();
    assert!(matches!(statuses[0], FileStatus::Malformed { .. }));
    assert_eq!(*statuses[1], FileStatus::Ingested { invocations: 1 });
    assert!(matches!(statuses[2], FileStatus::InvalidName { .. }));
    assert_eq!(runner.config_seen.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_empty_directory_leaves_config_alone() {
    let layout = layout();
    let runner = CheckingRunner {
        config_file: config_file(&layout),
        fail: false,
        config_seen: Mutex::new(Vec::new()),
    };

    let report = ingest(&config(&layout, ParserConfig::in_dir(&layout.bin)), &runner)
        .await
        .unwrap();

    assert!(report.outcomes.is_empty());
    assert!(config_file(&layout).exists());
}

#[tokio::test]
async fn test_missing_data_dir_is_fatal() {
    let layout = layout();
    let runner = CheckingRunner {
        config_file: config_file(&layout),
        fail: false,
        config_seen: Mutex::new(Vec::new()),
    };
    let mut cfg = config(&layout, ParserConfig::in_dir(&layout.bin));
    cfg.data_dir = layout.data.join("missing");

    let err = ingest(&cfg, &runner).await.unwrap_err();
    assert!(matches!(err, IngestError::DataDir { .. }));
}

/// Fails every call after putting a directory where the config belongs,
/// so the config cannot be moved back.
struct BlockingRunner {
    config_file: PathBuf,
}

#[async_trait]
impl ParserRunner for BlockingRunner {
    async fn run(&self, _invocation: &ParserInvocation) -> Result<(), InvokeError> {
        std::fs::create_dir_all(&self.config_file).unwrap();
        std::fs::write(self.config_file.join("keep"), "").unwrap();
        Err(InvokeError::NonZeroExit { code: Some(1) })
    }
}

#[tokio::test]
async fn test_batch_error_wins_over_failed_restore() {
    let layout = layout();
    std::fs::write(layout.data.join("journal_21_1.xml"), GOOD).unwrap();
    let runner = BlockingRunner {
        config_file: config_file(&layout),
    };
    let cfg = config(&layout, ParserConfig::in_dir(&layout.bin)).with_policy(FailurePolicy::Strict);

    let err = ingest(&cfg, &runner).await.unwrap_err();

    assert!(matches!(err, IngestError::Aborted { .. }));
    assert!(layout.bin.join("JournalParser.conf.temp").exists());
}

#[cfg(unix)]
mod process {
    use super::*;
    use std::os::unix::fs::PermissionsExt;
    use std::path::Path;

    use journal_ingest::ProcessRunner;

    // Writing an executable while another test forks can fail the exec with
    // ETXTBSY, so script creation and spawning are serialised.
    static SPAWN_LOCK: tokio::sync::Mutex<()> = tokio::sync::Mutex::const_new(());

    /// Stand-in parser: logs its view of the world and validates arguments
    /// the way the real parser does before touching the database.
    const FAKE_PARSER: &str = r#"#!/bin/sh
here="$(dirname "$0")"
if [ -e "$here/JournalParser.conf" ]; then conf=present; else conf=absent; fi
echo "$# $1 $2 $3 $5 conf=$conf nomessage=${JOURNALPARSER_NOMESSAGE:-unset}" >> "$here/calls.log"
[ "$#" -eq 5 ] || exit 255
case "$3" in
  cycle_*_*) ;;
  *) exit 255 ;;
esac
[ -f "$4/journal_${3#cycle_}.xml" ] || exit 255
exit 0
"#;

    fn install_fake_parser(bin: &Path) -> PathBuf {
        let path = bin.join("JournalParser");
        std::fs::write(&path, FAKE_PARSER).unwrap();
        let mut perms = std::fs::metadata(&path).unwrap().permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&path, perms).unwrap();
        path
    }

    fn calls(bin: &Path) -> Vec<String> {
        std::fs::read_to_string(bin.join("calls.log"))
            .unwrap_or_default()
            .lines()
            .map(String::from)
            .collect()
    }

    #[tokio::test]
    async fn test_process_runner_cycle_mode() {
        let _lock = SPAWN_LOCK.lock().await;
        let layout = layout();
        std::fs::write(layout.data.join("journal_21_1.xml"), GOOD).unwrap();
        let exe = install_fake_parser(&layout.bin);
        let parser = ParserConfig {
            executable: exe,
            ..ParserConfig::in_dir(&layout.bin)
        };
        let runner = ProcessRunner::from_config(&parser);

        let report = ingest(&config(&layout, parser), &runner).await.unwrap();

        assert!(report.is_clean());
        assert_eq!(
            calls(&layout.bin),
            vec!["5 ENGINX * cycle_21_1 NDXENGINX conf=absent nomessage=1"]
        );
        assert!(config_file(&layout).exists());
    }

    #[tokio::test]
    async fn test_process_runner_per_run_mode() {
        let _lock = SPAWN_LOCK.lock().await;
        let layout = layout();
        std::fs::write(
            layout.data.join("journal_21_1.xml"),
            r#"<NXroot><NXentry name="ENGINX00000101"/><NXentry name="ENGINX00000102"/></NXroot>"#,
        )
        .unwrap();
        let exe = install_fake_parser(&layout.bin);
        let parser = ParserConfig {
            executable: exe,
            ..ParserConfig::in_dir(&layout.bin)
        };
        let runner = ProcessRunner::from_config(&parser);
        let cfg = config(&layout, parser).with_mode(InvocationMode::PerRun);

        let report = ingest(&cfg, &runner).await.unwrap();

        assert_eq!(report.outcomes[0].status, FileStatus::Ingested { invocations: 2 });
        assert_eq!(
            calls(&layout.bin),
            vec![
                "5 ENGINX 00000101 cycle_21_1 NDXENGINX conf=absent nomessage=1",
                "5 ENGINX 00000102 cycle_21_1 NDXENGINX conf=absent nomessage=1",
            ]
        );
    }

    #[tokio::test]
    async fn test_junk_arguments_fail() {
        let _lock = SPAWN_LOCK.lock().await;
        let layout = layout();
        let runner = ProcessRunner::new(install_fake_parser(&layout.bin));

        let args = ["junk", "arguments", "should", "raise", "error"].map(String::from);
        let err = runner.run_raw(&args).await.unwrap_err();

        assert!(matches!(err, InvokeError::NonZeroExit { code: Some(255) }));
    }

    #[tokio::test]
    async fn test_missing_journal_fails_but_batch_continues() {
        let _lock = SPAWN_LOCK.lock().await;
        let layout = layout();
        std::fs::write(layout.data.join("journal_21_2.xml"), GOOD).unwrap();
        let exe = install_fake_parser(&layout.bin);
        let parser = ParserConfig {
            executable: exe,
            ..ParserConfig::in_dir(&layout.bin)
        };
        let runner = ProcessRunner::from_config(&parser);
        // A listed journal that does not exist never reaches the parser.
        let cfg = config(&layout, parser).with_files(Some(vec![
            "journal_21_9.xml".into(),
            "journal_21_2.xml".into(),
        ]));

        let report = ingest(&cfg, &runner).await.unwrap();

        assert!(matches!(report.outcomes[0].status, FileStatus::Malformed { .. }));
        assert!(report.outcomes[1].status.is_success());
        assert!(config_file(&layout).exists());
    }

    #[tokio::test]
    async fn test_entry_outside_data_dir_is_loaded_from_its_own_dir() {
        let _lock = SPAWN_LOCK.lock().await;
        let layout = layout();
        let archive = tempfile::tempdir().unwrap();
        let journal = archive.path().join("journal_19_3.xml");
        std::fs::write(&journal, GOOD).unwrap();
        let exe = install_fake_parser(&layout.bin);
        let parser = ParserConfig {
            executable: exe,
            ..ParserConfig::in_dir(&layout.bin)
        };
        let runner = ProcessRunner::from_config(&parser);
        let cfg =
            config(&layout, parser).with_files(Some(vec![journal.display().to_string()]));

        let report = ingest(&cfg, &runner).await.unwrap();

        assert!(report.is_clean(), "{report}");
        assert_eq!(calls(&layout.bin).len(), 1);
    }
}
