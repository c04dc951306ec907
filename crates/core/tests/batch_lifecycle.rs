//! Batch lifecycle integration tests.
//!
//! These tests run the batch driver against the fake encoder script:
//! - Progress reporting and submission order
//! - Parallelism ceiling
//! - Recovery decisions (retry, skip, abort, fail)
//! - Interrupt handling and temporary file cleanup
#![cfg(unix)]

use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

use reflac_core::{
    discover, exit_code, BatchDriver, BatchOutcome, BatchProgress, Decision, DiscoveryConfig,
    FixedPolicy, JobPool, PoolConfig, RecoveryPolicy,
    testing::{FakeLibrary, ScriptedPolicy},
};

/// Test helper holding a scratch library and the progress lines it printed.
struct TestHarness {
    library: FakeLibrary,
    progress: Arc<Mutex<Vec<String>>>,
    _temp_dir: TempDir,
}

impl TestHarness {
    fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        Self {
            library: FakeLibrary::new(temp_dir.path()),
            progress: Arc::default(),
            _temp_dir: temp_dir,
        }
    }

    fn add_files(&self, names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|name| self.library.add(name)).collect()
    }

    fn driver(&self, jobs: usize, policy: impl RecoveryPolicy + 'static) -> BatchDriver {
        let pool = JobPool::new(self.library.encoder_config(), Box::new(policy));
        let config = PoolConfig::default().with_jobs(jobs).with_poll_interval(10);
        let sink = Arc::clone(&self.progress);
        BatchDriver::new(pool, &config)
            .with_root(self.library.root())
            .with_progress(Arc::new(move |p: &BatchProgress| {
                sink.lock().unwrap().push(p.to_string());
            }))
    }

    fn progress_lines(&self) -> Vec<String> {
        self.progress.lock().unwrap().clone()
    }

    fn sorted_invocations(&self) -> Vec<PathBuf> {
        let mut seen = self.library.invocations();
        seen.sort();
        seen
    }
}

#[tokio::test]
async fn test_five_files_two_jobs_reports_progress() {
    let harness = TestHarness::new();
    let files = harness.add_files(&["01.flac", "02.flac", "03.flac", "04.flac", "05.flac"]);

    let mut driver = harness.driver(2, ScriptedPolicy::default());
    let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

    assert!(matches!(outcome, BatchOutcome::Completed(_)));
    assert_eq!(outcome.exit_code(), exit_code::SUCCESS);
    assert_eq!(
        harness.progress_lines(),
        vec![
            "1/5 (20%): Re-encoding '01.flac'",
            "2/5 (40%): Re-encoding '02.flac'",
            "3/5 (60%): Re-encoding '03.flac'",
            "4/5 (80%): Re-encoding '04.flac'",
            "5/5 (100%): Re-encoding '05.flac'",
        ]
    );

    let summary = outcome.summary();
    assert_eq!(summary.submitted, 5);
    assert_eq!(summary.stats.started, 5);
    assert_eq!(summary.stats.succeeded, 5);
    assert!(summary.peak_jobs <= 2);
    assert!(driver.pool().is_empty());
    assert!(harness.library.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn test_ceiling_is_never_exceeded() {
    for ceiling in 1..=3 {
        let harness = TestHarness::new();
        let names: Vec<String> = (1..=7).map(|i| format!("{:02}.flac", i)).collect();
        let names: Vec<&str> = names.iter().map(String::as_str).collect();
        let files = harness.add_files(&names);

        let mut driver = harness.driver(ceiling, ScriptedPolicy::default());
        let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

        let summary = outcome.summary();
        assert_eq!(outcome.exit_code(), exit_code::SUCCESS);
        assert!(
            summary.peak_jobs <= ceiling,
            "peak {} above ceiling {}",
            summary.peak_jobs,
            ceiling
        );
        assert_eq!(summary.stats.succeeded, 7);
        assert_eq!(harness.library.invocations().len(), 7);
        assert!(driver.pool().is_empty());
    }
}

#[tokio::test]
async fn test_sequential_skip_continues_with_next_file() {
    let harness = TestHarness::new();
    let files = harness.add_files(&["01.flac", "02-fail.flac", "03.flac"]);

    let mut driver = harness.driver(1, FixedPolicy(Decision::Skip));
    let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

    let summary = outcome.summary();
    assert_eq!(outcome.exit_code(), exit_code::SUCCESS);
    assert_eq!(summary.stats.succeeded, 2);
    assert_eq!(summary.stats.failed, 1);
    assert_eq!(summary.skipped, vec![files[1].clone()]);
    assert_eq!(harness.library.invocations(), files);
    assert!(harness.library.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn test_retry_counts_success_once() {
    let harness = TestHarness::new();
    let files = harness.add_files(&["01.flac", "02.flac", "03.flac"]);
    harness.library.fail_once(&files[1]);

    let policy = ScriptedPolicy::new([Decision::Retry]);
    let mut driver = harness.driver(2, policy.clone());
    let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

    let summary = outcome.summary();
    assert_eq!(outcome.exit_code(), exit_code::SUCCESS);
    assert_eq!(summary.stats.started, 4);
    assert_eq!(summary.stats.succeeded, 3);
    assert_eq!(summary.stats.retried, 1);
    assert!(summary.skipped.is_empty());

    let failures = policy.failures();
    assert_eq!(failures.len(), 1);
    assert_eq!(failures[0].input, files[1]);
    assert_eq!(failures[0].attempt, 1);
    assert_eq!(harness.sorted_invocations().len(), 4);
}

#[tokio::test]
async fn test_abort_drains_running_jobs() {
    let harness = TestHarness::new();
    let files = harness.add_files(&["01-fail.flac", "02-slow.flac", "03.flac", "04.flac"]);

    let mut driver = harness.driver(2, ScriptedPolicy::new([Decision::Abort]));
    let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

    assert!(matches!(outcome, BatchOutcome::Aborted(_)));
    assert_eq!(outcome.exit_code(), exit_code::ABORTED);

    let summary = outcome.summary();
    assert_eq!(summary.submitted, 2);
    assert_eq!(summary.stats.drained, 1);
    assert_eq!(summary.stats.succeeded, 1);
    assert_eq!(
        harness.sorted_invocations(),
        vec![files[0].clone(), files[1].clone()]
    );
    assert!(driver.pool().is_empty());
    assert!(harness.library.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn test_fail_policy_stops_with_command_failed() {
    let harness = TestHarness::new();
    let files = harness.add_files(&["01.flac", "02-fail.flac", "03.flac"]);

    let mut driver = harness.driver(1, FixedPolicy(Decision::Fail));
    let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.exit_code(), exit_code::COMMAND_FAILED);
    match &outcome {
        BatchOutcome::Failed { path, summary } => {
            assert_eq!(path.as_ref(), Some(&files[1]));
            assert_eq!(summary.submitted, 2);
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert_eq!(harness.library.invocations().len(), 2);
}

#[tokio::test]
async fn test_last_file_failure_is_not_lost_with_fail_policy() {
    let harness = TestHarness::new();
    let files = harness.add_files(&["01.flac", "02-fail.flac"]);

    let mut driver = harness.driver(4, FixedPolicy(Decision::Fail));
    let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.exit_code(), exit_code::COMMAND_FAILED);
    match &outcome {
        BatchOutcome::Failed { path, summary } => {
            assert_eq!(path.as_ref(), Some(&files[1]));
            assert_eq!(summary.stats.failed, 1);
        }
        other => panic!("Expected Failed, got {:?}", other),
    }
    assert!(harness.library.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn test_last_file_failure_is_skipped_with_skip_policy() {
    let harness = TestHarness::new();
    let files = harness.add_files(&["01.flac", "02-fail.flac"]);

    let mut driver = harness.driver(4, FixedPolicy(Decision::Skip));
    let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

    let summary = outcome.summary();
    assert!(matches!(outcome, BatchOutcome::Completed(_)));
    assert_eq!(summary.stats.succeeded, 1);
    assert_eq!(summary.stats.failed, 1);
    assert_eq!(summary.stats.drained, 0);
    assert_eq!(summary.skipped, vec![files[1].clone()]);
}

#[tokio::test]
async fn test_interrupt_during_abort_keeps_abort_outcome() {
    let harness = TestHarness::new();
    let files = harness.add_files(&["01-fail.flac", "02-slow.flac"]);

    // The failure is reaped after ~50 ms; the abort then drains the slow job
    // until ~400 ms, and the interrupt lands in between.
    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let mut driver = harness.driver(2, ScriptedPolicy::new([Decision::Abort]));
    let outcome = driver.run(&files, &cancel).await.unwrap();

    assert!(matches!(outcome, BatchOutcome::Aborted(_)));
    assert_eq!(outcome.exit_code(), exit_code::ABORTED);
    assert!(driver.pool().is_empty());
    assert!(harness.library.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn test_closed_prompt_stops_with_command_failed() {
    let harness = TestHarness::new();
    let files = harness.add_files(&["01-fail.flac", "02.flac"]);

    let mut driver = harness.driver(1, ScriptedPolicy::default());
    let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

    assert!(matches!(outcome, BatchOutcome::Failed { path: None, .. }));
    assert_eq!(outcome.exit_code(), exit_code::COMMAND_FAILED);
    assert!(harness.library.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn test_interrupt_waits_for_running_jobs() {
    let harness = TestHarness::new();
    let files = harness.add_files(&[
        "01.flac",
        "02-slow.flac",
        "03-slow.flac",
        "04-slow.flac",
        "05-slow.flac",
        "06-slow.flac",
    ]);

    let cancel = CancellationToken::new();
    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(200)).await;
        trigger.cancel();
    });

    let mut driver = harness.driver(4, ScriptedPolicy::default());
    let outcome = driver.run(&files, &cancel).await.unwrap();

    assert!(matches!(outcome, BatchOutcome::Interrupted(_)));
    assert_eq!(outcome.exit_code(), exit_code::INTERRUPTED);

    let summary = outcome.summary();
    assert_eq!(summary.submitted, 5);
    assert_eq!(summary.stats.succeeded, 5);
    assert_eq!(summary.stats.drained, 4);
    assert_eq!(harness.sorted_invocations(), files[..5].to_vec());
    assert!(driver.pool().is_empty());
    assert!(harness.library.leftover_temp_files().is_empty());
}

#[tokio::test]
async fn test_discovered_files_run_in_order() {
    let harness = TestHarness::new();
    harness.add_files(&[
        "Artist B/Album/01.flac",
        "Artist A/Album/02.flac",
        "Artist A/Album/01.flac",
        "Artist A/Album/cover.jpg",
    ]);

    let config = DiscoveryConfig::with_folder(harness.library.root());
    let files = discover(&config).await.unwrap();
    assert_eq!(files.len(), 3);

    let mut driver = harness.driver(2, ScriptedPolicy::default());
    let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.exit_code(), exit_code::SUCCESS);
    assert_eq!(
        harness.progress_lines(),
        vec![
            "1/3 (33%): Re-encoding 'Artist A/Album/01.flac'",
            "2/3 (66%): Re-encoding 'Artist A/Album/02.flac'",
            "3/3 (100%): Re-encoding 'Artist B/Album/01.flac'",
        ]
    );
}

#[tokio::test]
async fn test_summary_serializes() {
    let harness = TestHarness::new();
    let files = harness.add_files(&["01-fail.flac"]);

    let mut driver = harness.driver(1, FixedPolicy(Decision::Skip));
    let outcome = driver.run(&files, &CancellationToken::new()).await.unwrap();

    let json = serde_json::to_value(outcome.summary()).unwrap();
    assert_eq!(json["total"], 1);
    assert_eq!(json["stats"]["failed"], 1);
    assert_eq!(json["skipped"].as_array().unwrap().len(), 1);
}
