//! Runs that move the working directory. Kept in their own binary since the working directory
//! is process-wide.
mod utils;
#[allow(unused)]
use utils::*;

use loads::core::EXIT_SUCCESS;
use loads::prelude::*;
use loads::RunOptions;
use loads::TestResult;
use std::fs;
use std::path::PathBuf;
use std::sync::{Mutex, OnceLock};
use std::time::Duration;

static OBSERVED: Mutex<Vec<PathBuf>> = Mutex::new(Vec::new());

/// Tests of this file compare the working directory outside of runs.
async fn serial() -> tokio::sync::MutexGuard<'static, ()> {
    static LOCK: OnceLock<tokio::sync::Mutex<()>> = OnceLock::new();
    LOCK.get_or_init(|| tokio::sync::Mutex::new(())).lock().await
}

#[scenario]
async fn scenario_reads_include(ctx: TestContext) -> Result<(), TestError> {
    let payload = fs::read_to_string("payload.txt")?;
    check(payload == "hello", "unexpected payload")?;
    let nested = fs::read_to_string("fixtures/nested/deep.json")?;
    check(nested.contains("deep"), "nested file missing")?;
    ctx.incr_counter("read");
    Ok(())
}

#[scenario]
async fn scenario_sees_cwd(_ctx: TestContext) -> Result<(), TestError> {
    let cwd = std::env::current_dir()?;
    let name = cwd
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or_default();
    check(
        name == format!("run-{}", std::process::id()),
        "not in the run directory",
    )
}

#[scenario]
async fn scenario_observes_cwd(_ctx: TestContext) -> Result<(), TestError> {
    OBSERVED.lock().unwrap().push(std::env::current_dir()?);
    tokio::time::sleep(Duration::from_millis(20)).await;
    OBSERVED.lock().unwrap().push(std::env::current_dir()?);
    Ok(())
}

fn fqn(name: &str) -> String {
    format!("{}::{name}", module_path!())
}

#[tokio::test]
#[ntest::timeout(10_000)]
async fn include_files_are_staged_in_the_run_directory() {
    init();
    let _serial = serial().await;

    let source = tempfile::tempdir().unwrap();
    fs::write(source.path().join("payload.txt"), "hello").unwrap();
    fs::write(source.path().join("ignored.bin"), [0u8, 1, 2]).unwrap();
    fs::create_dir_all(source.path().join("fixtures/nested")).unwrap();
    fs::write(
        source.path().join("fixtures/nested/deep.json"),
        r#"{"deep": true}"#,
    )
    .unwrap();

    let target = tempfile::tempdir().unwrap();
    let before = std::env::current_dir().unwrap();

    let options = RunOptions {
        fqn: Some(fqn("scenario_reads_include")),
        users: Some("2".into()),
        hits: Some("2".into()),
        test_dir: Some(target.path().join("run")),
        include_file: vec![
            source.path().join("*.txt").display().to_string(),
            source.path().join("fixtures").display().to_string(),
        ],
        ..Default::default()
    };
    let outcome = run(options).await;

    assert_eq!(outcome.exit.unwrap(), EXIT_SUCCESS);
    assert_eq!(outcome.results.nb_success(), 4);
    assert_eq!(std::env::current_dir().unwrap(), before);

    let staged: PathBuf = target
        .path()
        .join(format!("run-{}", std::process::id()));
    assert!(staged.join("payload.txt").is_file());
    assert!(staged.join("fixtures/nested/deep.json").is_file());
    assert!(!staged.join("ignored.bin").exists());

    let outcome = run(RunOptions {
        fqn: Some(fqn("scenario_sees_cwd")),
        test_dir: Some(target.path().join("run")),
        ..Default::default()
    })
    .await;
    assert_eq!(outcome.exit.unwrap(), EXIT_SUCCESS);
    assert_eq!(std::env::current_dir().unwrap(), before);

    // A missing include directory aborts the run before it starts.
    let options = RunOptions {
        fqn: Some(fqn("scenario_reads_include")),
        test_dir: Some(target.path().join("run")),
        include_file: vec![target
            .path()
            .join("does-not-exist/*.txt")
            .display()
            .to_string()],
        ..Default::default()
    };
    let outcome = run(options).await;

    assert!(matches!(outcome.exit, Err(loads::LoadsError::Staging(_))));
    assert_eq!(outcome.results.nb_errors(), 1);
    assert_eq!(std::env::current_dir().unwrap(), before);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
#[ntest::timeout(10_000)]
async fn moving_runs_wait_for_active_runs() {
    init();
    let _serial = serial().await;

    let target = tempfile::tempdir().unwrap();
    let before = std::env::current_dir().unwrap();

    let staying = tokio::spawn(run(RunOptions {
        fqn: Some(fqn("scenario_observes_cwd")),
        users: Some("3".into()),
        hits: Some("5".into()),
        ..Default::default()
    }));
    tokio::time::sleep(Duration::from_millis(10)).await;
    let moving = tokio::spawn(run(RunOptions {
        fqn: Some(fqn("scenario_sees_cwd")),
        users: Some("2".into()),
        hits: Some("3".into()),
        test_dir: Some(target.path().join("run")),
        ..Default::default()
    }));

    let staying = staying.await.unwrap();
    let moving = moving.await.unwrap();

    assert_eq!(staying.exit.unwrap(), EXIT_SUCCESS);
    assert_eq!(moving.exit.unwrap(), EXIT_SUCCESS);
    assert_eq!(moving.results.nb_success(), 6);

    let observed = OBSERVED.lock().unwrap();
    assert_eq!(observed.len(), 2 * 15);
    let foreign = observed.iter().filter(|cwd| **cwd != before).count();
    assert_eq!(foreign, 0, "hits observing a foreign working directory");
    assert_eq!(std::env::current_dir().unwrap(), before);
}
