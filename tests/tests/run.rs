mod utils;
#[allow(unused)]
use utils::*;

use loads::prelude::*;
use loads::core::{EXIT_FAILURE, EXIT_SUCCESS};
use loads::RunOptions;
use loads::TestResult;
use serde_json::{json, Value};
use std::time::Duration;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

fn fqn(name: &str) -> String {
    format!("{}::{name}", module_path!())
}

fn options(name: &str, users: &str, hits: &str) -> RunOptions {
    RunOptions {
        fqn: Some(fqn(name)),
        users: Some(users.into()),
        hits: Some(hits.into()),
        ..Default::default()
    }
}

/* Scenarios */

#[scenario]
async fn scenario_ok(_ctx: TestContext) -> Result<(), TestError> {
    Ok(())
}

#[scenario]
async fn scenario_odd_hits_fail(ctx: TestContext) -> Result<(), TestError> {
    check(ctx.status().current_hit % 2 == 0, "odd hit")
}

#[scenario]
async fn scenario_counting(ctx: TestContext) -> Result<(), TestError> {
    ctx.incr_counter("requests");
    ctx.incr_counter("requests");
    Ok(())
}

#[scenario]
async fn scenario_io_error(_ctx: TestContext) -> Result<(), TestError> {
    let _ = std::fs::read("/this/path/does/not/exist")?;
    Ok(())
}

#[scenario]
async fn scenario_panics(ctx: TestContext) -> Result<(), TestError> {
    if ctx.status().current_user == 2 {
        panic!("user 2 blew up");
    }
    Ok(())
}

#[scenario]
async fn scenario_sleepy(_ctx: TestContext) -> Result<(), TestError> {
    tokio::time::sleep(Duration::from_millis(10)).await;
    Ok(())
}

/* Tests */

#[tokio::test]
async fn stream_is_ndjson() {
    init();

    let mut options = options("scenario_ok", "1:2", "2");
    options.run_id = Some("3456789".into());
    options.loads_status.insert("project".into(), json!("demo"));
    let outcome = run(options).await;

    assert_eq!(outcome.exit.unwrap(), EXIT_SUCCESS);
    let records = outcome.records;
    assert_eq!(records.len(), 2 + (1 + 2) * 2 * 3);

    for record in &records {
        assert_eq!(record["run_id"], "3456789");
        assert_eq!(record["project"], "demo");
        let timestamp = record["timestamp"].as_str().unwrap();
        assert!(OffsetDateTime::parse(timestamp, &Rfc3339).is_ok());
    }

    let actions = actions(&records);
    assert_eq!(actions.first(), Some(&"startTestRun"));
    assert_eq!(actions.last(), Some(&"stopTestRun"));

    let stops: Vec<&Value> = records
        .iter()
        .filter(|record| record["action"] == "stopTest")
        .collect();
    assert_eq!(stops.len(), 6);
    assert!(stops.iter().all(|record| record["elapsed"].is_f64()));

    let last_phase: Vec<_> = records
        .iter()
        .filter(|record| record["nb_users"] == 2 && record["action"] == "startTest")
        .map(|record| {
            (
                record["current_user"].as_u64().unwrap(),
                record["current_hit"].as_u64().unwrap(),
            )
        })
        .collect();
    assert_eq!(last_phase.len(), 4);
    for user in 1..=2 {
        let hits: Vec<_> = last_phase
            .iter()
            .filter(|(current_user, _)| *current_user == user)
            .map(|(_, hit)| *hit)
            .collect();
        assert_eq!(hits, vec![1, 2]);
    }
}

#[tokio::test]
async fn failures_set_the_exit_code() {
    init();

    let outcome = run(options("scenario_odd_hits_fail", "2", "4")).await;

    assert_eq!(outcome.exit.unwrap(), EXIT_FAILURE);
    assert_eq!(outcome.results.nb_failures(), 4);
    assert_eq!(outcome.results.nb_success(), 4);

    let failures: Vec<_> = outcome
        .records
        .iter()
        .filter(|record| record["action"] == "addFailure")
        .collect();
    assert!(failures.iter().all(|record| record["exception"] == "odd hit"));
}

#[tokio::test]
async fn counters_do_not_change_the_outcome() {
    init();

    let outcome = run(options("scenario_counting", "3", "1")).await;

    assert_eq!(outcome.exit.unwrap(), EXIT_SUCCESS);
    let counters: Vec<_> = outcome
        .records
        .iter()
        .filter(|record| record["action"] == "incr_counter")
        .collect();
    assert_eq!(counters.len(), 6);
    assert!(counters.iter().all(|record| record["counter"] == "requests"));
}

#[tokio::test]
async fn errors_are_recorded_per_hit() {
    init();

    let outcome = run(options("scenario_io_error", "1", "3")).await;

    assert_eq!(outcome.exit.unwrap(), EXIT_FAILURE);
    assert_eq!(outcome.results.nb_errors(), 3);
    assert_eq!(outcome.results.nb_failures(), 0);
}

#[tokio::test]
async fn panics_are_recorded_as_errors() {
    init();

    let outcome = run(options("scenario_panics", "3", "2")).await;

    assert_eq!(outcome.exit.unwrap(), EXIT_FAILURE);
    assert_eq!(outcome.results.nb_errors(), 2);
    assert_eq!(outcome.results.nb_success(), 4);
    let errors: Vec<_> = outcome
        .records
        .iter()
        .filter(|record| record["action"] == "addError")
        .collect();
    assert!(errors
        .iter()
        .all(|record| record["current_user"] == 2 && record["exception"] == "user 2 blew up"));
}

#[tokio::test]
async fn unknown_scenario_aborts() {
    init();

    let outcome = run(options("no_such_scenario", "1", "1")).await;

    assert!(matches!(outcome.exit, Err(loads::LoadsError::Resolution(_))));
    assert_eq!(actions(&outcome.records), vec!["addError"]);
}

#[tokio::test]
async fn invalid_counts_abort_before_running() {
    init();

    let outcome = run(options("scenario_ok", "1:x", "1")).await;

    assert!(matches!(
        outcome.exit,
        Err(loads::LoadsError::Configuration(_))
    ));
    assert!(outcome.records.is_empty());
}

#[tokio::test]
async fn status_fields_do_not_collide_with_event_fields() {
    init();

    let mut colliding = options("scenario_ok", "2", "1");
    colliding.loads_status.insert("current_user".into(), json!(7));
    let outcome = run(colliding).await;

    assert!(matches!(
        outcome.exit,
        Err(loads::LoadsError::Configuration(_))
    ));
    assert!(outcome.lines.is_empty());

    let mut tagged = options("scenario_ok", "2", "1");
    tagged.loads_status.insert("agent".into(), json!(7));
    let outcome = run(tagged).await;

    assert_eq!(outcome.exit.unwrap(), EXIT_SUCCESS);
    for line in &outcome.lines {
        assert_eq!(line.matches("\"current_user\"").count(), 1, "{line}");
        assert_eq!(line.matches("\"action\"").count(), 1, "{line}");
    }
    assert!(outcome.records.iter().all(|record| record["agent"] == 7));
}

#[tokio::test]
#[ntest::timeout(5_000)]
async fn duration_mode_runs_every_phase() {
    init();

    let options = RunOptions {
        fqn: Some(fqn("scenario_sleepy")),
        users: Some("1:3".into()),
        duration: Some(0.2),
        ..Default::default()
    };
    let start = std::time::Instant::now();
    let outcome = run(options).await;

    assert_eq!(outcome.exit.unwrap(), EXIT_SUCCESS);
    assert!(start.elapsed() >= Duration::from_millis(400));

    let starts: Vec<_> = outcome
        .records
        .iter()
        .filter(|record| record["action"] == "startTest")
        .collect();
    for user in 1..=3 {
        assert!(starts
            .iter()
            .any(|record| record["nb_users"] == 3 && record["current_user"] == user));
    }
    assert!(starts
        .iter()
        .all(|record| record["current_hit"] == record["nb_hits"]));
    assert_eq!(outcome.results.tests_run(), outcome.results.nb_success());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn multi_threaded_run() {
    init();

    let outcome = run(options("scenario_sleepy", "4:8", "3")).await;

    assert_eq!(outcome.exit.unwrap(), EXIT_SUCCESS);
    assert_eq!(outcome.results.tests_run(), (4 + 8) * 3);
}
