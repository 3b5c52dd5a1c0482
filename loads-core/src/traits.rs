use crate::event::ResultEvent;
use crate::status::WorkerStatus;
use std::{future::Future, pin::Pin, time::Duration};

/// Outcome sink used by scenarios and the runner.
///
/// For every iteration a scenario calls `start_test`, then exactly one of
/// `add_success`/`add_failure`/`add_error`, then `stop_test`.
pub trait TestResult: Send + Sync {
    fn start_test_run(&self, agent_id: Option<&str>, status: &WorkerStatus);
    fn stop_test_run(&self, agent_id: Option<&str>, status: &WorkerStatus);
    fn start_test(&self, status: &WorkerStatus);
    fn stop_test(&self, status: &WorkerStatus, elapsed: Duration);
    fn add_success(&self, status: &WorkerStatus);
    fn add_failure(&self, status: &WorkerStatus, reason: &str);
    fn add_error(&self, status: &WorkerStatus, reason: &str);
    fn incr_counter(&self, name: &str, status: &WorkerStatus);

    fn nb_errors(&self) -> u64;
    fn nb_failures(&self) -> u64;
}

pub type ScenarioFuture<'a> = Pin<Box<dyn Future<Output = ()> + Send + 'a>>;

/// A repeatable unit of work. One call is one hit, and reports its own outcome to the sink
/// the scenario was built with.
pub trait Scenario: Send + Sync {
    fn call<'a>(&'a self, status: &'a WorkerStatus) -> ScenarioFuture<'a>;
}

/// External channel for result events. Implementations must not panic on well-formed events.
pub trait Streamer: Send + Sync {
    fn push(&self, event: &ResultEvent);
}
