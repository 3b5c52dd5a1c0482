use loads_core::{Action, ResultEvent, Streamer, TestResult, WorkerStatus};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// Default result sink: counts outcomes and relays every call to a [`Streamer`].
///
/// Without a streamer the counters are still maintained but nothing is emitted.
pub struct Results {
    streamer: Option<Box<dyn Streamer>>,
    tests_run: AtomicU64,
    nb_success: AtomicU64,
    nb_failures: AtomicU64,
    nb_errors: AtomicU64,
}

impl Results {
    pub fn new(streamer: Option<Box<dyn Streamer>>) -> Self {
        Self {
            streamer,
            tests_run: AtomicU64::new(0),
            nb_success: AtomicU64::new(0),
            nb_failures: AtomicU64::new(0),
            nb_errors: AtomicU64::new(0),
        }
    }

    pub fn tests_run(&self) -> u64 {
        self.tests_run.load(Ordering::Relaxed)
    }

    pub fn nb_success(&self) -> u64 {
        self.nb_success.load(Ordering::Relaxed)
    }

    pub fn was_successful(&self) -> bool {
        self.nb_errors() + self.nb_failures() == 0
    }

    fn stream(&self, event: impl FnOnce() -> ResultEvent) {
        if let Some(streamer) = &self.streamer {
            streamer.push(&event());
        }
    }
}

impl Default for Results {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TestResult for Results {
    fn start_test_run(&self, agent_id: Option<&str>, status: &WorkerStatus) {
        self.stream(|| ResultEvent::new(Action::StartTestRun, status.clone()).agent_id(agent_id));
    }

    fn stop_test_run(&self, agent_id: Option<&str>, status: &WorkerStatus) {
        self.stream(|| ResultEvent::new(Action::StopTestRun, status.clone()).agent_id(agent_id));
    }

    fn start_test(&self, status: &WorkerStatus) {
        self.tests_run.fetch_add(1, Ordering::Relaxed);
        self.stream(|| ResultEvent::new(Action::StartTest, status.clone()));
    }

    fn stop_test(&self, status: &WorkerStatus, elapsed: Duration) {
        self.stream(|| ResultEvent::new(Action::StopTest, status.clone()).elapsed(elapsed));
    }

    fn add_success(&self, status: &WorkerStatus) {
        self.nb_success.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("loads_success").increment(1);

        self.stream(|| ResultEvent::new(Action::AddSuccess, status.clone()));
    }

    fn add_failure(&self, status: &WorkerStatus, reason: &str) {
        self.nb_failures.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("loads_failure").increment(1);

        self.stream(|| ResultEvent::new(Action::AddFailure, status.clone()).exception(reason));
    }

    fn add_error(&self, status: &WorkerStatus, reason: &str) {
        self.nb_errors.fetch_add(1, Ordering::Relaxed);

        #[cfg(feature = "metrics")]
        metrics::counter!("loads_error").increment(1);

        self.stream(|| ResultEvent::new(Action::AddError, status.clone()).exception(reason));
    }

    fn incr_counter(&self, name: &str, status: &WorkerStatus) {
        #[cfg(feature = "metrics")]
        metrics::counter!("loads_counter", "name" => name.to_string()).increment(1);

        self.stream(|| ResultEvent::new(Action::IncrCounter, status.clone()).counter(name));
    }

    fn nb_errors(&self) -> u64 {
        self.nb_errors.load(Ordering::Relaxed)
    }

    fn nb_failures(&self) -> u64 {
        self.nb_failures.load(Ordering::Relaxed)
    }
}
