//! Adapter turning an async test function into a [`Scenario`].
use crate::registry::ScenarioContext;
use futures_util::FutureExt;
use loads_core::{RunConfiguration, Scenario, ScenarioFuture, TestResult, WorkerStatus};
use loads_runtime::DnsResolver;
use std::any::Any;
use std::fmt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, trace};

/// Outcome of a failed hit.
///
/// Any error type converts into [`TestError::Error`], so `?` can be used freely in test bodies.
/// Use [`TestError::failure`] or [`check`] for assertion failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestError {
    /// The system under test misbehaved.
    Failure(String),
    /// The test itself could not run.
    Error(String),
}

impl TestError {
    pub fn failure(reason: impl Into<String>) -> Self {
        Self::Failure(reason.into())
    }

    pub fn error(reason: impl Into<String>) -> Self {
        Self::Error(reason.into())
    }
}

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TestError::Failure(reason) => write!(f, "failure: {reason}"),
            TestError::Error(reason) => write!(f, "error: {reason}"),
        }
    }
}

impl<E: std::error::Error> From<E> for TestError {
    fn from(err: E) -> Self {
        Self::Error(err.to_string())
    }
}

/// Fail the hit with `reason` unless `condition` holds.
pub fn check(condition: bool, reason: &str) -> Result<(), TestError> {
    if condition {
        Ok(())
    } else {
        Err(TestError::failure(reason))
    }
}

/// What a test body sees of the run: its worker status, the run configuration, the run's DNS
/// resolver and a handle to report custom counters.
#[derive(Clone)]
pub struct TestContext {
    status: WorkerStatus,
    result: Arc<dyn TestResult>,
    config: Arc<RunConfiguration>,
    resolver: Arc<DnsResolver>,
}

impl TestContext {
    pub fn status(&self) -> &WorkerStatus {
        &self.status
    }

    pub fn config(&self) -> &RunConfiguration {
        &self.config
    }

    pub fn resolver(&self) -> &DnsResolver {
        &self.resolver
    }

    pub fn incr_counter(&self, name: &str) {
        self.result.incr_counter(name, &self.status);
    }
}

/// Runs a test body once per hit, reporting `startTest`, its outcome and `stopTest`.
///
/// Errors and panics of the body are recorded against that hit only.
pub struct TestCase<F> {
    name: String,
    result: Arc<dyn TestResult>,
    config: Arc<RunConfiguration>,
    resolver: Arc<DnsResolver>,
    func: F,
}

impl<F, Fut> TestCase<F>
where
    F: Fn(TestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TestError>> + Send + 'static,
{
    pub fn new(ctx: ScenarioContext, func: F) -> Self {
        Self {
            name: ctx.name,
            result: ctx.result,
            config: ctx.config,
            resolver: ctx.resolver,
            func,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl<F, Fut> Scenario for TestCase<F>
where
    F: Fn(TestContext) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TestError>> + Send + 'static,
{
    fn call<'a>(&'a self, status: &'a WorkerStatus) -> ScenarioFuture<'a> {
        Box::pin(async move {
            self.result.start_test(status);
            let start = Instant::now();

            let ctx = TestContext {
                status: status.clone(),
                result: self.result.clone(),
                config: self.config.clone(),
                resolver: self.resolver.clone(),
            };
            let outcome = AssertUnwindSafe(async { (self.func)(ctx).await })
                .catch_unwind()
                .await;

            match outcome {
                Ok(Ok(())) => self.result.add_success(status),
                Ok(Err(TestError::Failure(reason))) => {
                    trace!("{} failed: {reason}", self.name);
                    self.result.add_failure(status, &reason);
                }
                Ok(Err(TestError::Error(reason))) => {
                    trace!("{} errored: {reason}", self.name);
                    self.result.add_error(status, &reason);
                }
                Err(panic) => {
                    let reason = panic_message(panic.as_ref());
                    error!("{} panicked: {reason}", self.name);
                    self.result.add_error(status, &reason);
                }
            }

            self.result.stop_test(status, start.elapsed());
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg.clone()
    } else {
        "panic".to_string()
    }
}
