//! Concurrency orchestration
//!
//! A run is a sequence of phases, one per `users` entry. Each phase spawns that many workers
//! and waits for all of them before the next phase starts.
use crate::registry::{ScenarioContext, ScenarioRegistry};
use crate::results::Results;
use crate::streamer::StdoutStreamer;
use crate::LoadsError;
use loads_core::{
    RunConfiguration, RunOptions, Scenario, TestResult, WorkerStatus, EXIT_FAILURE, EXIT_SUCCESS,
    REFRESH_INTERVAL,
};
use loads_runtime::staging::{pack_include_files, unpack_include_files};
use loads_runtime::DnsResolver;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::Instant;
#[allow(unused_imports)]
use tracing::{debug, error, info, instrument, trace, warn, Instrument};

mod workdir;
mod worker;

use workdir::WorkDir;
use worker::{Bound, Worker};

/// Upper bound for a phase deadline, keeps `Instant` arithmetic in range.
const MAX_PHASE_DURATION: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Cooperative stop flag.
///
/// Workers observe it between hits and the runner between phases; hits already dispatched
/// always complete.
#[derive(Clone, Debug, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Something refreshed periodically while a run is active, such as a progress display.
pub trait Output: Send + Sync {
    fn refresh(&self, run_id: Option<&str>);
}

/// Local load runner.
pub struct Runner {
    options: RunOptions,
    config: Arc<RunConfiguration>,
    registry: ScenarioRegistry,
    result: Arc<dyn TestResult>,
    resolver: Arc<DnsResolver>,
    outputs: Vec<Arc<dyn Output>>,
    stop: StopHandle,
}

impl Runner {
    /// Resolve `options` into a run. Fails before anything is spawned when the load parameters
    /// are malformed.
    ///
    /// By default scenarios come from [`ScenarioRegistry::linked`] and results are streamed to
    /// standard output.
    pub fn new(options: RunOptions) -> Result<Self, LoadsError> {
        let config = options.resolve()?;
        debug!("Resolved run configuration: {config}");

        Ok(Self {
            options,
            config: Arc::new(config),
            registry: ScenarioRegistry::linked(),
            result: Arc::new(Results::new(Some(Box::new(StdoutStreamer::new())))),
            resolver: Arc::new(DnsResolver::new()),
            outputs: vec![],
            stop: StopHandle::default(),
        })
    }

    pub fn with_registry(mut self, registry: ScenarioRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_result(mut self, result: Arc<dyn TestResult>) -> Self {
        self.result = result;
        self
    }

    pub fn with_resolver(mut self, resolver: Arc<DnsResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn with_output(mut self, output: Arc<dyn Output>) -> Self {
        self.outputs.push(output);
        self
    }

    pub fn config(&self) -> &RunConfiguration {
        &self.config
    }

    pub fn result(&self) -> &Arc<dyn TestResult> {
        &self.result
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    /// Run the load test to completion.
    ///
    /// Returns [`EXIT_FAILURE`] when any hit failed or errored, [`EXIT_SUCCESS`] otherwise. A
    /// failure outside of a hit is recorded once as an error and returned.
    #[instrument(
        name = "run",
        skip_all,
        fields(
            fqn = self.options.fqn(),
            project = self.options.project_name(),
            run_id = ?self.options.run_id,
        )
    )]
    pub async fn execute(&self) -> Result<u8, LoadsError> {
        match self.run().await {
            Ok(()) => {
                let errors = self.result.nb_errors();
                let failures = self.result.nb_failures();
                if errors + failures > 0 {
                    info!("Run complete with {errors} error(s) and {failures} failure(s)");
                    Ok(EXIT_FAILURE)
                } else {
                    info!("Run complete");
                    Ok(EXIT_SUCCESS)
                }
            }
            Err(err) => {
                error!("Run aborted: {err}");
                self.result.add_error(&self.run_status(), &err.to_string());
                Err(err)
            }
        }
    }

    async fn run(&self) -> Result<(), LoadsError> {
        // Held until every worker of this run is done.
        let _workdir = self.prepare_workdir().await?;

        debug!("Resolving scenario {}", self.options.fqn());
        let factory = self.registry.resolve(self.options.fqn())?;
        let scenario: Arc<dyn Scenario> = Arc::from(factory(ScenarioContext {
            name: self.options.fqn().to_string(),
            result: self.result.clone(),
            config: self.config.clone(),
            resolver: self.resolver.clone(),
        }));

        let _refresh = self.spawn_refresh();
        let run_status = self.run_status();
        let agent_id = self.options.agent_id.as_deref();

        if !self.options.externally_managed {
            self.result.start_test_run(agent_id, &run_status);
        }

        for &nb_users in &self.config.users {
            if self.stop.is_stopped() {
                info!("Stop requested; skipping remaining phases");
                break;
            }
            self.run_phase(&scenario, nb_users).await?;
        }

        tokio::task::yield_now().await;

        if !self.options.externally_managed {
            self.result.stop_test_run(agent_id, &run_status);
        }

        debug!("Test over - cleaning up");
        Ok(())
    }

    #[instrument(name = "phase", skip_all, fields(users = nb_users))]
    async fn run_phase(&self, scenario: &Arc<dyn Scenario>, nb_users: usize) -> Result<(), LoadsError> {
        let start = Instant::now();
        let bound = match self.config.duration {
            Some(duration) => Bound::Until(
                start
                    .checked_add(duration)
                    .unwrap_or_else(|| start + MAX_PHASE_DURATION),
            ),
            None => Bound::Hits(self.config.hits.clone().into()),
        };

        let template = self.run_status();
        let mut workers = JoinSet::new();

        for current_user in 1..=nb_users {
            let worker = Worker {
                scenario: scenario.clone(),
                status: template.for_worker(current_user, nb_users),
                stop: self.stop.clone(),
            };
            workers.spawn(worker.run(bound.clone()).in_current_span());
            tokio::task::yield_now().await;
        }

        // Workers watch the deadline themselves, so in-flight hits finish past it.
        join_all(&mut workers).await?;

        debug!(
            "Phase of {nb_users} user(s) done in {}",
            humantime::format_duration(start.elapsed())
        );
        Ok(())
    }

    async fn prepare_workdir(&self) -> Result<WorkDir, LoadsError> {
        let Some(test_dir) = &self.options.test_dir else {
            return Ok(WorkDir::shared().await);
        };

        let mut workdir = WorkDir::exclusive().await;
        let dir = PathBuf::from(format!("{}-{}", test_dir.display(), std::process::id()));
        let patterns = self.options.include_file.clone();

        debug!("Unpacking {patterns:?} into {}", dir.display());
        let staged = dir.clone();
        tokio::task::spawn_blocking(move || -> Result<(), LoadsError> {
            std::fs::create_dir_all(&staged)?;
            let bundle = pack_include_files(&patterns, ".")?;
            unpack_include_files(&bundle, &staged)?;
            Ok(())
        })
        .await??;

        workdir.enter(&dir)?;
        Ok(workdir)
    }

    fn spawn_refresh(&self) -> Option<AbortOnDrop> {
        if self.outputs.is_empty() {
            return None;
        }

        let outputs = self.outputs.clone();
        let stop = self.stop.clone();
        let run_id = self.options.run_id.clone();
        let handle = tokio::spawn(
            async move {
                let mut interval = tokio::time::interval(REFRESH_INTERVAL);
                loop {
                    interval.tick().await;
                    if stop.is_stopped() {
                        break;
                    }
                    for output in &outputs {
                        output.refresh(run_id.as_deref());
                    }
                }
            }
            .in_current_span(),
        );

        Some(AbortOnDrop(handle))
    }

    fn run_status(&self) -> WorkerStatus {
        WorkerStatus::for_run(self.options.run_id.clone(), self.options.loads_status.clone())
    }
}

async fn join_all(workers: &mut JoinSet<()>) -> Result<(), LoadsError> {
    while let Some(res) = workers.join_next().await {
        res?;
    }
    Ok(())
}

struct AbortOnDrop(JoinHandle<()>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}
