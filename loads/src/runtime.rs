//! Default Loads runtime
//!
//! Parses the runner arguments, sets up logging and drives a [`Runner`] to completion. A ctrl-c
//! stops the run cooperatively: dispatched hits finish and the run is closed normally.
use crate::registry::ScenarioRegistry;
use crate::runner::{Output, Runner};
use crate::LoadsError;
use clap::Parser;
use loads_core::{RunOptions, TestResult, EXIT_ABORTED};
use loads_runtime::{logging, RunnerCli};
use std::process::ExitCode;
use std::sync::Arc;
#[allow(unused)]
use tracing::{debug, error, info, instrument, warn, Instrument};

/// Default Loads runtime.
///
/// # Example
///
/// ```ignore
/// use loads::prelude::*;
///
/// #[tokio::main]
/// async fn main() -> std::process::ExitCode {
///     LoadsRuntime::new()
///         .with_args()
///         .run()
///         .await
/// }
/// ```
pub struct LoadsRuntime {
    options: RunOptions,
    registry: Option<ScenarioRegistry>,
    result: Option<Arc<dyn TestResult>>,
    outputs: Vec<Arc<dyn Output>>,
    cli: Option<RunnerCli>,
}

impl Default for LoadsRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl LoadsRuntime {
    pub fn new() -> Self {
        LoadsRuntime {
            options: RunOptions::default(),
            registry: None,
            result: None,
            outputs: vec![],
            cli: None,
        }
    }

    /// Use the `loads-runner` command line arguments.
    ///
    /// A positional JSON document carries the full options; flags override its fields.
    ///
    /// # Example
    /// ```ignore
    /// $ ./my_load_test --fqn my_test::scenarios::test_home -u 1:5:10 -d 30s
    /// $ ./my_load_test '{"fqn": "my_test::scenarios::test_home", "hits": "10"}' --debug
    /// ```
    pub fn with_args(mut self) -> Self {
        self.cli = Some(RunnerCli::parse());
        self
    }

    pub fn options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Scenarios to pick from. Defaults to every `#[scenario]` linked into the binary.
    pub fn registry(mut self, registry: ScenarioRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Result sink. Defaults to [`Results`](crate::Results) streaming to standard output.
    pub fn result(mut self, result: Arc<dyn TestResult>) -> Self {
        self.result = Some(result);
        self
    }

    pub fn output(mut self, output: Arc<dyn Output>) -> Self {
        self.outputs.push(output);
        self
    }

    /// Run to completion and turn the outcome into a process exit code.
    pub async fn run(self) -> ExitCode {
        match self.try_run().await {
            Ok(code) => ExitCode::from(code),
            Err(err) => {
                error!("{err}");
                ExitCode::from(EXIT_ABORTED)
            }
        }
    }

    pub async fn try_run(self) -> Result<u8, LoadsError> {
        let options = match self.cli {
            Some(cli) => {
                let options = cli.clone().into_options()?;
                if let Err(err) = logging::init(cli.debug, cli.logfile(&options)) {
                    warn!("Unable to set up logging: {err}");
                }
                options
            }
            None => self.options,
        };

        if options.no_patching {
            debug!("no_patching has no effect on this runner");
        }

        let mut runner = Runner::new(options)?;
        if let Some(registry) = self.registry {
            runner = runner.with_registry(registry);
        }
        if let Some(result) = self.result {
            runner = runner.with_result(result);
        }
        for output in self.outputs {
            runner = runner.with_output(output);
        }

        let stop = runner.stop_handle();
        let ctrl_c = tokio::spawn(
            async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    info!("Interrupted; waiting for dispatched hits");
                    stop.stop();
                }
            }
            .in_current_span(),
        );

        let res = runner.execute().await;
        ctrl_c.abort();
        res
    }
}
