use clap::Parser;
use loads_core::{ConfigError, CountSpec, RunOptions, DEFAULT_LOGFILE};
use std::path::PathBuf;

/// Command line of the load runner.
///
/// The optional positional argument is a JSON document of run options; flags override the
/// matching fields of that document.
#[derive(Parser, Clone, Debug)]
#[command(name = "loads-runner", version, about = "Runs a load test.")]
pub struct RunnerCli {
    /// Running options, as JSON.
    pub options: Option<String>,

    /// Identifier of the scenario to run.
    #[arg(long)]
    pub fqn: Option<String>,

    /// Concurrency phases, e.g. `10` or `1:10:20`.
    #[arg(short, long)]
    pub users: Option<CountSpec>,

    /// Hits per user, e.g. `100` or `10:100`.
    #[arg(long)]
    pub hits: Option<CountSpec>,

    /// Run each phase for this long instead of a number of hits (`30`, `1m 30s`).
    #[arg(short, long, value_parser = parse_duration)]
    pub duration: Option<f64>,

    #[arg(long)]
    pub agents: Option<i64>,

    /// Run inside `<test-dir>-<pid>`.
    #[arg(long)]
    pub test_dir: Option<PathBuf>,

    /// File patterns copied into the run directory.
    #[arg(long)]
    pub include_file: Vec<String>,

    /// Leave `startTestRun`/`stopTestRun` to the caller.
    #[arg(long)]
    pub externally_managed: bool,

    #[arg(long)]
    pub run_id: Option<String>,

    #[arg(long)]
    pub debug: bool,

    /// `stdout` (logs go to stderr) or a file path. Externally managed workers log to
    /// [`DEFAULT_LOGFILE`] unless told otherwise.
    #[arg(long)]
    pub logfile: Option<String>,
}

fn parse_duration(value: &str) -> Result<f64, String> {
    if let Ok(secs) = value.trim().parse::<f64>() {
        return Ok(secs);
    }
    humantime::parse_duration(value)
        .map(|duration| duration.as_secs_f64())
        .map_err(|err| err.to_string())
}

impl RunnerCli {
    /// Log destination for a run of `options`.
    pub fn logfile(&self, options: &RunOptions) -> &str {
        match &self.logfile {
            Some(logfile) => logfile,
            None if options.externally_managed => DEFAULT_LOGFILE,
            None => "stdout",
        }
    }

    pub fn into_options(self) -> Result<RunOptions, ConfigError> {
        let mut options = RunOptions::from_json(self.options.as_deref().unwrap_or_default())?;

        if self.fqn.is_some() {
            options.fqn = self.fqn;
        }
        if self.users.is_some() {
            options.users = self.users;
        }
        if self.hits.is_some() {
            options.hits = self.hits;
        }
        if self.duration.is_some() {
            options.duration = self.duration;
        }
        if self.agents.is_some() {
            options.agents = self.agents;
        }
        if self.test_dir.is_some() {
            options.test_dir = self.test_dir;
        }
        if self.run_id.is_some() {
            options.run_id = self.run_id;
        }
        options.include_file.extend(self.include_file);
        options.externally_managed |= self.externally_managed;

        Ok(options)
    }
}
