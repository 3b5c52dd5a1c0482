use crate::error::LoggingError;
use std::fs::OpenOptions;
use std::sync::Mutex;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Install the global log subscriber.
///
/// `logfile` is either `"stdout"`, in which case logs go to stderr so that the result stream on
/// stdout stays machine readable, or a path opened in append mode. `RUST_LOG` overrides the
/// level picked from `debug`.
pub fn init(debug: bool, logfile: &str) -> Result<(), LoggingError> {
    let level = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let builder = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(false);

    let res = if logfile == "stdout" {
        builder.with_writer(std::io::stderr).try_init()
    } else {
        let file = OpenOptions::new().create(true).append(true).open(logfile)?;
        builder.with_ansi(false).with_writer(Mutex::new(file)).try_init()
    };

    res.map_err(|err| LoggingError::Init(err.to_string()))
}
