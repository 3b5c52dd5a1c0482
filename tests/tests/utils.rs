use loads::streamer::WriterStreamer;
use loads::{LoadsError, Results, RunOptions, Runner};
use serde_json::Value;
use std::io::{self, Write};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::error;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[allow(unused)]
pub fn init() {
    static ONCE_LOCK: OnceLock<()> = OnceLock::new();

    ONCE_LOCK.get_or_init(|| {
        let default_panic = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |info| {
            default_panic(info);
            error!("Panic occurred: {info:?}");
        }));

        let _ = FmtSubscriber::builder()
            .with_env_filter(EnvFilter::new("loads=debug,loads_runtime=debug"))
            .with_test_writer()
            .try_init();
    });
}

/// In-memory NDJSON sink shared between the runner and the test.
#[derive(Clone, Default)]
pub struct Buffer(Arc<Mutex<Vec<u8>>>);

impl Write for Buffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl Buffer {
    pub fn lines(&self) -> Vec<String> {
        let data = self.0.lock().unwrap();
        std::str::from_utf8(&data)
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }
}

#[allow(unused)]
pub struct Outcome {
    pub exit: Result<u8, LoadsError>,
    pub results: Arc<Results>,
    /// Raw NDJSON lines, as emitted.
    pub lines: Vec<String>,
    pub records: Vec<Value>,
}

#[allow(unused)]
pub async fn run(options: RunOptions) -> Outcome {
    let buffer = Buffer::default();
    let results = Arc::new(Results::new(Some(Box::new(WriterStreamer::new(
        buffer.clone(),
    )))));

    let exit = match Runner::new(options) {
        Ok(runner) => runner.with_result(results.clone()).execute().await,
        Err(err) => Err(err),
    };

    let lines = buffer.lines();
    let records = lines
        .iter()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    Outcome {
        exit,
        results,
        lines,
        records,
    }
}

#[allow(unused)]
pub fn actions(records: &[Value]) -> Vec<&str> {
    records
        .iter()
        .map(|record| record["action"].as_str().unwrap())
        .collect()
}
