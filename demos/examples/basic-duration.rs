use loads::prelude::*;
use loads::{RunOptions, Runner};
use reqwest::Client;
use std::process::ExitCode;
use std::sync::OnceLock;
use std::time::Duration;
use tracing_subscriber::FmtSubscriber;

static CLIENT: OnceLock<Client> = OnceLock::new();

#[tokio::main]
async fn main() -> ExitCode {
    FmtSubscriber::builder()
        .with_env_filter("loads=debug")
        .with_writer(std::io::stderr)
        .init();

    let options = RunOptions {
        fqn: Some(format!("{}::scenario_delay", module_path!())),
        users: Some("1:10:20".into()),
        duration: Some(30.),
        run_id: Some("basic-duration".into()),
        ..Default::default()
    };

    let runner = match Runner::new(options) {
        Ok(runner) => runner,
        Err(err) => {
            tracing::error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    let stop = runner.stop_handle();
    tokio::spawn(async move {
        let _ = tokio::signal::ctrl_c().await;
        stop.stop();
    });

    match runner.execute().await {
        Ok(code) => ExitCode::from(code),
        Err(_) => ExitCode::FAILURE,
    }
}

#[scenario]
async fn scenario_delay(_ctx: TestContext) -> Result<(), TestError> {
    let client = CLIENT.get_or_init(Client::new);
    let res = client
        .get("http://0.0.0.0:3002/delay/ms/10")
        .timeout(Duration::from_secs(5))
        .send()
        .await?;
    check(res.status().is_success(), "expected a 2xx response")
}
