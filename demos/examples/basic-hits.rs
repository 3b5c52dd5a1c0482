use loads::prelude::*;
use reqwest::header::HOST;
use reqwest::Client;
use std::process::ExitCode;
use std::sync::OnceLock;

static CLIENT: OnceLock<Client> = OnceLock::new();

/// Run with e.g.
///
/// ```text
/// $ cargo run --example basic-hits -- --fqn basic_hits::scenario_home -u 1:5:10 --hits 20
/// ```
#[tokio::main]
async fn main() -> ExitCode {
    LoadsRuntime::new().with_args().run().await
}

#[scenario]
async fn scenario_home(ctx: TestContext) -> Result<(), TestError> {
    let target = ctx.resolver().resolve("http://localhost:3002/").await?;
    let client = CLIENT.get_or_init(Client::new);

    let res = client
        .get(target.url)
        .header(HOST, target.original)
        .send()
        .await?;
    check(res.status().is_success(), "expected a 2xx response")?;

    ctx.incr_counter("home");
    Ok(())
}
