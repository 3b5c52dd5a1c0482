use loads::LoadsRuntime;
use std::process::ExitCode;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    LoadsRuntime::new().with_args().run().await
}
