use loads_core::ConfigError;
use loads_runtime::StagingError;
use thiserror::Error;
use tokio::task::JoinError;

#[derive(Debug, Error)]
pub enum LoadsError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    #[error("Scenario {0:?} not found")]
    Resolution(String),

    #[error("Unable to stage include files: {0}")]
    Staging(#[from] StagingError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Orchestration error: {0}")]
    Orchestration(String),
}

impl From<JoinError> for LoadsError {
    fn from(err: JoinError) -> Self {
        Self::Orchestration(format!("worker did not complete: {err}"))
    }
}
