use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("Invalid {field} value {token:?}: expected a positive integer")]
    InvalidCount { field: &'static str, token: String },

    #[error("No {field} given")]
    Empty { field: &'static str },

    #[error("Invalid duration {0}: expected a non-negative number of seconds")]
    InvalidDuration(f64),

    #[error("Invalid agents value {0}: expected a positive integer")]
    InvalidAgents(i64),

    #[error("Status field {0:?} is set by the runner and cannot be overridden")]
    ReservedField(String),

    #[error("Could not load options: {0}")]
    Options(String),
}
