//! Process-level collaborators of the load runner: command line, logging, include-file
//! staging and host resolution.
pub mod cli;
pub mod dns;
pub mod logging;
pub mod staging;

mod error;

pub use crate::cli::RunnerCli;
pub use crate::dns::{DnsResolver, Resolved};
pub use crate::error::{DnsError, LoggingError, StagingError};
