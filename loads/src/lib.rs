#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

extern crate self as loads;

pub mod case;
pub mod dummy;
pub mod registry;
pub mod results;
pub mod runner;
pub mod runtime;
pub mod streamer;

mod error;

pub use case::{check, TestCase, TestContext, TestError};
pub use error::LoadsError;
pub use loads_core as core;
pub use loads_core::{
    Action, ResultEvent, RunConfiguration, RunOptions, Scenario, Streamer, TestResult,
    WorkerStatus,
};
pub use loads_macros::scenario;
pub use loads_runtime::{DnsResolver, Resolved};
pub use registry::ScenarioRegistry;
pub use results::Results;
pub use runner::{Output, Runner, StopHandle};
pub use runtime::LoadsRuntime;

pub mod prelude {
    pub use crate::case::{check, TestContext, TestError};
    pub use crate::runtime::LoadsRuntime;
    pub use loads_macros::scenario;
}
