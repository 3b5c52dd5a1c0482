use crate::status::WorkerStatus;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::fmt;
use std::time::Duration;
use time::OffsetDateTime;

/// Lifecycle events relayed by the result sink.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    #[serde(rename = "startTestRun")]
    StartTestRun,
    #[serde(rename = "stopTestRun")]
    StopTestRun,
    #[serde(rename = "startTest")]
    StartTest,
    #[serde(rename = "stopTest")]
    StopTest,
    #[serde(rename = "addSuccess")]
    AddSuccess,
    #[serde(rename = "addFailure")]
    AddFailure,
    #[serde(rename = "addError")]
    AddError,
    #[serde(rename = "incr_counter")]
    IncrCounter,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::StartTestRun => "startTestRun",
            Action::StopTestRun => "stopTestRun",
            Action::StartTest => "startTest",
            Action::StopTest => "stopTest",
            Action::AddSuccess => "addSuccess",
            Action::AddFailure => "addFailure",
            Action::AddError => "addError",
            Action::IncrCounter => "incr_counter",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One record of the result stream: the action, the status of the reporting worker and the
/// fields specific to the call.
///
/// Timestamps serialize as RFC 3339 strings and durations as fractional seconds.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResultEvent {
    pub action: Action,
    #[serde(with = "time::serde::rfc3339")]
    pub timestamp: OffsetDateTime,
    #[serde(flatten)]
    pub status: WorkerStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub counter: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exception: Option<String>,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elapsed: Option<Duration>,
}

impl ResultEvent {
    pub fn new(action: Action, status: WorkerStatus) -> Self {
        Self {
            action,
            timestamp: OffsetDateTime::now_utc(),
            status,
            agent_id: None,
            counter: None,
            exception: None,
            elapsed: None,
        }
    }

    pub fn agent_id(mut self, agent_id: Option<&str>) -> Self {
        self.agent_id = agent_id.map(str::to_string);
        self
    }

    pub fn counter(mut self, name: &str) -> Self {
        self.counter = Some(name.to_string());
        self
    }

    pub fn exception(mut self, reason: &str) -> Self {
        self.exception = Some(reason.to_string());
        self
    }

    pub fn elapsed(mut self, elapsed: Duration) -> Self {
        self.elapsed = Some(elapsed);
        self
    }
}
