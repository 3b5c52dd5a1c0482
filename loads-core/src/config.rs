use crate::constants::{DEFAULT_FQN, DEFAULT_PROJECT_NAME};
use crate::error::ConfigError;
use crate::status::RESERVED_FIELDS;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DurationSecondsWithFrac};
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

/// Raw `users`/`hits` option: a single integer, a list, or a colon-delimited string such as
/// `"1:10:20"`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountSpec {
    Single(i64),
    List(Vec<CountToken>),
    Delimited(String),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CountToken {
    Int(i64),
    Text(String),
}

impl CountSpec {
    /// Normalize into an ordered, non-empty sequence of positive integers.
    pub fn parse(&self, field: &'static str) -> Result<Vec<u64>, ConfigError> {
        let values = match self {
            CountSpec::Single(value) => vec![positive(field, *value)?],
            CountSpec::List(tokens) => tokens
                .iter()
                .map(|token| match token {
                    CountToken::Int(value) => positive(field, *value),
                    CountToken::Text(text) => parse_token(field, text),
                })
                .collect::<Result<Vec<_>, _>>()?,
            CountSpec::Delimited(text) => text
                .split(':')
                .map(|token| parse_token(field, token))
                .collect::<Result<Vec<_>, _>>()?,
        };

        if values.is_empty() {
            return Err(ConfigError::Empty { field });
        }
        Ok(values)
    }
}

fn positive(field: &'static str, value: i64) -> Result<u64, ConfigError> {
    match u64::try_from(value) {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidCount {
            field,
            token: value.to_string(),
        }),
    }
}

fn parse_token(field: &'static str, token: &str) -> Result<u64, ConfigError> {
    match token.trim().parse::<u64>() {
        Ok(value) if value > 0 => Ok(value),
        _ => Err(ConfigError::InvalidCount {
            field,
            token: token.to_string(),
        }),
    }
}

impl FromStr for CountSpec {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CountSpec::Delimited(s.to_string()))
    }
}

impl From<u32> for CountSpec {
    fn from(value: u32) -> Self {
        CountSpec::Single(value.into())
    }
}

impl From<&str> for CountSpec {
    fn from(value: &str) -> Self {
        CountSpec::Delimited(value.to_string())
    }
}

impl From<Vec<u32>> for CountSpec {
    fn from(values: Vec<u32>) -> Self {
        CountSpec::List(
            values
                .into_iter()
                .map(|v| CountToken::Int(v.into()))
                .collect(),
        )
    }
}

/// Resolved, immutable parameters of one run.
#[serde_as]
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RunConfiguration {
    /// One concurrency phase per entry, run in order.
    pub users: Vec<usize>,
    /// Hit sub-phases run by every worker. Empty for duration-bounded runs without hits.
    pub hits: Vec<u64>,
    #[serde_as(as = "Option<DurationSecondsWithFrac<f64>>")]
    pub duration: Option<Duration>,
    pub agents: u64,
    /// Estimated number of scenario invocations across all agents. `0` when duration-bounded.
    pub total: u64,
}

impl RunConfiguration {
    pub fn resolve(
        users: Option<&CountSpec>,
        hits: Option<&CountSpec>,
        duration: Option<f64>,
        agents: Option<i64>,
    ) -> Result<Self, ConfigError> {
        let users = match users {
            Some(spec) => spec
                .parse("users")?
                .into_iter()
                .map(|user| {
                    usize::try_from(user).map_err(|_| ConfigError::InvalidCount {
                        field: "users",
                        token: user.to_string(),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?,
            None => vec![1],
        };

        let duration = duration
            .map(|secs| Duration::try_from_secs_f64(secs).map_err(|_| ConfigError::InvalidDuration(secs)))
            .transpose()?;

        let hits = match (hits, duration) {
            (Some(spec), _) => spec.parse("hits")?,
            (None, None) => vec![1],
            (None, Some(_)) => vec![],
        };

        let agents = match agents {
            Some(agents) => u64::try_from(agents)
                .ok()
                .filter(|agents| *agents > 0)
                .ok_or(ConfigError::InvalidAgents(agents))?,
            None => 1,
        };

        let total = if duration.is_some() {
            0
        } else {
            users
                .iter()
                .flat_map(|&user| hits.iter().map(move |&hit| hit.saturating_mul(user as u64)))
                .fold(0u64, u64::saturating_add)
                .saturating_mul(agents)
        };

        Ok(Self {
            users,
            hits,
            duration,
            agents,
            total,
        })
    }

    pub fn is_duration_bounded(&self) -> bool {
        self.duration.is_some()
    }
}

impl fmt::Display for RunConfiguration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "users={:?} agents={}", self.users, self.agents)?;
        match self.duration {
            Some(duration) => write!(f, " duration={}", humantime::format_duration(duration)),
            None => write!(f, " hits={:?} total={}", self.hits, self.total),
        }
    }
}

/// Structured process input. Every field is optional; absent fields take the defaults of a
/// single local run of the dummy scenario.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunOptions {
    pub fqn: Option<String>,
    pub users: Option<CountSpec>,
    pub hits: Option<CountSpec>,
    pub duration: Option<f64>,
    pub agents: Option<i64>,
    pub project_name: Option<String>,
    pub test_dir: Option<PathBuf>,
    pub include_file: Vec<String>,
    pub no_patching: bool,
    pub externally_managed: bool,
    pub agent_id: Option<String>,
    pub run_id: Option<String>,
    /// Extra identifying fields copied onto every worker status.
    pub loads_status: BTreeMap<String, serde_json::Value>,
}

impl RunOptions {
    /// Parse the JSON options document. An empty document yields the defaults.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_json::from_str(text).map_err(|err| ConfigError::Options(err.to_string()))
    }

    pub fn fqn(&self) -> &str {
        self.fqn.as_deref().unwrap_or(DEFAULT_FQN)
    }

    pub fn project_name(&self) -> &str {
        self.project_name.as_deref().unwrap_or(DEFAULT_PROJECT_NAME)
    }

    /// Validate the options into a [`RunConfiguration`]. Pass-through status fields must not
    /// collide with the fields written on every event.
    pub fn resolve(&self) -> Result<RunConfiguration, ConfigError> {
        if let Some(key) = self
            .loads_status
            .keys()
            .find(|key| RESERVED_FIELDS.contains(&key.as_str()))
        {
            return Err(ConfigError::ReservedField(key.clone()));
        }

        RunConfiguration::resolve(
            self.users.as_ref(),
            self.hits.as_ref(),
            self.duration,
            self.agents,
        )
    }
}
