use std::io;

use thiserror::Error;

use crate::{registry::EntryKind, MetricName};

pub type Result<T> = std::result::Result<T, StatError>;

#[derive(Debug, Error)]
pub enum StatError {
    #[error("timer `{name}` is already running")]
    TimerRunning { name: MetricName },
    #[error("timer `{name}` is not running")]
    TimerIdle { name: MetricName },
    #[error("`{name}` is registered as a {registered}, not a {requested}")]
    KindMismatch {
        name: MetricName,
        registered: EntryKind,
        requested: EntryKind,
    },
    #[error("`{name}` cannot take the non-finite value {value}")]
    InvalidValue { name: MetricName, value: f64 },
    #[error("could not send packet to {destination}: {source}")]
    Transport {
        destination: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid {key} `{value}`: {reason}")]
    Config {
        key: &'static str,
        value: String,
        reason: String,
    },
    #[error("system clock is set before the unix epoch")]
    Clock,
}

impl StatError {
    /// Whether the error came from misusing a timer's start/stop cycle.
    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::TimerRunning { .. } | Self::TimerIdle { .. })
    }
}
