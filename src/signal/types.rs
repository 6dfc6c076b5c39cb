//! Signal kinds, watched paths, and payload parsing.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// What a metadata path announces when it appears.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SignalKind {
    /// Advisory: interruption risk is elevated, no deadline attached.
    Rebalance,
    /// Hard notice: the instance will be stopped, hibernated or terminated.
    Action,
}

impl SignalKind {
    /// Whether signals of this kind always carry a deadline.
    pub fn carries_deadline(self) -> bool {
        matches!(self, SignalKind::Action)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SignalKind::Rebalance => "rebalance",
            SignalKind::Action => "action",
        }
    }
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A metadata location to poll and the signal kind expected there.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct SignalPath {
    /// Path relative to `latest/meta-data/`.
    pub path: String,

    /// Signal kind expected at this path.
    pub kind: SignalKind,
}

impl SignalPath {
    pub fn new(path: impl Into<String>, kind: SignalKind) -> Self {
        Self {
            path: path.into(),
            kind,
        }
    }

    /// `events/recommendations/rebalance`
    pub fn rebalance() -> Self {
        Self::new("events/recommendations/rebalance", SignalKind::Rebalance)
    }

    /// `spot/instance-action`
    pub fn instance_action() -> Self {
        Self::new("spot/instance-action", SignalKind::Action)
    }
}

/// Reasons a present payload could not be turned into a signal.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload has no `time` field")]
    MissingTime,

    #[error("invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// A confirmed interruption signal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminationSignal {
    pub kind: SignalKind,
    /// Always `Some` for [`SignalKind::Action`], always `None` for rebalance.
    pub deadline: Option<DateTime<Utc>>,
    /// Requested action (`terminate`, `stop`, `hibernate`) when reported.
    pub action: Option<String>,
    /// Advisory notice time of a rebalance recommendation, if offered.
    pub notice_time: Option<DateTime<Utc>>,
    /// Metadata path the signal was read from.
    pub path: String,
}

#[derive(Deserialize)]
struct InstanceActionPayload {
    action: Option<String>,
    time: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RebalancePayload {
    notice_time: Option<String>,
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, ParseError> {
    DateTime::parse_from_rfc3339(value.trim())
        .map(|t| t.with_timezone(&Utc))
        .map_err(|source| ParseError::Timestamp {
            value: value.to_string(),
            source,
        })
}

impl TerminationSignal {
    /// Parse a present payload read from `path`.
    ///
    /// An instance-action payload must name its scheduled time, e.g.
    /// `{"action": "terminate", "time": "2017-09-18T08:22:00Z"}`. For a
    /// rebalance recommendation presence alone is the signal; a readable
    /// `noticeTime` is kept when offered.
    pub fn parse(path: &SignalPath, payload: &str) -> Result<Self, ParseError> {
        match path.kind {
            SignalKind::Action => {
                let body: InstanceActionPayload = serde_json::from_str(payload)?;
                let time = body.time.ok_or(ParseError::MissingTime)?;
                let deadline = parse_timestamp(&time)?;
                Ok(Self {
                    kind: SignalKind::Action,
                    deadline: Some(deadline),
                    action: body.action,
                    notice_time: None,
                    path: path.path.clone(),
                })
            }
            SignalKind::Rebalance => {
                let notice_time = serde_json::from_str::<RebalancePayload>(payload)
                    .ok()
                    .and_then(|body| body.notice_time)
                    .and_then(|value| parse_timestamp(&value).ok());
                Ok(Self {
                    kind: SignalKind::Rebalance,
                    deadline: None,
                    action: None,
                    notice_time,
                    path: path.path.clone(),
                })
            }
        }
    }
}
