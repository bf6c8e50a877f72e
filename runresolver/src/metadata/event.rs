//! Events: typed edges between executions and artifacts.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{ArtifactId, ExecutionId};
use crate::errors::StoreError;
use crate::utils::Timestamp;

/// The closed set of event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventKind {
    /// Type not recorded.
    Unknown,
    /// Output declared before execution.
    DeclaredOutput,
    /// Input declared before execution.
    DeclaredInput,
    /// Artifact consumed by the execution.
    Input,
    /// Artifact produced by the execution.
    Output,
    /// Artifact consumed internally by the orchestrator.
    InternalInput,
    /// Artifact republished by the orchestrator (the end node's run outputs).
    InternalOutput,
    /// Output registered but not yet finalized.
    PendingOutput,
}

impl EventKind {
    /// Returns the type name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unknown => "UNKNOWN",
            Self::DeclaredOutput => "DECLARED_OUTPUT",
            Self::DeclaredInput => "DECLARED_INPUT",
            Self::Input => "INPUT",
            Self::Output => "OUTPUT",
            Self::InternalInput => "INTERNAL_INPUT",
            Self::InternalOutput => "INTERNAL_OUTPUT",
            Self::PendingOutput => "PENDING_OUTPUT",
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UNKNOWN" => Ok(Self::Unknown),
            "DECLARED_OUTPUT" => Ok(Self::DeclaredOutput),
            "DECLARED_INPUT" => Ok(Self::DeclaredInput),
            "INPUT" => Ok(Self::Input),
            "OUTPUT" => Ok(Self::Output),
            "INTERNAL_INPUT" => Ok(Self::InternalInput),
            "INTERNAL_OUTPUT" => Ok(Self::InternalOutput),
            "PENDING_OUTPUT" => Ok(Self::PendingOutput),
            other => Err(StoreError::malformed(format!("unknown event type '{other}'"))),
        }
    }
}

/// Position of an artifact within an execution's channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EventPath {
    /// The channel key (e.g., "examples").
    pub key: String,
    /// Position within the channel's artifact list.
    pub index: u32,
}

impl EventPath {
    /// Creates a new event path.
    #[must_use]
    pub fn new(key: impl Into<String>, index: u32) -> Self {
        Self {
            key: key.into(),
            index,
        }
    }
}

/// A typed edge recording that an execution produced or consumed an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// The artifact end of the edge.
    pub artifact_id: ArtifactId,

    /// The execution end of the edge.
    pub execution_id: ExecutionId,

    /// The event type.
    #[serde(rename = "type")]
    pub kind: EventKind,

    /// Channel key and index.
    pub path: EventPath,

    /// When the event was recorded.
    #[serde(rename = "milliseconds_since_epoch", with = "chrono::serde::ts_milliseconds")]
    pub recorded_at: Timestamp,
}

impl Event {
    /// Creates a new event.
    #[must_use]
    pub fn new(
        execution_id: ExecutionId,
        artifact_id: ArtifactId,
        kind: EventKind,
        path: EventPath,
        recorded_at: Timestamp,
    ) -> Self {
        Self {
            artifact_id,
            execution_id,
            kind,
            path,
            recorded_at,
        }
    }

    /// Returns the channel key.
    #[must_use]
    pub fn key(&self) -> &str {
        &self.path.key
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_kind_round_trips_through_wire_name() {
        let kinds = [
            EventKind::Unknown,
            EventKind::DeclaredOutput,
            EventKind::DeclaredInput,
            EventKind::Input,
            EventKind::Output,
            EventKind::InternalInput,
            EventKind::InternalOutput,
            EventKind::PendingOutput,
        ];
        for kind in kinds {
            assert_eq!(kind.as_str().parse::<EventKind>().unwrap(), kind);
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }

    #[test]
    fn test_unknown_event_type_is_malformed() {
        assert!(matches!(
            "REPUBLISHED".parse::<EventKind>(),
            Err(StoreError::Malformed(_))
        ));
    }

    #[test]
    fn test_event_key() {
        let event = Event::new(
            ExecutionId::new(1),
            ArtifactId::new(2),
            EventKind::InternalOutput,
            EventPath::new("examples", 0),
            crate::utils::now_utc(),
        );
        assert_eq!(event.key(), "examples");
    }
}
