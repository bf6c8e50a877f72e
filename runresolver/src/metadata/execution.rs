//! Executions: records of pipeline work.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::ExecutionId;
use crate::utils::Timestamp;

/// Last known state of an execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ExecutionState {
    /// State not recorded.
    #[default]
    Unknown,
    /// Registered but not started.
    New,
    /// In progress.
    Running,
    /// Finished successfully.
    Complete,
    /// Finished with an error.
    Failed,
    /// Outputs reused from an earlier execution.
    Cached,
    /// Stopped before finishing.
    Canceled,
}

impl ExecutionState {
    /// Returns true for states known not to have produced final outputs.
    ///
    /// `Unknown` is not one of them: stores often leave the state unset on
    /// executions that did finish.
    #[must_use]
    pub const fn is_unfinished_or_failed(self) -> bool {
        matches!(self, Self::New | Self::Running | Self::Failed | Self::Canceled)
    }
}

impl fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "UNKNOWN"),
            Self::New => write!(f, "NEW"),
            Self::Running => write!(f, "RUNNING"),
            Self::Complete => write!(f, "COMPLETE"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cached => write!(f, "CACHED"),
            Self::Canceled => write!(f, "CANCELED"),
        }
    }
}

/// A record of one unit of pipeline work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Execution {
    /// Store-assigned identity.
    pub id: ExecutionId,

    /// The execution type (e.g., "ExampleGen", "EndNode").
    #[serde(rename = "type")]
    pub type_name: String,

    /// Last known state.
    #[serde(default, rename = "last_known_state")]
    pub state: ExecutionState,

    /// When the store created the execution.
    #[serde(rename = "create_time_since_epoch", with = "chrono::serde::ts_milliseconds")]
    pub created_at: Timestamp,
}

impl Execution {
    /// Creates a new execution record.
    #[must_use]
    pub fn new(
        id: ExecutionId,
        type_name: impl Into<String>,
        state: ExecutionState,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            state,
            created_at,
        }
    }

    /// Returns true if the execution has the given type.
    #[must_use]
    pub fn is_type(&self, type_name: &str) -> bool {
        self.type_name == type_name
    }
}
