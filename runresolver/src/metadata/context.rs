//! Contexts: named groupings of executions.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use super::ContextId;
use crate::errors::StoreError;
use crate::utils::Timestamp;

/// The closed set of context types the orchestrator writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    /// One pipeline node, including the synthetic end node.
    Node,
    /// One run of a pipeline.
    PipelineRun,
    /// A whole pipeline across runs.
    Pipeline,
}

impl ContextKind {
    /// Returns the type name as stored.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::PipelineRun => "pipeline_run",
            Self::Pipeline => "pipeline",
        }
    }
}

impl fmt::Display for ContextKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContextKind {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Self::Node),
            "pipeline_run" => Ok(Self::PipelineRun),
            "pipeline" => Ok(Self::Pipeline),
            other => Err(StoreError::malformed(format!("unknown context type '{other}'"))),
        }
    }
}

/// A typed, named grouping entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Context {
    /// Store-assigned identity.
    pub id: ContextId,

    /// The context type.
    #[serde(rename = "type")]
    pub kind: ContextKind,

    /// The context name, unique per type.
    pub name: String,

    /// Custom properties.
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub properties: HashMap<String, serde_json::Value>,

    /// When the store created the context.
    #[serde(rename = "create_time_since_epoch", with = "chrono::serde::ts_milliseconds")]
    pub created_at: Timestamp,
}

impl Context {
    /// Creates a new context.
    #[must_use]
    pub fn new(
        id: ContextId,
        kind: ContextKind,
        name: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            id,
            kind,
            name: name.into(),
            properties: HashMap::new(),
            created_at,
        }
    }

    /// Returns true if this is a `pipeline_run` context.
    #[must_use]
    pub fn is_pipeline_run(&self) -> bool {
        self.kind == ContextKind::PipelineRun
    }
}
