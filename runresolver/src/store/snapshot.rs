//! Serializable dump of a metadata store.

use serde::{Deserialize, Serialize};

use crate::metadata::{Artifact, Context, ContextId, Event, Execution, ExecutionId};

/// Links an execution to a context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Association {
    /// The context.
    pub context_id: ContextId,
    /// The execution.
    pub execution_id: ExecutionId,
}

impl Association {
    /// Creates a new association.
    #[must_use]
    pub const fn new(context_id: ContextId, execution_id: ExecutionId) -> Self {
        Self {
            context_id,
            execution_id,
        }
    }
}

/// Every record of a store, in the JSON layout used for fixtures and dumps.
///
/// Kind fields are validated during deserialization, so an unknown context or
/// event type fails the load instead of reaching the resolver.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreSnapshot {
    /// All artifacts.
    #[serde(default)]
    pub artifacts: Vec<Artifact>,
    /// All executions.
    #[serde(default)]
    pub executions: Vec<Execution>,
    /// All contexts.
    #[serde(default)]
    pub contexts: Vec<Context>,
    /// Execution-to-context links.
    #[serde(default)]
    pub associations: Vec<Association>,
    /// All events.
    #[serde(default)]
    pub events: Vec<Event>,
}
