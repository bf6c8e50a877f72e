//! Metadata model for the records a pipeline orchestrator writes.
//!
//! This module contains the typed view of the store's graph:
//! - Store-assigned ids for artifacts, executions and contexts
//! - Artifacts, executions and contexts (nodes)
//! - Events (typed edges between executions and artifacts)
//!
//! Kind strings are parsed into closed enums here, so the resolution code
//! never matches on free-form type names except execution types.

mod artifact;
mod context;
mod event;
mod execution;
mod ids;

pub use artifact::Artifact;
pub use context::{Context, ContextKind};
pub use event::{Event, EventKind, EventPath};
pub use execution::{Execution, ExecutionState};
pub use ids::{ArtifactId, ContextId, ExecutionId};

/// Execution type recorded for the synthetic end node of every pipeline run.
pub const END_NODE_EXECUTION_TYPE: &str = "EndNode";

/// Returns the `node` context name of a pipeline's end node.
///
/// # Examples
///
/// ```
/// use runresolver::metadata::end_node_context_name;
///
/// assert_eq!(end_node_context_name("taxi"), "taxi.taxi_end");
/// ```
#[must_use]
pub fn end_node_context_name(pipeline_name: &str) -> String {
    format!("{pipeline_name}.{pipeline_name}_end")
}
