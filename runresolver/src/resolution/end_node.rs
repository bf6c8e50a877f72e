//! Locates the end-node execution of a pipeline run.

use tracing::{debug, warn};

use super::PipelineRun;
use crate::errors::{ConsistencyError, Result};
use crate::metadata::{Context, Execution, END_NODE_EXECUTION_TYPE};
use crate::store::MetadataStore;

/// Finds the single `EndNode` execution shared by a run context and the
/// pipeline's end-node context.
#[derive(Clone, Copy)]
pub struct EndNodeLocator<'a> {
    store: &'a dyn MetadataStore,
    end_node_context: &'a Context,
}

impl<'a> EndNodeLocator<'a> {
    /// Creates a locator for the pipeline owning `end_node_context`.
    #[must_use]
    pub fn new(store: &'a dyn MetadataStore, end_node_context: &'a Context) -> Self {
        Self {
            store,
            end_node_context,
        }
    }

    /// Returns the run's end node, or `None` if the run is not resolvable yet.
    ///
    /// An end node recorded as new, running, failed or canceled counts as
    /// absent. One with no recorded state is used.
    ///
    /// # Errors
    ///
    /// Returns `ConsistencyError::MultipleEndNodes` if the run has more than
    /// one end-node execution, and propagates store failures.
    pub fn locate(&self, run: &PipelineRun) -> Result<Option<Execution>> {
        let mut end_nodes: Vec<Execution> = self
            .store
            .list_executions_for_contexts(&[run.context.id, self.end_node_context.id])?
            .into_iter()
            .filter(|e| e.is_type(END_NODE_EXECUTION_TYPE))
            .collect();

        if end_nodes.len() > 1 {
            warn!(
                run_id = %run.run_id(),
                count = end_nodes.len(),
                "Run has more than one end-node execution"
            );
            return Err(ConsistencyError::MultipleEndNodes {
                run_id: run.run_id().to_string(),
                context_id: run.context.id,
                executions: end_nodes.iter().map(|e| e.id).collect(),
            }
            .into());
        }

        let Some(end_node) = end_nodes.pop() else {
            debug!(run_id = %run.run_id(), "Run has no end-node execution");
            return Ok(None);
        };

        if end_node.state.is_unfinished_or_failed() {
            debug!(
                run_id = %run.run_id(),
                execution_id = %end_node.id,
                state = %end_node.state,
                "End node is unfinished or failed"
            );
            return Ok(None);
        }

        Ok(Some(end_node))
    }
}
