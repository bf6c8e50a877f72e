//! Store fixture for resolution tests.

use std::sync::Arc;

use crate::errors::StoreError;
use crate::metadata::{
    end_node_context_name, Artifact, Context, ContextKind, EventKind, EventPath, Execution,
    ExecutionState, END_NODE_EXECUTION_TYPE,
};
use crate::resolution::ResolverContext;
use crate::store::InMemoryMetadataStore;

/// Output channels as written by a test: key to artifacts in index order.
pub type Channels<'a> = [(&'a str, &'a [&'a Artifact])];

/// Writes the records an orchestrator leaves behind for one pipeline.
///
/// Runs are recorded in call order, so the last `put_run` is the newest.
#[derive(Debug, Clone)]
pub struct StoreFixture {
    pipeline_name: String,
    store: Arc<InMemoryMetadataStore>,
}

impl StoreFixture {
    /// Creates a fixture over an empty store.
    #[must_use]
    pub fn new(pipeline_name: impl Into<String>) -> Self {
        Self::with_store(pipeline_name, Arc::new(InMemoryMetadataStore::new()))
    }

    /// Creates a fixture writing into an existing store.
    #[must_use]
    pub fn with_store(pipeline_name: impl Into<String>, store: Arc<InMemoryMetadataStore>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            store,
        }
    }

    /// Returns the pipeline name.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.pipeline_name
    }

    /// Returns the underlying store.
    #[must_use]
    pub fn store(&self) -> &Arc<InMemoryMetadataStore> {
        &self.store
    }

    /// Returns a resolver context over the store.
    #[must_use]
    pub fn context(&self) -> ResolverContext {
        ResolverContext::new(self.store.clone())
    }

    /// Records an artifact.
    pub fn put_artifact(&self, type_name: &str) -> Result<Artifact, StoreError> {
        self.store.put_artifact(type_name)
    }

    /// Returns the context with this kind and name, creating it if needed.
    pub fn put_context(&self, kind: ContextKind, name: &str) -> Result<Context, StoreError> {
        self.store.put_context(kind, name)
    }

    /// Returns the `node` context of a pipeline node.
    pub fn node_context(&self, node: &str) -> Result<Context, StoreError> {
        self.put_context(ContextKind::Node, node)
    }

    /// Returns the pipeline's end-node context.
    pub fn end_node_context(&self) -> Result<Context, StoreError> {
        self.node_context(&end_node_context_name(&self.pipeline_name))
    }

    /// Returns the `pipeline` context.
    pub fn pipeline_context(&self) -> Result<Context, StoreError> {
        self.put_context(ContextKind::Pipeline, &self.pipeline_name)
    }

    /// Records a finished run whose end node published `channels`.
    pub fn put_run(&self, run_id: &str, channels: &Channels<'_>) -> Result<Context, StoreError> {
        self.put_run_with_state(run_id, ExecutionState::Complete, channels)
            .map(|(run, _)| run)
    }

    /// Records a run whose end node is in `state`.
    ///
    /// The end node is attached to the run, end-node and pipeline contexts and
    /// publishes `channels` as `INTERNAL_OUTPUT` events.
    pub fn put_run_with_state(
        &self,
        run_id: &str,
        state: ExecutionState,
        channels: &Channels<'_>,
    ) -> Result<(Context, Execution), StoreError> {
        let run = self.put_context(ContextKind::PipelineRun, run_id)?;
        let pipeline = self.pipeline_context()?;
        let end = self.end_node_context()?;
        let end_node =
            self.put_execution(END_NODE_EXECUTION_TYPE, state, &[&pipeline, &run, &end])?;
        self.put_events(&end_node, EventKind::InternalOutput, channels)?;
        Ok((run, end_node))
    }

    /// Records a completed execution publishing `outputs` as `OUTPUT` events.
    pub fn put_output_execution(
        &self,
        type_name: &str,
        outputs: &Channels<'_>,
        contexts: &[&Context],
    ) -> Result<Execution, StoreError> {
        let execution = self.put_execution(type_name, ExecutionState::Complete, contexts)?;
        self.put_events(&execution, EventKind::Output, outputs)?;
        Ok(execution)
    }

    /// Records an execution associated with `contexts`.
    pub fn put_execution(
        &self,
        type_name: &str,
        state: ExecutionState,
        contexts: &[&Context],
    ) -> Result<Execution, StoreError> {
        let ids: Vec<_> = contexts.iter().map(|c| c.id).collect();
        self.store.put_execution(type_name, state, &ids)
    }

    fn put_events(
        &self,
        execution: &Execution,
        kind: EventKind,
        channels: &Channels<'_>,
    ) -> Result<(), StoreError> {
        for (key, artifacts) in channels {
            for (index, artifact) in (0u32..).zip(artifacts.iter()) {
                self.store
                    .put_event(execution.id, artifact.id, kind, EventPath::new(*key, index))?;
            }
        }
        Ok(())
    }
}
