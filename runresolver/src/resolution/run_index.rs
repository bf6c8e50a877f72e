//! Enumerates the runs of a pipeline.

use std::collections::BTreeMap;
use std::fmt;

use crate::errors::StoreError;
use crate::metadata::{end_node_context_name, Context, ContextId, ContextKind};
use crate::store::{MetadataStore, NamePredicate};
use crate::utils::Timestamp;

/// Orderable recency key of a pipeline run.
///
/// Compares by creation time, then run identifier, then context id. Creation
/// times can collide, so the trailing fields make the order total.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct RunRecency {
    created_at: Timestamp,
    run_id: String,
    context_id: ContextId,
}

impl RunRecency {
    /// Derives the recency key of a `pipeline_run` context.
    #[must_use]
    pub fn of(context: &Context) -> Self {
        Self {
            created_at: context.created_at,
            run_id: context.name.clone(),
            context_id: context.id,
        }
    }

    /// Returns the creation time component.
    #[must_use]
    pub const fn created_at(&self) -> Timestamp {
        self.created_at
    }
}

/// One run of a pipeline, identified by its `pipeline_run` context.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineRun {
    /// The `pipeline_run` context.
    pub context: Context,
    /// Ordering key.
    pub recency: RunRecency,
}

impl PipelineRun {
    /// Wraps a `pipeline_run` context.
    #[must_use]
    pub fn new(context: Context) -> Self {
        let recency = RunRecency::of(&context);
        Self { context, recency }
    }

    /// Returns the run identifier.
    #[must_use]
    pub fn run_id(&self) -> &str {
        &self.context.name
    }
}

impl fmt::Display for PipelineRun {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (context {})", self.context.name, self.context.id)
    }
}

/// The end-node context of a pipeline together with every run attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct RunIndex {
    /// The pipeline's end-node `node` context.
    pub end_node_context: Context,
    /// Runs in no particular order.
    pub runs: Vec<PipelineRun>,
}

impl RunIndex {
    /// Returns the runs newest first.
    #[must_use]
    pub fn newest_first(mut self) -> Vec<PipelineRun> {
        self.runs.sort_by(|a, b| b.recency.cmp(&a.recency));
        self.runs
    }
}

/// Finds the `pipeline_run` contexts belonging to a pipeline.
///
/// A run belongs to the pipeline when it shares an execution with the
/// pipeline's end-node context.
#[derive(Clone, Copy)]
pub struct PipelineRunIndex<'a> {
    store: &'a dyn MetadataStore,
}

impl<'a> PipelineRunIndex<'a> {
    /// Creates an index over `store`.
    #[must_use]
    pub fn new(store: &'a dyn MetadataStore) -> Self {
        Self { store }
    }

    /// Looks up the end-node context of `pipeline_name`.
    ///
    /// # Errors
    ///
    /// Propagates store failures. Two contexts with the same kind and name
    /// are reported as `StoreError::Malformed`.
    pub fn end_node_context(&self, pipeline_name: &str) -> Result<Option<Context>, StoreError> {
        let name = end_node_context_name(pipeline_name);
        let mut found = self
            .store
            .list_contexts(ContextKind::Node, &NamePredicate::exact(name.as_str()))?;
        match found.len() {
            0 | 1 => Ok(found.pop()),
            n => Err(StoreError::malformed(format!(
                "{n} node contexts are named '{name}'"
            ))),
        }
    }

    /// Lists the runs attached to an end-node context.
    pub fn runs_for(&self, end_node_context: &Context) -> Result<Vec<PipelineRun>, StoreError> {
        let executions = self
            .store
            .list_executions_for_contexts(&[end_node_context.id])?;

        let mut runs = BTreeMap::new();
        for execution in &executions {
            for context in self.store.list_contexts_for_execution(execution.id)? {
                if context.is_pipeline_run() {
                    runs.entry(context.id).or_insert(context);
                }
            }
        }
        Ok(runs.into_values().map(PipelineRun::new).collect())
    }

    /// Returns the pipeline's runs, or `None` if the pipeline has never run.
    pub fn lookup(&self, pipeline_name: &str) -> Result<Option<RunIndex>, StoreError> {
        let Some(end_node_context) = self.end_node_context(pipeline_name)? else {
            return Ok(None);
        };
        let runs = self.runs_for(&end_node_context)?;
        Ok(Some(RunIndex {
            end_node_context,
            runs,
        }))
    }
}
