//! Read-only query facade over the metadata store.
//!
//! The resolver consumes the store exclusively through [`MetadataStore`].
//! Every call is a blocking query against a store that other processes may be
//! writing to, so no two calls are assumed to observe the same snapshot.

mod memory;
mod predicate;
mod snapshot;

pub use memory::InMemoryMetadataStore;
pub use predicate::NamePredicate;
pub use snapshot::{Association, StoreSnapshot};

use std::sync::Arc;

use crate::errors::StoreError;
use crate::metadata::{
    Artifact, ArtifactId, Context, ContextId, ContextKind, Event, EventKind, Execution,
    ExecutionId,
};

/// A shared, read-only store handle.
pub type StoreHandle = Arc<dyn MetadataStore>;

/// Read-only queries the resolver issues against the metadata store.
///
/// Implementations must validate raw type strings into the closed kind enums
/// and report anything that does not fit as [`StoreError::Malformed`].
#[cfg_attr(test, mockall::automock)]
pub trait MetadataStore: Send + Sync {
    /// Lists contexts of one kind whose name matches `name`, ordered by id.
    fn list_contexts(
        &self,
        kind: ContextKind,
        name: &NamePredicate,
    ) -> Result<Vec<Context>, StoreError>;

    /// Lists executions associated with every context in `contexts`, ordered by id.
    ///
    /// An empty `contexts` slice matches nothing.
    fn list_executions_for_contexts(
        &self,
        contexts: &[ContextId],
    ) -> Result<Vec<Execution>, StoreError>;

    /// Lists the contexts an execution is associated with, ordered by id.
    fn list_contexts_for_execution(
        &self,
        execution: ExecutionId,
    ) -> Result<Vec<Context>, StoreError>;

    /// Lists the events of one kind recorded for an execution.
    fn list_events_for_execution(
        &self,
        execution: ExecutionId,
        kind: EventKind,
    ) -> Result<Vec<Event>, StoreError>;

    /// Fetches artifacts by id. Unknown ids are omitted from the result.
    fn get_artifacts_by_ids(&self, ids: &[ArtifactId]) -> Result<Vec<Artifact>, StoreError>;
}
