//! In-memory metadata store.

use parking_lot::RwLock;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::path::Path;

use super::{Association, MetadataStore, NamePredicate, StoreSnapshot};
use crate::errors::StoreError;
use crate::metadata::{
    Artifact, ArtifactId, Context, ContextId, ContextKind, Event, EventKind, EventPath,
    Execution, ExecutionId, ExecutionState,
};
use crate::utils::{from_epoch_millis, now_utc, to_epoch_millis, Timestamp};

#[derive(Debug, Default)]
struct Tables {
    artifacts: BTreeMap<ArtifactId, Artifact>,
    executions: BTreeMap<ExecutionId, Execution>,
    contexts: BTreeMap<ContextId, Context>,
    associations: BTreeSet<Association>,
    events: Vec<Event>,
    last_id: i64,
    last_millis: i64,
}

impl Tables {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Store clock: wall time, forced strictly increasing so creation order
    /// is always recoverable from timestamps.
    fn stamp(&mut self) -> Result<Timestamp, StoreError> {
        let millis = to_epoch_millis(&now_utc()).max(self.last_millis + 1);
        self.last_millis = millis;
        Ok(from_epoch_millis(millis)?)
    }

    fn context_named(&self, kind: ContextKind, name: &str) -> Option<&Context> {
        self.contexts
            .values()
            .find(|c| c.kind == kind && c.name == name)
    }

    fn require_execution(&self, op: &str, id: ExecutionId) -> Result<(), StoreError> {
        if self.executions.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::query(op, format!("unknown execution {id}")))
        }
    }

    fn require_context(&self, op: &str, id: ContextId) -> Result<(), StoreError> {
        if self.contexts.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::query(op, format!("unknown context {id}")))
        }
    }

    fn require_artifact(&self, op: &str, id: ArtifactId) -> Result<(), StoreError> {
        if self.artifacts.contains_key(&id) {
            Ok(())
        } else {
            Err(StoreError::query(op, format!("unknown artifact {id}")))
        }
    }
}

/// A thread-safe metadata store held in memory.
///
/// Besides implementing the read-only [`MetadataStore`] facade it exposes the
/// writer calls an orchestrator makes while running a pipeline, and can be
/// loaded from or dumped to a JSON [`StoreSnapshot`]. Ids are allocated from a
/// single increasing counter shared by all tables.
#[derive(Debug, Default)]
pub struct InMemoryMetadataStore {
    tables: RwLock<Tables>,
}

impl InMemoryMetadataStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a new artifact of the given type.
    pub fn put_artifact(&self, type_name: &str) -> Result<Artifact, StoreError> {
        let mut tables = self.tables.write();
        let id = ArtifactId::new(tables.next_id());
        let created_at = tables.stamp()?;
        let artifact = Artifact::new(id, type_name, created_at);
        tables.artifacts.insert(id, artifact.clone());
        Ok(artifact)
    }

    /// Returns the context with this kind and name, creating it if needed.
    pub fn put_context(&self, kind: ContextKind, name: &str) -> Result<Context, StoreError> {
        let mut tables = self.tables.write();
        if let Some(existing) = tables.context_named(kind, name) {
            return Ok(existing.clone());
        }
        let id = ContextId::new(tables.next_id());
        let created_at = tables.stamp()?;
        let context = Context::new(id, kind, name, created_at);
        tables.contexts.insert(id, context.clone());
        Ok(context)
    }

    /// Records a new execution associated with `contexts`.
    pub fn put_execution(
        &self,
        type_name: &str,
        state: ExecutionState,
        contexts: &[ContextId],
    ) -> Result<Execution, StoreError> {
        let mut tables = self.tables.write();
        for context in contexts {
            tables.require_context("put_execution", *context)?;
        }
        let id = ExecutionId::new(tables.next_id());
        let created_at = tables.stamp()?;
        let execution = Execution::new(id, type_name, state, created_at);
        tables.executions.insert(id, execution.clone());
        for context in contexts {
            tables.associations.insert(Association::new(*context, id));
        }
        Ok(execution)
    }

    /// Associates an existing execution with an existing context.
    pub fn put_association(
        &self,
        context: ContextId,
        execution: ExecutionId,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        tables.require_context("put_association", context)?;
        tables.require_execution("put_association", execution)?;
        tables.associations.insert(Association::new(context, execution));
        Ok(())
    }

    /// Records an event linking an execution to an artifact.
    pub fn put_event(
        &self,
        execution: ExecutionId,
        artifact: ArtifactId,
        kind: EventKind,
        path: EventPath,
    ) -> Result<Event, StoreError> {
        let mut tables = self.tables.write();
        tables.require_execution("put_event", execution)?;
        tables.require_artifact("put_event", artifact)?;
        let recorded_at = tables.stamp()?;
        let event = Event::new(execution, artifact, kind, path, recorded_at);
        tables.events.push(event.clone());
        Ok(event)
    }

    /// Updates the state of an existing execution.
    pub fn set_execution_state(
        &self,
        execution: ExecutionId,
        state: ExecutionState,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        match tables.executions.get_mut(&execution) {
            Some(record) => {
                record.state = state;
                Ok(())
            }
            None => Err(StoreError::query(
                "set_execution_state",
                format!("unknown execution {execution}"),
            )),
        }
    }

    /// Builds a store from a snapshot, checking that every reference resolves.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Malformed` on dangling references, duplicate ids
    /// or duplicate `(kind, name)` contexts.
    pub fn from_snapshot(snapshot: StoreSnapshot) -> Result<Self, StoreError> {
        let mut tables = Tables::default();
        let mut max_id = 0;
        let mut max_millis = 0;

        for artifact in snapshot.artifacts {
            max_id = max_id.max(artifact.id.get());
            max_millis = max_millis.max(to_epoch_millis(&artifact.created_at));
            if tables.artifacts.insert(artifact.id, artifact).is_some() {
                return Err(StoreError::malformed("duplicate artifact id"));
            }
        }
        for execution in snapshot.executions {
            max_id = max_id.max(execution.id.get());
            max_millis = max_millis.max(to_epoch_millis(&execution.created_at));
            if tables.executions.insert(execution.id, execution).is_some() {
                return Err(StoreError::malformed("duplicate execution id"));
            }
        }
        let mut names = HashSet::new();
        for context in snapshot.contexts {
            max_id = max_id.max(context.id.get());
            max_millis = max_millis.max(to_epoch_millis(&context.created_at));
            if !names.insert((context.kind, context.name.clone())) {
                return Err(StoreError::malformed(format!(
                    "duplicate {} context '{}'",
                    context.kind, context.name
                )));
            }
            if tables.contexts.insert(context.id, context).is_some() {
                return Err(StoreError::malformed("duplicate context id"));
            }
        }
        for association in snapshot.associations {
            if !tables.contexts.contains_key(&association.context_id)
                || !tables.executions.contains_key(&association.execution_id)
            {
                return Err(StoreError::malformed(format!(
                    "association {}->{} references a missing record",
                    association.context_id, association.execution_id
                )));
            }
            tables.associations.insert(association);
        }
        for event in snapshot.events {
            if !tables.executions.contains_key(&event.execution_id)
                || !tables.artifacts.contains_key(&event.artifact_id)
            {
                return Err(StoreError::malformed(format!(
                    "event {}->{} references a missing record",
                    event.execution_id, event.artifact_id
                )));
            }
            max_millis = max_millis.max(to_epoch_millis(&event.recorded_at));
            tables.events.push(event);
        }

        tables.last_id = max_id;
        tables.last_millis = max_millis;
        Ok(Self {
            tables: RwLock::new(tables),
        })
    }

    /// Dumps every record into a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> StoreSnapshot {
        let tables = self.tables.read();
        StoreSnapshot {
            artifacts: tables.artifacts.values().cloned().collect(),
            executions: tables.executions.values().cloned().collect(),
            contexts: tables.contexts.values().cloned().collect(),
            associations: tables.associations.iter().copied().collect(),
            events: tables.events.clone(),
        }
    }

    /// Loads a store from a JSON snapshot file.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let raw = std::fs::read_to_string(path)?;
        let snapshot: StoreSnapshot = serde_json::from_str(&raw)?;
        Self::from_snapshot(snapshot)
    }

    /// Writes the store to a JSON snapshot file.
    pub fn save_json(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let raw = serde_json::to_string_pretty(&self.snapshot())?;
        std::fs::write(path, raw)?;
        Ok(())
    }
}

impl MetadataStore for InMemoryMetadataStore {
    fn list_contexts(
        &self,
        kind: ContextKind,
        name: &NamePredicate,
    ) -> Result<Vec<Context>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .contexts
            .values()
            .filter(|c| c.kind == kind && name.matches(&c.name))
            .cloned()
            .collect())
    }

    fn list_executions_for_contexts(
        &self,
        contexts: &[ContextId],
    ) -> Result<Vec<Execution>, StoreError> {
        if contexts.is_empty() {
            return Ok(Vec::new());
        }
        let tables = self.tables.read();
        Ok(tables
            .executions
            .values()
            .filter(|e| {
                contexts
                    .iter()
                    .all(|c| tables.associations.contains(&Association::new(*c, e.id)))
            })
            .cloned()
            .collect())
    }

    fn list_contexts_for_execution(
        &self,
        execution: ExecutionId,
    ) -> Result<Vec<Context>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .associations
            .iter()
            .filter(|a| a.execution_id == execution)
            .filter_map(|a| tables.contexts.get(&a.context_id))
            .cloned()
            .collect())
    }

    fn list_events_for_execution(
        &self,
        execution: ExecutionId,
        kind: EventKind,
    ) -> Result<Vec<Event>, StoreError> {
        let tables = self.tables.read();
        Ok(tables
            .events
            .iter()
            .filter(|e| e.execution_id == execution && e.kind == kind)
            .cloned()
            .collect())
    }

    fn get_artifacts_by_ids(&self, ids: &[ArtifactId]) -> Result<Vec<Artifact>, StoreError> {
        let tables = self.tables.read();
        let mut seen = HashSet::new();
        Ok(ids
            .iter()
            .filter(|id| seen.insert(**id))
            .filter_map(|id| tables.artifacts.get(id))
            .cloned()
            .collect())
    }
}
