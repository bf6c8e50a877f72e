//! Rebuilds a run's output channels from its end node's events.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use super::ChannelMapping;
use crate::errors::{ConsistencyError, ResolverError, Result};
use crate::metadata::{ArtifactId, EventKind, Execution};
use crate::store::MetadataStore;

/// Turns an end node's `INTERNAL_OUTPUT` events into a [`ChannelMapping`].
#[derive(Clone, Copy)]
pub struct ChannelMaterializer<'a> {
    store: &'a dyn MetadataStore,
}

impl<'a> ChannelMaterializer<'a> {
    /// Creates a materializer reading from `store`.
    #[must_use]
    pub fn new(store: &'a dyn MetadataStore) -> Self {
        Self { store }
    }

    /// Collects the end node's channels, artifacts ordered by event index.
    ///
    /// An end node without `INTERNAL_OUTPUT` events yields an empty mapping.
    ///
    /// # Errors
    ///
    /// Returns a `ConsistencyError` if two events share a key and index or an
    /// event points at an artifact the store does not have, and propagates
    /// store failures.
    pub fn materialize(&self, end_node: &Execution) -> Result<ChannelMapping> {
        let events = self
            .store
            .list_events_for_execution(end_node.id, EventKind::InternalOutput)?;
        if events.is_empty() {
            debug!(execution_id = %end_node.id, "End node published no outputs");
            return Ok(ChannelMapping::new());
        }

        let mut channels: BTreeMap<String, BTreeMap<u32, ArtifactId>> = BTreeMap::new();
        for event in &events {
            let slots = channels.entry(event.path.key.clone()).or_default();
            if slots.insert(event.path.index, event.artifact_id).is_some() {
                return Err(ConsistencyError::DuplicateEventIndex {
                    execution: end_node.id,
                    key: event.path.key.clone(),
                    index: event.path.index,
                }
                .into());
            }
        }

        let ids: Vec<ArtifactId> = events.iter().map(|e| e.artifact_id).collect();
        let artifacts: HashMap<_, _> = self
            .store
            .get_artifacts_by_ids(&ids)?
            .into_iter()
            .map(|a| (a.id, a))
            .collect();

        channels
            .into_iter()
            .map(|(key, slots)| {
                let resolved = slots
                    .into_values()
                    .map(|id| {
                        artifacts.get(&id).cloned().ok_or_else(|| {
                            ResolverError::from(ConsistencyError::MissingArtifact {
                                execution: end_node.id,
                                artifact: id,
                                key: key.clone(),
                            })
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok((key, resolved))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::{EventPath, ExecutionState};
    use crate::store::{InMemoryMetadataStore, MockMetadataStore};
    use crate::utils::now_utc;
    use pretty_assertions::assert_eq;

    fn end_node(store: &InMemoryMetadataStore) -> Execution {
        store
            .put_execution("EndNode", ExecutionState::Complete, &[])
            .unwrap()
    }

    #[test]
    fn test_groups_by_key_and_orders_by_index() {
        let store = InMemoryMetadataStore::new();
        let execution = end_node(&store);
        let a = store.put_artifact("Examples").unwrap();
        let b = store.put_artifact("Examples").unwrap();
        let c = store.put_artifact("ExampleStatistics").unwrap();

        // Recorded out of index order.
        store
            .put_event(execution.id, b.id, EventKind::InternalOutput, EventPath::new("k1", 1))
            .unwrap();
        store
            .put_event(execution.id, c.id, EventKind::InternalOutput, EventPath::new("k2", 0))
            .unwrap();
        store
            .put_event(execution.id, a.id, EventKind::InternalOutput, EventPath::new("k1", 0))
            .unwrap();

        let mapping = ChannelMaterializer::new(&store).materialize(&execution).unwrap();
        assert_eq!(mapping.keys().collect::<Vec<_>>(), vec!["k1", "k2"]);
        assert_eq!(mapping.get("k1").unwrap(), &[a, b][..]);
        assert_eq!(mapping.get("k2").unwrap(), &[c][..]);
    }

    #[test]
    fn test_ignores_plain_output_events() {
        let store = InMemoryMetadataStore::new();
        let execution = end_node(&store);
        let a = store.put_artifact("Examples").unwrap();
        store
            .put_event(execution.id, a.id, EventKind::Output, EventPath::new("examples", 0))
            .unwrap();

        let mapping = ChannelMaterializer::new(&store).materialize(&execution).unwrap();
        assert!(mapping.is_empty());
    }

    #[test]
    fn test_same_artifact_in_two_channels() {
        let store = InMemoryMetadataStore::new();
        let execution = end_node(&store);
        let a = store.put_artifact("Examples").unwrap();
        store
            .put_event(execution.id, a.id, EventKind::InternalOutput, EventPath::new("train", 0))
            .unwrap();
        store
            .put_event(execution.id, a.id, EventKind::InternalOutput, EventPath::new("eval", 0))
            .unwrap();

        let mapping = ChannelMaterializer::new(&store).materialize(&execution).unwrap();
        assert_eq!(mapping.get("train").unwrap()[0].id, a.id);
        assert_eq!(mapping.get("eval").unwrap()[0].id, a.id);
    }

    #[test]
    fn test_duplicate_index_is_a_consistency_error() {
        let store = InMemoryMetadataStore::new();
        let execution = end_node(&store);
        let a = store.put_artifact("Examples").unwrap();
        let b = store.put_artifact("Examples").unwrap();
        for artifact in [&a, &b] {
            store
                .put_event(
                    execution.id,
                    artifact.id,
                    EventKind::InternalOutput,
                    EventPath::new("examples", 0),
                )
                .unwrap();
        }

        let err = ChannelMaterializer::new(&store).materialize(&execution).unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Consistency(ConsistencyError::DuplicateEventIndex { index: 0, .. })
        ));
    }

    #[test]
    fn test_missing_artifact_is_a_consistency_error() {
        let execution = Execution::new(
            crate::metadata::ExecutionId::new(1),
            "EndNode",
            ExecutionState::Complete,
            now_utc(),
        );
        let mut store = MockMetadataStore::new();
        store.expect_list_events_for_execution().returning(|execution, kind| {
            Ok(vec![crate::metadata::Event::new(
                execution,
                ArtifactId::new(7),
                kind,
                EventPath::new("examples", 0),
                now_utc(),
            )])
        });
        store
            .expect_get_artifacts_by_ids()
            .returning(|_| Ok(Vec::new()));

        let err = ChannelMaterializer::new(&store).materialize(&execution).unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Consistency(ConsistencyError::MissingArtifact { artifact, .. })
                if artifact == ArtifactId::new(7)
        ));
    }
}
