//! Picks the newest run with a complete, non-empty end-node output.

use tracing::debug;

use super::{
    ChannelMaterializer, EndNodeLocator, PipelineRunIndex, ResolveOutcome, ResolvedRun,
    SkipReason,
};
use crate::errors::Result;
use crate::store::MetadataStore;

/// Walks a pipeline's runs newest first and stops at the first one whose end
/// node published at least one channel.
///
/// Runs are never merged: the first qualifying run's end node is the whole
/// answer.
#[derive(Clone, Copy)]
pub struct LatestRunSelector<'a> {
    store: &'a dyn MetadataStore,
    pipeline_name: &'a str,
}

impl<'a> LatestRunSelector<'a> {
    /// Creates a selector for `pipeline_name`.
    #[must_use]
    pub fn new(store: &'a dyn MetadataStore, pipeline_name: &'a str) -> Self {
        Self {
            store,
            pipeline_name,
        }
    }

    /// Resolves the latest qualifying run.
    ///
    /// # Errors
    ///
    /// Propagates store failures and consistency violations hit while probing.
    /// A violation in a run newer than the first qualifying one aborts the
    /// resolution rather than being skipped.
    pub fn select(&self) -> Result<ResolveOutcome> {
        let index = PipelineRunIndex::new(self.store).lookup(self.pipeline_name)?;
        let Some(index) = index.filter(|i| !i.runs.is_empty()) else {
            debug!(pipeline = %self.pipeline_name, "Pipeline has no runs");
            return Ok(ResolveOutcome::Skipped(SkipReason::NoRuns {
                pipeline: self.pipeline_name.to_string(),
            }));
        };

        let end_node_context = index.end_node_context.clone();
        let locator = EndNodeLocator::new(self.store, &end_node_context);
        let materializer = ChannelMaterializer::new(self.store);

        let candidates = index.newest_first();
        let total = candidates.len();
        for (probed, run) in candidates.into_iter().enumerate() {
            debug!(
                pipeline = %self.pipeline_name,
                run_id = %run.run_id(),
                position = probed,
                "Probing run"
            );
            let Some(end_node) = locator.locate(&run)? else {
                continue;
            };
            let channels = materializer.materialize(&end_node)?;
            if channels.is_empty() {
                debug!(
                    run_id = %run.run_id(),
                    "Run has an empty end-node output, trying older runs"
                );
                continue;
            }
            return Ok(ResolveOutcome::Resolved(ResolvedRun {
                run_id: run.run_id().to_string(),
                context_id: run.context.id,
                end_node: end_node.id,
                channels,
            }));
        }

        Ok(ResolveOutcome::Skipped(SkipReason::NoQualifyingRun {
            pipeline: self.pipeline_name.to_string(),
            probed: total,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ResolverError, StoreError};
    use crate::metadata::{
        Artifact, ArtifactId, Context, ContextId, ContextKind, Event, EventKind, EventPath,
        Execution, ExecutionId, ExecutionState,
    };
    use crate::store::{InMemoryMetadataStore, MockMetadataStore};
    use crate::testing::StoreFixture;
    use crate::utils::now_utc;

    #[test]
    fn test_skips_runs_without_end_node() {
        let fixture = StoreFixture::new("p");
        let a1 = fixture.put_artifact("Examples").unwrap();
        fixture.put_run("run-001", &[("examples", &[&a1])]).unwrap();
        // Newer run that never reached its end node.
        let node = fixture.node_context("example-gen").unwrap();
        let end = fixture.end_node_context().unwrap();
        let run_2 = fixture
            .put_context(ContextKind::PipelineRun, "run-002")
            .unwrap();
        let a2 = fixture.put_artifact("Examples").unwrap();
        fixture
            .put_output_execution("ExampleGen", &[("examples", &[&a2])], &[&node, &run_2, &end])
            .unwrap();

        let outcome = LatestRunSelector::new(fixture.store().as_ref(), "p")
            .select()
            .unwrap();
        let run = outcome.run().unwrap();
        assert_eq!(run.run_id, "run-001");
        assert_eq!(run.channels.artifact_ids()["examples"], vec![a1.id]);
    }

    #[test]
    fn test_empty_end_node_output_does_not_qualify() {
        let fixture = StoreFixture::new("p");
        let a1 = fixture.put_artifact("Examples").unwrap();
        fixture.put_run("run-001", &[("examples", &[&a1])]).unwrap();
        fixture.put_run("run-002", &[]).unwrap();

        let outcome = LatestRunSelector::new(fixture.store().as_ref(), "p")
            .select()
            .unwrap();
        assert_eq!(outcome.run().unwrap().run_id, "run-001");
    }

    #[test]
    fn test_no_qualifying_run_reports_probe_count() {
        let fixture = StoreFixture::new("p");
        fixture.put_run("run-001", &[]).unwrap();
        fixture.put_run("run-002", &[]).unwrap();

        let outcome = LatestRunSelector::new(fixture.store().as_ref(), "p")
            .select()
            .unwrap();
        assert_eq!(
            outcome,
            ResolveOutcome::Skipped(SkipReason::NoQualifyingRun {
                pipeline: "p".to_string(),
                probed: 2,
            })
        );
    }

    #[test]
    fn test_end_node_context_without_runs_is_no_runs() {
        let store = InMemoryMetadataStore::new();
        store.put_context(ContextKind::Node, "p.p_end").unwrap();

        let outcome = LatestRunSelector::new(&store, "p").select().unwrap();
        assert_eq!(
            outcome,
            ResolveOutcome::Skipped(SkipReason::NoRuns {
                pipeline: "p".to_string()
            })
        );
    }

    /// Mock store holding runs 2 (older) and 3 (newer) that share end node
    /// 10. Fails the test if the older run is ever probed.
    fn two_run_store() -> MockMetadataStore {
        let end = Context::new(ContextId::new(1), ContextKind::Node, "p.p_end", now_utc());
        let run_old = Context::new(
            ContextId::new(2),
            ContextKind::PipelineRun,
            "run-001",
            now_utc(),
        );
        let run_new = Context::new(
            ContextId::new(3),
            ContextKind::PipelineRun,
            "run-002",
            now_utc() + chrono::Duration::seconds(1),
        );
        let end_node = Execution::new(
            ExecutionId::new(10),
            "EndNode",
            ExecutionState::Complete,
            now_utc(),
        );

        let mut store = MockMetadataStore::new();
        let end_for_lookup = end.clone();
        store
            .expect_list_contexts()
            .returning(move |_, _| Ok(vec![end_for_lookup.clone()]));
        store
            .expect_list_executions_for_contexts()
            .returning(move |ids| {
                // Index lookup passes only the end-node context; probes pass
                // the run context first.
                if ids.len() == 2 {
                    assert_eq!(ids[0], ContextId::new(3), "older run must not be probed");
                }
                Ok(vec![end_node.clone()])
            });
        let runs = vec![end, run_old, run_new];
        store
            .expect_list_contexts_for_execution()
            .returning(move |_| Ok(runs.clone()));
        store
    }

    fn one_output_event(execution: ExecutionId, kind: EventKind) -> Vec<Event> {
        vec![Event::new(
            execution,
            ArtifactId::new(20),
            kind,
            EventPath::new("examples", 0),
            now_utc(),
        )]
    }

    #[test]
    fn test_stops_at_first_qualifying_run() {
        let mut store = two_run_store();
        store
            .expect_list_events_for_execution()
            .times(1)
            .returning(|execution, kind| Ok(one_output_event(execution, kind)));
        store.expect_get_artifacts_by_ids().times(1).returning(|ids| {
            Ok(ids
                .iter()
                .map(|id| Artifact::new(*id, "Examples", now_utc()))
                .collect())
        });

        let outcome = LatestRunSelector::new(&store, "p").select().unwrap();
        assert_eq!(outcome.run().unwrap().run_id, "run-002");
    }

    #[test]
    fn test_artifact_fetch_failure_aborts_without_trying_older_runs() {
        let mut store = two_run_store();
        store
            .expect_list_events_for_execution()
            .times(1)
            .returning(|execution, kind| Ok(one_output_event(execution, kind)));
        store
            .expect_get_artifacts_by_ids()
            .times(1)
            .returning(|_| Err(StoreError::query("get_artifacts_by_ids", "deadline exceeded")));

        let err = LatestRunSelector::new(&store, "p").select().unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Store(ref e)
                if *e == StoreError::query("get_artifacts_by_ids", "deadline exceeded")
        ));
    }

    #[test]
    fn test_event_listing_failure_aborts_without_trying_older_runs() {
        let mut store = two_run_store();
        store
            .expect_list_events_for_execution()
            .times(1)
            .returning(|_, _| Err(StoreError::Unavailable("connection reset".to_string())));
        store.expect_get_artifacts_by_ids().never();

        let err = LatestRunSelector::new(&store, "p").select().unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Store(StoreError::Unavailable(ref msg)) if msg == "connection reset"
        ));
    }

    #[test]
    fn test_store_failure_propagates_unchanged() {
        let mut store = MockMetadataStore::new();
        store
            .expect_list_contexts()
            .returning(|_, _| Err(StoreError::Unavailable("connection refused".to_string())));

        let err = LatestRunSelector::new(&store, "p").select().unwrap_err();
        assert!(matches!(
            err,
            ResolverError::Store(StoreError::Unavailable(ref msg)) if msg == "connection refused"
        ));
    }
}
