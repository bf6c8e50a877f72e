//! The `LatestPipelineRun` resolver operation.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{error, info, warn};

use super::{LatestRunSelector, ResolveOutcome};
use crate::errors::{ConfigError, ResolverError, Result};
use crate::events::{NoOpEventSink, ResolutionEvent, ResolutionEventSink};
use crate::observability::{ResolutionSpanAttributes, SpanTimer};
use crate::store::StoreHandle;
use crate::utils::generate_uuid;

/// Options of [`LatestPipelineRun`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LatestPipelineRunConfig {
    /// The pipeline whose runs are resolved.
    pub pipeline_name: String,
}

impl LatestPipelineRunConfig {
    /// Creates a configuration for `pipeline_name`.
    #[must_use]
    pub fn new(pipeline_name: impl Into<String>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
        }
    }

    /// Checks the options.
    ///
    /// # Errors
    ///
    /// Returns a `ConfigError` if the pipeline name is empty or has
    /// surrounding whitespace.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.pipeline_name.is_empty() {
            return Err(ConfigError::new("pipeline_name", "must not be empty"));
        }
        if self.pipeline_name.trim() != self.pipeline_name {
            return Err(ConfigError::new(
                "pipeline_name",
                "must not have leading or trailing whitespace",
            ));
        }
        Ok(())
    }
}

/// Everything an operation needs at invocation time.
#[derive(Clone)]
pub struct ResolverContext {
    store: StoreHandle,
    event_sink: Arc<dyn ResolutionEventSink>,
}

impl ResolverContext {
    /// Creates a context over a read-only store handle.
    #[must_use]
    pub fn new(store: StoreHandle) -> Self {
        Self {
            store,
            event_sink: Arc::new(NoOpEventSink),
        }
    }

    /// Sets the sink that receives resolution events.
    #[must_use]
    pub fn with_event_sink(mut self, sink: Arc<dyn ResolutionEventSink>) -> Self {
        self.event_sink = sink;
        self
    }

    /// Returns the store handle.
    #[must_use]
    pub fn store(&self) -> &StoreHandle {
        &self.store
    }

    /// Returns the event sink.
    #[must_use]
    pub fn event_sink(&self) -> &Arc<dyn ResolutionEventSink> {
        &self.event_sink
    }
}

impl fmt::Debug for ResolverContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolverContext").finish_non_exhaustive()
    }
}

/// The calls a resolver framework makes on an operation.
///
/// Operations are created with their options, bound to a context, then
/// resolved any number of times.
pub trait ResolverOp: Send + Sync {
    /// Returns the operation name.
    fn name(&self) -> &str;

    /// Binds the invocation context, replacing any previous one.
    fn set_context(&mut self, context: ResolverContext);

    /// Resolves against the bound context.
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::ContextNotBound` if no context is bound.
    fn resolve(&self) -> Result<ResolveOutcome>;
}

/// Resolves the output channels of the latest completed run of a pipeline.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use runresolver::prelude::*;
///
/// let store = Arc::new(InMemoryMetadataStore::new());
/// let mut op = LatestPipelineRun::create(LatestPipelineRunConfig::new("taxi")).unwrap();
/// op.set_context(ResolverContext::new(store));
///
/// assert!(op.resolve().unwrap().is_skipped());
/// ```
#[derive(Debug, Clone)]
pub struct LatestPipelineRun {
    config: LatestPipelineRunConfig,
    context: Option<ResolverContext>,
}

impl LatestPipelineRun {
    /// The operation name.
    pub const NAME: &'static str = "LatestPipelineRun";

    /// Creates an unbound operation.
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::Config` if the options are invalid.
    pub fn create(config: LatestPipelineRunConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            context: None,
        })
    }

    /// Creates an unbound operation from a JSON options object.
    ///
    /// # Errors
    ///
    /// Returns `ResolverError::Config` if the object does not describe valid
    /// options.
    pub fn from_props(props: serde_json::Value) -> Result<Self> {
        let config: LatestPipelineRunConfig = serde_json::from_value(props)
            .map_err(|e| ConfigError::new("props", e.to_string()))?;
        Self::create(config)
    }

    /// Returns the configured pipeline name.
    #[must_use]
    pub fn pipeline_name(&self) -> &str {
        &self.config.pipeline_name
    }

    /// Returns true once a context has been bound.
    #[must_use]
    pub const fn is_bound(&self) -> bool {
        self.context.is_some()
    }

    /// Resolves on the blocking thread pool, for callers on an async runtime.
    ///
    /// # Errors
    ///
    /// Same as [`ResolverOp::resolve`], plus `ResolverError::Internal` if the
    /// blocking task panics.
    pub async fn resolve_async(&self) -> Result<ResolveOutcome> {
        let op = self.clone();
        tokio::task::spawn_blocking(move || op.resolve())
            .await
            .map_err(|e| ResolverError::Internal(format!("resolution task failed: {e}")))?
    }

    fn report(
        &self,
        context: &ResolverContext,
        attributes: ResolutionSpanAttributes,
        result: &Result<ResolveOutcome>,
    ) {
        match result {
            Ok(ResolveOutcome::Resolved(run)) => {
                info!(
                    pipeline = %self.config.pipeline_name,
                    run_id = %run.run_id,
                    channels = ?run.channels.keys().collect::<Vec<_>>(),
                    duration_ms = ?attributes.duration_ms,
                    "Resolved latest pipeline run"
                );
            }
            Ok(ResolveOutcome::Skipped(reason)) => {
                info!(
                    pipeline = %self.config.pipeline_name,
                    %reason,
                    duration_ms = ?attributes.duration_ms,
                    "No pipeline run to resolve; skipping"
                );
            }
            Err(err) if err.is_fatal() => {
                error!(
                    pipeline = %self.config.pipeline_name,
                    code = err.code(),
                    error = %err,
                    "Resolution failed"
                );
            }
            Err(err) => {
                warn!(
                    pipeline = %self.config.pipeline_name,
                    code = err.code(),
                    error = %err,
                    "Resolution failed"
                );
            }
        }
        context.event_sink().emit(&ResolutionEvent::new(result, attributes));
    }
}

impl ResolverOp for LatestPipelineRun {
    fn name(&self) -> &str {
        Self::NAME
    }

    fn set_context(&mut self, context: ResolverContext) {
        self.context = Some(context);
    }

    fn resolve(&self) -> Result<ResolveOutcome> {
        let Some(context) = &self.context else {
            error!(
                op = Self::NAME,
                pipeline = %self.config.pipeline_name,
                "resolve() called before set_context()"
            );
            return Err(ResolverError::context_not_bound(Self::NAME));
        };

        let resolution_id = generate_uuid();
        let span = tracing::info_span!(
            "resolve",
            op = Self::NAME,
            pipeline = %self.config.pipeline_name,
            %resolution_id
        );
        let _entered = span.enter();
        let timer = SpanTimer::start();

        let result =
            LatestRunSelector::new(context.store().as_ref(), &self.config.pipeline_name).select();

        let attributes = ResolutionSpanAttributes::new(&self.config.pipeline_name)
            .with_resolution_id(resolution_id.to_string())
            .with_result(&result)
            .with_duration_ms(timer.finish());
        self.report(context, attributes, &result);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::StoreError;
    use crate::events::{CollectingEventSink, LoggingEventSink, ResolutionEventKind};
    use crate::store::{InMemoryMetadataStore, MockMetadataStore};
    use crate::testing::StoreFixture;

    #[test]
    fn test_config_validation() {
        assert!(LatestPipelineRunConfig::new("p").validate().is_ok());
        assert!(LatestPipelineRunConfig::new("").validate().is_err());
        assert!(LatestPipelineRunConfig::new(" p").validate().is_err());
    }

    #[test]
    fn test_create_rejects_empty_pipeline_name() {
        let err = LatestPipelineRun::create(LatestPipelineRunConfig::new("")).unwrap_err();
        assert!(matches!(err, ResolverError::Config(ref e) if e.field == "pipeline_name"));
    }

    #[test]
    fn test_from_props() {
        let op = LatestPipelineRun::from_props(serde_json::json!({"pipeline_name": "taxi"}))
            .unwrap();
        assert_eq!(op.pipeline_name(), "taxi");
        assert_eq!(op.name(), "LatestPipelineRun");
        assert!(!op.is_bound());

        let err = LatestPipelineRun::from_props(serde_json::json!({"pipeline": "taxi"}))
            .unwrap_err();
        assert_eq!(err.code(), "RESOLVE-CONFIG");
    }

    #[test]
    fn test_resolve_before_set_context_fails_fast() {
        let op = LatestPipelineRun::create(LatestPipelineRunConfig::new("p")).unwrap();
        let err = op.resolve().unwrap_err();
        assert!(matches!(
            err,
            ResolverError::ContextNotBound { ref op } if op == "LatestPipelineRun"
        ));
    }

    #[test]
    fn test_events_emitted_per_outcome() {
        let fixture = StoreFixture::new("p");
        let sink = Arc::new(CollectingEventSink::new());
        let mut op = LatestPipelineRun::create(LatestPipelineRunConfig::new("p")).unwrap();
        op.set_context(fixture.context().with_event_sink(sink.clone()));

        assert!(op.resolve().unwrap().is_skipped());

        let a1 = fixture.put_artifact("Examples").unwrap();
        fixture.put_run("run-001", &[("examples", &[&a1])]).unwrap();
        assert!(op.resolve().unwrap().is_resolved());

        assert_eq!(
            sink.event_types(),
            vec!["resolution.skipped", "resolution.resolved"]
        );
        let resolved = &sink.events()[1];
        assert_eq!(resolved.attributes.run_id.as_deref(), Some("run-001"));
        assert!(resolved.attributes.resolution_id.is_some());
    }

    #[test]
    fn test_failed_resolution_emits_failed_event() {
        let mut store = MockMetadataStore::new();
        store
            .expect_list_contexts()
            .returning(|_, _| Err(StoreError::Unavailable("connection refused".to_string())));
        let sink = Arc::new(CollectingEventSink::new());
        let mut op = LatestPipelineRun::create(LatestPipelineRunConfig::new("p")).unwrap();
        op.set_context(ResolverContext::new(Arc::new(store)).with_event_sink(sink.clone()));

        assert!(op.resolve().is_err());
        let events = sink.events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, ResolutionEventKind::Failed);
        assert_eq!(events[0].attributes.error_code.as_deref(), Some("RESOLVE-STORE"));
    }

    #[test]
    fn test_logging_sink_through_resolution() {
        let fixture = StoreFixture::new("p");
        let a1 = fixture.put_artifact("Examples").unwrap();
        fixture.put_run("run-001", &[("examples", &[&a1])]).unwrap();

        for sink in [LoggingEventSink::debug(), LoggingEventSink::info()] {
            let mut op = LatestPipelineRun::create(LatestPipelineRunConfig::new("p")).unwrap();
            op.set_context(fixture.context().with_event_sink(Arc::new(sink)));
            let outcome = op.resolve().unwrap();
            assert_eq!(outcome.run().map(|run| run.run_id.as_str()), Some("run-001"));
        }

        let mut op = LatestPipelineRun::create(LatestPipelineRunConfig::new("q")).unwrap();
        op.set_context(fixture.context().with_event_sink(Arc::new(LoggingEventSink::default())));
        assert!(op.resolve().unwrap().is_skipped());
    }

    #[test]
    fn test_rebinding_switches_store() {
        let fixture = StoreFixture::new("p");
        let a1 = fixture.put_artifact("Examples").unwrap();
        fixture.put_run("run-001", &[("examples", &[&a1])]).unwrap();

        let mut op = LatestPipelineRun::create(LatestPipelineRunConfig::new("p")).unwrap();
        op.set_context(fixture.context());
        assert!(op.resolve().unwrap().is_resolved());

        op.set_context(ResolverContext::new(Arc::new(InMemoryMetadataStore::new())));
        assert!(op.resolve().unwrap().is_skipped());
    }

    #[tokio::test]
    async fn test_resolve_async_matches_resolve() {
        let fixture = StoreFixture::new("p");
        let a1 = fixture.put_artifact("Examples").unwrap();
        fixture.put_run("run-001", &[("examples", &[&a1])]).unwrap();

        let mut op = LatestPipelineRun::create(LatestPipelineRunConfig::new("p")).unwrap();
        op.set_context(fixture.context());

        let sync_outcome = op.resolve().unwrap();
        let async_outcome = op.resolve_async().await.unwrap();
        assert_eq!(sync_outcome, async_outcome);
    }

    #[tokio::test]
    async fn test_resolve_async_unbound() {
        let op = LatestPipelineRun::create(LatestPipelineRunConfig::new("p")).unwrap();
        let err = op.resolve_async().await.unwrap_err();
        assert_eq!(err.code(), "RESOLVE-UNBOUND");
    }
}
