//! # Runresolver
//!
//! Resolves the output channels of the latest completed run of a pipeline
//! from an ML metadata store.
//!
//! A pipeline run ends with an end node that republishes the run's outputs
//! as `INTERNAL_OUTPUT` events. Runresolver finds the newest run whose end
//! node completed and published something, and returns those outputs as a
//! channel mapping:
//!
//! - **Read-only store facade**: all queries go through [`store::MetadataStore`]
//! - **Explicit outcomes**: `Resolved` or `Skipped`, with faults kept apart in
//!   [`errors::ResolverError`]
//! - **Deterministic recency**: runs are ordered by creation time, with ties
//!   broken by run id
//!
//! ## Quick Start
//!
//! ```rust
//! use runresolver::prelude::*;
//! use runresolver::testing::StoreFixture;
//!
//! let fixture = StoreFixture::new("taxi");
//! let examples = fixture.put_artifact("Examples").unwrap();
//! fixture.put_run("run-001", &[("examples", &[&examples])]).unwrap();
//!
//! let mut op = LatestPipelineRun::create(LatestPipelineRunConfig::new("taxi")).unwrap();
//! op.set_context(ResolverContext::new(fixture.store().clone()));
//!
//! let outcome = op.resolve().unwrap();
//! let channels = outcome.channels().unwrap();
//! assert_eq!(channels.get("examples").unwrap()[0].id, examples.id);
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod errors;
pub mod events;
pub mod metadata;
pub mod observability;
pub mod resolution;
pub mod store;
pub mod testing;
pub mod utils;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::errors::{ConfigError, ConsistencyError, ResolverError, StoreError};
    pub use crate::events::{
        CollectingEventSink, LoggingEventSink, NoOpEventSink, ResolutionEvent,
        ResolutionEventKind, ResolutionEventSink,
    };
    pub use crate::metadata::{
        Artifact, ArtifactId, Context, ContextId, ContextKind, Event, EventKind, EventPath,
        Execution, ExecutionId, ExecutionState,
    };
    pub use crate::observability::{init_tracing, LogFormat, TracingConfig};
    pub use crate::resolution::{
        ChannelMapping, LatestPipelineRun, LatestPipelineRunConfig, ResolveOutcome, ResolvedRun,
        ResolverContext, ResolverOp, SkipReason,
    };
    pub use crate::store::{InMemoryMetadataStore, MetadataStore, NamePredicate, StoreHandle};
    pub use crate::utils::{generate_uuid, iso_timestamp, Timestamp};
}
