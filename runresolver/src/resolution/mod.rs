//! Latest pipeline-run resolution.
//!
//! Resolution runs in four steps, each with its own component:
//!
//! 1. [`PipelineRunIndex`] finds the pipeline's end-node context and the runs
//!    attached to it.
//! 2. [`EndNodeLocator`] finds the `EndNode` execution of a run.
//! 3. [`ChannelMaterializer`] rebuilds the end node's output channels.
//! 4. [`LatestRunSelector`] walks runs newest first and stops at the first one
//!    with a non-empty mapping.
//!
//! [`LatestPipelineRun`] wraps the selector in the operation lifecycle
//! (create, bind, resolve).

mod end_node;
mod materializer;
mod op;
mod outcome;
mod run_index;
mod selector;


pub use end_node::EndNodeLocator;
pub use materializer::ChannelMaterializer;
pub use op::{LatestPipelineRun, LatestPipelineRunConfig, ResolverContext, ResolverOp};
pub use outcome::{ChannelMapping, ResolveOutcome, ResolvedRun, SkipReason};
pub use run_index::{PipelineRun, PipelineRunIndex, RunIndex, RunRecency};
pub use selector::LatestRunSelector;
