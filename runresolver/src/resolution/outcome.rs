//! Resolution results.

use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

use crate::metadata::{Artifact, ArtifactId, ContextId, ExecutionId};

/// Output channels of one pipeline run: channel key to ordered artifacts.
///
/// Keys iterate in sorted order. A key is present only if at least one
/// artifact was published under it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChannelMapping(BTreeMap<String, Vec<Artifact>>);

impl ChannelMapping {
    /// Creates an empty mapping.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if no channel has artifacts.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if the channel is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    /// Returns the artifacts of a channel in index order.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&[Artifact]> {
        self.0.get(key).map(Vec::as_slice)
    }

    /// Returns the channel keys in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Iterates over channels in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Artifact])> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_slice()))
    }

    /// Returns the artifact ids of every channel.
    #[must_use]
    pub fn artifact_ids(&self) -> BTreeMap<String, Vec<ArtifactId>> {
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), v.iter().map(|a| a.id).collect()))
            .collect()
    }

    /// Consumes the mapping and returns the underlying map.
    #[must_use]
    pub fn into_inner(self) -> BTreeMap<String, Vec<Artifact>> {
        self.0
    }
}

impl FromIterator<(String, Vec<Artifact>)> for ChannelMapping {
    /// Collects channels, dropping any whose artifact list is empty.
    fn from_iter<I: IntoIterator<Item = (String, Vec<Artifact>)>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .filter(|(_, artifacts)| !artifacts.is_empty())
                .collect(),
        )
    }
}

/// The run a resolution settled on, with its output channels.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedRun {
    /// Run identifier (the `pipeline_run` context name).
    pub run_id: String,
    /// The `pipeline_run` context.
    pub context_id: ContextId,
    /// The end-node execution whose outputs were read.
    pub end_node: ExecutionId,
    /// The run's output channels. Never empty.
    pub channels: ChannelMapping,
}

/// Why a resolution produced no input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "reason", rename_all = "snake_case")]
pub enum SkipReason {
    /// The pipeline has no recorded runs.
    NoRuns {
        /// The pipeline name.
        pipeline: String,
    },
    /// Runs exist but none has a complete end node with outputs.
    NoQualifyingRun {
        /// The pipeline name.
        pipeline: String,
        /// How many runs were examined.
        probed: usize,
    },
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoRuns { pipeline } => write!(f, "pipeline '{pipeline}' has no runs"),
            Self::NoQualifyingRun { pipeline, probed } => write!(
                f,
                "none of the {probed} runs of pipeline '{pipeline}' has a complete end-node output"
            ),
        }
    }
}

/// Result of a successful resolution call.
///
/// `Skipped` is an expected outcome: the caller should not run downstream
/// work this cycle. It is not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ResolveOutcome {
    /// The newest qualifying run and its channels.
    Resolved(ResolvedRun),
    /// No run qualifies.
    Skipped(SkipReason),
}

impl ResolveOutcome {
    /// Returns true for `Resolved`.
    #[must_use]
    pub const fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }

    /// Returns true for `Skipped`.
    #[must_use]
    pub const fn is_skipped(&self) -> bool {
        matches!(self, Self::Skipped(_))
    }

    /// Returns the resolved channels, if any.
    #[must_use]
    pub const fn channels(&self) -> Option<&ChannelMapping> {
        match self {
            Self::Resolved(run) => Some(&run.channels),
            Self::Skipped(_) => None,
        }
    }

    /// Consumes the outcome and returns the resolved channels, if any.
    #[must_use]
    pub fn into_channels(self) -> Option<ChannelMapping> {
        match self {
            Self::Resolved(run) => Some(run.channels),
            Self::Skipped(_) => None,
        }
    }

    /// Returns the resolved run, if any.
    #[must_use]
    pub const fn run(&self) -> Option<&ResolvedRun> {
        match self {
            Self::Resolved(run) => Some(run),
            Self::Skipped(_) => None,
        }
    }
}
