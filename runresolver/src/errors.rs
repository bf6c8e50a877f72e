//! Error types for run resolution.
//!
//! "No qualifying run" is not represented here: it is an ordinary
//! [`ResolveOutcome::Skipped`](crate::resolution::ResolveOutcome) value. The
//! types below cover genuine faults only.

use std::collections::HashMap;
use thiserror::Error;

use crate::metadata::{ArtifactId, ContextId, ExecutionId};
use crate::utils::TimestampError;

/// Result type for resolver operations.
pub type Result<T> = std::result::Result<T, ResolverError>;

/// The main error type for resolver operations.
#[derive(Debug, Error)]
pub enum ResolverError {
    /// A store query failed.
    #[error("{0}")]
    Store(#[from] StoreError),

    /// The store contents contradict the run layout written by the orchestrator.
    #[error("{0}")]
    Consistency(#[from] ConsistencyError),

    /// The operation was configured with invalid options.
    #[error("{0}")]
    Config(#[from] ConfigError),

    /// `resolve()` was called before `set_context()`.
    #[error("Resolver operation '{op}' was invoked before a store context was bound")]
    ContextNotBound {
        /// The operation name.
        op: String,
    },

    /// A generic internal error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResolverError {
    /// Creates a context-not-bound error.
    #[must_use]
    pub fn context_not_bound(op: impl Into<String>) -> Self {
        Self::ContextNotBound { op: op.into() }
    }

    /// Returns a stable, machine-readable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Store(_) => "RESOLVE-STORE",
            Self::Consistency(_) => "RESOLVE-CONSISTENCY",
            Self::Config(_) => "RESOLVE-CONFIG",
            Self::ContextNotBound { .. } => "RESOLVE-UNBOUND",
            Self::Internal(_) => "RESOLVE-INTERNAL",
        }
    }

    /// Returns true if retrying the same call cannot succeed.
    ///
    /// Store failures are the only transient class; retry policy for them
    /// belongs to the caller.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        !matches!(self, Self::Store(StoreError::Unavailable(_)))
    }

    /// Converts to a dictionary representation.
    #[must_use]
    pub fn to_dict(&self) -> HashMap<String, serde_json::Value> {
        let mut map = HashMap::new();
        map.insert("code".to_string(), serde_json::json!(self.code()));
        map.insert("message".to_string(), serde_json::json!(self.to_string()));
        map.insert("fatal".to_string(), serde_json::json!(self.is_fatal()));
        if let Self::Consistency(err) = self {
            map.insert("violation".to_string(), serde_json::json!(err.kind()));
        }
        map
    }
}

/// Errors reported by a [`MetadataStore`](crate::store::MetadataStore).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The store could not be reached.
    #[error("Metadata store unavailable: {0}")]
    Unavailable(String),

    /// A query was rejected or failed while executing.
    #[error("Store query '{query}' failed: {message}")]
    Query {
        /// The facade method that failed.
        query: String,
        /// The reason reported by the store.
        message: String,
    },

    /// The store returned a record that does not fit the metadata model.
    #[error("Malformed store record: {0}")]
    Malformed(String),
}

impl StoreError {
    /// Creates a query failure.
    #[must_use]
    pub fn query(query: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Query {
            query: query.into(),
            message: message.into(),
        }
    }

    /// Creates a malformed-record error.
    #[must_use]
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

impl From<TimestampError> for StoreError {
    fn from(err: TimestampError) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Malformed(err.to_string())
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        Self::Unavailable(err.to_string())
    }
}

/// Store contents that violate the pipeline-run layout.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsistencyError {
    /// A single run has more than one end-node execution.
    #[error(
        "Pipeline run '{run_id}' (context {context_id}) has {} end-node executions: {executions:?}",
        .executions.len()
    )]
    MultipleEndNodes {
        /// The run identifier.
        run_id: String,
        /// The run context id.
        context_id: ContextId,
        /// All end-node executions found for the run.
        executions: Vec<ExecutionId>,
    },

    /// An event references an artifact the store does not return.
    #[error("Execution {execution} publishes missing artifact {artifact} under '{key}'")]
    MissingArtifact {
        /// The end-node execution.
        execution: ExecutionId,
        /// The dangling artifact id.
        artifact: ArtifactId,
        /// The channel key of the event.
        key: String,
    },

    /// Two events of one execution occupy the same channel position.
    #[error("Execution {execution} has more than one artifact at '{key}'[{index}]")]
    DuplicateEventIndex {
        /// The end-node execution.
        execution: ExecutionId,
        /// The channel key.
        key: String,
        /// The repeated index.
        index: u32,
    },
}

impl ConsistencyError {
    /// Returns a short name for the violation.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::MultipleEndNodes { .. } => "multiple_end_nodes",
            Self::MissingArtifact { .. } => "missing_artifact",
            Self::DuplicateEventIndex { .. } => "duplicate_event_index",
        }
    }
}

/// Error raised when an operation is configured with invalid options.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Invalid option '{field}': {message}")]
pub struct ConfigError {
    /// The offending option.
    pub field: String,
    /// What is wrong with it.
    pub message: String,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}
