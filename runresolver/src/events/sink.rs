//! Resolution events and sink implementations.

use parking_lot::Mutex;
use serde::Serialize;
use std::fmt;
use tracing::{debug, info, warn, Level};

use crate::errors::Result;
use crate::observability::ResolutionSpanAttributes;
use crate::resolution::ResolveOutcome;

/// How a resolution call ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionEventKind {
    /// A run was resolved.
    Resolved,
    /// No run qualified.
    Skipped,
    /// The call returned an error.
    Failed,
}

impl ResolutionEventKind {
    /// Classifies a resolution result.
    #[must_use]
    pub const fn of(result: &Result<ResolveOutcome>) -> Self {
        match result {
            Ok(ResolveOutcome::Resolved(_)) => Self::Resolved,
            Ok(ResolveOutcome::Skipped(_)) => Self::Skipped,
            Err(_) => Self::Failed,
        }
    }

    /// Returns the dotted event type, e.g. `resolution.resolved`.
    #[must_use]
    pub const fn event_type(self) -> &'static str {
        match self {
            Self::Resolved => "resolution.resolved",
            Self::Skipped => "resolution.skipped",
            Self::Failed => "resolution.failed",
        }
    }
}

impl fmt::Display for ResolutionEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.event_type())
    }
}

/// One resolution call as seen by a sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolutionEvent {
    /// How the call ended.
    pub kind: ResolutionEventKind,
    /// Span attributes of the call.
    pub attributes: ResolutionSpanAttributes,
}

impl ResolutionEvent {
    /// Builds the event for a finished call.
    #[must_use]
    pub fn new(result: &Result<ResolveOutcome>, attributes: ResolutionSpanAttributes) -> Self {
        Self {
            kind: ResolutionEventKind::of(result),
            attributes,
        }
    }

    /// Returns the dotted event type.
    #[must_use]
    pub const fn event_type(&self) -> &'static str {
        self.kind.event_type()
    }
}

/// Receives one event per resolution call.
///
/// Called on the resolving thread after the outcome is known. Sinks must not
/// fail; anything they cannot deliver is dropped.
pub trait ResolutionEventSink: Send + Sync {
    /// Records an event.
    fn emit(&self, event: &ResolutionEvent);
}

/// Discards all events.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpEventSink;

impl ResolutionEventSink for NoOpEventSink {
    fn emit(&self, _event: &ResolutionEvent) {}
}

/// Writes each event to `tracing` at a fixed level.
///
/// Failed calls are always logged at `WARN`, whatever the configured level.
#[derive(Debug, Clone)]
pub struct LoggingEventSink {
    level: Level,
}

impl Default for LoggingEventSink {
    fn default() -> Self {
        Self::info()
    }
}

impl LoggingEventSink {
    /// Logs at `DEBUG`.
    #[must_use]
    pub const fn debug() -> Self {
        Self { level: Level::DEBUG }
    }

    /// Logs at `INFO`.
    #[must_use]
    pub const fn info() -> Self {
        Self { level: Level::INFO }
    }

    /// Returns the configured level.
    #[must_use]
    pub const fn level(&self) -> Level {
        self.level
    }
}

impl ResolutionEventSink for LoggingEventSink {
    fn emit(&self, event: &ResolutionEvent) {
        let attrs = &event.attributes;
        let resolution_id = attrs.resolution_id.as_deref().unwrap_or_default();
        if event.kind == ResolutionEventKind::Failed {
            warn!(
                event_type = event.event_type(),
                pipeline = %attrs.pipeline_name,
                resolution_id,
                error_code = ?attrs.error_code,
                "Resolution event"
            );
        } else if self.level == Level::DEBUG {
            debug!(
                event_type = event.event_type(),
                pipeline = %attrs.pipeline_name,
                resolution_id,
                run_id = ?attrs.run_id,
                "Resolution event"
            );
        } else {
            info!(
                event_type = event.event_type(),
                pipeline = %attrs.pipeline_name,
                resolution_id,
                run_id = ?attrs.run_id,
                "Resolution event"
            );
        }
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct CollectingEventSink {
    events: Mutex<Vec<ResolutionEvent>>,
}

impl CollectingEventSink {
    /// Creates an empty sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the collected events.
    #[must_use]
    pub fn events(&self) -> Vec<ResolutionEvent> {
        self.events.lock().clone()
    }

    /// Returns the collected event types.
    #[must_use]
    pub fn event_types(&self) -> Vec<&'static str> {
        self.events.lock().iter().map(ResolutionEvent::event_type).collect()
    }
}

impl ResolutionEventSink for CollectingEventSink {
    fn emit(&self, event: &ResolutionEvent) {
        self.events.lock().push(event.clone());
    }
}
