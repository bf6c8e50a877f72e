//! Span attributes and timing for resolution calls.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Instant;

use crate::errors::Result;
use crate::resolution::ResolveOutcome;

/// Attributes describing one resolution call.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolutionSpanAttributes {
    /// Pipeline name.
    pub pipeline_name: String,
    /// Correlation id of the call.
    pub resolution_id: Option<String>,
    /// `resolved`, `skipped` or `failed`.
    pub status: Option<String>,
    /// The resolved run.
    pub run_id: Option<String>,
    /// Channel keys of the resolved run.
    pub channels: Vec<String>,
    /// Why nothing was resolved.
    pub skip_reason: Option<String>,
    /// Error code if failed.
    pub error_code: Option<String>,
    /// Error message if failed.
    pub error: Option<String>,
    /// Duration in milliseconds.
    pub duration_ms: Option<f64>,
}

impl ResolutionSpanAttributes {
    /// Creates attributes for a call resolving `pipeline_name`.
    #[must_use]
    pub fn new(pipeline_name: impl Into<String>) -> Self {
        Self {
            pipeline_name: pipeline_name.into(),
            ..Default::default()
        }
    }

    /// Sets the resolution id.
    #[must_use]
    pub fn with_resolution_id(mut self, id: impl Into<String>) -> Self {
        self.resolution_id = Some(id.into());
        self
    }

    /// Records the result of the call.
    #[must_use]
    pub fn with_result(mut self, result: &Result<ResolveOutcome>) -> Self {
        match result {
            Ok(ResolveOutcome::Resolved(run)) => {
                self.status = Some("resolved".to_string());
                self.run_id = Some(run.run_id.clone());
                self.channels = run.channels.keys().map(str::to_string).collect();
            }
            Ok(ResolveOutcome::Skipped(reason)) => {
                self.status = Some("skipped".to_string());
                self.skip_reason = Some(reason.to_string());
            }
            Err(err) => {
                self.status = Some("failed".to_string());
                self.error_code = Some(err.code().to_string());
                self.error = Some(err.to_string());
            }
        }
        self
    }

    /// Sets the duration.
    #[must_use]
    pub fn with_duration_ms(mut self, duration_ms: f64) -> Self {
        self.duration_ms = Some(duration_ms);
        self
    }

    /// Converts to OpenTelemetry attributes.
    #[must_use]
    pub fn to_otel_attributes(&self) -> HashMap<String, String> {
        let mut attrs = HashMap::new();

        attrs.insert("pipeline.name".to_string(), self.pipeline_name.clone());

        if let Some(ref v) = self.resolution_id {
            attrs.insert("resolution.id".to_string(), v.clone());
        }
        if let Some(ref v) = self.status {
            attrs.insert("resolution.status".to_string(), v.clone());
        }
        if let Some(ref v) = self.run_id {
            attrs.insert("pipeline.run_id".to_string(), v.clone());
        }
        if !self.channels.is_empty() {
            attrs.insert("resolution.channels".to_string(), self.channels.join(","));
        }
        if let Some(ref v) = self.skip_reason {
            attrs.insert("resolution.skip_reason".to_string(), v.clone());
        }
        if let Some(ref v) = self.error_code {
            attrs.insert("resolution.error_code".to_string(), v.clone());
        }
        if let Some(ref v) = self.error {
            attrs.insert("resolution.error".to_string(), v.clone());
        }
        if let Some(v) = self.duration_ms {
            attrs.insert("resolution.duration_ms".to_string(), v.to_string());
        }

        attrs
    }
}

/// Wall-clock timer for one resolution call.
#[derive(Debug, Clone, Copy)]
pub struct SpanTimer {
    start: Instant,
}

impl SpanTimer {
    /// Starts timing.
    #[must_use]
    pub fn start() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Returns the elapsed time in milliseconds.
    #[must_use]
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Stops timing and returns the duration in milliseconds.
    #[must_use]
    pub fn finish(self) -> f64 {
        self.elapsed_ms()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ResolverError, StoreError};
    use crate::resolution::SkipReason;

    #[test]
    fn test_skipped_attributes() {
        let result = Ok(ResolveOutcome::Skipped(SkipReason::NoRuns {
            pipeline: "taxi".to_string(),
        }));
        let attrs = ResolutionSpanAttributes::new("taxi")
            .with_resolution_id("abc")
            .with_result(&result)
            .with_duration_ms(1.5);

        let otel = attrs.to_otel_attributes();
        assert_eq!(otel.get("pipeline.name"), Some(&"taxi".to_string()));
        assert_eq!(otel.get("resolution.id"), Some(&"abc".to_string()));
        assert_eq!(otel.get("resolution.status"), Some(&"skipped".to_string()));
        assert_eq!(otel.get("resolution.duration_ms"), Some(&"1.5".to_string()));
        assert!(!otel.contains_key("pipeline.run_id"));
    }

    #[test]
    fn test_failed_attributes() {
        let result: Result<ResolveOutcome> =
            Err(ResolverError::Store(StoreError::Unavailable("down".to_string())));
        let attrs = ResolutionSpanAttributes::new("taxi").with_result(&result);

        assert_eq!(attrs.status.as_deref(), Some("failed"));
        assert_eq!(attrs.error_code.as_deref(), Some("RESOLVE-STORE"));
    }

    #[test]
    fn test_span_timer() {
        let timer = SpanTimer::start();
        std::thread::sleep(std::time::Duration::from_millis(10));
        assert!(timer.finish() >= 10.0);
    }
}
