//! Observability utilities.

mod subscriber;
mod tracing;

pub use self::subscriber::{init_tracing, LogFormat, TracingConfig};
pub use self::tracing::{ResolutionSpanAttributes, SpanTimer};
