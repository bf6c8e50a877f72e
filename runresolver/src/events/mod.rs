//! Resolution events and the sinks that receive them.
//!
//! Every `resolve()` call on a bound operation reports exactly one
//! [`ResolutionEvent`] to the sink in its
//! [`ResolverContext`](crate::resolution::ResolverContext).

mod sink;

pub use sink::{
    CollectingEventSink, LoggingEventSink, NoOpEventSink, ResolutionEvent, ResolutionEventKind,
    ResolutionEventSink,
};
