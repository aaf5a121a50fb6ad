//! Fetch tracing.
//!
//! A [`Tracer`] is passed explicitly through every fetch and observes its lifecycle.
//! It never influences control flow: implementations must be cheap and must not panic.

pub mod events;
pub mod statistics;

pub use events::TraceEvent;
pub use statistics::{LoggingStatisticsTracer, Statistics};

pub trait Tracer: Send + Sync {
    fn trace(&self, event: TraceEvent);
}

/// Tracer that ignores every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpTracer;

impl Tracer for NoOpTracer {
    fn trace(&self, _event: TraceEvent) {}
}

impl<T: Tracer + ?Sized> Tracer for std::sync::Arc<T> {
    fn trace(&self, event: TraceEvent) {
        (**self).trace(event)
    }
}
