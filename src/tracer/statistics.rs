//! Tracer that forwards events to the log and keeps running counters.

use crate::tracer::{TraceEvent, Tracer};
use crate::content::Availability;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info, warn};

/// Snapshot of the counters of a [`LoggingStatisticsTracer`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub fetches_started: u64,
    pub fetches_completed: u64,
    pub available: u64,
    pub unavailable: u64,
    pub errors: u64,
}

#[derive(Debug, Default)]
pub struct LoggingStatisticsTracer {
    started: AtomicU64,
    completed: AtomicU64,
    available: AtomicU64,
    unavailable: AtomicU64,
    errors: AtomicU64,
}

impl LoggingStatisticsTracer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statistics(&self) -> Statistics {
        Statistics {
            fetches_started: self.started.load(Ordering::Relaxed),
            fetches_completed: self.completed.load(Ordering::Relaxed),
            available: self.available.load(Ordering::Relaxed),
            unavailable: self.unavailable.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
        }
    }

    pub fn log_summary(&self) {
        let stats = self.statistics();
        info!(
            fetches_started = stats.fetches_started,
            fetches_completed = stats.fetches_completed,
            available = stats.available,
            unavailable = stats.unavailable,
            errors = stats.errors,
            "Fetch statistics"
        );
    }
}

impl Tracer for LoggingStatisticsTracer {
    fn trace(&self, event: TraceEvent) {
        match &event {
            TraceEvent::FetchStarted { position, source } => {
                self.started.fetch_add(1, Ordering::Relaxed);
                debug!(position = %position, source = %source, "Fetch started");
            }
            TraceEvent::FetchCompleted {
                position,
                source,
                availability,
            } => {
                self.completed.fetch_add(1, Ordering::Relaxed);
                if *availability == Availability::Available {
                    self.available.fetch_add(1, Ordering::Relaxed);
                } else {
                    self.unavailable.fetch_add(1, Ordering::Relaxed);
                }
                debug!(
                    position = %position,
                    source = %source,
                    availability = %availability,
                    "Fetch completed"
                );
            }
            TraceEvent::FetchError {
                position,
                source,
                cause,
            } => {
                self.errors.fetch_add(1, Ordering::Relaxed);
                warn!(position = %position, source = %source, cause = %cause, "Fetch failed");
            }
        }
    }
}
