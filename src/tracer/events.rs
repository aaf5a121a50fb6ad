//! Event schema for fetch tracing.

use crate::content::{Availability, Position};
use serde::{Deserialize, Serialize};

/// Lifecycle event of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TraceEvent {
    FetchStarted {
        position: Position,
        source: String,
    },
    FetchCompleted {
        position: Position,
        source: String,
        availability: Availability,
    },
    FetchError {
        position: Position,
        source: String,
        cause: String,
    },
}

impl TraceEvent {
    pub fn fetch_started(position: &Position, source: impl Into<String>) -> Self {
        TraceEvent::FetchStarted {
            position: position.clone(),
            source: source.into(),
        }
    }

    pub fn fetch_completed(
        position: &Position,
        source: impl Into<String>,
        availability: Availability,
    ) -> Self {
        TraceEvent::FetchCompleted {
            position: position.clone(),
            source: source.into(),
            availability,
        }
    }

    pub fn fetch_error(
        position: &Position,
        source: impl Into<String>,
        cause: &dyn std::error::Error,
    ) -> Self {
        TraceEvent::FetchError {
            position: position.clone(),
            source: source.into(),
            cause: cause.to_string(),
        }
    }

    pub fn position(&self) -> &Position {
        match self {
            TraceEvent::FetchStarted { position, .. }
            | TraceEvent::FetchCompleted { position, .. }
            | TraceEvent::FetchError { position, .. } => position,
        }
    }

    pub fn source(&self) -> &str {
        match self {
            TraceEvent::FetchStarted { source, .. }
            | TraceEvent::FetchCompleted { source, .. }
            | TraceEvent::FetchError { source, .. } => source,
        }
    }
}
